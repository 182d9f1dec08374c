// Terminal progress for handlehunt scans
// Drives an indicatif bar from the scanner's progress events

use indicatif::{ProgressBar, ProgressStyle};

use crate::scanner::ProgressObserver;

const BAR_TEMPLATE: &str = "[{bar:50}] {percent:>3}% ({pos}/{len}) {elapsed_precise}";

/// Progress bar on stderr; indicatif hides it when stderr is not a terminal.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    /// `expected` is only the initial length; the scanner reports the dispatched count.
    pub fn new(expected: usize) -> Self {
        Self {
            bar: create_progress_bar(expected),
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }

    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&self, completed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
        if completed == total {
            self.bar.finish();
        }
    }
}

fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
