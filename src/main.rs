// Main CLI entry point for handlehunt
// Uses clap for argument parsing

use clap::{value_parser, Arg, ArgAction, Command};
use handlehunt::catalog::{CatalogParser, WmnJsonParser};
use handlehunt::config::{load_config, DEFAULT_CONFIG_PATH};
use handlehunt::progress::ConsoleProgress;
use handlehunt::reporting::{export, render_console_summary, ExportFormat};
use handlehunt::scanner::Scanner;
use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const CATALOG_URL: &str = "https://raw.githubusercontent.com/WebBreacher/WhatsMyName/main/wmn-data.json";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("handlehunt=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn cli() -> Command {
    Command::new("handlehunt")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Jake Abendroth")
        .about("Checks which sites in a WhatsMyName catalog have an account for a username")
        .after_help("EXAMPLES:\n  handlehunt johndoe\n  handlehunt johndoe --categories social,gaming --format both\n  handlehunt --list-categories --catalog wmn-data.json")
        .arg(Arg::new("username")
            .required_unless_present("list_categories")
            .help("Username to search for"))
        .arg(Arg::new("catalog")
            .long("catalog")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("Path to wmn-data.json (default from config)"))
        .arg(Arg::new("config")
            .long("config")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .default_value(DEFAULT_CONFIG_PATH)
            .help("Path to TOML config file"))
        .arg(Arg::new("categories")
            .short('c')
            .long("categories")
            .num_args(1)
            .value_delimiter(',')
            .help("Comma-separated categories to check (default: all)"))
        .arg(Arg::new("max_sites")
            .short('m')
            .long("max-sites")
            .num_args(1)
            .value_parser(value_parser!(usize))
            .help("Maximum number of sites to check"))
        .arg(Arg::new("concurrency")
            .short('n')
            .long("concurrency")
            .num_args(1)
            .value_parser(value_parser!(usize))
            .help("Parallel requests, 1-10"))
        .arg(Arg::new("timeout")
            .short('t')
            .long("timeout")
            .num_args(1)
            .value_parser(value_parser!(u64))
            .help("Per-request timeout in seconds, 5-60"))
        .arg(Arg::new("format")
            .short('f')
            .long("format")
            .num_args(1)
            .value_parser(["html", "csv", "json", "both"])
            .default_value("html")
            .help("Report format"))
        .arg(Arg::new("output_dir")
            .short('o')
            .long("output-dir")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("Directory for report files (default from config)"))
        .arg(Arg::new("list_categories")
            .long("list-categories")
            .action(ArgAction::SetTrue)
            .help("Print the catalog's categories and exit"))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .action(ArgAction::SetTrue)
            .help("Log every probe to stderr"))
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    let config_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = load_config(&config_path).unwrap_or_else(|e| {
        eprintln!("Failed to load config {}: {}", config_path.display(), e);
        std::process::exit(2);
    });

    if let Some(n) = matches.get_one::<usize>("concurrency") {
        config.search.concurrent_requests = *n;
    }
    if let Some(t) = matches.get_one::<u64>("timeout") {
        config.search.timeout_secs = *t;
    }
    if let Some(m) = matches.get_one::<usize>("max_sites") {
        config.search.max_sites = *m;
    }
    if let Some(path) = matches.get_one::<PathBuf>("catalog") {
        config.paths.database = path.clone();
    }
    if let Some(dir) = matches.get_one::<PathBuf>("output_dir") {
        config.paths.reports = dir.clone();
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid settings: {}", e);
        std::process::exit(2);
    }

    let catalog = WmnJsonParser.parse(&config.paths.database).unwrap_or_else(|e| {
        eprintln!("Failed to load catalog: {}", e);
        eprintln!("Download it with:\n  wget {}", CATALOG_URL);
        std::process::exit(1);
    });

    if matches.get_flag("list_categories") {
        for category in catalog.categories() {
            println!("{}", category);
        }
        return;
    }

    let username = matches
        .get_one::<String>("username")
        .map(|u| u.trim().to_string())
        .unwrap_or_default();
    if username.is_empty() {
        eprintln!("Username must not be empty.");
        std::process::exit(2);
    }

    let selected: HashSet<String> = matches
        .get_many::<String>("categories")
        .map(|values| {
            values
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let known: HashSet<String> = catalog.categories().into_iter().collect();
    for category in selected.difference(&known) {
        tracing::warn!("category '{}' is not in the catalog", category);
    }

    let selection = catalog.select(&selected, config.search.max_sites);
    println!(
        "Loaded {} sites in {} categories from {}",
        catalog.sites.len(),
        known.len(),
        config.paths.database.display()
    );
    if selection.truncated() {
        println!(
            "Limit reached: checking the first {} of {} matching sites",
            selection.records.len(),
            selection.matched
        );
    }
    let scan_config = config.scan_config();
    println!(
        "Searching for '{}' on {} sites (about {}s)...",
        username,
        selection.records.len(),
        selection.records.len() * 2 / scan_config.concurrency
    );

    let progress = Arc::new(ConsoleProgress::new(selection.records.len()));
    let scanner = Scanner::new(scan_config).with_progress(progress);
    let outcome = tokio::select! {
        outcome = scanner.scan(&username, &selection.records) => outcome,
        _ = tokio::signal::ctrl_c() => {
            println!("\nInterrupted.");
            std::process::exit(130);
        }
    };
    let report = match outcome {
        Ok(report) => report.with_selected_categories(selected.into_iter().collect()),
        Err(e) => {
            eprintln!("Scan failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", render_console_summary(&report));

    let format: ExportFormat = matches
        .get_one::<String>("format")
        .and_then(|f| f.parse().ok())
        .unwrap_or(ExportFormat::Html);
    match export(&report, &config.paths.reports, format) {
        Ok(paths) => {
            for path in paths {
                println!("Report: {}", path.display());
            }
        }
        Err(e) => {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
    }
}
