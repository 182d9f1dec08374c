// Reporting and output for handlehunt
// Console summary plus HTML, CSV, TXT and JSON export

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::ScanReport;

/// Sites listed per category in the console summary.
pub const CONSOLE_SITES_PER_CATEGORY: usize = 5;

const REPORT_PREFIX: &str = "handlehunt";

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    /// CSV plus the TXT summary
    Csv,
    Json,
    /// HTML, CSV and TXT
    Both,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(ExportFormat::Html),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "both" => Ok(ExportFormat::Both),
            other => Err(format!("unknown export format: {}", other)),
        }
    }
}

/// Escape CSV field to prevent formula injection attacks
/// Cells starting with =, +, -, @, or tab are prefixed with single quote
fn escape_csv_field(field: &str) -> String {
    let Some(first_char) = field.chars().next() else {
        return String::new();
    };
    let needs_escaping = matches!(first_char, '=' | '+' | '-' | '@' | '\t');

    if needs_escaping {
        format!("\"'{}\"", field.replace('"', "\"\""))
    } else if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Target reduced to characters safe for a file name.
pub fn sanitize_target(target: &str) -> String {
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(target, "_").replace("..", "_");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "target".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `handlehunt_<target>_<YYYYmmdd_HHMMSS><suffix>`
pub fn report_filename(report: &ScanReport, suffix: &str) -> String {
    format!(
        "{}_{}_{}{}",
        REPORT_PREFIX,
        sanitize_target(&report.target),
        report.timestamp.format("%Y%m%d_%H%M%S"),
        suffix
    )
}

fn create_in(dir: &Path, name: &str) -> io::Result<(PathBuf, File)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    let file = File::create(&path)?;
    Ok((path, file))
}

/// Plain-text summary for the terminal.
pub fn render_console_summary(report: &ScanReport) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Results");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Username: {}", report.target);
    let _ = writeln!(out, "Sites checked: {}", report.total_evaluated);
    let _ = writeln!(out, "Profiles found: {}", report.total_found);
    if report.total_errors > 0 {
        let _ = writeln!(out, "Errors: {}", report.total_errors);
    }
    let _ = writeln!(out, "Categories with results: {}", report.category_count());

    let groups = report.sorted_categories();
    if groups.is_empty() {
        let _ = writeln!(out, "\nNo profiles found.");
    } else {
        let _ = writeln!(out, "\nFound profiles:");
        for (category, sites) in &groups {
            let _ = writeln!(out, "\n{} ({}):", category.to_uppercase(), sites.len());
            for site in sites.iter().take(CONSOLE_SITES_PER_CATEGORY) {
                let _ = writeln!(out, "  - {}: {}", site.name, site.url);
            }
            if sites.len() > CONSOLE_SITES_PER_CATEGORY {
                let _ = writeln!(
                    out,
                    "  ... and {} more",
                    sites.len() - CONSOLE_SITES_PER_CATEGORY
                );
            }
        }
    }
    let _ = write!(out, "{}", rule);
    out
}

pub fn render_html(report: &ScanReport) -> String {
    let target = escape_html(&report.target);
    let generated = report.timestamp.format("%Y-%m-%d %H:%M:%S");
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>handlehunt report - {target}</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; }}
        .header {{ background: #2c3e50; color: white; padding: 20px; border-radius: 5px; }}
        .stats {{ display: grid; grid-template-columns: repeat(4, 1fr); gap: 10px; margin: 20px 0; }}
        .stat-box {{ background: #f8f9fa; padding: 15px; border-radius: 5px; text-align: center; }}
        .category {{ margin: 20px 0; border: 1px solid #ddd; border-radius: 5px; }}
        .category-header {{ background: #34495e; color: white; padding: 10px; }}
        .site-item {{ padding: 10px; border-bottom: 1px solid #eee; }}
        .site-item:last-child {{ border-bottom: none; }}
        .filter {{ background: #e8f4fd; padding: 10px; border-radius: 5px; margin: 10px 0; }}
        a {{ color: #3498db; text-decoration: none; }}
    </style>
</head>
<body>
    <div class="header">
        <h1>handlehunt report</h1>
        <p>Username: <strong>{target}</strong> | Date: {generated}</p>
    </div>
    <div class="stats">
        <div class="stat-box"><h3>{checked}</h3><p>Sites Checked</p></div>
        <div class="stat-box"><h3>{found}</h3><p>Profiles Found</p></div>
        <div class="stat-box"><h3>{errors}</h3><p>Errors</p></div>
        <div class="stat-box"><h3>{categories}</h3><p>Categories</p></div>
    </div>
"#,
        target = target,
        generated = generated,
        checked = report.total_evaluated,
        found = report.total_found,
        errors = report.total_errors,
        categories = report.category_count(),
    );

    if !report.selected_categories.is_empty() {
        let _ = writeln!(
            html,
            "    <div class=\"filter\"><strong>Filtered categories:</strong> {}</div>",
            escape_html(&report.selected_categories.join(", "))
        );
    }

    for (category, sites) in report.sorted_categories() {
        let _ = writeln!(html, "    <div class=\"category\">");
        let _ = writeln!(
            html,
            "        <div class=\"category-header\"><h3>{} ({})</h3></div>",
            escape_html(&category.to_uppercase()),
            sites.len()
        );
        for site in sites {
            let url = escape_html(&site.url);
            let _ = writeln!(
                html,
                "        <div class=\"site-item\"><strong>{}</strong><br><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a></div>",
                escape_html(&site.name),
                url,
                url
            );
        }
        let _ = writeln!(html, "    </div>");
    }

    html.push_str("</body>\n</html>\n");
    html
}

pub fn export_html(report: &ScanReport, dir: &Path) -> Result<PathBuf, io::Error> {
    let (path, mut file) = create_in(dir, &report_filename(report, ".html"))?;
    file.write_all(render_html(report).as_bytes())?;
    Ok(path)
}

/// Found profiles as CSV, sorted by category then site.
///
/// Returns `None` without creating a file when nothing was found.
pub fn export_csv(report: &ScanReport, dir: &Path) -> Result<Option<PathBuf>, io::Error> {
    if report.total_found == 0 {
        return Ok(None);
    }
    let (path, mut file) = create_in(dir, &report_filename(report, ".csv"))?;
    let stamp = report.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();

    writeln!(file, "category,site_name,url,status,timestamp")?;
    for (category, sites) in report.sorted_categories() {
        for site in sites {
            let status = site.status.map(|s| s.to_string()).unwrap_or_default();
            writeln!(
                file,
                "{},{},{},{},{}",
                escape_csv_field(category),
                escape_csv_field(&site.name),
                escape_csv_field(&site.url),
                status,
                stamp
            )?;
        }
    }

    Ok(Some(path))
}

pub fn export_summary(report: &ScanReport, dir: &Path) -> Result<PathBuf, io::Error> {
    let (path, mut file) = create_in(dir, &report_filename(report, "_summary.txt"))?;
    let rule = "=".repeat(60);

    writeln!(file, "handlehunt report - {}", report.target)?;
    writeln!(file, "{}", rule)?;
    writeln!(file, "Generated: {}", report.timestamp.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(file, "Tool: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "{}", rule)?;
    writeln!(file, "\nSTATISTICS:")?;
    writeln!(file, "  - Username: {}", report.target)?;
    writeln!(file, "  - Sites checked: {}", report.total_evaluated)?;
    writeln!(file, "  - Profiles found: {}", report.total_found)?;
    writeln!(file, "  - Errors: {}", report.total_errors)?;
    writeln!(file, "  - Categories with results: {}", report.category_count())?;
    if !report.selected_categories.is_empty() {
        writeln!(
            file,
            "  - Filtered categories: {}",
            report.selected_categories.join(", ")
        )?;
    }
    writeln!(file, "\n{}", rule)?;
    writeln!(file, "FOUND PROFILES:")?;
    for (category, sites) in report.sorted_categories() {
        writeln!(file, "\n{} ({}):", category.to_uppercase(), sites.len())?;
        for site in sites {
            writeln!(file, "  - {}", site.name)?;
            writeln!(file, "    {}", site.url)?;
        }
    }

    Ok(path)
}

pub fn export_json(report: &ScanReport, dir: &Path) -> Result<PathBuf, io::Error> {
    let (path, file) = create_in(dir, &report_filename(report, ".json"))?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(path)
}

/// Write every file the format calls for. Returns the paths written.
pub fn export(report: &ScanReport, dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>, io::Error> {
    let mut written = Vec::new();
    if matches!(format, ExportFormat::Html | ExportFormat::Both) {
        written.push(export_html(report, dir)?);
    }
    if matches!(format, ExportFormat::Csv | ExportFormat::Both) {
        if let Some(csv) = export_csv(report, dir)? {
            written.push(csv);
        }
        written.push(export_summary(report, dir)?);
    }
    if format == ExportFormat::Json {
        written.push(export_json(report, dir)?);
    }
    Ok(written)
}
