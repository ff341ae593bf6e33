//! Plain-text summary report.

use crate::quality::QualityMetrics;
use crate::utils::ensure_writable_dir;
use chrono::{DateTime, Local};
use std::error::Error;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Render the report with a generation timestamp header.
pub fn render_report(metrics: &QualityMetrics, site: &str, generated: DateTime<Local>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "Scraping Summary Report for {site}");
    let _ = writeln!(out, "Generated: {}", generated.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out);
    let _ = write!(out, "{metrics}");
    out
}

/// Render the report for `site` and write it to `path`.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the write fails.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_report(
    metrics: &QualityMetrics,
    site: &str,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_writable_dir(parent).await?;
    }
    fs::write(path, render_report(metrics, site, Local::now())).await?;
    info!("Wrote summary report");
    Ok(())
}
