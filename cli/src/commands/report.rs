use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Args;
use shared::TradeReportTemplate;
use std::path::{Path, PathBuf};

use crate::state::AppState;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Output file; defaults to a timestamped file in HTML_REPORTS_DIR
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value = "交易日志")]
    pub title: String,
}

fn default_report_path(dir: &Path, now: NaiveDateTime) -> PathBuf {
    dir.join(format!("trade_report_{}.html", now.format("%Y%m%d_%H%M%S")))
}

pub fn handle_report(state: &AppState, args: ReportArgs) -> Result<()> {
    let records = state.repository.list()?;
    let now = state.config.now();

    let html = TradeReportTemplate::new(args.title, &records, now)
        .to_html()
        .context("Failed to render trade report")?;

    let path = args
        .output
        .unwrap_or_else(|| default_report_path(&state.config.html_reports_dir, now));
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create report directory {}", dir.display()))?;
    }
    std::fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!("Wrote report for {} trades to {}", records.len(), path.display());
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::parse_time;

    #[test]
    fn test_default_report_path() {
        let now = parse_time("2024-03-05 14:55:07").unwrap();
        assert_eq!(
            default_report_path(Path::new("./html_reports"), now),
            PathBuf::from("./html_reports/trade_report_20240305_145507.html")
        );
    }
}
