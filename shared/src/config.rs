use crate::name_resolver::{DEFAULT_SINA_REFERER, DEFAULT_SINA_URL};
use anyhow::Context;
use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use dotenv::dotenv;
use std::path::PathBuf;

pub struct Config {
    pub data_file: PathBuf,
    pub name_lookup_url: String,
    pub name_lookup_referer: String,
    pub html_reports_dir: PathBuf,
    pub timezone: Tz,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        let timezone = std::env::var("JOURNAL_TIMEZONE").unwrap_or_else(|_| "Asia/Shanghai".to_string());

        Ok(Config {
            data_file: std::env::var("JOURNAL_DATA_FILE")
                .unwrap_or_else(|_| "trades.csv".to_string())
                .into(),
            name_lookup_url: std::env::var("NAME_LOOKUP_URL")
                .unwrap_or_else(|_| DEFAULT_SINA_URL.to_string()),
            name_lookup_referer: std::env::var("NAME_LOOKUP_REFERER")
                .unwrap_or_else(|_| DEFAULT_SINA_REFERER.to_string()),
            html_reports_dir: std::env::var("HTML_REPORTS_DIR")
                .unwrap_or_else(|_| "./html_reports".to_string())
                .into(),
            timezone: timezone
                .parse()
                .map_err(|e| anyhow::anyhow!("{}", e))
                .with_context(|| format!("Invalid JOURNAL_TIMEZONE {:?}", timezone))?,
        })
    }

    /// Wall-clock time in the journal's timezone, without offset
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.timezone).naive_local()
    }
}
