use anyhow::Result;
use chrono::{TimeZone, Utc};

/// Build time recorded by build.rs as epoch seconds, shown in UTC
fn build_time(raw: &str) -> String {
    raw.parse::<i64>()
        .ok()
        .and_then(|epoch| Utc.timestamp_opt(epoch, 0).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn handle_version() -> Result<()> {
    println!("trade-journal {}", env!("CARGO_PKG_VERSION"));
    println!("Branch:     {}", option_env!("GIT_BRANCH").unwrap_or("unknown"));
    println!("Tag:        {}", option_env!("GIT_TAG").unwrap_or("unknown"));
    println!("Commit:     {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("Build Time: {}", build_time(option_env!("BUILD_TIME").unwrap_or("unknown")));
    println!("OS:         {}", option_env!("TARGET_OS").unwrap_or("unknown"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_time() {
        assert_eq!(build_time("0"), "1970-01-01 00:00:00 UTC");
        assert_eq!(build_time("unknown"), "unknown");
    }
}
