//! Stock code to display name lookup
//!
//! Resolvers never fail: network and parse errors degrade to
//! [`UNKNOWN_STOCK_NAME`]. The repository does not depend on this module;
//! only the presentation layer calls it when a trade is entered.

use async_trait::async_trait;
use std::collections::HashMap;

/// Sentinel returned when a name cannot be resolved
pub const UNKNOWN_STOCK_NAME: &str = "未知股票";

pub const DEFAULT_SINA_URL: &str = "http://hq.sinajs.cn/list=";
pub const DEFAULT_SINA_REFERER: &str = "https://finance.sina.com.cn";

#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Display name for `code`, or [`UNKNOWN_STOCK_NAME`]
    async fn resolve(&self, code: &str) -> String;
}

/// Exchange prefix used by the quote service: Shanghai, Shenzhen or Beijing
pub fn market_prefix(code: &str) -> &'static str {
    match code.chars().next() {
        Some('6') => "sh",
        Some('0') | Some('3') => "sz",
        Some('4') | Some('8') => "bj",
        _ => "sh",
    }
}

/// Extract the name from a `var hq_str_sh600519="贵州茅台,..."` quote line
pub fn parse_quote_name(body: &str) -> Option<String> {
    let (_, data) = body.split_once("=\"")?;
    if data.is_empty() || data.starts_with('"') {
        return None;
    }
    let name = data.split(',').next()?.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Sina real-time quote lookup
#[derive(Debug, Clone)]
pub struct SinaNameResolver {
    client: reqwest::Client,
    base_url: String,
    referer: String,
}

impl SinaNameResolver {
    pub fn new(base_url: impl Into<String>, referer: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            referer: referer.into(),
        }
    }

    async fn fetch(&self, code: &str) -> Result<Option<String>, reqwest::Error> {
        let url = format!("{}{}{}", self.base_url, market_prefix(code), code);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::REFERER, &self.referer)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        Ok(parse_quote_name(&body))
    }
}

impl Default for SinaNameResolver {
    fn default() -> Self {
        Self::new(DEFAULT_SINA_URL, DEFAULT_SINA_REFERER)
    }
}

#[async_trait]
impl NameResolver for SinaNameResolver {
    async fn resolve(&self, code: &str) -> String {
        let code = code.trim();
        if code.is_empty() {
            return String::new();
        }

        match self.fetch(code).await {
            Ok(Some(name)) => name,
            Ok(None) => {
                tracing::warn!("No quote data for stock code {}", code);
                UNKNOWN_STOCK_NAME.to_string()
            }
            Err(e) => {
                tracing::warn!("Error fetching stock name for {}: {}", code, e);
                UNKNOWN_STOCK_NAME.to_string()
            }
        }
    }
}

/// Fixed lookup table, for offline use and tests
#[derive(Debug, Clone, Default)]
pub struct StaticNameResolver {
    names: HashMap<String, String>,
}

impl StaticNameResolver {
    pub fn new<I, K, V>(names: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl NameResolver for StaticNameResolver {
    async fn resolve(&self, code: &str) -> String {
        let code = code.trim();
        if code.is_empty() {
            return String::new();
        }
        self.names
            .get(code)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_STOCK_NAME.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_prefix() {
        assert_eq!(market_prefix("600519"), "sh");
        assert_eq!(market_prefix("000001"), "sz");
        assert_eq!(market_prefix("300750"), "sz");
        assert_eq!(market_prefix("830799"), "bj");
        assert_eq!(market_prefix("430047"), "bj");
        assert_eq!(market_prefix("900901"), "sh");
    }

    #[test]
    fn test_parse_quote_name() {
        let body = "var hq_str_sh600519=\"贵州茅台,1700.00,1690.00,1712.30\";\n";
        assert_eq!(parse_quote_name(body).as_deref(), Some("贵州茅台"));
        assert_eq!(parse_quote_name("var hq_str_sh999999=\"\";"), None);
        assert_eq!(parse_quote_name("garbage"), None);
    }

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticNameResolver::new([("600519", "贵州茅台")]);
        assert_eq!(resolver.resolve("600519").await, "贵州茅台");
        assert_eq!(resolver.resolve("000001").await, UNKNOWN_STOCK_NAME);
        assert_eq!(resolver.resolve("").await, "");
    }

    #[tokio::test]
    async fn test_unreachable_service_degrades_to_sentinel() {
        let resolver = SinaNameResolver::new("http://127.0.0.1:9/list=", DEFAULT_SINA_REFERER);
        assert_eq!(resolver.resolve("600519").await, UNKNOWN_STOCK_NAME);
        assert_eq!(resolver.resolve("  ").await, "");
    }
}
