use std::time::Duration;

// -----------------------------------------------
// CBOE DELAYED QUOTE ENDPOINTS
// -----------------------------------------------
pub const CBOE_BASE_URL: &str = "https://cdn.cboe.com/api/global/delayed_quotes/options";

/// Cash-settled indices are published under an underscore-prefixed name.
pub const CBOE_INDICES: &[&str] = &["SPX", "NDX", "RUT", "VIX", "XSP", "DJX", "MRUT", "XND"];

pub fn cboe_symbol(symbol: &str) -> String {
    let symbol = symbol.trim().trim_start_matches('_').to_ascii_uppercase();
    if CBOE_INDICES.contains(&symbol.as_str()) {
        format!("_{}", symbol)
    } else {
        symbol
    }
}

pub fn cboe_option_chain_url(symbol: &str) -> String {
    format!(
        "{}/{}.json",
        CBOE_BASE_URL,
        urlencoding::encode(&cboe_symbol(symbol))
    )
}

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                               AppleWebKit/537.36 (KHTML, like Gecko) \
                               Chrome/131.0.0.0 Safari/537.36";

pub const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.8",
];

// Full SPX chains are several megabytes
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const CI_HTTP_TIMEOUT: Duration = Duration::from_secs(20);

// -----------------------------------------------
// RETRY CONFIG
// -----------------------------------------------
pub const RETRY_BASE_DELAY_MS: u64 = 200;
pub const RETRY_FACTOR: u64 = 2;
pub const RETRY_MAX_DELAY_SECS: u64 = 5;
pub const RETRY_MAX_ATTEMPTS: usize = 3;

// -----------------------------------------------
// CONCURRENCY / CACHE
// -----------------------------------------------
pub const DEFAULT_MAX_CONCURRENT: usize = 4;
pub const REPORT_CACHE_SECS: u64 = 60;
pub const CI_BATCH_TIMEOUT_SECS: u64 = 300;

// -----------------------------------------------
// RUNTIME CONFIGURATION
// -----------------------------------------------
pub const DEFAULT_SYMBOL: &str = "SPX";
pub const DEFAULT_BATCH_SYMBOLS: &[&str] = &["SPX", "NDX", "RUT"];
pub const DEFAULT_PORT: u16 = 3002;
pub const DEFAULT_OUTPUT_DIR: &str = "gamma_reports";

pub fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Check if running in CI/automated environment
pub fn is_ci_environment() -> bool {
    std::env::var("CI").is_ok() || std::env::var("GITHUB_ACTIONS").is_ok()
}

pub fn get_http_timeout() -> Duration {
    if is_ci_environment() { CI_HTTP_TIMEOUT } else { HTTP_TIMEOUT }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_symbols_get_prefix() {
        assert_eq!(cboe_symbol("spx"), "_SPX");
        assert_eq!(cboe_symbol("_NDX"), "_NDX");
        assert_eq!(cboe_symbol("AAPL"), "AAPL");
        assert_eq!(
            cboe_option_chain_url("SPX"),
            "https://cdn.cboe.com/api/global/delayed_quotes/options/_SPX.json"
        );
    }

    #[test]
    fn test_parse_symbol_list() {
        assert_eq!(parse_symbol_list(" spx, ndx ,,rut"), vec!["SPX", "NDX", "RUT"]);
        assert!(parse_symbol_list(" , ").is_empty());
    }
}
