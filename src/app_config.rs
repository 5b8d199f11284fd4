use crate::cboe::config;
use crate::gex::{GammaSource, GexSettings, ProfileConfig};
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration handler
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: String,
    pub port: u16,
    pub symbol: String,
    pub batch_symbols: Vec<String>,
    pub max_concurrent: usize,
    pub settings: GexSettings,
    pub save_reports: bool,
    pub output_dir: PathBuf,
}

impl AppConfig {
    /// Create new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ProfileConfig::default();
        let profile = ProfileConfig {
            lower_pct: parse_or(&lookup, "GEX_RANGE_LOW", defaults.lower_pct)?,
            upper_pct: parse_or(&lookup, "GEX_RANGE_HIGH", defaults.upper_pct)?,
            level_count: parse_or(&lookup, "GEX_LEVELS", defaults.level_count)?,
        };

        let base = GexSettings::default();
        let settings = GexSettings {
            profile,
            gamma_source: match lookup("GEX_GAMMA_SOURCE") {
                Some(raw) => GammaSource::from_str(&raw).map_err(|e| anyhow!(e))?,
                None => base.gamma_source,
            },
            risk_free_rate: parse_or(&lookup, "GEX_RISK_FREE", base.risk_free_rate)?,
            dividend_yield: parse_or(&lookup, "GEX_DIVIDEND", base.dividend_yield)?,
        };

        let symbol = lookup("GEX_SYMBOL")
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| config::DEFAULT_SYMBOL.to_string());

        let batch_symbols = lookup("GEX_SYMBOLS")
            .map(|raw| config::parse_symbol_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| config::DEFAULT_BATCH_SYMBOLS.iter().map(|s| s.to_string()).collect());

        Ok(Self {
            mode: lookup("GEX_MODE").unwrap_or_else(|| "single".to_string()),
            port: parse_or(&lookup, "GEX_PORT", config::DEFAULT_PORT)?,
            symbol,
            batch_symbols,
            max_concurrent: parse_or(&lookup, "GEX_MAX_CONCURRENT", config::DEFAULT_MAX_CONCURRENT)?
                .clamp(1, 16),
            settings,
            save_reports: lookup("GEX_SAVE").is_some_and(|v| is_truthy(&v)),
            output_dir: lookup("GEX_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(config::DEFAULT_OUTPUT_DIR)),
        })
    }

    /// Log configuration details for CI environments
    pub fn log_ci_config(&self) {
        if config::is_ci_environment() {
            println!("{}", "Running in CI environment".blue().bold());
            println!("{} Mode: {}", "→".cyan(), self.mode.yellow());

            if self.mode == "server" {
                println!("{} Server mode not supported in CI - switching to batch", "⚠".yellow());
            }
            println!();
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.settings
            .profile
            .validate()
            .context("Invalid GEX_RANGE_LOW / GEX_RANGE_HIGH / GEX_LEVELS")?;

        for (name, value) in [
            ("GEX_RISK_FREE", self.settings.risk_free_rate),
            ("GEX_DIVIDEND", self.settings.dividend_yield),
        ] {
            if !value.is_finite() {
                anyhow::bail!("{} must be a finite number, got {}", name, value);
            }
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid {}='{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.mode, "single");
        assert_eq!(cfg.symbol, "SPX");
        assert_eq!(cfg.batch_symbols, vec!["SPX", "NDX", "RUT"]);
        assert_eq!(cfg.port, 3002);
        assert_eq!(cfg.settings, GexSettings::default());
        assert!(!cfg.save_reports);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_overrides() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("GEX_MODE", "batch"),
            ("GEX_SYMBOL", "ndx"),
            ("GEX_SYMBOLS", "spx,xsp"),
            ("GEX_RANGE_LOW", "0.9"),
            ("GEX_LEVELS", "61"),
            ("GEX_GAMMA_SOURCE", "model"),
            ("GEX_RISK_FREE", "0.045"),
            ("GEX_SAVE", "yes"),
            ("GEX_OUTPUT_DIR", "out"),
        ]))
        .unwrap();

        assert_eq!(cfg.mode, "batch");
        assert_eq!(cfg.symbol, "NDX");
        assert_eq!(cfg.batch_symbols, vec!["SPX", "XSP"]);
        assert_eq!(cfg.settings.profile.lower_pct, 0.9);
        assert_eq!(cfg.settings.profile.level_count, 61);
        assert_eq!(cfg.settings.gamma_source, GammaSource::Model);
        assert_eq!(cfg.settings.risk_free_rate, 0.045);
        assert!(cfg.save_reports);
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(AppConfig::from_lookup(lookup_from(&[("GEX_LEVELS", "many")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("GEX_GAMMA_SOURCE", "vega")])).is_err());

        let inverted = AppConfig::from_lookup(lookup_from(&[("GEX_RANGE_LOW", "1.5")])).unwrap();
        assert!(inverted.validate().is_err());
    }
}
