use super::config;
use super::render;
use super::CboeClient;
use crate::api_server_axum;
use crate::app_config::AppConfig;
use crate::gex::{analyze_snapshot, ChainSnapshot, GexReport, GexSettings};
use crate::utility::{timed, AggregateTimer, Timer};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// One line of a batch run, as printed and as served by `/api/gex/batch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub symbol: String,
    pub success: bool,
    pub spot: Option<f64>,
    pub total_gamma: Option<f64>,
    pub flip: Option<f64>,
    pub next_expiry: Option<NaiveDate>,
    pub error: Option<String>,
}

impl BatchEntry {
    pub fn from_report(report: &GexReport) -> Self {
        Self {
            symbol: report.underlying.clone(),
            success: true,
            spot: Some(report.spot),
            total_gamma: Some(report.total_gamma),
            flip: report.flip.map(|f| f.price),
            next_expiry: report.next_expiry,
            error: None,
        }
    }

    pub fn failed(symbol: &str, error: impl std::fmt::Display) -> Self {
        Self {
            symbol: symbol.to_string(),
            success: false,
            spot: None,
            total_gamma: None,
            flip: None,
            next_expiry: None,
            error: Some(error.to_string()),
        }
    }
}

/// Run the pipeline over every fetched snapshot. A failed fetch or analysis
/// only fails its own symbol.
pub fn analyze_fetched(
    symbols: &[String],
    fetched: Vec<Result<(String, ChainSnapshot)>>,
    today: NaiveDate,
    settings: &GexSettings,
    timings: &mut AggregateTimer,
) -> Vec<(BatchEntry, Option<GexReport>)> {
    symbols
        .iter()
        .zip(fetched)
        .map(|(symbol, result)| {
            let snapshot = match result {
                Ok((_, snapshot)) => snapshot,
                Err(e) => return (BatchEntry::failed(symbol, format!("{:#}", e)), None),
            };

            let started = Instant::now();
            let analyzed = analyze_snapshot(&snapshot, today, settings);
            timings.record(started.elapsed());

            match analyzed {
                Ok(report) => (BatchEntry::from_report(&report), Some(report)),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "analysis failed");
                    (BatchEntry::failed(symbol, e), None)
                }
            }
        })
        .collect()
}

pub fn report_path(output_dir: &Path, symbol: &str) -> PathBuf {
    output_dir.join(format!("{}_gex.json", symbol.trim_start_matches('_').to_ascii_uppercase()))
}

pub fn save_report(report: &GexReport, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let path = report_path(output_dir, &report.underlying);
    std::fs::write(&path, serde_json::to_string_pretty(report)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// GEX Command Handler - encapsulates the console workflows
pub struct GexCommands;

impl GexCommands {
    /// Fetch, analyze and print one underlying
    pub async fn run_single(cfg: &AppConfig) -> Result<()> {
        render::header("GEX Single Underlying");

        let client = CboeClient::new()?;
        let symbol = cfg.symbol.as_str();

        println!("{} Fetching option chain for {}...", "→".cyan(), symbol.yellow());
        println!("{} Gamma source: {:?}", "→".cyan(), cfg.settings.gamma_source);
        println!();

        let fetch_timer = Timer::start(format!("fetch {}", symbol));
        let snapshot = client.fetch_snapshot(symbol).await?;
        fetch_timer.stop();

        println!("{} Received {} contracts", "✓".green(), snapshot.quotes.len());

        let today = Local::now().date_naive();
        let report = timed(format!("analyze {}", symbol), || {
            analyze_snapshot(&snapshot, today, &cfg.settings)
        })
        .with_context(|| format!("Gamma analysis failed for {}", symbol))?;

        render::display_report(&report, cfg.settings.profile.lower_pct, cfg.settings.profile.upper_pct);

        if cfg.save_reports {
            let path = save_report(&report, &cfg.output_dir)?;
            println!("{} Saved report to {}", "✓".green(), path.display());
        }
        render::rule();

        Ok(())
    }

    /// Fetch all configured underlyings concurrently and print a summary
    pub async fn run_batch(cfg: &AppConfig) -> Result<()> {
        render::header("GEX Batch Processor");

        let client = Arc::new(CboeClient::new()?);
        let symbols = cfg.batch_symbols.clone();

        println!("{} Symbols: {}", "ℹ".blue(), symbols.join(", ").yellow());
        println!("{} Max concurrent requests: {}", "ℹ".blue(), cfg.max_concurrent);
        println!();

        let start_time = Instant::now();
        let fetch = Arc::clone(&client).fetch_all_snapshots(symbols.clone(), cfg.max_concurrent);

        let fetched = if config::is_ci_environment() {
            println!("{} CI timeout enabled: {} seconds", "⏱".yellow(), config::CI_BATCH_TIMEOUT_SECS);
            match tokio::time::timeout(Duration::from_secs(config::CI_BATCH_TIMEOUT_SECS), fetch).await {
                Ok(results) => results,
                Err(_) => {
                    println!(
                        "{} Timeout reached after {} seconds - stopping analysis",
                        "⚠".red(),
                        config::CI_BATCH_TIMEOUT_SECS
                    );
                    symbols.iter().map(|_| Err(anyhow::anyhow!("Timeout"))).collect()
                }
            }
        } else {
            fetch.await
        };
        let fetch_elapsed = start_time.elapsed();

        let mut timings = AggregateTimer::new("batch analysis");
        let today = Local::now().date_naive();
        let outcomes = analyze_fetched(&symbols, fetched, today, &cfg.settings, &mut timings);

        for (entry, _) in &outcomes {
            print!("{}", if entry.success { ".".green() } else { "✗".red() });
        }
        println!("\n");

        let entries: Vec<BatchEntry> = outcomes.iter().map(|(entry, _)| entry.clone()).collect();
        Self::display_batch_summary(&entries, fetch_elapsed);
        timings.summary();

        for (_, report) in &outcomes {
            let Some(report) = report else { continue };
            render::display_report(report, cfg.settings.profile.lower_pct, cfg.settings.profile.upper_pct);
            if cfg.save_reports {
                let path = save_report(report, &cfg.output_dir)?;
                println!("{} Saved report to {}", "✓".green(), path.display());
            }
        }

        println!();
        render::rule();
        println!("{}", "Done!".green().bold());
        render::rule();

        Ok(())
    }

    /// Run API server mode
    pub async fn run_server(cfg: &AppConfig) -> Result<()> {
        render::header("GEX API Server");
        api_server_axum::start_server(cfg).await
    }

    fn display_batch_summary(entries: &[BatchEntry], elapsed: Duration) {
        let failed: Vec<&BatchEntry> = entries.iter().filter(|e| !e.success).collect();

        render::rule();
        println!("{}", "Summary".cyan().bold());
        render::rule();
        println!("{} Successful: {}", "✓".green(), entries.len() - failed.len());
        println!("{} Failed: {}", "✗".red(), failed.len());
        println!("{} Fetch time: {:.2}s", "⏱".yellow(), elapsed.as_secs_f64());
        println!();

        println!("{:<8} {:>12} {:>12} {:>12} {:>12}", "Symbol", "Spot", "Gamma (Bn)", "Flip", "Next Exp");
        for entry in entries.iter().filter(|e| e.success) {
            println!(
                "{:<8} {:>12.2} {:>+12.3} {:>12} {:>12}",
                entry.symbol.yellow(),
                entry.spot.unwrap_or_default(),
                entry.total_gamma.unwrap_or_default(),
                entry.flip.map_or("none".to_string(), |f| format!("{:.2}", f)),
                entry.next_expiry.map_or("-".to_string(), |d| d.to_string()),
            );
        }
        println!();

        if !failed.is_empty() {
            println!("{}", "Failed Symbols:".red());
            for entry in &failed {
                let error = entry.error.as_deref().unwrap_or_default();
                println!("  {} {} → {}", "✗".red(), entry.symbol.yellow(), error.chars().take(80).collect::<String>());
            }
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gex::{GammaSource, LastTrade, OptionQuote};

    fn quote(identifier: &str, iv: f64, open_interest: f64) -> OptionQuote {
        OptionQuote {
            identifier: identifier.to_string(),
            iv,
            open_interest,
            last_trade: LastTrade::default(),
        }
    }

    fn snapshot(symbol: &str) -> ChainSnapshot {
        ChainSnapshot {
            underlying: symbol.to_string(),
            spot: 100.0,
            timestamp: None,
            quotes: vec![
                quote("SPX250321C00100000", 0.2, 10.0),
                quote("SPX250321P00100000", 0.25, 5.0),
            ],
        }
    }

    #[test]
    fn test_failed_symbol_does_not_stop_batch() {
        let symbols = vec!["SPX".to_string(), "NDX".to_string(), "RUT".to_string()];
        let broken = ChainSnapshot {
            quotes: vec![quote("RUT250321C00100000", 0.2, 1.0)],
            ..snapshot("RUT")
        };
        let fetched = vec![
            Ok(("SPX".to_string(), snapshot("SPX"))),
            Err(anyhow::anyhow!("Client error 404")),
            Ok(("RUT".to_string(), broken)),
        ];
        let settings = GexSettings {
            gamma_source: GammaSource::Model,
            ..GexSettings::default()
        };
        let today = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let mut timings = AggregateTimer::new("test");

        let outcomes = analyze_fetched(&symbols, fetched, today, &settings, &mut timings);

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].0.success);
        assert!(outcomes[0].1.is_some());
        assert!(outcomes[0].0.total_gamma.unwrap() > 0.0);

        assert!(!outcomes[1].0.success);
        assert_eq!(outcomes[1].0.symbol, "NDX");
        assert!(outcomes[1].0.error.as_deref().unwrap().contains("404"));

        assert!(!outcomes[2].0.success);
        assert!(outcomes[2].1.is_none());
        assert_eq!(timings.count(), 2);
    }

    #[test]
    fn test_report_path() {
        assert_eq!(
            report_path(Path::new("gamma_reports"), "_spx"),
            PathBuf::from("gamma_reports/SPX_gex.json")
        );
    }
}
