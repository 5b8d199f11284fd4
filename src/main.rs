use anyhow::Result;
use colored::Colorize;
use gex_analyzer::cboe::config;
use gex_analyzer::{init_logging, AppConfig, GexCommands};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let cfg = AppConfig::from_env()?;
    cfg.validate()?;
    cfg.log_ci_config();

    match cfg.mode.as_str() {
        "batch" => GexCommands::run_batch(&cfg).await?,
        _ if config::is_ci_environment() => {
            // Force batch mode in CI
            println!("{} GitHub Actions only supports batch mode, running batch instead", "ℹ".blue());
            GexCommands::run_batch(&cfg).await?;
        }
        "server" => GexCommands::run_server(&cfg).await?,
        "single" => GexCommands::run_single(&cfg).await?,
        _ => {
            eprintln!("Invalid mode '{}'. Use 'single', 'batch' or 'server'", cfg.mode);
            eprintln!("Set GEX_MODE environment variable to control execution mode");
            eprintln!("Examples:");
            eprintln!("  GEX_MODE=single GEX_SYMBOL=SPX cargo run         # One underlying");
            eprintln!("  GEX_MODE=batch GEX_SYMBOLS=SPX,NDX,RUT cargo run # Batch summary");
            eprintln!("  GEX_MODE=server GEX_PORT=3002 cargo run          # Start API server");
            eprintln!("  GEX_SAVE=1 GEX_OUTPUT_DIR=gamma_reports cargo run # Also write JSON reports");
            eprintln!("Note: GitHub Actions only supports 'batch' mode");
            std::process::exit(1);
        }
    }

    Ok(())
}
