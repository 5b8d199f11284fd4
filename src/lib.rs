pub mod api_server_axum;
pub mod app_config;
pub mod cboe;
pub mod gex;
pub mod logging;
pub mod utility;

// Re-export commonly used items
pub use app_config::AppConfig;
pub use cboe::{BatchEntry, CboeClient, GexCommands};
pub use gex::{analyze_snapshot, ChainSnapshot, GexError, GexReport, GexSettings};
pub use logging::init_logging;
