pub mod cboe_client;
pub mod cboe_commands;
pub mod config;
pub mod models;
pub mod render;

// Re-exports (public API)
pub use cboe_client::CboeClient;
pub use cboe_commands::{BatchEntry, GexCommands};
pub use models::{CboeChainData, CboeChainResponse, CboeOption};
