pub mod aggregator;
pub mod calendar;
pub mod chain;
pub mod config;
pub mod contract;
pub mod error;
pub mod flip;
pub mod pricer;
pub mod profile;
pub mod report;

// Re-exports (public API)
pub use aggregator::{aggregate_by_strike, row_exposure, ExposureSummary, GammaSource, StrikeExposure};
pub use calendar::{business_days_between, is_standard_monthly, years_to_expiry};
pub use chain::{
    decode_quotes, pair_chain, ChainSnapshot, LastTrade, OptionLeg, OptionQuote, OptionRecord,
    PairedStrikeRow,
};
pub use contract::{decode_identifier, ContractId, OptionType};
pub use error::{GexError, GexResult};
pub use flip::{locate_flip, locate_zero_crossing, FlipPoint};
pub use pricer::{gamma_exposure, gamma_parity_gap, signed_exposure, unit_gamma, MarketInputs};
pub use profile::{simulate_profile, ExpiryMarks, ProfileConfig, ProfilePoint};
pub use report::{analyze_snapshot, GexReport, GexSettings};
