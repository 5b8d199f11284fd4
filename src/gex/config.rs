use chrono::NaiveTime;

// -----------------------------------------------
// CONTRACT CONVENTIONS
// -----------------------------------------------
pub const CONTRACT_MULTIPLIER: f64 = 100.0;
pub const SETTLEMENT_HOUR: u32 = 16;

/// Expiry dates are normalized to 16:00 local exchange time.
pub fn settlement_time() -> NaiveTime {
    NaiveTime::from_hms_opt(SETTLEMENT_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

// -----------------------------------------------
// EXPOSURE UNITS
// -----------------------------------------------
/// Dollar gamma is quoted per 1% move of the underlying.
pub const ONE_PERCENT_MOVE: f64 = 0.01;
pub const BILLION: f64 = 1e9;

// -----------------------------------------------
// TIME TO EXPIRY
// -----------------------------------------------
pub const BUSINESS_DAYS_PER_YEAR: f64 = 262.0;

// Standard monthly expiry window (Friday, day of month)
pub const MONTHLY_FIRST_DAY: u32 = 15;
pub const MONTHLY_LAST_DAY: u32 = 21;

// -----------------------------------------------
// PROFILE DEFAULTS
// -----------------------------------------------
pub const DEFAULT_LOWER_PCT: f64 = 0.8;
pub const DEFAULT_UPPER_PCT: f64 = 1.2;
pub const DEFAULT_LEVEL_COUNT: usize = 30;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.0;
pub const DEFAULT_DIVIDEND_YIELD: f64 = 0.0;
