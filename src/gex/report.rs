use super::aggregator::{aggregate_by_strike, GammaSource, StrikeExposure};
use super::chain::{decode_quotes, pair_chain, ChainSnapshot, PairedStrikeRow};
use super::config;
use super::error::{GexError, GexResult};
use super::flip::{locate_flip, FlipPoint};
use super::pricer::{is_priceable, MarketInputs};
use super::profile::{simulate_profile, ExpiryMarks, ProfileConfig, ProfilePoint};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything the pipeline needs besides the chain itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GexSettings {
    pub profile: ProfileConfig,
    pub gamma_source: GammaSource,
    pub risk_free_rate: f64,
    pub dividend_yield: f64,
}

impl Default for GexSettings {
    fn default() -> Self {
        Self {
            profile: ProfileConfig::default(),
            gamma_source: GammaSource::default(),
            risk_free_rate: config::DEFAULT_RISK_FREE_RATE,
            dividend_yield: config::DEFAULT_DIVIDEND_YIELD,
        }
    }
}

impl GexSettings {
    pub fn market(&self, today: NaiveDate) -> MarketInputs {
        MarketInputs {
            today,
            risk_free_rate: self.risk_free_rate,
            dividend_yield: self.dividend_yield,
        }
    }
}

/// Output contract handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GexReport {
    pub underlying: String,
    pub spot: f64,
    pub as_of: NaiveDate,
    pub timestamp: Option<String>,
    /// Billions of dollars per 1% move.
    pub total_gamma: f64,
    pub strikes: Vec<StrikeExposure>,
    pub profile: Vec<ProfilePoint>,
    pub flip: Option<FlipPoint>,
    pub next_expiry: Option<NaiveDate>,
    pub next_monthly_expiry: Option<NaiveDate>,
    pub paired_rows: usize,
    pub degenerate_rows: usize,
}

/// Rows where either leg has zero volatility or zero time left.
fn count_degenerate(rows: &[PairedStrikeRow], market: &MarketInputs) -> usize {
    rows.iter()
        .filter(|row| {
            let years = market.years_to(row.expiration.date());
            let strike = row.strike();
            !is_priceable(1.0, strike, row.call.iv, years) || !is_priceable(1.0, strike, row.put.iv, years)
        })
        .count()
}

/// Run decode, pairing, aggregation, profile and flip over one snapshot.
///
/// A malformed identifier or a failed put/call merge aborts the run; no
/// partial report is produced.
pub fn analyze_snapshot(
    snapshot: &ChainSnapshot,
    today: NaiveDate,
    settings: &GexSettings,
) -> GexResult<GexReport> {
    let spot = snapshot.spot;
    if !spot.is_finite() || spot <= 0.0 {
        return Err(GexError::InvalidSpot(spot));
    }
    settings.profile.validate()?;

    let records = decode_quotes(&snapshot.quotes)?;
    let rows = pair_chain(records)?;
    let market = settings.market(today);

    let degenerate_rows = count_degenerate(&rows, &market);
    if degenerate_rows > 0 {
        debug!(
            underlying = %snapshot.underlying,
            degenerate_rows,
            "rows with zero vol or zero time contribute no gamma"
        );
    }

    let summary = aggregate_by_strike(&rows, spot, settings.gamma_source, &market);
    let profile = simulate_profile(&rows, spot, &settings.profile, &market)?;
    let flip = locate_flip(&profile);
    let marks = ExpiryMarks::from_rows(&rows, today);

    info!(
        underlying = %snapshot.underlying,
        spot,
        rows = rows.len(),
        total_gamma_bn = summary.total_gamma,
        flip = flip.map(|f| f.price),
        "computed gamma exposure"
    );

    Ok(GexReport {
        underlying: snapshot.underlying.clone(),
        spot,
        as_of: today,
        timestamp: snapshot.timestamp.clone(),
        total_gamma: summary.total_gamma,
        strikes: summary.strikes,
        profile,
        flip,
        next_expiry: marks.next_expiry,
        next_monthly_expiry: marks.next_monthly_expiry,
        paired_rows: rows.len(),
        degenerate_rows,
    })
}
