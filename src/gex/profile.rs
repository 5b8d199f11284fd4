use super::calendar;
use super::chain::PairedStrikeRow;
use super::config;
use super::contract::OptionType;
use super::error::{GexError, GexResult};
use super::pricer::{signed_exposure, unit_gamma, MarketInputs};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Hypothetical spot grid, as fractions of the current spot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub lower_pct: f64,
    pub upper_pct: f64,
    pub level_count: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            lower_pct: config::DEFAULT_LOWER_PCT,
            upper_pct: config::DEFAULT_UPPER_PCT,
            level_count: config::DEFAULT_LEVEL_COUNT,
        }
    }
}

impl ProfileConfig {
    pub fn validate(&self) -> GexResult<()> {
        if self.level_count < 2 {
            return Err(GexError::InvalidProfileConfig(format!(
                "need at least 2 levels, got {}",
                self.level_count
            )));
        }
        if !(self.lower_pct.is_finite() && self.upper_pct.is_finite()) || self.lower_pct <= 0.0 {
            return Err(GexError::InvalidProfileConfig(format!(
                "range bounds must be finite and positive, got {}..{}",
                self.lower_pct, self.upper_pct
            )));
        }
        if self.lower_pct >= self.upper_pct {
            return Err(GexError::InvalidProfileConfig(format!(
                "lower bound {} must be below upper bound {}",
                self.lower_pct, self.upper_pct
            )));
        }
        Ok(())
    }

    /// Evenly spaced levels from `lower_pct · spot` to `upper_pct · spot`, endpoints included.
    pub fn levels(&self, spot: f64) -> GexResult<Vec<f64>> {
        self.validate()?;
        let from = self.lower_pct * spot;
        let to = self.upper_pct * spot;
        let step = (to - from) / (self.level_count - 1) as f64;
        Ok((0..self.level_count)
            .map(|i| if i + 1 == self.level_count { to } else { from + step * i as f64 })
            .collect())
    }
}

/// Aggregate exposure at one hypothetical spot, billions per 1% move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub level: f64,
    pub all_expiries: f64,
    pub ex_next_expiry: f64,
    pub ex_next_monthly: f64,
}

/// Expiries singled out by the ex-next curves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryMarks {
    pub next_expiry: Option<NaiveDate>,
    pub next_monthly_expiry: Option<NaiveDate>,
}

impl ExpiryMarks {
    pub fn from_rows(rows: &[PairedStrikeRow], today: NaiveDate) -> Self {
        let expiries = rows.iter().map(|r| r.expiration.date());
        Self {
            next_expiry: expiries.clone().min(),
            next_monthly_expiry: expiries
                .filter(|d| *d >= today && calendar::is_standard_monthly(*d))
                .min(),
        }
    }
}

/// Level-independent inputs of one paired row.
struct RowTerms {
    strike: f64,
    years: f64,
    call_iv: f64,
    call_oi: f64,
    put_iv: f64,
    put_oi: f64,
    in_next_expiry: bool,
    in_next_monthly: bool,
}

impl RowTerms {
    fn exposure_at(&self, level: f64, market: &MarketInputs) -> f64 {
        let (r, q) = (market.risk_free_rate, market.dividend_yield);
        let call_gamma = unit_gamma(level, self.strike, self.call_iv, self.years, r, q, OptionType::Call);
        let put_gamma = unit_gamma(level, self.strike, self.put_iv, self.years, r, q, OptionType::Put);
        signed_exposure(call_gamma, self.call_oi, level, OptionType::Call)
            + signed_exposure(put_gamma, self.put_oi, level, OptionType::Put)
    }
}

fn evaluate_level(level: f64, terms: &[RowTerms], market: &MarketInputs) -> ProfilePoint {
    let mut all = 0.0;
    let mut ex_next = 0.0;
    let mut ex_monthly = 0.0;

    for row in terms {
        let exposure = row.exposure_at(level, market);
        all += exposure;
        if !row.in_next_expiry {
            ex_next += exposure;
        }
        if !row.in_next_monthly {
            ex_monthly += exposure;
        }
    }

    ProfilePoint {
        level,
        all_expiries: all / config::BILLION,
        ex_next_expiry: ex_next / config::BILLION,
        ex_next_monthly: ex_monthly / config::BILLION,
    }
}

/// Re-price every row's gamma at each level of the grid.
///
/// Uses the quoted implied volatilities unchanged. Levels are independent
/// and evaluated in parallel; the output is ascending by level.
pub fn simulate_profile(
    rows: &[PairedStrikeRow],
    spot: f64,
    profile: &ProfileConfig,
    market: &MarketInputs,
) -> GexResult<Vec<ProfilePoint>> {
    let levels = profile.levels(spot)?;
    let marks = ExpiryMarks::from_rows(rows, market.today);

    let terms: Vec<RowTerms> = rows
        .iter()
        .map(|row| {
            let expiry = row.expiration.date();
            RowTerms {
                strike: row.strike(),
                years: market.years_to(expiry),
                call_iv: row.call.iv,
                call_oi: row.call.open_interest,
                put_iv: row.put.iv,
                put_oi: row.put.open_interest,
                in_next_expiry: marks.next_expiry == Some(expiry),
                in_next_monthly: marks.next_monthly_expiry == Some(expiry),
            }
        })
        .collect();

    let mut points: Vec<ProfilePoint> = levels
        .par_iter()
        .map(|&level| evaluate_level(level, &terms, market))
        .collect();

    // the flip scan walks adjacent levels in ascending order
    points.sort_by(|a, b| a.level.total_cmp(&b.level));
    Ok(points)
}
