//! Black-Scholes European gamma and its dollar-exposure conversion.
//!
//! Gamma is identical for calls and puts. The put side is evaluated through
//! d2 and the discounted strike so that the two formulas can be checked
//! against each other.

use super::calendar;
use super::config;
use super::contract::OptionType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal};

/// Standard normal density φ(x)
fn norm_pdf(x: f64) -> f64 {
    Normal::standard().pdf(x)
}

/// Per-contract gamma.
///
/// Returns 0 for expired or zero-volatility contracts and for non-positive
/// spot or strike, so degenerate rows contribute nothing.
pub fn unit_gamma(
    spot: f64,
    strike: f64,
    vol: f64,
    years: f64,
    rate: f64,
    div: f64,
    option_type: OptionType,
) -> f64 {
    if !is_priceable(spot, strike, vol, years) {
        return 0.0;
    }

    let vol_sqrt_t = vol * years.sqrt();
    let d1 = ((spot / strike).ln() + (rate - div + 0.5 * vol * vol) * years) / vol_sqrt_t;

    match option_type {
        OptionType::Call => (-div * years).exp() * norm_pdf(d1) / (spot * vol_sqrt_t),
        OptionType::Put => {
            let d2 = d1 - vol_sqrt_t;
            strike * (-rate * years).exp() * norm_pdf(d2) / (spot * spot * vol_sqrt_t)
        }
    }
}

/// Zero time or zero volatility leaves gamma undefined; treated as 0.
pub fn is_priceable(spot: f64, strike: f64, vol: f64, years: f64) -> bool {
    years > 0.0 && vol > 0.0 && spot > 0.0 && strike > 0.0
}

/// Dollar gamma per 1% move: gamma · OI · multiplier · S² · 0.01
pub fn gamma_exposure(gamma: f64, open_interest: f64, spot: f64) -> f64 {
    gamma * open_interest * config::CONTRACT_MULTIPLIER * spot * spot * config::ONE_PERCENT_MOVE
}

/// Dollar gamma with the dealer sign applied (puts negative).
pub fn signed_exposure(gamma: f64, open_interest: f64, spot: f64, option_type: OptionType) -> f64 {
    option_type.exposure_sign() * gamma_exposure(gamma, open_interest, spot)
}

/// Relative gap between the call and put gamma formulas.
pub fn gamma_parity_gap(spot: f64, strike: f64, vol: f64, years: f64, rate: f64, div: f64) -> f64 {
    let call = unit_gamma(spot, strike, vol, years, rate, div, OptionType::Call);
    let put = unit_gamma(spot, strike, vol, years, rate, div, OptionType::Put);
    let scale = call.abs().max(put.abs());
    if scale == 0.0 { 0.0 } else { (call - put).abs() / scale }
}

/// Evaluation date and rate assumptions shared by every contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketInputs {
    pub today: NaiveDate,
    pub risk_free_rate: f64,
    pub dividend_yield: f64,
}

impl MarketInputs {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            risk_free_rate: config::DEFAULT_RISK_FREE_RATE,
            dividend_yield: config::DEFAULT_DIVIDEND_YIELD,
        }
    }

    pub fn years_to(&self, expiry: NaiveDate) -> f64 {
        calendar::years_to_expiry(self.today, expiry)
    }

    /// Unit gamma of a contract expiring on `expiry`, using the business-day clock.
    pub fn gamma(&self, spot: f64, strike: f64, vol: f64, expiry: NaiveDate, option_type: OptionType) -> f64 {
        unit_gamma(
            spot,
            strike,
            vol,
            self.years_to(expiry),
            self.risk_free_rate,
            self.dividend_yield,
            option_type,
        )
    }
}
