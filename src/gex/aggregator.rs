use super::chain::PairedStrikeRow;
use super::config;
use super::contract::OptionType;
use super::pricer::{signed_exposure, MarketInputs};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Where current-price unit gamma comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GammaSource {
    /// Gamma quoted by the feed alongside each contract.
    #[default]
    Quoted,
    /// Gamma recomputed from the quoted implied volatility.
    Model,
}

impl FromStr for GammaSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quoted" | "feed" => Ok(GammaSource::Quoted),
            "model" | "bs" => Ok(GammaSource::Model),
            other => Err(format!("unknown gamma source '{}', expected 'quoted' or 'model'", other)),
        }
    }
}

/// Exposure at one strike, in billions of dollars per 1% move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeExposure {
    pub strike: f64,
    pub call_exposure: f64,
    /// Already carries the negative dealer sign.
    pub put_exposure: f64,
    pub total_exposure: f64,
    pub call_open_interest: f64,
    pub put_open_interest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureSummary {
    /// Sum of every strike's total, billions per 1% move.
    pub total_gamma: f64,
    /// Ascending by strike.
    pub strikes: Vec<StrikeExposure>,
}

#[derive(Default)]
struct StrikeAccumulator {
    call_exposure: f64,
    put_exposure: f64,
    call_open_interest: f64,
    put_open_interest: f64,
}

fn leg_gamma(
    row: &PairedStrikeRow,
    option_type: OptionType,
    spot: f64,
    source: GammaSource,
    market: &MarketInputs,
) -> f64 {
    let leg = row.leg(option_type);
    match source {
        GammaSource::Quoted => {
            if leg.last_trade.gamma.is_finite() { leg.last_trade.gamma } else { 0.0 }
        }
        GammaSource::Model => market.gamma(spot, row.strike(), leg.iv, row.expiration.date(), option_type),
    }
}

/// Signed call and put dollar exposure of one row at `spot`.
pub fn row_exposure(
    row: &PairedStrikeRow,
    spot: f64,
    source: GammaSource,
    market: &MarketInputs,
) -> (f64, f64) {
    let call_gamma = leg_gamma(row, OptionType::Call, spot, source, market);
    let put_gamma = leg_gamma(row, OptionType::Put, spot, source, market);
    (
        signed_exposure(call_gamma, row.call.open_interest, spot, OptionType::Call),
        signed_exposure(put_gamma, row.put.open_interest, spot, OptionType::Put),
    )
}

/// Reduce paired rows to one exposure row per strike at the current spot.
pub fn aggregate_by_strike(
    rows: &[PairedStrikeRow],
    spot: f64,
    source: GammaSource,
    market: &MarketInputs,
) -> ExposureSummary {
    let mut by_strike: BTreeMap<u32, StrikeAccumulator> = BTreeMap::new();

    for row in rows {
        let (call, put) = row_exposure(row, spot, source, market);
        let acc = by_strike.entry(row.strike_millis).or_default();
        acc.call_exposure += call;
        acc.put_exposure += put;
        acc.call_open_interest += row.call.open_interest;
        acc.put_open_interest += row.put.open_interest;
    }

    let strikes: Vec<StrikeExposure> = by_strike
        .into_iter()
        .map(|(strike_millis, acc)| {
            let call_exposure = acc.call_exposure / config::BILLION;
            let put_exposure = acc.put_exposure / config::BILLION;
            StrikeExposure {
                strike: f64::from(strike_millis) / 1000.0,
                call_exposure,
                put_exposure,
                total_exposure: call_exposure + put_exposure,
                call_open_interest: acc.call_open_interest,
                put_open_interest: acc.put_open_interest,
            }
        })
        .collect();

    let total_gamma = strikes.iter().map(|s| s.total_exposure).sum();

    ExposureSummary { total_gamma, strikes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gex::chain::{LastTrade, OptionLeg};
    use chrono::NaiveDate;

    fn leg(oi: f64, gamma: f64) -> OptionLeg {
        OptionLeg {
            identifier: String::new(),
            iv: 0.2,
            open_interest: oi,
            last_trade: LastTrade { gamma, ..LastTrade::default() },
        }
    }

    fn row(root: &str, strike: u32, call_oi: f64, put_oi: f64) -> PairedStrikeRow {
        PairedStrikeRow {
            root: root.to_string(),
            expiration: NaiveDate::from_ymd_opt(2025, 3, 21).unwrap().and_hms_opt(16, 0, 0).unwrap(),
            strike_millis: strike * 1000,
            call: leg(call_oi, 0.001),
            put: leg(put_oi, 0.001),
        }
    }

    #[test]
    fn test_quoted_gamma_groups_by_strike() {
        let market = MarketInputs::new(NaiveDate::from_ymd_opt(2025, 3, 17).unwrap());
        let rows = vec![
            row("SPXW", 5600, 100.0, 50.0),
            row("SPX", 5500, 10.0, 10.0),
            row("SPX", 5600, 20.0, 10.0),
        ];

        let summary = aggregate_by_strike(&rows, 5550.0, GammaSource::Quoted, &market);
        assert_eq!(summary.strikes.len(), 2);
        assert_eq!(summary.strikes[0].strike, 5500.0);
        assert_eq!(summary.strikes[1].call_open_interest, 120.0);
        assert_eq!(summary.strikes[1].put_open_interest, 60.0);

        // equal OI and gamma on both legs nets to zero
        assert!(summary.strikes[0].total_exposure.abs() < 1e-15);

        let unit = 0.001 * 100.0 * 5550.0 * 5550.0 * 0.01 / 1e9;
        assert!((summary.strikes[1].call_exposure - 120.0 * unit).abs() < 1e-12);
        assert!((summary.strikes[1].put_exposure + 60.0 * unit).abs() < 1e-12);
        assert!((summary.total_gamma - 60.0 * unit).abs() < 1e-12);
    }

    #[test]
    fn test_gamma_source_parsing() {
        assert_eq!("model".parse::<GammaSource>().unwrap(), GammaSource::Model);
        assert_eq!(" Quoted ".parse::<GammaSource>().unwrap(), GammaSource::Quoted);
        assert!("delta".parse::<GammaSource>().is_err());
    }
}
