use super::profile::ProfilePoint;
use serde::{Deserialize, Serialize};

/// Interpolated zero-gamma price and the levels that bracket it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlipPoint {
    pub price: f64,
    pub lower_level: f64,
    pub lower_value: f64,
    pub upper_level: f64,
    pub upper_value: f64,
}

/// First sign change of `values` sampled at ascending `levels`.
///
/// Only the first crossing is reported even when the curve turns more than
/// once. A pair touching zero counts when one side is non-zero. `None` means
/// the curve keeps one sign, or stays at zero, over the whole range.
pub fn locate_zero_crossing(levels: &[f64], values: &[f64]) -> Option<FlipPoint> {
    let n = levels.len().min(values.len());

    (1..n).find_map(|i| {
        let (l0, v0) = (levels[i - 1], values[i - 1]);
        let (l1, v1) = (levels[i], values[i]);

        // a flat zero stretch is not a sign change
        if v0 * v1 > 0.0 || v0.is_nan() || v1.is_nan() || (v0 == 0.0 && v1 == 0.0) {
            return None;
        }

        let price = l1 - (l1 - l0) * v1 / (v1 - v0);

        Some(FlipPoint {
            price,
            lower_level: l0,
            lower_value: v0,
            upper_level: l1,
            upper_value: v1,
        })
    })
}

/// Zero-gamma level of the all-expiries curve.
pub fn locate_flip(profile: &[ProfilePoint]) -> Option<FlipPoint> {
    let levels: Vec<f64> = profile.iter().map(|p| p.level).collect();
    let values: Vec<f64> = profile.iter().map(|p| p.all_expiries).collect();
    locate_zero_crossing(&levels, &values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolates_first_crossing() {
        let flip = locate_zero_crossing(&[100.0, 105.0, 110.0, 115.0], &[-2.0, -1.0, 1.0, 2.0]).unwrap();
        assert!((flip.price - 107.5).abs() < 1e-12);
        assert_eq!(flip.lower_level, 105.0);
        assert_eq!(flip.upper_level, 110.0);
    }

    #[test]
    fn test_falling_curve_crosses_too() {
        let flip = locate_zero_crossing(&[10.0, 20.0], &[3.0, -1.0]).unwrap();
        assert!((flip.price - 17.5).abs() < 1e-12);
    }

    #[test]
    fn test_only_first_crossing_used() {
        let flip = locate_zero_crossing(&[1.0, 2.0, 3.0, 4.0], &[-1.0, 1.0, -1.0, 1.0]).unwrap();
        assert!((flip.price - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_touching_zero_counts() {
        let flip = locate_zero_crossing(&[1.0, 2.0, 3.0], &[2.0, 0.0, 1.0]).unwrap();
        assert_eq!(flip.price, 2.0);
    }

    #[test]
    fn test_flat_zero_curve_has_no_flip() {
        assert!(locate_zero_crossing(&[1.0, 2.0, 3.0], &[0.0, 0.0, 0.0]).is_none());

        // zeros before the first non-zero value do not start a crossing
        let flip = locate_zero_crossing(&[1.0, 2.0, 3.0, 4.0], &[0.0, 0.0, -1.0, 1.0]).unwrap();
        assert_eq!(flip.price, 2.0);
        assert_eq!(flip.lower_level, 2.0);
    }

    #[test]
    fn test_empty_chain_profile_has_no_flip() {
        use crate::gex::pricer::MarketInputs;
        use crate::gex::profile::{simulate_profile, ProfileConfig};
        use chrono::NaiveDate;

        let market = MarketInputs::new(NaiveDate::from_ymd_opt(2025, 3, 17).unwrap());
        let profile = simulate_profile(&[], 100.0, &ProfileConfig::default(), &market).unwrap();
        assert_eq!(profile.len(), 30);
        assert!(locate_flip(&profile).is_none());
    }

    #[test]
    fn test_one_signed_curve_has_no_flip() {
        assert!(locate_zero_crossing(&[1.0, 2.0, 3.0], &[1.0, 2.0, 0.5]).is_none());
        assert!(locate_zero_crossing(&[1.0, 2.0, 3.0], &[-1.0, -2.0, -0.5]).is_none());
        assert!(locate_zero_crossing(&[1.0], &[-1.0]).is_none());
    }
}
