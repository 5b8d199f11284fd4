use gex_analyzer::cboe::CboeChainResponse;
use gex_analyzer::gex::{analyze_snapshot, GexSettings};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "timestamp": "2025-03-03 16:15:02",
        "data": {
            "symbol": "_SPX",
            "current_price": 5849.72,
            "close": 5849.72,
            "options": [
                {
                    "option": "SPXW250321C05850000",
                    "iv": 0.1534,
                    "open_interest": 1520.0,
                    "last_trade_price": 81.3,
                    "bid": 80.9,
                    "ask": 81.7,
                    "volume": 4512.0,
                    "delta": 0.5123,
                    "gamma": 0.0021
                },
                {
                    "option": "SPXW250321P05850000",
                    "iv": 0.1611,
                    "open_interest": 2210.0,
                    "delta": -0.4877,
                    "gamma": 0.0020
                }
            ]
        }
    }"#;

    #[test]
    fn test_sample_chain_converts_to_snapshot() {
        let response: CboeChainResponse = serde_json::from_str(SAMPLE).unwrap();
        let snapshot = response.into_snapshot("SPX");

        assert_eq!(snapshot.underlying, "SPX");
        assert_eq!(snapshot.spot, 5849.72);
        assert_eq!(snapshot.timestamp.as_deref(), Some("2025-03-03 16:15:02"));
        assert_eq!(snapshot.quotes.len(), 2);

        let call = &snapshot.quotes[0];
        assert_eq!(call.identifier, "SPXW250321C05850000");
        assert_eq!(call.open_interest, 1520.0);
        assert_eq!(call.last_trade.gamma, 0.0021);

        // missing numeric fields default to zero
        let put = &snapshot.quotes[1];
        assert_eq!(put.last_trade.last_price, 0.0);
        assert_eq!(put.last_trade.volume, 0.0);
        assert_eq!(put.last_trade.change, 0.0);
    }

    #[test]
    fn test_sample_chain_runs_through_pipeline() {
        let response: CboeChainResponse = serde_json::from_str(SAMPLE).unwrap();
        let snapshot = response.into_snapshot("SPX");
        let today = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();

        let report = analyze_snapshot(&snapshot, today, &GexSettings::default()).unwrap();

        assert_eq!(report.underlying, "SPX");
        assert_eq!(report.paired_rows, 1);
        assert_eq!(report.strikes.len(), 1);
        assert_eq!(report.strikes[0].strike, 5850.0);
        assert_eq!(report.next_expiry, NaiveDate::from_ymd_opt(2025, 3, 21));
        assert_eq!(report.next_monthly_expiry, NaiveDate::from_ymd_opt(2025, 3, 21));
        // the larger put open interest outweighs the call side
        assert!(report.total_gamma < 0.0);
    }

    #[test]
    fn test_null_fields_tolerated() {
        let json = r#"{"data": {"close": 100.0, "options": [{"option": "XSP250321C00100000", "iv": null}]}}"#;
        let response: CboeChainResponse = serde_json::from_str(json).unwrap();
        let snapshot = response.into_snapshot("XSP");

        assert_eq!(snapshot.underlying, "XSP");
        assert!(snapshot.timestamp.is_none());
        assert_eq!(snapshot.quotes[0].iv, 0.0);
    }
}
