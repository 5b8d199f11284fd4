use super::contract::{decode_identifier, ContractId, OptionType};
use super::error::{GexError, GexResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Feed fields carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LastTrade {
    pub last_price: f64,
    pub change: f64,
    pub bid: f64,
    pub ask: f64,
    pub volume: f64,
    pub delta: f64,
    /// Per-contract gamma as quoted by the feed.
    pub gamma: f64,
}

/// One raw option as handed over by a snapshot source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub identifier: String,
    pub iv: f64,
    pub open_interest: f64,
    #[serde(default)]
    pub last_trade: LastTrade,
}

/// Full option chain for one underlying at one fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub underlying: String,
    pub spot: f64,
    pub timestamp: Option<String>,
    pub quotes: Vec<OptionQuote>,
}

/// A decoded call or put.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionRecord {
    pub identifier: String,
    pub contract: ContractId,
    pub iv: f64,
    pub open_interest: f64,
    pub last_trade: LastTrade,
}

impl OptionRecord {
    pub fn decode(quote: &OptionQuote) -> GexResult<Self> {
        let contract = decode_identifier(&quote.identifier)?;
        Ok(Self {
            identifier: quote.identifier.trim().to_string(),
            contract,
            iv: non_negative(quote.iv),
            open_interest: non_negative(quote.open_interest),
            last_trade: quote.last_trade.clone(),
        })
    }

    fn key(&self) -> PairKey {
        PairKey {
            root: self.contract.root.clone(),
            expiry: self.contract.expiry,
            strike_millis: self.contract.strike_millis,
        }
    }
}

/// Feeds occasionally send NaN or negative placeholders.
fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

/// Decode every quote; the first malformed identifier rejects the lot.
pub fn decode_quotes(quotes: &[OptionQuote]) -> GexResult<Vec<OptionRecord>> {
    quotes.iter().map(OptionRecord::decode).collect()
}

/// One side of a paired row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub identifier: String,
    pub iv: f64,
    pub open_interest: f64,
    pub last_trade: LastTrade,
}

/// Call and put sharing root, expiry and strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedStrikeRow {
    pub root: String,
    pub expiration: NaiveDateTime,
    pub strike_millis: u32,
    pub call: OptionLeg,
    pub put: OptionLeg,
}

impl PairedStrikeRow {
    pub fn strike(&self) -> f64 {
        f64::from(self.strike_millis) / 1000.0
    }

    pub fn leg(&self, option_type: OptionType) -> &OptionLeg {
        match option_type {
            OptionType::Call => &self.call,
            OptionType::Put => &self.put,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PairKey {
    root: String,
    expiry: chrono::NaiveDate,
    strike_millis: u32,
}

impl PairKey {
    fn describe(&self) -> String {
        format!(
            "{} {} {}",
            self.root,
            self.expiry.format("%Y-%m-%d"),
            f64::from(self.strike_millis) / 1000.0
        )
    }
}

impl From<OptionRecord> for OptionLeg {
    fn from(record: OptionRecord) -> Self {
        OptionLeg {
            identifier: record.identifier,
            iv: record.iv,
            open_interest: record.open_interest,
            last_trade: record.last_trade,
        }
    }
}

/// Join calls with their puts by position, preserving feed order.
///
/// The merge is all-or-nothing: unequal side counts, a repeated contract or
/// a call whose put at the same position has a different key rejects the
/// whole snapshot.
pub fn pair_chain(records: Vec<OptionRecord>) -> GexResult<Vec<PairedStrikeRow>> {
    let (calls, puts): (Vec<OptionRecord>, Vec<OptionRecord>) = records
        .into_iter()
        .partition(|r| r.contract.option_type == OptionType::Call);

    if calls.len() != puts.len() {
        return Err(GexError::PairingCountMismatch {
            calls: calls.len(),
            puts: puts.len(),
        });
    }

    let mut seen_calls: HashSet<PairKey> = HashSet::with_capacity(calls.len());
    let mut seen_puts: HashSet<PairKey> = HashSet::with_capacity(puts.len());
    let mut rows = Vec::with_capacity(calls.len());

    for (call, put) in calls.into_iter().zip(puts) {
        let key = call.key();
        let put_key = put.key();

        if !seen_calls.insert(key.clone()) {
            return Err(GexError::DuplicateContract { side: OptionType::Call, key: key.describe() });
        }
        if !seen_puts.insert(put_key.clone()) {
            return Err(GexError::DuplicateContract { side: OptionType::Put, key: put_key.describe() });
        }
        if key != put_key {
            return Err(GexError::UnmatchedContract {
                side: OptionType::Call,
                key: format!("{} (put at same position: {})", key.describe(), put_key.describe()),
            });
        }

        rows.push(PairedStrikeRow {
            root: key.root,
            expiration: call.contract.expiration(),
            strike_millis: key.strike_millis,
            call: call.into(),
            put: put.into(),
        });
    }

    debug!(rows = rows.len(), "paired option chain");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(id: &str, iv: f64, oi: f64) -> OptionQuote {
        OptionQuote {
            identifier: id.to_string(),
            iv,
            open_interest: oi,
            last_trade: LastTrade::default(),
        }
    }

    fn records(ids: &[&str]) -> Vec<OptionRecord> {
        let quotes: Vec<OptionQuote> = ids.iter().map(|id| quote(id, 0.2, 10.0)).collect();
        decode_quotes(&quotes).unwrap()
    }

    #[test]
    fn test_pairs_in_feed_order() {
        let rows = pair_chain(records(&[
            "SPX250321C05600000",
            "SPX250321C05500000",
            "SPX250321P05600000",
            "SPX250321P05500000",
        ]))
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].strike(), 5600.0);
        assert_eq!(rows[1].strike(), 5500.0);
        assert_eq!(rows[0].put.identifier, "SPX250321P05600000");
        assert_eq!(rows[0].call.identifier, "SPX250321C05600000");
    }

    #[test]
    fn test_puts_out_of_call_order_reject_snapshot() {
        let err = pair_chain(records(&[
            "SPX250321C05600000",
            "SPX250321C05500000",
            "SPX250321P05500000",
            "SPX250321P05600000",
        ]))
        .unwrap_err();
        assert!(matches!(err, GexError::UnmatchedContract { side: OptionType::Call, .. }));
        assert!(err.is_pairing_mismatch());
    }

    #[test]
    fn test_count_mismatch_rejects_snapshot() {
        let err = pair_chain(records(&["SPX250321C05600000"])).unwrap_err();
        assert_eq!(err, GexError::PairingCountMismatch { calls: 1, puts: 0 });
        assert!(err.is_pairing_mismatch());
    }

    #[test]
    fn test_misaligned_strike_rejects_snapshot() {
        let err = pair_chain(records(&["SPX250321C05600000", "SPX250321P05500000"])).unwrap_err();
        assert!(matches!(err, GexError::UnmatchedContract { side: OptionType::Call, .. }));
    }

    #[test]
    fn test_duplicate_call_rejects_snapshot() {
        let err = pair_chain(records(&[
            "SPX250321C05600000",
            "SPX250321C05600000",
            "SPX250321P05600000",
            "SPX250321P05500000",
        ]))
        .unwrap_err();
        assert!(matches!(err, GexError::DuplicateContract { side: OptionType::Call, .. }));
    }

    #[test]
    fn test_roots_pair_separately() {
        // AM and PM settled contracts share expiry and strike on monthly dates
        let rows = pair_chain(records(&[
            "SPX250321C05600000",
            "SPXW250321C05600000",
            "SPX250321P05600000",
            "SPXW250321P05600000",
        ]))
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].root, "SPX");
        assert_eq!(rows[1].root, "SPXW");
    }

    #[test]
    fn test_duplicate_put_rejects_snapshot() {
        let err = pair_chain(records(&[
            "SPX250321C05600000",
            "SPX250321C05500000",
            "SPX250321P05600000",
            "SPX250321P05600000",
        ]))
        .unwrap_err();
        assert!(matches!(err, GexError::DuplicateContract { side: OptionType::Put, .. }));
    }

    #[test]
    fn test_decode_clamps_bad_feed_values() {
        let record = OptionRecord::decode(&quote("SPX250321C05600000", f64::NAN, -3.0)).unwrap();
        assert_eq!(record.iv, 0.0);
        assert_eq!(record.open_interest, 0.0);
    }
}
