use super::config;
use super::error::{GexError, GexResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// Right-aligned field widths: <root><YYMMDD><C|P><strike x1000>
const STRIKE_WIDTH: usize = 8;
const TYPE_WIDTH: usize = 1;
const DATE_WIDTH: usize = 6;
const SUFFIX_WIDTH: usize = STRIKE_WIDTH + TYPE_WIDTH + DATE_WIDTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    fn from_letter(letter: u8) -> Option<Self> {
        match letter {
            b'C' => Some(OptionType::Call),
            b'P' => Some(OptionType::Put),
            _ => None,
        }
    }

    /// Dealer sign convention: puts count against calls.
    pub fn exposure_sign(self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

/// Decoded option identifier such as `SPXW250321C05600000`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId {
    pub root: String,
    pub expiry: NaiveDate,
    pub option_type: OptionType,
    /// Strike in thousandths of a point, exactly as encoded.
    pub strike_millis: u32,
}

impl ContractId {
    pub fn strike(&self) -> f64 {
        f64::from(self.strike_millis) / 1000.0
    }

    /// Expiry date at the settlement time of day.
    pub fn expiration(&self) -> NaiveDateTime {
        self.expiry.and_time(config::settlement_time())
    }
}

/// Decode an option identifier into its root, expiry, type and strike.
pub fn decode_identifier(identifier: &str) -> GexResult<ContractId> {
    let id = identifier.trim();

    if !id.is_ascii() {
        return Err(GexError::decoding(identifier, "non-ASCII characters"));
    }
    if id.len() <= SUFFIX_WIDTH {
        return Err(GexError::decoding(
            identifier,
            format!("expected more than {} characters, got {}", SUFFIX_WIDTH, id.len()),
        ));
    }

    let root_end = id.len() - SUFFIX_WIDTH;
    let bytes = id.as_bytes();
    let root = &id[..root_end];
    let date_field = &id[root_end..root_end + DATE_WIDTH];
    let type_letter = bytes[root_end + DATE_WIDTH];
    let strike_field = &id[id.len() - STRIKE_WIDTH..];

    if !root.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(GexError::decoding(identifier, format!("invalid root '{}'", root)));
    }

    let expiry = parse_expiry(date_field)
        .ok_or_else(|| GexError::decoding(identifier, format!("invalid expiry field '{}'", date_field)))?;

    let option_type = OptionType::from_letter(type_letter).ok_or_else(|| {
        GexError::decoding(identifier, format!("unknown option type '{}'", type_letter as char))
    })?;

    if !strike_field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GexError::decoding(identifier, format!("invalid strike field '{}'", strike_field)));
    }
    let strike_millis: u32 = strike_field
        .parse()
        .map_err(|e| GexError::decoding(identifier, format!("invalid strike field: {}", e)))?;
    if strike_millis == 0 {
        return Err(GexError::decoding(identifier, "strike must be positive"));
    }

    Ok(ContractId {
        root: root.to_string(),
        expiry,
        option_type,
        strike_millis,
    })
}

fn parse_expiry(field: &str) -> Option<NaiveDate> {
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let yy: i32 = field[0..2].parse().ok()?;
    let mm: u32 = field[2..4].parse().ok()?;
    let dd: u32 = field[4..6].parse().ok()?;
    NaiveDate::from_ymd_opt(2000 + yy, mm, dd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_weekly_call() {
        let id = decode_identifier("SPXW250321C05600000").unwrap();
        assert_eq!(id.root, "SPXW");
        assert_eq!(id.expiry, NaiveDate::from_ymd_opt(2025, 3, 21).unwrap());
        assert_eq!(id.option_type, OptionType::Call);
        assert_eq!(id.strike(), 5600.0);
        assert_eq!(id.expiration().format("%H:%M").to_string(), "16:00");
    }

    #[test]
    fn test_decode_keeps_sub_dollar_strike() {
        let id = decode_identifier("XSP250117P00587500").unwrap();
        assert_eq!(id.option_type, OptionType::Put);
        assert_eq!(id.strike_millis, 587_500);
        assert_eq!(id.strike(), 587.5);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        // too short
        assert!(decode_identifier("250321C05600000").is_err());
        // bad date digits
        assert!(decode_identifier("SPX25AB21C05600000").is_err());
        // month 13
        assert!(decode_identifier("SPX251321C05600000").is_err());
        // unknown type letter
        assert!(decode_identifier("SPX250321X05600000").is_err());
        // non-numeric strike
        assert!(decode_identifier("SPX250321C056000A0").is_err());
        // zero strike
        assert!(decode_identifier("SPX250321C00000000").is_err());
    }

    #[test]
    fn test_decoding_error_names_identifier() {
        let err = decode_identifier("BAD").unwrap_err();
        match err {
            GexError::Decoding { identifier, .. } => assert_eq!(identifier, "BAD"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
