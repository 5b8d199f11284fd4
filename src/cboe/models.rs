use crate::gex::{ChainSnapshot, LastTrade, OptionQuote};
use serde::{Deserialize, Serialize};

/// Top-level response of the CBOE delayed quotes options endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CboeChainResponse {
    #[serde(default)]
    pub timestamp: Option<String>,
    pub data: CboeChainData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CboeChainData {
    #[serde(default)]
    pub symbol: Option<String>,

    /// Last close of the underlying, used as spot
    pub close: f64,

    #[serde(default)]
    pub options: Vec<CboeOption>,
}

/// One option contract as quoted by CBOE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CboeOption {
    /// Compact identifier, e.g. `SPXW250321C05600000`
    pub option: String,

    #[serde(default)]
    pub iv: Option<f64>,

    #[serde(default)]
    pub open_interest: Option<f64>,

    #[serde(default)]
    pub last_trade_price: Option<f64>,

    #[serde(default)]
    pub change: Option<f64>,

    #[serde(default)]
    pub bid: Option<f64>,

    #[serde(default)]
    pub ask: Option<f64>,

    #[serde(default)]
    pub volume: Option<f64>,

    #[serde(default)]
    pub delta: Option<f64>,

    #[serde(default)]
    pub gamma: Option<f64>,
}

impl From<&CboeOption> for OptionQuote {
    fn from(opt: &CboeOption) -> Self {
        OptionQuote {
            identifier: opt.option.clone(),
            iv: opt.iv.unwrap_or(0.0),
            open_interest: opt.open_interest.unwrap_or(0.0),
            last_trade: LastTrade {
                last_price: opt.last_trade_price.unwrap_or(0.0),
                change: opt.change.unwrap_or(0.0),
                bid: opt.bid.unwrap_or(0.0),
                ask: opt.ask.unwrap_or(0.0),
                volume: opt.volume.unwrap_or(0.0),
                delta: opt.delta.unwrap_or(0.0),
                gamma: opt.gamma.unwrap_or(0.0),
            },
        }
    }
}

impl CboeChainResponse {
    /// Hand the chain over to the exposure pipeline.
    pub fn into_snapshot(self, symbol: &str) -> ChainSnapshot {
        let underlying = self
            .data
            .symbol
            .as_deref()
            .map(|s| s.trim_start_matches('_').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| symbol.to_string());

        ChainSnapshot {
            underlying,
            spot: self.data.close,
            timestamp: self.timestamp,
            quotes: self.data.options.iter().map(OptionQuote::from).collect(),
        }
    }
}
