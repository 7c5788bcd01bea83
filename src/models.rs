use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading session of one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Bar where every price field equals `close`
    pub fn flat(date: NaiveDate, close: f64, volume: f64) -> Self {
        Self { date, open: close, high: close, low: close, close, volume }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

/// Option contract snapshot as returned by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub contract_symbol: String,
    pub strike: f64,
    pub bid: f64,
    pub ask: f64,
    pub last_price: f64,
    pub open_interest: f64,
    pub implied_volatility: f64,
    pub expiration: NaiveDate,
    pub option_type: OptionType,

    /// Never populated by the provider; only an estimator fills it
    pub delta: Option<f64>,
}

impl OptionContract {
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    pub fn mid_price(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// Calendar days from `as_of` to expiration (negative once expired)
    pub fn days_to_expiry(&self, as_of: NaiveDate) -> i64 {
        (self.expiration - as_of).num_days()
    }
}

/// Contract that passed a filter, with its ranking score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub contract: OptionContract,
    pub days_to_expiry: i64,
    pub score: f64,
}

impl Candidate {
    pub fn mid_price(&self) -> f64 {
        self.contract.mid_price()
    }
}
