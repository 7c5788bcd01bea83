//! Optional data sources the strategy is gated on.
//!
//! Neither an implied-volatility-rank feed nor an option-Greeks model is
//! wired in yet. Both are traits so a real source can be plugged in; the
//! shipped [`Unavailable`] implementation has no model, so with the Yahoo
//! provider (which never reports delta) the buy-put gate and the candidate
//! filters stay closed.

use crate::models::OptionContract;
use chrono::NaiveDate;

pub trait VolatilityRankSource {
    /// IV rank in percent (0..=100) for `symbol` on `date`
    fn iv_rank(&self, symbol: &str, date: NaiveDate) -> Option<f64>;
}

pub trait GreeksEstimator {
    /// Delta magnitude (0..=1) for `contract` given the underlying price
    fn delta(
        &self,
        symbol: &str,
        contract: &OptionContract,
        underlying_price: f64,
        as_of: NaiveDate,
    ) -> Option<f64>;
}

/// No model behind it: IV rank is always `None`, delta is whatever the chain carried
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl VolatilityRankSource for Unavailable {
    fn iv_rank(&self, _symbol: &str, _date: NaiveDate) -> Option<f64> {
        None
    }
}

impl GreeksEstimator for Unavailable {
    fn delta(
        &self,
        _symbol: &str,
        contract: &OptionContract,
        _underlying_price: f64,
        _as_of: NaiveDate,
    ) -> Option<f64> {
        contract.delta
    }
}
