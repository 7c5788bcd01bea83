use crate::config::SignalThresholds;
use crate::indicators::IndicatorRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Entry/exit flags for one bar
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub date: NaiveDate,
    pub buy_put: bool,
    pub sell_put: bool,
}

/// The signal the scanner acts on for a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    BuyPut,
    SellPut,
    None,
}

impl Signal {
    /// Buy-put wins when both flags are set; sell-put is only looked at otherwise
    pub fn governing(row: &SignalRow) -> Self {
        if row.buy_put {
            Signal::BuyPut
        } else if row.sell_put {
            Signal::SellPut
        } else {
            Signal::None
        }
    }
}

/// One signal row per indicator row; incomplete (warm-up) rows keep both flags false
pub fn generate_signals(rows: &[IndicatorRow], thresholds: &SignalThresholds) -> Vec<SignalRow> {
    rows.iter()
        .map(|row| SignalRow {
            date: row.bar.date,
            buy_put: buy_put(row, thresholds),
            sell_put: sell_put(row, thresholds),
        })
        .collect()
}

/// (overbought breakdown OR squeeze breakdown) AND high IV rank
pub fn buy_put(row: &IndicatorRow, t: &SignalThresholds) -> bool {
    if !row.is_complete() {
        return false;
    }
    (overbought_breakdown(row, t) || squeeze_breakdown(row, t)) && high_iv_rank(row, t)
}

/// Price back above EMA-fast with weak RSI, IV rank collapsed, or MACD turned positive
pub fn sell_put(row: &IndicatorRow, t: &SignalThresholds) -> bool {
    if !row.is_complete() {
        return false;
    }
    recovery_above_ema(row, t) || low_iv_rank(row, t) || macd_positive(row)
}

/// RSI above the overbought level while price sits under EMA-fast and MACD histogram is negative
pub fn overbought_breakdown(row: &IndicatorRow, t: &SignalThresholds) -> bool {
    match (row.rsi, row.ema_fast, row.macd_hist) {
        (Some(rsi), Some(ema), Some(hist)) => {
            rsi > t.rsi_overbought && row.bar.close < ema && hist < 0.0
        }
        _ => false,
    }
}

/// Band width under `squeeze_width` of price and close below the lower band
pub fn squeeze_breakdown(row: &IndicatorRow, t: &SignalThresholds) -> bool {
    let (Some(upper), Some(lower)) = (row.bb_upper, row.bb_lower) else {
        return false;
    };
    let close = row.bar.close;
    if close <= 0.0 {
        return false;
    }
    let width = (upper - lower) / close;
    width < t.squeeze_width && close < lower
}

fn high_iv_rank(row: &IndicatorRow, t: &SignalThresholds) -> bool {
    row.iv_rank.is_some_and(|ivr| ivr > t.ivr_enter)
}

fn low_iv_rank(row: &IndicatorRow, t: &SignalThresholds) -> bool {
    row.iv_rank.is_some_and(|ivr| ivr < t.ivr_exit)
}

fn recovery_above_ema(row: &IndicatorRow, t: &SignalThresholds) -> bool {
    match (row.ema_fast, row.rsi) {
        (Some(ema), Some(rsi)) => row.bar.close > ema && rsi < t.exit_rsi,
        _ => false,
    }
}

fn macd_positive(row: &IndicatorRow) -> bool {
    row.macd_hist.is_some_and(|hist| hist > 0.0)
}
