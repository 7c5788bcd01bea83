use crate::config::IndicatorParams;
use crate::estimators::VolatilityRankSource;
use crate::models::PriceBar;

/// Price bar extended with derived indicator values
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub bar: PriceBar,

    pub rsi: Option<f64>,
    pub macd_hist: Option<f64>,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_pct: Option<f64>,    // None when the bands collapse
    pub iv_rank: Option<f64>,   // None unless a rank source is wired in
}

impl IndicatorRow {
    fn bare(bar: PriceBar) -> Self {
        Self {
            bar,
            rsi: None,
            macd_hist: None,
            ema_fast: None,
            ema_slow: None,
            bb_upper: None,
            bb_lower: None,
            bb_pct: None,
            iv_rank: None,
        }
    }

    /// True once every lookback-driven field is defined.
    /// `bb_pct` and `iv_rank` are optional even after warm-up.
    pub fn is_complete(&self) -> bool {
        self.rsi.is_some()
            && self.macd_hist.is_some()
            && self.ema_fast.is_some()
            && self.ema_slow.is_some()
            && self.bb_upper.is_some()
            && self.bb_lower.is_some()
    }
}

/// Compute one indicator row per bar
pub fn compute_indicators(bars: &[PriceBar], params: &IndicatorParams) -> Vec<IndicatorRow> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let rsi_values = rsi(&closes, params.rsi_length);
    let macd_values = macd_histogram(&closes, params.macd_fast, params.macd_slow, params.macd_signal);
    let ema_fast_values = ema(&closes, params.ema_fast);
    let ema_slow_values = ema(&closes, params.ema_slow);
    let bands = bollinger(&closes, params.bb_length, params.bb_std);

    let warmup = params.warmup();

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let mut row = IndicatorRow::bare(bar.clone());
            if i < warmup {
                return row;
            }

            row.rsi = rsi_values[i];
            row.macd_hist = macd_values[i];
            row.ema_fast = ema_fast_values[i];
            row.ema_slow = ema_slow_values[i];
            if let Some((upper, lower)) = bands[i] {
                row.bb_upper = Some(upper);
                row.bb_lower = Some(lower);
                row.bb_pct = bollinger_pct(bar.close, upper, lower);
            }
            row
        })
        .collect()
}

/// Fill `iv_rank` on every completed row from the given source
pub fn attach_iv_rank(rows: &mut [IndicatorRow], symbol: &str, source: &dyn VolatilityRankSource) {
    for row in rows.iter_mut().filter(|r| r.is_complete()) {
        row.iv_rank = source.iv_rank(symbol, row.bar.date);
    }
}

/// Exponential moving average, `k = 2 / (n + 1)`, seeded with the SMA of the first `n` values
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut prev = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(prev);

    // incremental form keeps a flat series exactly flat
    for (i, &v) in values.iter().enumerate().skip(period) {
        prev += k * (v - prev);
        out[i] = Some(prev);
    }
    out
}

/// EMA over a series that becomes defined part way through
fn ema_of_defined(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    let Some(start) = values.iter().position(Option::is_some) else {
        return out;
    };

    let tail: Vec<f64> = values[start..].iter().map_while(|v| *v).collect();
    for (offset, v) in ema(&tail, period).into_iter().enumerate() {
        out[start + offset] = v;
    }
    out
}

/// Wilder RSI. Flat windows (no gains, no losses) read 50.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let n = period as f64;

    let mut avg_gain = changes[..period].iter().map(|&c| c.max(0.0)).sum::<f64>() / n;
    let mut avg_loss = changes[..period].iter().map(|&c| (-c).max(0.0)).sum::<f64>() / n;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    // changes[j] is the move into closes[j + 1]
    for (j, &c) in changes.iter().enumerate().skip(period) {
        avg_gain = (avg_gain * (n - 1.0) + c.max(0.0)) / n;
        avg_loss = (avg_loss * (n - 1.0) + (-c).max(0.0)) / n;
        out[j + 1] = Some(rsi_value(avg_gain, avg_loss));
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// MACD histogram: (EMA fast - EMA slow) minus its signal EMA
pub fn macd_histogram(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<Option<f64>> {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);

    let macd_line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal_line = ema_of_defined(&macd_line, signal);

    macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect()
}

/// Bollinger (upper, lower): SMA ± mult × population standard deviation
pub fn bollinger(closes: &[f64], period: usize, mult: f64) -> Vec<Option<(f64, f64)>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return out;
    }

    for (i, window) in closes.windows(period).enumerate() {
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let std = variance.sqrt();
        out[i + period - 1] = Some((mean + mult * std, mean - mult * std));
    }
    out
}

/// %B position of `close` inside the bands; None when the bands have collapsed
pub fn bollinger_pct(close: f64, upper: f64, lower: f64) -> Option<f64> {
    let width = upper - lower;
    if width.abs() <= f64::EPSILON * close.abs().max(1.0) {
        return None;
    }
    Some((close - lower) / width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_seeded_with_sma() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let out = ema(&values, 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(2.0));
        // k = 0.5: 4 * 0.5 + 2 * 0.5
        assert_eq!(out[3], Some(3.0));
    }

    #[test]
    fn test_rsi_conventions() {
        assert_eq!(rsi_value(0.0, 0.0), 50.0);
        assert_eq!(rsi_value(1.0, 0.0), 100.0);
        assert_eq!(rsi_value(1.0, 1.0), 50.0);
    }

    #[test]
    fn test_rsi_falling_series_is_zero() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let out = rsi(&closes, 14);
        assert_eq!(out[13], None);
        assert_eq!(out[14], Some(0.0));
        assert_eq!(out[29], Some(0.0));
    }

    #[test]
    fn test_bollinger_pct_collapsed_bands() {
        assert_eq!(bollinger_pct(100.0, 100.0, 100.0), None);
        assert_eq!(bollinger_pct(105.0, 110.0, 100.0), Some(0.5));
    }

    #[test]
    fn test_bollinger_known_window() {
        // mean 3, population std sqrt(2)
        let out = bollinger(&[1.0, 2.0, 3.0, 4.0, 5.0], 5, 2.0);
        let (upper, lower) = out[4].unwrap();
        assert!((upper - (3.0 + 2.0 * 2f64.sqrt())).abs() < 1e-12);
        assert!((lower - (3.0 - 2.0 * 2f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn test_macd_defined_after_slow_plus_signal() {
        let closes: Vec<f64> = (0..60).map(|i| 50.0 + (i as f64).sin()).collect();
        let hist = macd_histogram(&closes, 12, 26, 9);
        // slow EMA defined at 25, signal needs 9 more values
        assert!(hist[32].is_none());
        assert!(hist[33].is_some());
    }
}
