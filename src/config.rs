use crate::error::ScanError;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// -----------------------------------------------
// YAHOO FINANCE ENDPOINTS
// -----------------------------------------------
pub const YAHOO_CHART_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const YAHOO_OPTIONS_BASE_URL: &str = "https://query2.finance.yahoo.com";
pub const YAHOO_COOKIE_URL: &str = "https://fc.yahoo.com";
pub const YAHOO_CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";

pub fn yahoo_chart_url(symbol: &str, period: &str, interval: &str) -> String {
    format!(
        "{}/v8/finance/chart/{}?range={}&interval={}&events=div%2Csplits",
        YAHOO_CHART_BASE_URL,
        urlencoding::encode(symbol),
        urlencoding::encode(period),
        urlencoding::encode(interval)
    )
}

pub fn yahoo_options_url(symbol: &str, expiration: Option<i64>, crumb: &str) -> String {
    let mut url = format!(
        "{}/v7/finance/options/{}?crumb={}",
        YAHOO_OPTIONS_BASE_URL,
        urlencoding::encode(symbol),
        urlencoding::encode(crumb)
    );
    if let Some(epoch) = expiration {
        url.push_str(&format!("&date={}", epoch));
    }
    url
}

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                               AppleWebKit/537.36 (KHTML, like Gecko) \
                               Chrome/131.0.0.0 Safari/537.36";

pub const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.8",
    "en-CA,en;q=0.9",
];

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

// -----------------------------------------------
// SCAN DEFAULTS
// -----------------------------------------------
pub const DEFAULT_SYMBOLS: &[&str] = &["PLTR", "NVDA"];
pub const DEFAULT_PERIOD: &str = "1y";
pub const DEFAULT_INTERVAL: &str = "1d";
/// Bars are keyed by calendar date, so only daily or coarser intervals work
pub const SUPPORTED_INTERVALS: &[&str] = &["1d", "5d", "1wk", "1mo", "3mo"];
pub const DEFAULT_TOP_N: usize = 3;
pub const DEFAULT_HARVEST_SHARES: u32 = 900;

/// Lookback lengths for the indicator engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub rsi_length: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub bb_length: usize,
    pub bb_std: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_length: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            ema_fast: 50,
            ema_slow: 200,
            bb_length: 20,
            bb_std: 2.0,
        }
    }
}

impl IndicatorParams {
    /// Number of leading bars whose derived fields stay undefined
    pub fn warmup(&self) -> usize {
        [
            self.rsi_length,
            self.macd_fast,
            self.macd_slow,
            self.macd_signal,
            self.ema_fast,
            self.ema_slow,
            self.bb_length,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Thresholds for buy-put / sell-put rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalThresholds {
    pub rsi_overbought: f64,
    pub exit_rsi: f64,
    pub squeeze_width: f64,
    pub ivr_enter: f64,
    pub ivr_exit: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            rsi_overbought: 70.0,
            exit_rsi: 50.0,
            squeeze_width: 0.05,
            ivr_enter: 50.0,
            ivr_exit: 30.0,
        }
    }
}

/// Liquidity, greek and expiry constraints for candidate contracts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub min_open_interest: f64,
    pub max_bid_ask_spread: f64,
    pub put_delta_target: f64,
    pub put_delta_range: f64,
    pub put_min_dte: i64,
    pub put_max_dte: i64,
    pub strike_otm_percent: f64,
    pub call_min_dte: i64,
    pub call_max_delta: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            min_open_interest: 500.0,
            max_bid_ask_spread: 0.50,
            put_delta_target: 0.30,
            put_delta_range: 0.05,
            put_min_dte: 7,
            put_max_dte: 30,
            strike_otm_percent: 0.10,
            call_min_dte: 45,
            call_max_delta: 0.10,
        }
    }
}

/// Account parameters used for the position-size hint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskParams {
    pub account_capital: f64,
    pub max_risk_per_trade: f64,
    pub contract_multiplier: f64,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            account_capital: 100_000.0,
            max_risk_per_trade: 0.02,
            contract_multiplier: 100.0,
        }
    }
}

/// Immutable configuration for one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub symbols: Vec<String>,
    pub period: String,
    pub interval: String,
    pub indicators: IndicatorParams,
    pub signals: SignalThresholds,
    pub filters: FilterParams,
    pub risk: RiskParams,

    /// Placeholder share count until a portfolio source exists
    pub harvest_share_estimate: u32,
    pub harvest_min_shares: u32,
    pub top_n: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            period: DEFAULT_PERIOD.to_string(),
            interval: DEFAULT_INTERVAL.to_string(),
            indicators: IndicatorParams::default(),
            signals: SignalThresholds::default(),
            filters: FilterParams::default(),
            risk: RiskParams::default(),
            harvest_share_estimate: DEFAULT_HARVEST_SHARES,
            harvest_min_shares: DEFAULT_HARVEST_SHARES,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl ScanConfig {
    /// Defaults overridden by SCAN_SYMBOLS, SCAN_PERIOD, SCAN_INTERVAL, SCAN_TOP_N
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(val) = std::env::var("SCAN_SYMBOLS") {
            let symbols = parse_symbols(&val);
            if !symbols.is_empty() {
                cfg.symbols = symbols;
            }
        }
        if let Ok(val) = std::env::var("SCAN_PERIOD") {
            cfg.period = val;
        }
        if let Ok(val) = std::env::var("SCAN_INTERVAL") {
            cfg.interval = val;
        }
        if let Ok(val) = std::env::var("SCAN_TOP_N") {
            if let Ok(num) = val.parse::<usize>() {
                cfg.top_n = num;
            }
        }

        cfg
    }

    pub fn harvest_mode(&self) -> bool {
        self.harvest_share_estimate >= self.harvest_min_shares
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.symbols.is_empty() {
            return Err(ScanError::Config("no symbols configured".to_string()));
        }
        if !SUPPORTED_INTERVALS.contains(&self.interval.as_str()) {
            return Err(ScanError::Config(format!(
                "interval {} not supported (expected one of {})",
                self.interval,
                SUPPORTED_INTERVALS.join(", ")
            )));
        }
        let ind = &self.indicators;
        let lengths = [
            ("rsi_length", ind.rsi_length),
            ("macd_fast", ind.macd_fast),
            ("macd_slow", ind.macd_slow),
            ("macd_signal", ind.macd_signal),
            ("ema_fast", ind.ema_fast),
            ("ema_slow", ind.ema_slow),
            ("bb_length", ind.bb_length),
        ];
        if let Some((name, _)) = lengths.iter().find(|(_, len)| *len == 0) {
            return Err(ScanError::Config(format!("{} must be positive", name)));
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(ScanError::Config(format!(
                "macd_fast ({}) must be below macd_slow ({})",
                ind.macd_fast, ind.macd_slow
            )));
        }
        if ind.bb_std <= 0.0 {
            return Err(ScanError::Config("bb_std must be positive".to_string()));
        }
        if self.top_n == 0 {
            return Err(ScanError::Config("top_n must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

// -----------------------------------------------
// RUNTIME OPTIONS
// -----------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Per-invocation options that are not strategy parameters
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub as_of: NaiveDate,
    pub format: ReportFormat,
}

impl RuntimeOptions {
    /// SCAN_AS_OF (YYYY-MM-DD, default today) and SCAN_FORMAT (text|json)
    pub fn from_env() -> Result<Self, ScanError> {
        let as_of = match std::env::var("SCAN_AS_OF") {
            Ok(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|e| ScanError::Config(format!("SCAN_AS_OF '{}': {}", raw, e)))?,
            Err(_) => Local::now().date_naive(),
        };

        let format = match std::env::var("SCAN_FORMAT") {
            Ok(raw) => parse_format(&raw)?,
            Err(_) => ReportFormat::Text,
        };

        Ok(Self { as_of, format })
    }
}

fn parse_format(raw: &str) -> Result<ReportFormat, ScanError> {
    match raw.trim().to_lowercase().as_str() {
        "text" => Ok(ReportFormat::Text),
        "json" => Ok(ReportFormat::Json),
        other => Err(ScanError::Config(format!(
            "unknown SCAN_FORMAT '{}', use 'text' or 'json'",
            other
        ))),
    }
}
