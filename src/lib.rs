pub mod config;
pub mod error;
pub mod estimators;
pub mod indicators;
pub mod logging;
pub mod market_client;
pub mod models;
pub mod option_filter;
pub mod report;
pub mod scanner;
pub mod signals;

// Re-exports for convenience
pub use config::{FilterParams, IndicatorParams, ReportFormat, RiskParams, RuntimeOptions, ScanConfig, SignalThresholds};
pub use error::ScanError;
pub use estimators::{GreeksEstimator, Unavailable, VolatilityRankSource};
pub use indicators::{attach_iv_rank, compute_indicators, IndicatorRow};
pub use market_client::{MarketDataProvider, YahooClient};
pub use models::{Candidate, OptionContract, OptionType, PriceBar};
pub use option_filter::{filter_call_candidates, filter_put_candidates, max_contracts};
pub use scanner::{Action, RankedContract, Scanner, TickerOutcome, TickerReport};
pub use signals::{generate_signals, Signal, SignalRow};
