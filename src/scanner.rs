use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::estimators::{GreeksEstimator, Unavailable, VolatilityRankSource};
use crate::indicators::{attach_iv_rank, compute_indicators};
use crate::market_client::MarketDataProvider;
use crate::models::{Candidate, OptionContract};
use crate::option_filter::{filter_call_candidates, filter_put_candidates, max_contracts};
use crate::signals::{generate_signals, Signal};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Candidate as presented in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedContract {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub premium: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_contracts: Option<u64>,
}

/// What the strategy recommends for a ticker today
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    BuyPut { candidates: Vec<RankedContract> },
    ReviewOpenPuts,
    Harvest { candidates: Vec<RankedContract> },
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TickerOutcome {
    Analyzed {
        signal_date: NaiveDate,
        underlying_price: f64,
        signal: Signal,
        action: Action,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerReport {
    pub symbol: String,
    pub as_of: NaiveDate,
    #[serde(flatten)]
    pub outcome: TickerOutcome,
}

impl TickerReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, TickerOutcome::Failed { .. })
    }
}

// -----------------------------------------------
// SCANNER
// -----------------------------------------------
pub struct Scanner<P> {
    provider: P,
    config: ScanConfig,
    iv_rank: Box<dyn VolatilityRankSource>,
    greeks: Box<dyn GreeksEstimator>,
}

impl<P: MarketDataProvider> Scanner<P> {
    pub fn new(provider: P, config: ScanConfig) -> Self {
        Self {
            provider,
            config,
            iv_rank: Box::new(Unavailable),
            greeks: Box::new(Unavailable),
        }
    }

    pub fn with_iv_rank_source(mut self, source: impl VolatilityRankSource + 'static) -> Self {
        self.iv_rank = Box::new(source);
        self
    }

    pub fn with_greeks_estimator(mut self, estimator: impl GreeksEstimator + 'static) -> Self {
        self.greeks = Box::new(estimator);
        self
    }

    /// Scan every configured symbol in order. A failed symbol is reported and skipped.
    pub async fn run(&self, as_of: NaiveDate) -> Vec<TickerReport> {
        let mut reports = Vec::with_capacity(self.config.symbols.len());

        for symbol in &self.config.symbols {
            let outcome = match self.scan_symbol(symbol, as_of).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(symbol = symbol.as_str(), error = %e, "Skipping symbol");
                    TickerOutcome::Failed { error: e.to_string() }
                }
            };

            reports.push(TickerReport {
                symbol: symbol.clone(),
                as_of,
                outcome,
            });
        }

        reports
    }

    /// Bars → indicators → signals → option chain → recommendation for one symbol
    pub async fn scan_symbol(&self, symbol: &str, as_of: NaiveDate) -> Result<TickerOutcome, ScanError> {
        let cfg = &self.config;
        info!(symbol, "Fetching price history");

        let bars = self
            .provider
            .fetch_bars(symbol, &cfg.period, &cfg.interval)
            .await?;
        if bars.is_empty() {
            return Err(ScanError::unavailable(symbol, "empty price history"));
        }

        let mut rows = compute_indicators(&bars, &cfg.indicators);
        attach_iv_rank(&mut rows, symbol, &*self.iv_rank);

        let signals = generate_signals(&rows, &cfg.signals);
        let (Some(latest), Some(today)) = (signals.last(), rows.last()) else {
            return Err(ScanError::unavailable(symbol, "empty price history"));
        };
        let signal = Signal::governing(latest);
        let underlying_price = today.bar.close;
        debug!(
            symbol,
            bars = bars.len(),
            buy_put = latest.buy_put,
            sell_put = latest.sell_put,
            "Signals computed"
        );

        info!(symbol, "Fetching option chain");
        let mut chain = self.provider.fetch_option_chain(symbol, Some(as_of)).await?;
        if chain.is_empty() {
            return Err(ScanError::unavailable(symbol, "empty option chain"));
        }
        self.estimate_deltas(symbol, &mut chain, underlying_price, as_of);

        let action = match signal {
            Signal::BuyPut => {
                let puts = filter_put_candidates(&chain, underlying_price, as_of, &cfg.filters);
                Action::BuyPut { candidates: self.top(puts, true) }
            }
            Signal::SellPut => Action::ReviewOpenPuts,
            Signal::None if cfg.harvest_mode() => {
                let calls = filter_call_candidates(&chain, underlying_price, as_of, &cfg.filters);
                Action::Harvest { candidates: self.top(calls, false) }
            }
            Signal::None => Action::Hold,
        };

        Ok(TickerOutcome::Analyzed {
            signal_date: latest.date,
            underlying_price,
            signal,
            action,
        })
    }

    fn estimate_deltas(&self, symbol: &str, chain: &mut [OptionContract], underlying_price: f64, as_of: NaiveDate) {
        for contract in chain.iter_mut() {
            contract.delta = self.greeks.delta(symbol, contract, underlying_price, as_of);
        }
    }

    fn top(&self, candidates: Vec<Candidate>, with_sizing: bool) -> Vec<RankedContract> {
        candidates
            .into_iter()
            .take(self.config.top_n)
            .map(|candidate| {
                let premium = candidate.mid_price();
                let max_contracts = if with_sizing {
                    max_contracts(premium, &self.config.risk)
                } else {
                    None
                };
                RankedContract { candidate, premium, max_contracts }
            })
            .collect()
    }
}
