use crate::config;
use crate::error::ScanError;
use crate::models::{OptionContract, OptionType, PriceBar};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use rand::{seq::SliceRandom, thread_rng};
use reqwest::{header, Client};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

/// Source of price history and option chains
#[async_trait]
pub trait MarketDataProvider {
    /// Chronological bars; bars without a close are dropped
    async fn fetch_bars(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<PriceBar>, ScanError>;

    /// Calls and puts across every expiration on or after `as_of`
    async fn fetch_option_chain(
        &self,
        symbol: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<OptionContract>, ScanError>;
}

// -----------------------------------------------
// YAHOO RESPONSE SHAPES
// -----------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: OptionsEnvelope,
}

#[derive(Debug, Deserialize)]
struct OptionsEnvelope {
    result: Option<Vec<OptionsResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct OptionsResult {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,

    #[serde(default)]
    options: Vec<OptionsByExpiry>,
}

#[derive(Debug, Deserialize)]
struct OptionsByExpiry {
    #[serde(rename = "expirationDate")]
    expiration_date: i64,

    #[serde(default)]
    calls: Vec<RawContract>,

    #[serde(default)]
    puts: Vec<RawContract>,
}

#[derive(Debug, Deserialize)]
struct RawContract {
    #[serde(rename = "contractSymbol")]
    contract_symbol: String,
    strike: f64,
    #[serde(default)]
    bid: f64,
    #[serde(default)]
    ask: f64,
    #[serde(rename = "lastPrice", default)]
    last_price: f64,
    #[serde(rename = "openInterest", default)]
    open_interest: f64,
    #[serde(rename = "impliedVolatility", default)]
    implied_volatility: f64,
    expiration: i64,
}

/// Expiration list plus the contracts of the expiry that was requested
#[derive(Debug)]
pub struct OptionsPage {
    pub expirations: Vec<i64>,
    pub expiration: Option<i64>,
    pub contracts: Vec<OptionContract>,
}

// -----------------------------------------------
// PARSERS
// -----------------------------------------------

fn epoch_to_date(epoch: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(epoch, 0).map(|dt| dt.date_naive())
}

/// Parse a chart response into bars, skipping sessions without a close
pub fn parse_chart(symbol: &str, text: &str) -> Result<Vec<PriceBar>, ScanError> {
    let response: ChartResponse = serde_json::from_str(text)?;

    if let Some(err) = response.chart.error {
        return Err(ScanError::unavailable(
            symbol,
            format!("{} - {}", err.code, err.description),
        ));
    }

    let data = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ScanError::unavailable(symbol, "no chart result"))?;

    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

    let bars = data
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = quote.close.get(i).copied().flatten()?;
            let date = epoch_to_date(ts)?;
            let pick = |series: &[Option<f64>]| series.get(i).copied().flatten().unwrap_or(close);
            Some(PriceBar {
                date,
                open: pick(&quote.open),
                high: pick(&quote.high),
                low: pick(&quote.low),
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0.0),
            })
        })
        .collect();

    Ok(bars)
}

/// Parse one options page (one expiration's calls and puts)
pub fn parse_options_page(symbol: &str, text: &str) -> Result<OptionsPage, ScanError> {
    let response: OptionsResponse = serde_json::from_str(text)?;

    if let Some(err) = response.option_chain.error {
        return Err(ScanError::unavailable(
            symbol,
            format!("{} - {}", err.code, err.description),
        ));
    }

    let result = response
        .option_chain
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ScanError::unavailable(symbol, "no option chain result"))?;

    let mut contracts = Vec::new();
    let mut expiration = None;

    for group in result.options {
        expiration = Some(group.expiration_date);
        let sides = [(OptionType::Call, group.calls), (OptionType::Put, group.puts)];
        for (option_type, raws) in sides {
            contracts.extend(raws.into_iter().filter_map(|raw| to_contract(raw, option_type)));
        }
    }

    Ok(OptionsPage {
        expirations: result.expiration_dates,
        expiration,
        contracts,
    })
}

/// Expiration epochs whose date is on or after `as_of` (all of them when `as_of` is None).
/// Epochs that don't map to a date are dropped.
pub fn expirations_on_or_after(epochs: &[i64], as_of: Option<NaiveDate>) -> Vec<i64> {
    epochs
        .iter()
        .copied()
        .filter(|&epoch| match (as_of, epoch_to_date(epoch)) {
            (Some(cutoff), Some(date)) => date >= cutoff,
            (None, Some(_)) => true,
            (_, None) => false,
        })
        .collect()
}

fn to_contract(raw: RawContract, option_type: OptionType) -> Option<OptionContract> {
    Some(OptionContract {
        expiration: epoch_to_date(raw.expiration)?,
        contract_symbol: raw.contract_symbol,
        strike: raw.strike,
        bid: raw.bid,
        ask: raw.ask,
        last_price: raw.last_price,
        open_interest: raw.open_interest,
        implied_volatility: raw.implied_volatility,
        option_type,
        delta: None,
    })
}

// -----------------------------------------------
// CLIENT WRAPPER WITH SESSION STATE
// -----------------------------------------------
pub struct YahooClient {
    client: Client,
    crumb: RwLock<Option<String>>,
}

impl YahooClient {
    pub fn new() -> Result<Self, ScanError> {
        Ok(Self {
            client: build_client()?,
            crumb: RwLock::new(None),
        })
    }

    /// Pick up the session cookie and crumb (only once per client)
    async fn crumb(&self) -> Result<String, ScanError> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }

        let mut cached = self.crumb.write().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // Only the Set-Cookie matters here; the status is usually 404
        let _ = self.client.get(config::YAHOO_COOKIE_URL).send().await?;

        let res = self.client.get(config::YAHOO_CRUMB_URL).send().await?;
        let status = res.status();
        let crumb = res.text().await?.trim().to_string();
        if !status.is_success() || crumb.is_empty() || crumb.starts_with('{') {
            return Err(ScanError::Request(format!("crumb request failed: {}", status)));
        }

        debug!("Obtained Yahoo session crumb");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    /// GET `url`, failing on non-success status or a non-JSON body
    async fn fetch_json(&self, url: &str) -> Result<String, ScanError> {
        debug!(url, "GET");
        let res = self.client.get(url).send().await?;
        let status = res.status();
        let text = res.text().await?;

        let trimmed = text.trim();
        let is_json = trimmed.starts_with('{') || trimmed.starts_with('[');

        if status.is_success() {
            if !is_json {
                let preview: String = text.chars().take(200).collect();
                return Err(ScanError::NonJsonResponse(preview));
            }
            Ok(text)
        } else if is_json && status == reqwest::StatusCode::NOT_FOUND {
            // Yahoo reports unknown symbols as 404 with an error object
            Ok(text)
        } else {
            let preview: String = text.chars().take(200).collect();
            Err(ScanError::Request(format!("HTTP {}: {}", status, preview)))
        }
    }

    async fn fetch_options_page(
        &self,
        symbol: &str,
        expiration: Option<i64>,
        crumb: &str,
    ) -> Result<OptionsPage, ScanError> {
        let url = config::yahoo_options_url(symbol, expiration, crumb);
        let text = self.fetch_json(&url).await?;
        parse_options_page(symbol, &text)
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn fetch_bars(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<PriceBar>, ScanError> {
        let url = config::yahoo_chart_url(symbol, period, interval);
        let text = self.fetch_json(&url).await?;
        let bars = parse_chart(symbol, &text)?;
        debug!(symbol, bars = bars.len(), "Fetched price history");
        Ok(bars)
    }

    async fn fetch_option_chain(
        &self,
        symbol: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<OptionContract>, ScanError> {
        let crumb = self.crumb().await?;
        let first = self.fetch_options_page(symbol, None, &crumb).await?;

        let wanted = expirations_on_or_after(&first.expirations, as_of);

        let mut contracts = Vec::new();
        let mut first = Some(first);

        for epoch in wanted {
            // The undated request already carries the nearest expiry
            let page = match first.take() {
                Some(page) if page.expiration == Some(epoch) => page,
                _ => self.fetch_options_page(symbol, Some(epoch), &crumb).await?,
            };
            contracts.extend(page.contracts);
        }

        debug!(symbol, contracts = contracts.len(), "Fetched option chain");
        Ok(contracts)
    }
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------
fn build_client() -> Result<Client, ScanError> {
    let mut headers = header::HeaderMap::new();

    let lang = config::ACCEPT_LANGUAGES
        .choose(&mut thread_rng())
        .copied()
        .unwrap_or("en-US,en;q=0.9");
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header::HeaderValue::from_str(lang)
            .map_err(|e| ScanError::Config(format!("bad Accept-Language: {}", e)))?,
    );
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));

    Ok(Client::builder()
        .default_headers(headers)
        .cookie_store(true)
        .user_agent(config::USER_AGENT)
        .timeout(config::HTTP_TIMEOUT)
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "PLTR"},
                "timestamp": [1748871000, 1748957400, 1749043800],
                "indicators": {"quote": [{
                    "open":   [120.0, null, 122.0],
                    "high":   [125.0, null, 126.0],
                    "low":    [119.0, null, 121.0],
                    "close":  [124.0, null, 125.5],
                    "volume": [1000000, null, 900000]
                }]}
            }],
            "error": null
        }
    }"#;

    const OPTIONS: &str = r#"{
        "optionChain": {
            "result": [{
                "underlyingSymbol": "PLTR",
                "expirationDates": [1749772800, 1750377600],
                "options": [{
                    "expirationDate": 1749772800,
                    "calls": [{
                        "contractSymbol": "PLTR250613C00130000",
                        "strike": 130.0, "lastPrice": 2.1, "bid": 2.0, "ask": 2.2,
                        "openInterest": 1500, "impliedVolatility": 0.62,
                        "expiration": 1749772800
                    }],
                    "puts": [{
                        "contractSymbol": "PLTR250613P00120000",
                        "strike": 120.0, "lastPrice": 1.9, "bid": 1.8,
                        "impliedVolatility": 0.58,
                        "expiration": 1749772800
                    }]
                }]
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_drops_missing_close() {
        let bars = parse_chart("PLTR", CHART).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(bars[1].close, 125.5);
        assert_eq!(bars[1].volume, 900000.0);
    }

    #[test]
    fn test_parse_chart_error_is_data_unavailable() {
        let text = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart("NOPE", text).unwrap_err();
        assert!(matches!(err, ScanError::DataUnavailable { .. }));
    }

    #[test]
    fn test_parse_options_page() {
        let page = parse_options_page("PLTR", OPTIONS).unwrap();
        assert_eq!(page.expirations, vec![1749772800, 1750377600]);
        assert_eq!(page.expiration, Some(1749772800));
        assert_eq!(page.contracts.len(), 2);

        let put = page
            .contracts
            .iter()
            .find(|c| c.option_type == OptionType::Put)
            .unwrap();
        assert_eq!(put.expiration, NaiveDate::from_ymd_opt(2025, 6, 13).unwrap());
        assert_eq!(put.ask, 0.0);
        assert_eq!(put.open_interest, 0.0);
        assert_eq!(put.delta, None);
    }

    #[test]
    fn test_expirations_on_or_after_as_of() {
        // 2025-06-13, 2025-06-20, 2025-06-27 (midnight UTC)
        let epochs = [1749772800, 1750377600, 1750982400];

        let as_of = NaiveDate::from_ymd_opt(2025, 6, 20);
        assert_eq!(expirations_on_or_after(&epochs, as_of), vec![1750377600, 1750982400]);

        let before_all = NaiveDate::from_ymd_opt(2025, 6, 1);
        assert_eq!(expirations_on_or_after(&epochs, before_all), epochs.to_vec());

        let after_all = NaiveDate::from_ymd_opt(2025, 6, 28);
        assert!(expirations_on_or_after(&epochs, after_all).is_empty());
    }

    #[test]
    fn test_expirations_without_as_of_keeps_all() {
        let epochs = [1749772800, 1750377600];
        assert_eq!(expirations_on_or_after(&epochs, None), epochs.to_vec());
    }

    #[test]
    fn test_expirations_out_of_range_epoch_dropped() {
        let epochs = [i64::MAX, 1749772800];
        assert_eq!(expirations_on_or_after(&epochs, None), vec![1749772800]);
    }
}
