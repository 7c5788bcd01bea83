use crate::config::{FilterParams, RiskParams};
use crate::models::{Candidate, OptionContract, OptionType};
use chrono::NaiveDate;

/// Put candidates for a directional entry, ranked by delta per strike dollar
pub fn filter_put_candidates(
    chain: &[OptionContract],
    underlying_price: f64,
    as_of: NaiveDate,
    params: &FilterParams,
) -> Vec<Candidate> {
    let lower_strike = underlying_price * (1.0 - params.strike_otm_percent);
    let delta_low = params.put_delta_target - params.put_delta_range;
    let delta_high = params.put_delta_target + params.put_delta_range;

    let candidates = chain
        .iter()
        .filter(|c| c.option_type == OptionType::Put)
        .filter_map(|c| {
            let dte = c.days_to_expiry(as_of);
            if dte < params.put_min_dte || dte > params.put_max_dte {
                return None;
            }
            if c.strike < lower_strike || c.strike > underlying_price {
                return None;
            }
            let delta = c.delta.filter(|d| (delta_low..=delta_high).contains(d))?;
            if !is_liquid(c, params) {
                return None;
            }
            // zero strike leaves the score undefined
            if c.strike <= 0.0 {
                return None;
            }

            Some(Candidate {
                contract: c.clone(),
                days_to_expiry: dte,
                score: delta / c.strike,
            })
        })
        .collect();

    rank(candidates)
}

/// Far OTM call candidates for covered-call harvesting, ranked by premium
pub fn filter_call_candidates(
    chain: &[OptionContract],
    underlying_price: f64,
    as_of: NaiveDate,
    params: &FilterParams,
) -> Vec<Candidate> {
    let candidates = chain
        .iter()
        .filter(|c| c.option_type == OptionType::Call)
        .filter_map(|c| {
            let dte = c.days_to_expiry(as_of);
            if dte < params.call_min_dte {
                return None;
            }
            if c.strike <= underlying_price {
                return None;
            }
            // NaN from an estimator counts as missing
            let delta = c.delta.filter(|d| d.is_finite())?;
            if delta > params.call_max_delta {
                return None;
            }
            if !is_liquid(c, params) {
                return None;
            }

            Some(Candidate {
                contract: c.clone(),
                days_to_expiry: dte,
                score: c.last_price,
            })
        })
        .collect();

    rank(candidates)
}

/// Open interest above the minimum and bid/ask spread below the maximum
fn is_liquid(contract: &OptionContract, params: &FilterParams) -> bool {
    contract.open_interest > params.min_open_interest
        && contract.spread() < params.max_bid_ask_spread
}

/// Sort by score, highest first; ties keep chain order
fn rank(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}

/// Contracts affordable within the per-trade risk budget at `premium`
pub fn max_contracts(premium: f64, risk: &RiskParams) -> Option<u64> {
    let cost = premium * risk.contract_multiplier;
    if !cost.is_finite() || cost <= 0.0 {
        return None;
    }
    let budget = risk.account_capital * risk.max_risk_per_trade;
    Some((budget / cost).floor() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn put(strike: f64, dte: i64, delta: Option<f64>) -> OptionContract {
        OptionContract {
            contract_symbol: format!("TEST{}P", strike),
            strike,
            bid: 1.00,
            ask: 1.10,
            last_price: 1.05,
            open_interest: 1000.0,
            implied_volatility: 0.45,
            expiration: as_of() + Duration::days(dte),
            option_type: OptionType::Put,
            delta,
        }
    }

    #[test]
    fn test_put_dte_bounds_inclusive() {
        let params = FilterParams::default();
        let chain = vec![
            put(95.0, 6, Some(0.30)),
            put(95.0, 7, Some(0.30)),
            put(95.0, 30, Some(0.30)),
            put(95.0, 31, Some(0.30)),
        ];
        let out = filter_put_candidates(&chain, 100.0, as_of(), &params);
        let dtes: Vec<i64> = out.iter().map(|c| c.days_to_expiry).collect();
        assert_eq!(dtes.len(), 2);
        assert!(dtes.contains(&7) && dtes.contains(&30));
    }

    #[test]
    fn test_put_strike_window() {
        let params = FilterParams::default();
        let chain = vec![
            put(89.0, 15, Some(0.30)),
            put(90.0, 15, Some(0.30)),
            put(100.0, 15, Some(0.30)),
            put(101.0, 15, Some(0.30)),
        ];
        let out = filter_put_candidates(&chain, 100.0, as_of(), &params);
        assert_eq!(out.len(), 2);
        // 0.30/90 beats 0.30/100
        assert_eq!(out[0].contract.strike, 90.0);
        assert_eq!(out[1].contract.strike, 100.0);
    }

    #[test]
    fn test_missing_delta_is_excluded() {
        let params = FilterParams::default();
        let out = filter_put_candidates(&[put(95.0, 15, None)], 100.0, as_of(), &params);
        assert!(out.is_empty());
    }

    #[test]
    fn test_wide_spread_is_excluded() {
        let params = FilterParams::default();
        let mut c = put(95.0, 15, Some(0.30));
        c.ask = c.bid + 0.50;
        assert!(filter_put_candidates(&[c], 100.0, as_of(), &params).is_empty());
    }

    #[test]
    fn test_zero_strike_is_excluded() {
        let params = FilterParams::default();
        assert!(filter_put_candidates(&[put(0.0, 15, Some(0.30))], 0.0, as_of(), &params).is_empty());
    }

    #[test]
    fn test_max_contracts() {
        let risk = RiskParams::default();
        // 2000 budget / 350 per contract
        assert_eq!(max_contracts(3.5, &risk), Some(5));
        assert_eq!(max_contracts(0.0, &risk), None);
    }
}
