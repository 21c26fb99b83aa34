//! Volatility and drawdown from the cumulative net-cash-flow series.
//!
//! Without daily valuations, the value proxy is the cumulative net flow
//! into the platforms — the investor's committed capital: deposits and
//! subscriptions push it up, repayments and withdrawals pull it down.
//! The series is daily-resampled with gaps forward-filled, normalized to
//! a base of 100 at its first non-zero value. Daily percentage changes
//! are annualized by √252; drawdown is measured against the running
//! maximum and reported as the most negative observation.

use chrono::NaiveDate;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::constants::TRADING_DAYS_PER_YEAR;
use crate::ledger::CashFlow;
use crate::utils::days_between;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    /// Annualized standard deviation of daily percentage changes.
    pub annualized_volatility: f64,
    /// Most negative drawdown observed, as a fraction (≤ 0).
    pub max_drawdown: f64,
}

/// Daily cumulative committed-capital series over the span of the flows,
/// with gaps forward-filled. Net amounts are signed from the pocket
/// perspective, so the platform-side series accumulates their negation.
/// Empty when there are no flows.
pub fn cumulative_flow_series(flows: &[&CashFlow]) -> Vec<(NaiveDate, Decimal)> {
    let mut daily_net: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for flow in flows {
        *daily_net.entry(flow.transaction_date).or_insert(Decimal::ZERO) -= flow.net_amount;
    }

    let (Some(first), Some(last)) = (
        daily_net.keys().next().copied(),
        daily_net.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    let mut series = Vec::new();
    let mut cumulative = Decimal::ZERO;
    for day in days_between(first, last) {
        if let Some(net) = daily_net.get(&day) {
            cumulative += *net;
        }
        series.push((day, cumulative));
    }
    series
}

/// Volatility and max drawdown of a flow batch. Neutral (zeros) when the
/// series is too short or its base value is not positive.
pub fn risk_metrics(flows: &[&CashFlow]) -> RiskMetrics {
    let series = cumulative_flow_series(flows);
    normalized_risk_metrics(&series)
}

fn normalized_risk_metrics(series: &[(NaiveDate, Decimal)]) -> RiskMetrics {
    // Normalize to 100 at the first non-zero value; leading zeros carry
    // no information.
    let Some(start) = series.iter().position(|(_, v)| !v.is_zero()) else {
        return RiskMetrics::default();
    };
    let base = series[start].1.to_f64().unwrap_or(0.0);
    if base <= 0.0 {
        return RiskMetrics::default();
    }

    let normalized: Vec<f64> = series[start..]
        .iter()
        .map(|(_, v)| v.to_f64().unwrap_or(0.0) / base * 100.0)
        .collect();
    if normalized.len() < 2 {
        return RiskMetrics::default();
    }

    let mut daily_changes = Vec::with_capacity(normalized.len() - 1);
    for window in normalized.windows(2) {
        if window[0] != 0.0 {
            daily_changes.push(window[1] / window[0] - 1.0);
        }
    }

    let annualized_volatility = if daily_changes.len() >= 2 {
        population_std(&daily_changes) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let mut running_max = f64::MIN;
    let mut max_drawdown: f64 = 0.0;
    for value in &normalized {
        running_max = running_max.max(*value);
        if running_max > 0.0 {
            max_drawdown = max_drawdown.min((value - running_max) / running_max);
        }
    }

    RiskMetrics {
        annualized_volatility,
        max_drawdown,
    }
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{FlowDirection, FlowKind, Platform};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// `net` is pocket-signed: committed money is negative.
    fn flow(id: &str, net: Decimal, on: NaiveDate) -> CashFlow {
        let direction = if net >= Decimal::ZERO {
            FlowDirection::In
        } else {
            FlowDirection::Out
        };
        CashFlow {
            id: id.to_string(),
            investment_id: None,
            platform: Platform::Pea,
            kind: FlowKind::Adjustment,
            direction,
            gross_amount: net.abs(),
            net_amount: net,
            tax_amount: Decimal::ZERO,
            capital_amount: Decimal::ZERO,
            interest_amount: Decimal::ZERO,
            transaction_date: on,
            description: String::new(),
        }
    }

    #[test]
    fn test_series_is_daily_and_forward_filled() {
        let flows = [
            flow("a", dec!(-100), date(2024, 1, 1)),
            flow("b", dec!(-50), date(2024, 1, 4)),
        ];
        let refs: Vec<&CashFlow> = flows.iter().collect();
        let series = cumulative_flow_series(&refs);
        assert_eq!(series.len(), 4);
        assert_eq!(series[0], (date(2024, 1, 1), dec!(100)));
        assert_eq!(series[1], (date(2024, 1, 2), dec!(100)));
        assert_eq!(series[2], (date(2024, 1, 3), dec!(100)));
        assert_eq!(series[3], (date(2024, 1, 4), dec!(150)));
    }

    #[test]
    fn test_same_day_flows_are_netted() {
        let flows = [
            flow("a", dec!(-100), date(2024, 1, 1)),
            flow("b", dec!(30), date(2024, 1, 1)),
        ];
        let refs: Vec<&CashFlow> = flows.iter().collect();
        let series = cumulative_flow_series(&refs);
        assert_eq!(series, vec![(date(2024, 1, 1), dec!(70))]);
    }

    #[test]
    fn test_empty_flows_are_neutral() {
        assert!(cumulative_flow_series(&[]).is_empty());
        assert_eq!(risk_metrics(&[]), RiskMetrics::default());
    }

    #[test]
    fn test_flat_series_has_no_volatility_or_drawdown() {
        let flows = [
            flow("a", dec!(-100), date(2024, 1, 1)),
            flow("b", dec!(0), date(2024, 1, 10)),
        ];
        let refs: Vec<&CashFlow> = flows.iter().collect();
        let metrics = risk_metrics(&refs);
        assert_eq!(metrics.annualized_volatility, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
    }

    #[test]
    fn test_drawdown_measures_peak_to_trough() {
        // Committed capital 100 -> 200, then 80 repaid: trough is 40%
        // below the 200 peak.
        let flows = [
            flow("a", dec!(-100), date(2024, 1, 1)),
            flow("b", dec!(-100), date(2024, 1, 2)),
            flow("c", dec!(80), date(2024, 1, 3)),
        ];
        let refs: Vec<&CashFlow> = flows.iter().collect();
        let metrics = risk_metrics(&refs);
        assert!((metrics.max_drawdown - (-0.4)).abs() < 1e-9);
        assert!(metrics.annualized_volatility > 0.0);
    }

    #[test]
    fn test_negative_base_is_neutral() {
        // A series opening with money coming back (nothing ever
        // committed) has no meaningful base to normalize against.
        let flows = [
            flow("a", dec!(100), date(2024, 1, 1)),
            flow("b", dec!(-50), date(2024, 1, 2)),
        ];
        let refs: Vec<&CashFlow> = flows.iter().collect();
        assert_eq!(risk_metrics(&refs), RiskMetrics::default());
    }
}
