//! Deterministic stress scenarios.
//!
//! What-if deltas reported alongside the ledger, never fed back into it:
//! losing the single largest counterparty exposure, half the active
//! capital turning delayed, and a flat 20% haircut on marked-to-market
//! valuations.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::ledger::{Investment, InvestmentStatus, Platform};
use crate::lifecycle::DerivedStates;

/// Haircut applied to mark-to-market valuations.
const HAIRCUT: Decimal = dec!(0.20);

/// Share of active capital assumed delayed.
const DELAY_SHARE: Decimal = dec!(0.50);

/// Impact of one adverse scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StressImpact {
    pub absolute: Decimal,
    /// Impact as a percentage of the platform's capital.
    pub platform_pct: f64,
    /// Impact as a percentage of the whole portfolio's capital.
    pub portfolio_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StressScenarios {
    /// Total loss of the largest counterparty exposure.
    pub largest_counterparty_default: Option<StressImpact>,
    /// Half of the active capital stops amortizing on schedule.
    pub half_active_delayed: Option<StressImpact>,
    /// Flat 20% valuation haircut (mark-to-market platforms only).
    pub valuation_haircut: Option<StressImpact>,
}

/// Stress deltas for one platform. Scenarios without applicable capital
/// come back `None`.
pub fn stress_scenarios(
    platform: Platform,
    investments: &[&Investment],
    states: &DerivedStates,
    market_value: Decimal,
    platform_capital: Decimal,
    portfolio_capital: Decimal,
) -> StressScenarios {
    let mut scenarios = StressScenarios::default();

    let mut by_counterparty: BTreeMap<&str, Decimal> = BTreeMap::new();
    for investment in investments {
        if investment.invested_amount > Decimal::ZERO {
            *by_counterparty
                .entry(investment.counterparty.as_str())
                .or_insert(Decimal::ZERO) += investment.invested_amount;
        }
    }
    if let Some(largest) = by_counterparty.values().copied().max() {
        scenarios.largest_counterparty_default =
            Some(impact(largest, platform_capital, portfolio_capital));
    }

    let active_capital: Decimal = investments
        .iter()
        .filter(|inv| {
            states
                .get(&inv.id)
                .map(|s| s.status == InvestmentStatus::Active)
                .unwrap_or(false)
        })
        .map(|inv| inv.invested_amount)
        .sum();
    if active_capital > Decimal::ZERO {
        scenarios.half_active_delayed = Some(impact(
            active_capital * DELAY_SHARE,
            platform_capital,
            portfolio_capital,
        ));
    }

    if platform.is_mark_to_market() && market_value > Decimal::ZERO {
        scenarios.valuation_haircut = Some(impact(
            market_value * HAIRCUT,
            platform_capital,
            portfolio_capital,
        ));
    }

    scenarios
}

fn impact(absolute: Decimal, platform_capital: Decimal, portfolio_capital: Decimal) -> StressImpact {
    StressImpact {
        absolute,
        platform_pct: pct_of(absolute, platform_capital),
        portfolio_pct: pct_of(absolute, portfolio_capital),
    }
}

fn pct_of(part: Decimal, whole: Decimal) -> f64 {
    if whole > Decimal::ZERO {
        (part.to_f64().unwrap_or(0.0) / whole.to_f64().unwrap_or(1.0)) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::DerivedState;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn investment(id: &str, counterparty: &str, invested: Decimal) -> Investment {
        Investment {
            id: id.to_string(),
            platform: Platform::Homunity,
            project_name: "P".to_string(),
            counterparty: counterparty.to_string(),
            invested_amount: invested,
            annual_rate: None,
            duration_months: None,
            investment_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            expected_end_date: None,
            actual_end_date: None,
            status: InvestmentStatus::Active,
            source_capital_repaid: None,
        }
    }

    fn active_states(ids: &[&str]) -> DerivedStates {
        let mut states = HashMap::new();
        for id in ids {
            states.insert(
                id.to_string(),
                DerivedState {
                    investment_id: id.to_string(),
                    capital_repaid: Decimal::ZERO,
                    outstanding_capital: Decimal::ZERO,
                    status: InvestmentStatus::Active,
                    actual_end_date: None,
                    is_delayed: false,
                    needs_review: false,
                },
            );
        }
        states
    }

    #[test]
    fn test_largest_counterparty_aggregates_exposures() {
        let a1 = investment("a1", "Alpha", dec!(300));
        let a2 = investment("a2", "Alpha", dec!(300));
        let b = investment("b", "Beta", dec!(500));
        let states = active_states(&["a1", "a2", "b"]);
        let scenarios = stress_scenarios(
            Platform::Homunity,
            &[&a1, &a2, &b],
            &states,
            Decimal::ZERO,
            dec!(1100),
            dec!(2200),
        );
        let default = scenarios.largest_counterparty_default.unwrap();
        assert_eq!(default.absolute, dec!(600));
        assert!((default.platform_pct - 54.545454).abs() < 1e-3);
        assert!((default.portfolio_pct - 27.272727).abs() < 1e-3);
    }

    #[test]
    fn test_half_active_delayed_uses_active_capital_only() {
        let a = investment("a", "Alpha", dec!(400));
        let b = investment("b", "Beta", dec!(600));
        // Only "a" is active.
        let states = active_states(&["a"]);
        let scenarios = stress_scenarios(
            Platform::Homunity,
            &[&a, &b],
            &states,
            Decimal::ZERO,
            dec!(1000),
            dec!(1000),
        );
        assert_eq!(scenarios.half_active_delayed.unwrap().absolute, dec!(200));
    }

    #[test]
    fn test_haircut_only_for_mark_to_market() {
        let states = HashMap::new();
        let crowdfunding = stress_scenarios(
            Platform::PretUp,
            &[],
            &states,
            dec!(5000),
            dec!(5000),
            dec!(5000),
        );
        assert!(crowdfunding.valuation_haircut.is_none());

        let brokerage = stress_scenarios(
            Platform::Pea,
            &[],
            &states,
            dec!(5000),
            dec!(5000),
            dec!(5000),
        );
        let haircut = brokerage.valuation_haircut.unwrap();
        assert_eq!(haircut.absolute, dec!(1000));
        assert!((haircut.platform_pct - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_platform_has_no_scenarios() {
        let scenarios = stress_scenarios(
            Platform::PretUp,
            &[],
            &HashMap::new(),
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
        );
        assert_eq!(scenarios, StressScenarios::default());
    }
}
