//! Counterparty concentration (Herfindahl index).

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::ledger::Investment;

/// Number of entries in the top-counterparties table.
const TOP_COUNTERPARTY_COUNT: usize = 3;

/// Concentration classification over the Herfindahl index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcentrationLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl ConcentrationLevel {
    pub fn classify(herfindahl: f64) -> Self {
        if herfindahl < 0.15 {
            ConcentrationLevel::Low
        } else if herfindahl < 0.25 {
            ConcentrationLevel::Moderate
        } else if herfindahl < 0.40 {
            ConcentrationLevel::High
        } else {
            ConcentrationLevel::VeryHigh
        }
    }
}

/// One counterparty's share of the invested capital.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterpartyShare {
    pub counterparty: String,
    pub invested: Decimal,
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcentrationMetrics {
    /// Σ shareᵢ² over counterparties, in [0, 1].
    pub herfindahl: f64,
    pub level: ConcentrationLevel,
    /// Inverse Herfindahl: how many equal-weight counterparties the
    /// portfolio effectively behaves like.
    pub effective_counterparties: f64,
    pub counterparty_count: usize,
    /// Largest exposures first, at most three entries.
    pub top_counterparties: Vec<CounterpartyShare>,
}

/// Concentration of invested capital over counterparties.
/// Returns `None` when there is no positive invested amount to split.
pub fn concentration(investments: &[&Investment]) -> Option<ConcentrationMetrics> {
    let mut by_counterparty: BTreeMap<&str, Decimal> = BTreeMap::new();
    for investment in investments {
        if investment.invested_amount > Decimal::ZERO {
            *by_counterparty
                .entry(investment.counterparty.as_str())
                .or_insert(Decimal::ZERO) += investment.invested_amount;
        }
    }

    let total: Decimal = by_counterparty.values().copied().sum();
    if total <= Decimal::ZERO {
        return None;
    }
    let total_f = total.to_f64().unwrap_or(0.0);
    if total_f <= 0.0 {
        return None;
    }

    let herfindahl: f64 = by_counterparty
        .values()
        .map(|invested| {
            let share = invested.to_f64().unwrap_or(0.0) / total_f;
            share * share
        })
        .sum();

    let mut shares: Vec<CounterpartyShare> = by_counterparty
        .iter()
        .map(|(name, invested)| CounterpartyShare {
            counterparty: name.to_string(),
            invested: *invested,
            share_pct: invested.to_f64().unwrap_or(0.0) / total_f * 100.0,
        })
        .collect();
    // Largest first; the BTreeMap ordering breaks amount ties by name.
    shares.sort_by(|a, b| b.invested.cmp(&a.invested));
    shares.truncate(TOP_COUNTERPARTY_COUNT);

    Some(ConcentrationMetrics {
        herfindahl,
        level: ConcentrationLevel::classify(herfindahl),
        effective_counterparties: if herfindahl > 0.0 { 1.0 / herfindahl } else { 0.0 },
        counterparty_count: by_counterparty.len(),
        top_counterparties: shares,
    })
}
