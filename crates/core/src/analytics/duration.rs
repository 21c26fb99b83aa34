//! Duration and capital-immobilization metrics.

use chrono::{Months, NaiveDate};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::{Investment, InvestmentStatus};
use crate::lifecycle::DerivedStates;
use crate::utils::months_between;

/// Investment counts per maturity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationBuckets {
    pub under_6m: usize,
    pub from_6_to_12m: usize,
    pub over_12m: usize,
}

/// Outstanding capital of active investments expected back within the
/// trailing horizons.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedLiquidity {
    pub within_6m: Decimal,
    pub within_12m: Decimal,
    pub within_24m: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationMetrics {
    /// Invested-amount-weighted average months between investment date
    /// and expected end date.
    pub weighted_average_months: f64,
    pub buckets: DurationBuckets,
    pub projected_liquidity: ProjectedLiquidity,
    pub delayed_count: usize,
}

/// Duration profile of a set of investments. Neutral (all zeros) when no
/// investment carries a usable duration.
pub fn duration_metrics(
    investments: &[&Investment],
    states: &DerivedStates,
    as_of: NaiveDate,
) -> DurationMetrics {
    let mut metrics = DurationMetrics::default();

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for investment in investments {
        let Some(months) = duration_months(investment) else {
            continue;
        };

        let weight = investment.invested_amount.to_f64().unwrap_or(0.0);
        if weight > 0.0 {
            weighted_sum += months * weight;
            weight_total += weight;
        }

        if months < 6.0 {
            metrics.buckets.under_6m += 1;
        } else if months <= 12.0 {
            metrics.buckets.from_6_to_12m += 1;
        } else {
            metrics.buckets.over_12m += 1;
        }
    }

    if weight_total > 0.0 {
        metrics.weighted_average_months = weighted_sum / weight_total;
    }

    let horizon_6m = as_of.checked_add_months(Months::new(6));
    let horizon_12m = as_of.checked_add_months(Months::new(12));
    let horizon_24m = as_of.checked_add_months(Months::new(24));

    for investment in investments {
        let Some(state) = states.get(&investment.id) else {
            continue;
        };
        if state.is_delayed {
            metrics.delayed_count += 1;
        }
        if state.status != InvestmentStatus::Active {
            continue;
        }
        let Some(end) = investment.expected_end_date else {
            continue;
        };
        if end < as_of {
            continue;
        }
        if horizon_6m.is_some_and(|h| end <= h) {
            metrics.projected_liquidity.within_6m += state.outstanding_capital;
        }
        if horizon_12m.is_some_and(|h| end <= h) {
            metrics.projected_liquidity.within_12m += state.outstanding_capital;
        }
        if horizon_24m.is_some_and(|h| end <= h) {
            metrics.projected_liquidity.within_24m += state.outstanding_capital;
        }
    }

    metrics
}

/// Months between investment date and expected end date, falling back to
/// the contractual duration when no end date was sourced.
fn duration_months(investment: &Investment) -> Option<f64> {
    match investment.expected_end_date {
        Some(end) => Some(months_between(investment.investment_date, end)),
        None => investment.duration_months.map(f64::from),
    }
}
