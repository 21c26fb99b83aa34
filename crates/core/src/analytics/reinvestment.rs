//! Reinvestment, expected-interest and portfolio-maturity metrics.

use chrono::NaiveDate;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::constants::DAYS_PER_MONTH;
use crate::ledger::{CashFlow, FlowDirection, FlowKind, Investment, InvestmentStatus};
use crate::lifecycle::DerivedStates;

/// Normalization ceiling for the duration score of the maturity
/// indicator, in months.
const MAX_DURATION_MONTHS: f64 = 60.0;

/// Share of returned capital (repayments, interest, dividends) that went
/// back into new investments, in percent. Zero when nothing came back.
pub fn reinvestment_rate_pct(flows: &[&CashFlow]) -> f64 {
    let capital_returned: Decimal = flows
        .iter()
        .filter(|f| {
            f.direction == FlowDirection::In
                && matches!(f.kind, FlowKind::Repayment | FlowKind::Interest | FlowKind::Dividend)
        })
        .map(|f| f.gross_amount)
        .sum();

    let new_investments: Decimal = flows
        .iter()
        .filter(|f| f.direction == FlowDirection::Out && f.kind == FlowKind::InvestmentOutflow)
        .map(|f| f.gross_amount)
        .sum();

    if capital_returned > Decimal::ZERO {
        (new_investments / capital_returned).to_f64().unwrap_or(0.0) * 100.0
    } else {
        0.0
    }
}

/// Interest still expected from active investments: nominal rate applied
/// to the outstanding capital over the months left to the expected end.
pub fn expected_future_interest(
    investments: &[&Investment],
    states: &DerivedStates,
    as_of: NaiveDate,
) -> Decimal {
    let mut total = Decimal::ZERO;
    for investment in investments {
        let Some(state) = states.get(&investment.id) else {
            continue;
        };
        if state.status != InvestmentStatus::Active {
            continue;
        }
        let (Some(rate), Some(end)) = (investment.annual_rate, investment.expected_end_date) else {
            continue;
        };
        if rate <= Decimal::ZERO || end <= as_of {
            continue;
        }

        let remaining_months =
            Decimal::from((end - as_of).num_days()) / Decimal::try_from(DAYS_PER_MONTH).unwrap_or(dec!(30.44));
        let expected = state.outstanding_capital * (rate / dec!(100)) * (remaining_months / dec!(12));
        if expected > Decimal::ZERO {
            total += expected;
        }
    }
    total
}

/// Composite 0–100 maturity score of a platform: the mean of a
/// short-term-liquidity score, an inverse-duration score, a reinvestment
/// score and a repayment score. Higher reads as a younger, more dynamic
/// book.
pub fn maturity_indicator(
    repayment_rate_pct: f64,
    projected_liquidity_6m: Decimal,
    outstanding_capital: Decimal,
    weighted_average_duration_months: f64,
    reinvestment_rate_pct: f64,
) -> f64 {
    let liquidity_score = if outstanding_capital > Decimal::ZERO {
        (projected_liquidity_6m / outstanding_capital)
            .to_f64()
            .unwrap_or(0.0)
            * 100.0
    } else {
        0.0
    };

    let duration_score = if weighted_average_duration_months > 0.0 {
        ((1.0 - weighted_average_duration_months / MAX_DURATION_MONTHS) * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let reinvestment_score = reinvestment_rate_pct.clamp(0.0, 100.0);
    let repayment_score = repayment_rate_pct.clamp(0.0, 100.0);

    let score = (liquidity_score + duration_score + reinvestment_score + repayment_score) / 4.0;
    (score * 100.0).round() / 100.0
}
