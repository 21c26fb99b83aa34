//! Lifecycle state derivation.
//!
//! Recomputes every investment's repaid capital, outstanding capital and
//! status from the complete linked flow history, on every pass. There is
//! no incremental path: late-arriving or corrected flows always produce
//! a consistent final state because nothing survives from earlier runs.

use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::constants::CAPITAL_TOLERANCE;
use crate::ledger::{CashFlow, FlowKind, Investment, InvestmentStatus};
use crate::lifecycle::{DerivedState, DerivedStates};
use crate::linker::LinkedLedger;

/// Derives the lifecycle state of every investment in the ledger as of
/// the given date, into a fresh map keyed by investment id.
pub fn derive_states(ledger: &LinkedLedger, as_of: NaiveDate) -> DerivedStates {
    // Index linked flows once instead of scanning per investment.
    let mut flows_by_investment: HashMap<&str, Vec<&CashFlow>> = HashMap::new();
    for flow in &ledger.flows {
        if let Some(investment_id) = ledger.linked_investment_id(flow) {
            flows_by_investment.entry(investment_id).or_default().push(flow);
        }
    }

    ledger
        .investments
        .iter()
        .map(|investment| {
            let linked = flows_by_investment
                .get(investment.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let state = derive_one(investment, linked, ledger, as_of);
            (investment.id.clone(), state)
        })
        .collect()
}

fn derive_one(
    investment: &Investment,
    linked: &[&CashFlow],
    ledger: &LinkedLedger,
    as_of: NaiveDate,
) -> DerivedState {
    let repayments: Vec<&CashFlow> = linked
        .iter()
        .copied()
        .filter(|f| f.kind == FlowKind::Repayment)
        .collect();

    // The transaction log is authoritative; the position table's
    // capital-repaid column is only trusted when no repayment flow
    // could be linked at all.
    let capital_repaid: Decimal = if repayments.is_empty() {
        investment.source_capital_repaid.unwrap_or(Decimal::ZERO)
    } else {
        repayments.iter().map(|f| ledger.split_for(f).capital).sum()
    };

    let mut needs_review = false;
    if capital_repaid > investment.invested_amount + CAPITAL_TOLERANCE {
        warn!(
            "Investment '{}': repaid capital {} exceeds invested amount {}; clamping outstanding to 0",
            investment.id, capital_repaid, investment.invested_amount
        );
        needs_review = true;
    }

    let outstanding_capital = (investment.invested_amount - capital_repaid).max(Decimal::ZERO);

    let last_repayment_date = repayments.iter().map(|f| f.transaction_date).max();

    let (status, actual_end_date, is_delayed) = resolve_status(
        investment,
        outstanding_capital,
        last_repayment_date,
        as_of,
        &mut needs_review,
    );

    DerivedState {
        investment_id: investment.id.clone(),
        capital_repaid,
        outstanding_capital,
        status,
        actual_end_date,
        is_delayed,
        needs_review,
    }
}

/// Status transition rules, in priority order:
///
/// 1. a source-provided `defaulted` or `in_procedure` status is kept
///    verbatim, no further inference;
/// 2. outstanding within tolerance of zero on a funded investment means
///    `completed`, ended at the last repayment (or the expected end date
///    when the source marked completion without any linked repayment);
/// 3. an expected end date strictly in the past on a not-completed
///    investment means `delayed`;
/// 4. otherwise the sourced status stands (normally `active`).
fn resolve_status(
    investment: &Investment,
    outstanding: Decimal,
    last_repayment_date: Option<NaiveDate>,
    as_of: NaiveDate,
    needs_review: &mut bool,
) -> (InvestmentStatus, Option<NaiveDate>, bool) {
    match investment.status {
        InvestmentStatus::Defaulted | InvestmentStatus::InProcedure => {
            return (investment.status, investment.actual_end_date, false);
        }
        _ => {}
    }

    if outstanding <= CAPITAL_TOLERANCE && investment.invested_amount > Decimal::ZERO {
        let actual_end = last_repayment_date
            .or(investment.actual_end_date)
            .or(investment.expected_end_date);
        return (InvestmentStatus::Completed, actual_end, false);
    }

    if investment.status == InvestmentStatus::Completed {
        // The source says completed but the flow history leaves capital
        // outstanding: keep the sourced status, flag the inconsistency.
        warn!(
            "Investment '{}' marked completed by source but {} still outstanding",
            investment.id, outstanding
        );
        *needs_review = true;
        let actual_end = investment.actual_end_date.or(investment.expected_end_date);
        return (InvestmentStatus::Completed, actual_end, false);
    }

    if let Some(expected_end) = investment.expected_end_date {
        if expected_end < as_of {
            return (InvestmentStatus::Delayed, None, true);
        }
    }

    (investment.status, None, investment.status == InvestmentStatus::Delayed)
}
