//! Derived lifecycle state models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::ledger::InvestmentStatus;

/// Per-run derived state of one investment, recomputed from the full
/// linked flow history. The sourced `Investment` record is never mutated;
/// this struct is the only carrier of derived fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedState {
    pub investment_id: String,
    /// Sum of the capital components of the linked repayment flows.
    pub capital_repaid: Decimal,
    /// `max(0, invested - repaid)`.
    pub outstanding_capital: Decimal,
    pub status: InvestmentStatus,
    pub actual_end_date: Option<NaiveDate>,
    pub is_delayed: bool,
    /// Set when the derivation hit a structural inconsistency (repaid
    /// exceeding invested, or a source-completed investment with capital
    /// still outstanding). The record needs operator review.
    pub needs_review: bool,
}

/// Derived state per investment id, computed fresh each run.
pub type DerivedStates = HashMap<String, DerivedState>;
