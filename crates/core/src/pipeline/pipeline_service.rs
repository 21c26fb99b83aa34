//! The four-stage reconciliation pipeline.
//!
//! One run is a pure, single-pass batch computation over an immutable
//! snapshot of one user's records: link the flows, derive lifecycle
//! state, then aggregate (rate solving happens inside aggregation).
//! Each stage consumes the full, finalized output of the previous one.
//! Runs share no state, so re-running on the same snapshot yields an
//! identical report.

use chrono::NaiveDate;
use log::debug;

use crate::ledger::{sanitize_batch, CashFlow, Investment, LiquidityBalance, PortfolioPosition};
use crate::lifecycle::derive_states;
use crate::linker::{link_flows, LinkedLedger, ScheduleEntry};
use crate::report::{aggregate, Report};

/// Everything the extraction layer hands over for one run: normalized
/// record batches, already date- and amount-parsed.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationInput {
    pub investments: Vec<Investment>,
    pub flows: Vec<CashFlow>,
    pub schedules: Vec<ScheduleEntry>,
    pub positions: Vec<PortfolioPosition>,
    pub balances: Vec<LiquidityBalance>,
}

/// Validates the batches and resolves every flow against the investment
/// batch: the first pipeline stage.
pub fn reconcile(input: ReconciliationInput) -> LinkedLedger {
    let batch = sanitize_batch(input.investments, input.flows);
    if !batch.rejections.is_empty() {
        debug!(
            "Batch intake excluded {} malformed record(s)",
            batch.rejections.len()
        );
    }
    link_flows(batch, &input.schedules, input.positions, input.balances)
}

/// Runs the whole pipeline and returns the best-effort report.
pub fn run_reconciliation(input: ReconciliationInput, as_of: NaiveDate) -> Report {
    let ledger = reconcile(input);
    let states = derive_states(&ledger, as_of);
    aggregate(&ledger, &states, as_of)
}
