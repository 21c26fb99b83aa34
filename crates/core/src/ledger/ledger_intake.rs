//! Batch-boundary validation.
//!
//! Malformed records are excluded and counted before reconciliation
//! begins; the run proceeds with the remainder. Rejections are carried
//! through to the report diagnostics.

use log::warn;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::ValidationError;
use crate::ledger::{CashFlow, FlowDirection, Investment};

/// A record excluded at the batch boundary, with the reason it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRejection {
    pub record_id: String,
    pub reason: String,
}

/// The sanitized input of one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct LedgerBatch {
    pub investments: Vec<Investment>,
    pub flows: Vec<CashFlow>,
    pub rejections: Vec<RecordRejection>,
}

/// Validates both input batches, keeping the well-formed records and
/// collecting one rejection per malformed one.
pub fn sanitize_batch(investments: Vec<Investment>, flows: Vec<CashFlow>) -> LedgerBatch {
    let mut batch = LedgerBatch::default();

    for investment in investments {
        match validate_investment(&investment) {
            Ok(()) => batch.investments.push(investment),
            Err(reason) => {
                warn!(
                    "Rejecting investment '{}' ({}): {}",
                    investment.id, investment.platform, reason
                );
                batch.rejections.push(RecordRejection {
                    record_id: investment.id,
                    reason: reason.to_string(),
                });
            }
        }
    }

    for flow in flows {
        match validate_flow(&flow) {
            Ok(()) => batch.flows.push(flow),
            Err(reason) => {
                warn!("Rejecting cash flow '{}' ({}): {}", flow.id, flow.platform, reason);
                batch.rejections.push(RecordRejection {
                    record_id: flow.id,
                    reason: reason.to_string(),
                });
            }
        }
    }

    batch
}

fn validate_investment(investment: &Investment) -> Result<(), ValidationError> {
    if investment.id.trim().is_empty() {
        return Err(ValidationError::MissingField("id"));
    }
    if investment.invested_amount < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount {
            field: "investedAmount",
            value: investment.invested_amount,
        });
    }
    if let Some(repaid) = investment.source_capital_repaid {
        if repaid < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount {
                field: "sourceCapitalRepaid",
                value: repaid,
            });
        }
    }
    Ok(())
}

fn validate_flow(flow: &CashFlow) -> Result<(), ValidationError> {
    if flow.id.trim().is_empty() {
        return Err(ValidationError::MissingField("id"));
    }
    for (field, value) in [
        ("grossAmount", flow.gross_amount),
        ("taxAmount", flow.tax_amount),
        ("capitalAmount", flow.capital_amount),
        ("interestAmount", flow.interest_amount),
    ] {
        if value < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount { field, value });
        }
    }
    let sign_ok = match flow.direction {
        FlowDirection::In => flow.net_amount >= Decimal::ZERO,
        FlowDirection::Out => flow.net_amount <= Decimal::ZERO,
    };
    if !sign_ok {
        return Err(ValidationError::DirectionMismatch {
            net: flow.net_amount,
            direction: flow.direction.to_string(),
        });
    }
    if flow.gross_amount < flow.net_amount.abs() {
        return Err(ValidationError::GrossBelowNet {
            gross: flow.gross_amount,
            net: flow.net_amount,
        });
    }
    Ok(())
}
