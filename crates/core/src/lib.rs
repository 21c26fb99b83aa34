//! Patrimoine Core - Reconciliation and analytics engine.
//!
//! This crate contains the core business logic for Patrimoine: it turns
//! normalized per-platform record batches into one canonical ledger
//! (investments linked to their cash flows), re-derives lifecycle state
//! from the full flow history, and computes performance and risk metrics.
//! It is storage- and transport-agnostic; extraction and presentation
//! live in separate layers.

pub mod analytics;
pub mod constants;
pub mod errors;
pub mod ledger;
pub mod lifecycle;
pub mod linker;
pub mod pipeline;
pub mod report;
pub mod solver;
pub mod utils;

// Re-export the reporting layer's calling surface
pub use ledger::*;
pub use lifecycle::{derive_states, DerivedState, DerivedStates};
pub use linker::{LinkMethod, LinkResolution, LinkedLedger, ScheduleEntry};
pub use pipeline::{reconcile, run_reconciliation, ReconciliationInput};
pub use report::{aggregate, Report};
pub use solver::{solve_rate, RateSolve};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
