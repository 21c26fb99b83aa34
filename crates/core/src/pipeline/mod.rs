//! Pipeline module - the reconcile → derive → solve → aggregate façade.

mod pipeline_service;

// Re-export the public interface
pub use pipeline_service::{reconcile, run_reconciliation, ReconciliationInput};
