//! Ledger module - canonical record model and batch intake.

mod ledger_intake;
mod ledger_model;

// Re-export the public interface
pub use ledger_intake::{sanitize_batch, LedgerBatch, RecordRejection};
pub use ledger_model::{
    CashFlow, FlowDirection, FlowKind, Investment, InvestmentStatus, LiquidityBalance, Platform,
    PlatformKind, PortfolioPosition,
};
