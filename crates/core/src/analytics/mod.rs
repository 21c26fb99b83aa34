//! Analytics module - portfolio metrics built on the reconciled ledger.
//!
//! Every metric here degrades per-metric: empty or zero-valued input
//! yields a defined neutral value, never an error, so one missing input
//! can never fail the whole report.

pub mod concentration;
pub mod duration;
pub mod periodic;
pub mod reinvestment;
pub mod risk;
pub mod rolling;
pub mod stress;

pub use concentration::*;
pub use duration::*;
pub use periodic::*;
pub use reinvestment::*;
pub use risk::*;
pub use rolling::*;
pub use stress::*;
