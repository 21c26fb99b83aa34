//! Lifecycle module - investment state derivation.

mod lifecycle_model;
mod state_deriver;

// Re-export the public interface
pub use lifecycle_model::{DerivedState, DerivedStates};
pub use state_deriver::derive_states;
