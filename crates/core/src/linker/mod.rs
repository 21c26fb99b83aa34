//! Cross-source linker module - flow→investment resolution.

mod linker_model;
mod linker_service;
mod name_normalizer;

// Re-export the public interface
pub use linker_model::{FlowSplit, LinkMethod, LinkResolution, LinkedLedger, ScheduleEntry};
pub use linker_service::link_flows;
pub use name_normalizer::{normalize_match_key, strip_boilerplate};
