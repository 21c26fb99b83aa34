//! Report module - per-platform and global KPI assembly.

mod report_model;
mod report_service;

// Re-export the public interface
pub use report_model::{GlobalKpis, PlatformReport, Report, RunDiagnostics};
pub use report_service::aggregate;

#[cfg(test)]
mod report_service_tests;
