//! Report domain models.
//!
//! The report is the engine's only output surface: a serializable tree
//! of scalars, per-platform maps and small ordered tables. Formatting,
//! localization and presentation belong to the (excluded) dashboard
//! layer, not here.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analytics::{
    ConcentrationMetrics, DurationMetrics, PeriodicPerformance, RiskMetrics, RollingReturns,
    StressScenarios,
};
use crate::errors::Result;
use crate::ledger::RecordRejection;

/// Portfolio-wide headline figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalKpis {
    /// Crowdfunding outstanding + marked-to-market value + liquidity.
    pub total_wealth: Decimal,
    pub crowdfunding_outstanding: Decimal,
    pub market_value: Decimal,
    /// Latest authoritative balance per platform, summed.
    pub liquidity: Decimal,
    /// Fresh money deposited across all platforms.
    pub total_deposits: Decimal,
    /// `total_wealth - total_deposits`.
    pub net_gain: Decimal,
    pub gross_annual_rate_pct: f64,
    pub net_annual_rate_pct: f64,
    pub concentration: Option<ConcentrationMetrics>,
    pub risk: RiskMetrics,
    pub rolling: RollingReturns,
}

/// One platform's reconciled KPI block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformReport {
    pub invested_capital: Decimal,
    /// Outstanding loan capital, or the current market value for
    /// marked-to-market platforms.
    pub outstanding_capital: Decimal,
    pub capital_repaid: Decimal,
    pub repayment_rate_pct: f64,
    pub project_count: usize,
    pub gross_interest_received: Decimal,
    pub taxes_and_fees: Decimal,
    /// Gross interest received minus taxes and fees.
    pub realized_net_gain: Decimal,
    pub expected_future_interest: Decimal,
    pub gross_annual_rate_pct: f64,
    pub net_annual_rate_pct: f64,
    pub reinvestment_rate_pct: f64,
    pub maturity_indicator: f64,
    pub concentration: Option<ConcentrationMetrics>,
    pub duration: Option<DurationMetrics>,
    pub risk: RiskMetrics,
    pub rolling: RollingReturns,
    pub stress: StressScenarios,
    pub periodic: PeriodicPerformance,
}

/// Everything the run had to skip, clamp or leave unlinked.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDiagnostics {
    pub rejected_records: Vec<RecordRejection>,
    /// Flows with no resolved investment, ambiguous ones included.
    pub unlinked_flows: usize,
    /// Flows left unlinked because more than one investment matched.
    pub ambiguous_flows: Vec<String>,
    /// Headline rate solves that fell back to the closed-form
    /// approximation.
    pub fallback_rate_solves: usize,
    /// Headline rate solves that degraded to the neutral 0.
    pub neutral_rate_solves: usize,
    /// Investments whose derivation hit a structural inconsistency.
    pub investments_needing_review: Vec<String>,
}

/// The engine's best-effort output for one reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub as_of: NaiveDate,
    pub global: GlobalKpis,
    /// Platform label → KPI block, only for platforms present in the run.
    pub platforms: BTreeMap<String, PlatformReport>,
    pub diagnostics: RunDiagnostics,
}

impl Report {
    /// The report as a plain JSON tree, for consumers that do not link
    /// against the domain types.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
