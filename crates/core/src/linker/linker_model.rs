//! Linker domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ledger::{CashFlow, Investment, LiquidityBalance, Platform, PortfolioPosition, RecordRejection};

/// How a flow was attached to its investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMethod {
    /// The raw record already carried a usable investment identifier.
    ExplicitKey,
    /// Normalized-name substring match against exactly one investment.
    NormalizedName,
    /// Matched against a row of the investment's amortization schedule.
    Schedule,
}

/// Outcome of resolving one flow. Ambiguity is a first-class result,
/// never an error: ambiguous flows stay unlinked and are surfaced in
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum LinkResolution {
    Linked {
        investment_id: String,
        method: LinkMethod,
    },
    Ambiguous {
        candidates: Vec<String>,
    },
    Unlinked,
}

impl LinkResolution {
    pub fn investment_id(&self) -> Option<&str> {
        match self {
            LinkResolution::Linked { investment_id, .. } => Some(investment_id),
            _ => None,
        }
    }

    pub fn is_linked(&self) -> bool {
        matches!(self, LinkResolution::Linked { .. })
    }
}

/// One row of a per-investment amortization schedule: installment number,
/// due date and the authoritative capital/interest/tax split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub investment_id: String,
    pub installment: u32,
    pub due_date: NaiveDate,
    pub capital_amount: Decimal,
    pub interest_amount: Decimal,
    pub tax_amount: Decimal,
}

/// Capital/interest/tax split of one flow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSplit {
    pub capital: Decimal,
    pub interest: Decimal,
    pub tax: Decimal,
}

/// The reconciled ledger: both sanitized batches plus the
/// flow→investment mapping and the schedule-sourced split overrides.
///
/// Everything here is immutable for the rest of the run; later stages
/// compute into fresh structures keyed by record id.
#[derive(Debug, Clone, Default)]
pub struct LinkedLedger {
    pub investments: Vec<Investment>,
    pub flows: Vec<CashFlow>,
    pub positions: Vec<PortfolioPosition>,
    pub balances: Vec<LiquidityBalance>,
    /// Flow id → resolution.
    pub links: HashMap<String, LinkResolution>,
    /// Flow id → authoritative split from a matched schedule row,
    /// overriding whatever split the raw flow implied.
    pub split_overrides: HashMap<String, FlowSplit>,
    /// Records excluded at the batch boundary.
    pub rejections: Vec<RecordRejection>,
}

static UNLINKED: LinkResolution = LinkResolution::Unlinked;

impl LinkedLedger {
    pub fn resolution(&self, flow_id: &str) -> &LinkResolution {
        self.links.get(flow_id).unwrap_or(&UNLINKED)
    }

    /// The investment a flow was linked to, if any.
    pub fn linked_investment_id(&self, flow: &CashFlow) -> Option<&str> {
        self.resolution(&flow.id).investment_id()
    }

    /// The effective split of a flow: the schedule override when one
    /// matched, the flow's own components otherwise.
    pub fn split_for(&self, flow: &CashFlow) -> FlowSplit {
        self.split_overrides
            .get(&flow.id)
            .copied()
            .unwrap_or(FlowSplit {
                capital: flow.capital_amount,
                interest: flow.interest_amount,
                tax: flow.tax_amount,
            })
    }

    /// All flows linked to the given investment, in ledger order.
    pub fn flows_linked_to(&self, investment_id: &str) -> Vec<&CashFlow> {
        self.flows
            .iter()
            .filter(|f| self.linked_investment_id(f) == Some(investment_id))
            .collect()
    }

    pub fn platform_investments(&self, platform: Platform) -> Vec<&Investment> {
        self.investments.iter().filter(|i| i.platform == platform).collect()
    }

    pub fn platform_flows(&self, platform: Platform) -> Vec<&CashFlow> {
        self.flows.iter().filter(|f| f.platform == platform).collect()
    }

    pub fn platform_positions(&self, platform: Platform) -> Vec<&PortfolioPosition> {
        self.positions.iter().filter(|p| p.platform == platform).collect()
    }

    /// Ids of flows left unlinked because more than one investment matched.
    pub fn ambiguous_flow_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .links
            .iter()
            .filter(|(_, r)| matches!(r, LinkResolution::Ambiguous { .. }))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of flows with no resolved investment (ambiguous included).
    pub fn unlinked_flow_count(&self) -> usize {
        self.flows
            .iter()
            .filter(|f| !self.resolution(&f.id).is_linked())
            .count()
    }
}
