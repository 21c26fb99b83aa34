//! Cross-source flow→investment resolution.
//!
//! Resolution order per flow, first match wins: explicit key carried by
//! the record, normalized-name match against exactly one investment,
//! then schedule match for repayments. The resolver is a pure function
//! of its input batches: same batches always yield the same mapping,
//! independent of record ordering, so re-running it is idempotent.
//!
//! The linker never creates an investment; it only attaches an existing
//! identifier or leaves the flow unlinked.

use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::constants::MIN_MATCH_KEY_LEN;
use crate::ledger::{CashFlow, FlowKind, Investment, LedgerBatch, LiquidityBalance, PortfolioPosition};
use crate::linker::name_normalizer::{normalize_match_key, strip_boilerplate};
use crate::linker::{FlowSplit, LinkMethod, LinkResolution, LinkedLedger, ScheduleEntry};

/// Installment number in a repayment description, e.g.
/// "Remboursement mensualité n°12" or "Échéance 4 - Villa Marguerite".
static INSTALLMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:n\s*°|mensualit[eé]|[eé]ch[eé]ance)\s*(\d{1,3})")
        .expect("invalid installment regex")
});

/// Resolves every flow of the batch against the investment batch and the
/// amortization schedules, producing the reconciled ledger.
pub fn link_flows(
    batch: LedgerBatch,
    schedules: &[ScheduleEntry],
    positions: Vec<PortfolioPosition>,
    balances: Vec<LiquidityBalance>,
) -> LinkedLedger {
    let LedgerBatch {
        mut investments,
        mut flows,
        rejections,
    } = batch;

    // Stable record order keeps downstream iteration (and therefore the
    // report) independent of how the extraction layer ordered its output.
    investments.sort_by(|a, b| a.id.cmp(&b.id));
    flows.sort_by(|a, b| (a.transaction_date, a.id.as_str()).cmp(&(b.transaction_date, b.id.as_str())));

    let by_id: HashMap<&str, &Investment> =
        investments.iter().map(|i| (i.id.as_str(), i)).collect();

    // Precomputed normalized (counterparty, project) keys, skipping
    // investments whose key reduces to nothing.
    let name_keys: Vec<(&Investment, String)> = investments
        .iter()
        .map(|inv| {
            let key = normalize_match_key(&format!("{} {}", inv.counterparty, inv.project_name));
            (inv, key)
        })
        .filter(|(_, key)| key.len() >= MIN_MATCH_KEY_LEN)
        .collect();

    let mut schedule_by_investment: HashMap<&str, Vec<&ScheduleEntry>> = HashMap::new();
    for entry in schedules {
        schedule_by_investment
            .entry(entry.investment_id.as_str())
            .or_default()
            .push(entry);
    }

    let mut links: HashMap<String, LinkResolution> = HashMap::with_capacity(flows.len());
    let mut split_overrides: HashMap<String, FlowSplit> = HashMap::new();

    for flow in &flows {
        let resolution = resolve_flow(flow, &by_id, &name_keys, schedules);

        if let LinkResolution::Linked { investment_id, .. } = &resolution {
            if flow.kind == FlowKind::Repayment {
                if let Some(rows) = schedule_by_investment.get(investment_id.as_str()) {
                    if let Some(row) = match_schedule_row(flow, rows) {
                        split_overrides.insert(
                            flow.id.clone(),
                            FlowSplit {
                                capital: row.capital_amount,
                                interest: row.interest_amount,
                                tax: row.tax_amount,
                            },
                        );
                    }
                }
            }
        }

        links.insert(flow.id.clone(), resolution);
    }

    LinkedLedger {
        investments,
        flows,
        positions,
        balances,
        links,
        split_overrides,
        rejections,
    }
}

fn resolve_flow(
    flow: &CashFlow,
    by_id: &HashMap<&str, &Investment>,
    name_keys: &[(&Investment, String)],
    schedules: &[ScheduleEntry],
) -> LinkResolution {
    // 1. Explicit key carried by the record, same platform.
    if let Some(declared) = flow.investment_id.as_deref() {
        if let Some(investment) = by_id.get(declared) {
            if investment.platform == flow.platform {
                return LinkResolution::Linked {
                    investment_id: declared.to_string(),
                    method: LinkMethod::ExplicitKey,
                };
            }
        }
    }

    // 2. Normalized-name match, substring in either direction, against
    //    exactly one investment. Ties are left unlinked rather than guessed.
    let flow_key = strip_boilerplate(&normalize_match_key(&flow.description));
    if flow_key.len() >= MIN_MATCH_KEY_LEN {
        let candidates: Vec<&Investment> = name_keys
            .iter()
            .filter(|(inv, key)| {
                inv.platform == flow.platform
                    && (flow_key.contains(key.as_str()) || key.contains(flow_key.as_str()))
            })
            .map(|(inv, _)| *inv)
            .collect();

        match candidates.len() {
            1 => {
                return LinkResolution::Linked {
                    investment_id: candidates[0].id.clone(),
                    method: LinkMethod::NormalizedName,
                };
            }
            n if n > 1 => {
                let mut ids: Vec<String> = candidates.iter().map(|i| i.id.clone()).collect();
                ids.sort();
                debug!(
                    "Flow '{}' matches {} investments by name ({}); leaving unlinked",
                    flow.id,
                    n,
                    ids.join(", ")
                );
                return LinkResolution::Ambiguous { candidates: ids };
            }
            _ => {}
        }
    }

    // 3. Schedule match for repayments: installment number parsed from
    //    the description, else exact date.
    if flow.kind == FlowKind::Repayment {
        let platform_rows: Vec<&ScheduleEntry> = schedules
            .iter()
            .filter(|row| {
                by_id
                    .get(row.investment_id.as_str())
                    .is_some_and(|inv| inv.platform == flow.platform)
            })
            .collect();

        if let Some(row) = match_schedule_row(flow, &platform_rows) {
            return LinkResolution::Linked {
                investment_id: row.investment_id.clone(),
                method: LinkMethod::Schedule,
            };
        }

        // More than one schedule row fits: ambiguity, not a guess.
        let date_matches = candidate_investment_ids(flow, &platform_rows);
        if date_matches.len() > 1 {
            debug!(
                "Repayment '{}' matches schedule rows of {} investments; leaving unlinked",
                flow.id,
                date_matches.len()
            );
            return LinkResolution::Ambiguous {
                candidates: date_matches,
            };
        }
    }

    LinkResolution::Unlinked
}

/// The unique schedule row matching a repayment flow: by installment
/// number when one can be parsed from the description, else by due date.
/// Returns `None` when no row, or more than one row, fits.
fn match_schedule_row<'a>(flow: &CashFlow, rows: &[&'a ScheduleEntry]) -> Option<&'a ScheduleEntry> {
    if let Some(installment) = parse_installment(&flow.description) {
        let matches: Vec<&ScheduleEntry> = rows
            .iter()
            .copied()
            .filter(|row| row.installment == installment)
            .collect();
        if matches.len() == 1 {
            return Some(matches[0]);
        }
    }

    let matches: Vec<&ScheduleEntry> = rows
        .iter()
        .copied()
        .filter(|row| row.due_date == flow.transaction_date)
        .collect();
    if matches.len() == 1 {
        return Some(matches[0]);
    }
    None
}

/// Distinct investment ids of the schedule rows whose due date equals the
/// flow's transaction date, sorted.
fn candidate_investment_ids(flow: &CashFlow, rows: &[&ScheduleEntry]) -> Vec<String> {
    let mut ids: Vec<String> = rows
        .iter()
        .filter(|row| row.due_date == flow.transaction_date)
        .map(|row| row.investment_id.clone())
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

fn parse_installment(description: &str) -> Option<u32> {
    INSTALLMENT_RE
        .captures(description)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
