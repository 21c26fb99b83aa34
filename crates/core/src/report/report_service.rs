//! Report assembly.
//!
//! Consumes the reconciled ledger and the derived states and produces
//! the per-platform and global KPI blocks. Platforms are independent of
//! each other, so their blocks are built in parallel; the four-stage
//! pipeline order within a platform is already settled by the time this
//! stage runs.

use chrono::NaiveDate;
use log::debug;
use num_traits::ToPrimitive;
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::analytics::{
    concentration, duration_metrics, expected_future_interest, maturity_indicator,
    periodic_performance, reinvestment_rate_pct, risk_metrics, rolling_returns, stress_scenarios,
};
use crate::ledger::{CashFlow, FlowDirection, FlowKind, Investment, Platform, PortfolioPosition};
use crate::lifecycle::DerivedStates;
use crate::linker::LinkedLedger;
use crate::report::{GlobalKpis, PlatformReport, Report, RunDiagnostics};
use crate::solver::{solve_rate_detailed, SolveMethod};

/// How many headline solves degraded, tallied into diagnostics.
#[derive(Debug, Default, Clone, Copy)]
struct SolveTally {
    fallback: usize,
    neutral: usize,
}

impl SolveTally {
    fn record(&mut self, method: SolveMethod) {
        match method {
            SolveMethod::ClosedForm => self.fallback += 1,
            SolveMethod::Neutral => self.neutral += 1,
            _ => {}
        }
    }

    fn merge(&mut self, other: SolveTally) {
        self.fallback += other.fallback;
        self.neutral += other.neutral;
    }
}

/// Builds the full report for one reconciliation run.
pub fn aggregate(ledger: &LinkedLedger, states: &DerivedStates, as_of: NaiveDate) -> Report {
    let platforms = present_platforms(ledger);
    debug!("Aggregating report for {} platform(s)", platforms.len());

    let portfolio_capital = total_portfolio_capital(ledger);

    let per_platform: Vec<(Platform, PlatformReport, SolveTally)> = platforms
        .par_iter()
        .map(|platform| {
            let (report, tally) =
                build_platform_report(*platform, ledger, states, as_of, portfolio_capital);
            (*platform, report, tally)
        })
        .collect();

    let mut platform_reports = BTreeMap::new();
    let mut tally = SolveTally::default();
    for (platform, report, platform_tally) in per_platform {
        platform_reports.insert(platform.as_str().to_string(), report);
        tally.merge(platform_tally);
    }

    let (global, global_tally) = build_global_kpis(ledger, states, as_of);
    tally.merge(global_tally);

    let mut investments_needing_review: Vec<String> = states
        .values()
        .filter(|s| s.needs_review)
        .map(|s| s.investment_id.clone())
        .collect();
    investments_needing_review.sort();

    Report {
        as_of,
        global,
        platforms: platform_reports,
        diagnostics: RunDiagnostics {
            rejected_records: ledger.rejections.clone(),
            unlinked_flows: ledger.unlinked_flow_count(),
            ambiguous_flows: ledger.ambiguous_flow_ids(),
            fallback_rate_solves: tally.fallback,
            neutral_rate_solves: tally.neutral,
            investments_needing_review,
        },
    }
}

fn build_platform_report(
    platform: Platform,
    ledger: &LinkedLedger,
    states: &DerivedStates,
    as_of: NaiveDate,
    portfolio_capital: Decimal,
) -> (PlatformReport, SolveTally) {
    let investments = ledger.platform_investments(platform);
    let flows = ledger.platform_flows(platform);
    let positions = ledger.platform_positions(platform);
    let is_mtm = platform.is_mark_to_market();

    let market_value = latest_market_value(&positions);

    // Marked-to-market platforms report deposits as their cost basis;
    // lending platforms report the sum of their positions.
    let invested_capital: Decimal = if is_mtm {
        flows
            .iter()
            .filter(|f| f.kind == FlowKind::Deposit)
            .map(|f| f.gross_amount)
            .sum()
    } else {
        investments.iter().map(|i| i.invested_amount).sum()
    };

    let capital_repaid: Decimal = investments
        .iter()
        .filter_map(|i| states.get(&i.id))
        .map(|s| s.capital_repaid)
        .sum();

    let outstanding_capital: Decimal = if is_mtm {
        market_value
    } else {
        investments
            .iter()
            .filter_map(|i| states.get(&i.id))
            .map(|s| s.outstanding_capital)
            .sum()
    };

    let repayment_rate_pct = pct_ratio(capital_repaid, invested_capital);

    let gross_interest_received: Decimal = flows
        .iter()
        .filter(|f| {
            f.is_inbound()
                && matches!(f.kind, FlowKind::Repayment | FlowKind::Interest | FlowKind::Dividend)
        })
        .map(|f| ledger.split_for(f).interest)
        .sum();

    let taxes_and_fees = sum_taxes_and_fees(&flows, ledger);
    let realized_net_gain = gross_interest_received - taxes_and_fees;

    let mut tally = SolveTally::default();
    let gross_solve = solve_rate_detailed(&rate_flows(
        &flows,
        &investments,
        ledger,
        outstanding_capital,
        as_of,
        AmountBasis::Gross,
    ));
    tally.record(gross_solve.method);
    let net_solve = solve_rate_detailed(&rate_flows(
        &flows,
        &investments,
        ledger,
        outstanding_capital,
        as_of,
        AmountBasis::Net,
    ));
    tally.record(net_solve.method);

    let duration = (!is_mtm).then(|| duration_metrics(&investments, states, as_of));
    let projected_6m = duration
        .as_ref()
        .map(|d| d.projected_liquidity.within_6m)
        .unwrap_or(Decimal::ZERO);
    let weighted_months = duration
        .as_ref()
        .map(|d| d.weighted_average_months)
        .unwrap_or(0.0);

    let reinvestment = reinvestment_rate_pct(&flows);
    let net_pairs = rate_flows(
        &flows,
        &investments,
        ledger,
        Decimal::ZERO,
        as_of,
        AmountBasis::Net,
    );

    let report = PlatformReport {
        invested_capital,
        outstanding_capital,
        capital_repaid,
        repayment_rate_pct,
        project_count: if is_mtm { positions.len() } else { investments.len() },
        gross_interest_received,
        taxes_and_fees,
        realized_net_gain,
        expected_future_interest: expected_future_interest(&investments, states, as_of),
        gross_annual_rate_pct: gross_solve.annual_rate * 100.0,
        net_annual_rate_pct: net_solve.annual_rate * 100.0,
        reinvestment_rate_pct: reinvestment,
        maturity_indicator: maturity_indicator(
            repayment_rate_pct,
            projected_6m,
            outstanding_capital,
            weighted_months,
            reinvestment,
        ),
        concentration: concentration(&investments),
        duration,
        risk: risk_metrics(&flows),
        rolling: rolling_returns(&net_pairs, outstanding_capital, as_of),
        stress: stress_scenarios(
            platform,
            &investments,
            states,
            market_value,
            invested_capital,
            portfolio_capital,
        ),
        periodic: periodic_performance(&flows, ledger),
    };

    (report, tally)
}

fn build_global_kpis(
    ledger: &LinkedLedger,
    states: &DerivedStates,
    as_of: NaiveDate,
) -> (GlobalKpis, SolveTally) {
    let crowdfunding_outstanding: Decimal = ledger
        .investments
        .iter()
        .filter(|i| !i.platform.is_mark_to_market())
        .filter_map(|i| states.get(&i.id))
        .map(|s| s.outstanding_capital)
        .sum();

    let market_value: Decimal = Platform::ALL
        .iter()
        .filter(|p| p.is_mark_to_market())
        .map(|p| latest_market_value(&ledger.platform_positions(*p)))
        .sum();

    let liquidity = latest_liquidity(ledger);
    let total_wealth = crowdfunding_outstanding + market_value + liquidity;

    let total_deposits: Decimal = ledger
        .flows
        .iter()
        .filter(|f| f.kind == FlowKind::Deposit)
        .map(|f| f.gross_amount)
        .sum();

    let all_flows: Vec<&CashFlow> = ledger.flows.iter().collect();
    let all_investments: Vec<&Investment> = ledger.investments.iter().collect();

    let mut tally = SolveTally::default();
    let gross_solve = solve_rate_detailed(&rate_flows(
        &all_flows,
        &all_investments,
        ledger,
        total_wealth,
        as_of,
        AmountBasis::Gross,
    ));
    tally.record(gross_solve.method);
    let net_solve = solve_rate_detailed(&rate_flows(
        &all_flows,
        &all_investments,
        ledger,
        total_wealth,
        as_of,
        AmountBasis::Net,
    ));
    tally.record(net_solve.method);

    let net_pairs = rate_flows(
        &all_flows,
        &all_investments,
        ledger,
        Decimal::ZERO,
        as_of,
        AmountBasis::Net,
    );

    let kpis = GlobalKpis {
        total_wealth,
        crowdfunding_outstanding,
        market_value,
        liquidity,
        total_deposits,
        net_gain: total_wealth - total_deposits,
        gross_annual_rate_pct: gross_solve.annual_rate * 100.0,
        net_annual_rate_pct: net_solve.annual_rate * 100.0,
        concentration: concentration(&all_investments),
        risk: risk_metrics(&all_flows),
        rolling: rolling_returns(&net_pairs, total_wealth, as_of),
    };

    (kpis, tally)
}

/// Amount basis for rate solving: gross ignores taxes, net includes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AmountBasis {
    Gross,
    Net,
}

/// The signed flow sequence fed to the rate solver: every ledger flow,
/// a synthetic initial outflow for investments whose subscription never
/// appeared in the transaction log, and a synthetic terminal inflow at
/// the current value when one exists.
fn rate_flows(
    flows: &[&CashFlow],
    investments: &[&Investment],
    ledger: &LinkedLedger,
    terminal_value: Decimal,
    as_of: NaiveDate,
    basis: AmountBasis,
) -> Vec<(NaiveDate, Decimal)> {
    let mut sequence: Vec<(NaiveDate, Decimal)> = flows
        .iter()
        .map(|f| {
            let amount = match basis {
                AmountBasis::Gross => f.signed_gross(),
                AmountBasis::Net => f.net_amount,
            };
            (f.transaction_date, amount)
        })
        .collect();

    let mut covered: BTreeSet<&str> = BTreeSet::new();
    for flow in flows {
        if flow.kind == FlowKind::InvestmentOutflow && flow.direction == FlowDirection::Out {
            if let Some(id) = ledger.linked_investment_id(flow) {
                covered.insert(id);
            }
        }
    }
    for investment in investments {
        if investment.invested_amount > Decimal::ZERO && !covered.contains(investment.id.as_str()) {
            sequence.push((investment.investment_date, -investment.invested_amount));
        }
    }

    if terminal_value > Decimal::ZERO {
        sequence.push((as_of, terminal_value));
    }

    sequence
}

/// Tax components of every flow plus the full amount of fee/tax flows.
fn sum_taxes_and_fees(flows: &[&CashFlow], ledger: &LinkedLedger) -> Decimal {
    let components: Decimal = flows.iter().map(|f| ledger.split_for(f).tax).sum();
    let standalone: Decimal = flows
        .iter()
        .filter(|f| matches!(f.kind, FlowKind::Fee | FlowKind::Tax))
        .map(|f| f.gross_amount)
        .sum();
    components + standalone
}

/// Sum of the latest valuation per asset: positions are point-in-time
/// rows, only the most recent one per asset counts.
fn latest_market_value(positions: &[&PortfolioPosition]) -> Decimal {
    let mut latest: HashMap<(&str, &str), &PortfolioPosition> = HashMap::new();
    for position in positions {
        let key = (position.asset_id.as_str(), position.asset_name.as_str());
        let keep = latest
            .get(&key)
            .map(|current| position.valuation_date > current.valuation_date)
            .unwrap_or(true);
        if keep {
            latest.insert(key, position);
        }
    }
    latest.values().map(|p| p.market_value).sum()
}

/// Sum over platforms of the most recent cash balance.
fn latest_liquidity(ledger: &LinkedLedger) -> Decimal {
    let mut latest: HashMap<Platform, (NaiveDate, Decimal)> = HashMap::new();
    for balance in &ledger.balances {
        let keep = latest
            .get(&balance.platform)
            .map(|(date, _)| balance.balance_date > *date)
            .unwrap_or(true);
        if keep {
            latest.insert(balance.platform, (balance.balance_date, balance.amount));
        }
    }
    latest.values().map(|(_, amount)| *amount).sum()
}

fn total_portfolio_capital(ledger: &LinkedLedger) -> Decimal {
    let invested: Decimal = ledger.investments.iter().map(|i| i.invested_amount).sum();
    let market: Decimal = Platform::ALL
        .iter()
        .filter(|p| p.is_mark_to_market())
        .map(|p| latest_market_value(&ledger.platform_positions(*p)))
        .sum();
    invested + market
}

fn present_platforms(ledger: &LinkedLedger) -> Vec<Platform> {
    let mut present: BTreeSet<Platform> = BTreeSet::new();
    present.extend(ledger.investments.iter().map(|i| i.platform));
    present.extend(ledger.flows.iter().map(|f| f.platform));
    present.extend(ledger.positions.iter().map(|p| p.platform));
    present.extend(ledger.balances.iter().map(|b| b.platform));
    present.into_iter().collect()
}

fn pct_ratio(part: Decimal, whole: Decimal) -> f64 {
    if whole > Decimal::ZERO {
        (part / whole).to_f64().unwrap_or(0.0) * 100.0
    } else {
        0.0
    }
}
