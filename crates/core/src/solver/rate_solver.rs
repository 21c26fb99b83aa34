//! Annualized internal rate of return from an irregular dated flow
//! sequence (XIRR).
//!
//! The solver finds `r` such that
//! `NPV(r) = Σ amount_i / (1 + r)^((date_i − date_0) / 365.25)` is zero.
//! Solving is an explicit ordered ladder of strategies, each producing a
//! tagged outcome, composed by a small loop rather than nested error
//! handling: Newton from 0.10, Newton from −0.10, the closed-form
//! approximation, then the neutral default.
//!
//! The annualized rate is a reporting field, not a precondition for the
//! rest of the pipeline: every degenerate input (fewer than two flows,
//! one-signed batches, zero-length periods, non-convergence) degrades to
//! `0.0` instead of propagating an error, and the result is always
//! finite and inside the plausible band.

use chrono::NaiveDate;
use log::debug;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::constants::{DAYS_PER_YEAR, MAX_SOLVER_ITERATIONS, RATE_BAND_MAX, RATE_BAND_MIN};

/// Rates below this are treated as a degenerate discounting base.
const RATE_FLOOR: f64 = -0.999_999;

/// Newton seeds tried in order.
const NEWTON_SEEDS: [f64; 2] = [0.10, -0.10];

/// Outcome of one solving strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveOutcome {
    Converged(f64),
    /// Converged numerically but outside the plausible band.
    OutOfBand(f64),
    Failed,
}

/// Which rung of the strategy ladder produced the final rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    Primary,
    AlternateSeed,
    ClosedForm,
    Neutral,
}

/// A solved annualized rate and how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSolve {
    pub annual_rate: f64,
    pub method: SolveMethod,
}

/// Solves the annualized rate for a dated, signed flow sequence.
/// Convenience wrapper over [`solve_rate_detailed`].
pub fn solve_rate(flows: &[(NaiveDate, Decimal)]) -> f64 {
    solve_rate_detailed(flows).annual_rate
}

/// Solves the annualized rate, reporting which strategy produced it.
pub fn solve_rate_detailed(flows: &[(NaiveDate, Decimal)]) -> RateSolve {
    let neutral = RateSolve {
        annual_rate: 0.0,
        method: SolveMethod::Neutral,
    };

    if flows.len() < 2 {
        return neutral;
    }

    let mut dated: Vec<(NaiveDate, f64)> = flows
        .iter()
        .map(|(date, amount)| (*date, amount.to_f64().unwrap_or(0.0)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);

    let base_date = dated[0].0;
    let last_date = dated[dated.len() - 1].0;
    if base_date == last_date {
        return neutral;
    }

    let has_outflow = dated.iter().any(|(_, a)| *a < 0.0);
    let has_inflow = dated.iter().any(|(_, a)| *a > 0.0);
    if !has_outflow || !has_inflow {
        return neutral;
    }

    // Day granularity: dates are already calendar days, the year count
    // is actual/365.25.
    let timed: Vec<(f64, f64)> = dated
        .iter()
        .map(|(date, amount)| (((*date - base_date).num_days() as f64) / DAYS_PER_YEAR, *amount))
        .collect();

    for (index, seed) in NEWTON_SEEDS.iter().enumerate() {
        if let SolveOutcome::Converged(rate) = newton(&timed, *seed) {
            return RateSolve {
                annual_rate: rate,
                method: if index == 0 {
                    SolveMethod::Primary
                } else {
                    SolveMethod::AlternateSeed
                },
            };
        }
    }

    if let SolveOutcome::Converged(rate) = closed_form(&timed) {
        debug!("Rate solve fell back to the closed-form approximation: {rate:.4}");
        return RateSolve {
            annual_rate: rate,
            method: SolveMethod::ClosedForm,
        };
    }

    neutral
}

fn in_band(rate: f64) -> bool {
    (RATE_BAND_MIN..=RATE_BAND_MAX).contains(&rate)
}

fn npv(rate: f64, timed: &[(f64, f64)]) -> f64 {
    timed
        .iter()
        .map(|(years, amount)| amount / (1.0 + rate).powf(*years))
        .sum()
}

fn npv_derivative(rate: f64, timed: &[(f64, f64)]) -> f64 {
    timed
        .iter()
        .map(|(years, amount)| -years * amount / (1.0 + rate).powf(years + 1.0))
        .sum()
}

/// Newton iteration with a fixed cap; no unbounded retry loop.
fn newton(timed: &[(f64, f64)], seed: f64) -> SolveOutcome {
    let scale: f64 = timed.iter().map(|(_, a)| a.abs()).sum::<f64>().max(1.0);
    let tolerance = 1e-8 * scale;

    let mut rate = seed;
    for _ in 0..MAX_SOLVER_ITERATIONS {
        let value = npv(rate, timed);
        if !value.is_finite() {
            return SolveOutcome::Failed;
        }
        if value.abs() <= tolerance {
            return if in_band(rate) {
                SolveOutcome::Converged(rate)
            } else {
                SolveOutcome::OutOfBand(rate)
            };
        }

        let derivative = npv_derivative(rate, timed);
        if !derivative.is_finite() || derivative.abs() < f64::EPSILON {
            return SolveOutcome::Failed;
        }

        let mut next = rate - value / derivative;
        if !next.is_finite() {
            return SolveOutcome::Failed;
        }
        // Keep the discounting base positive: step toward the floor
        // instead of jumping past it.
        if next <= RATE_FLOOR {
            next = (rate + RATE_FLOOR) / 2.0;
        }
        if (next - rate).abs() < 1e-12 {
            rate = next;
            break;
        }
        rate = next;
    }

    let value = npv(rate, timed);
    if value.is_finite() && value.abs() <= tolerance {
        if in_band(rate) {
            SolveOutcome::Converged(rate)
        } else {
            SolveOutcome::OutOfBand(rate)
        }
    } else {
        SolveOutcome::Failed
    }
}

/// Closed-form approximation from the first and last flow dates:
/// `(total_in / total_out)^(1 / years) − 1`.
fn closed_form(timed: &[(f64, f64)]) -> SolveOutcome {
    let total_in: f64 = timed.iter().map(|(_, a)| a.max(0.0)).sum();
    let total_out: f64 = timed.iter().map(|(_, a)| (-a).max(0.0)).sum();
    let years = timed.last().map(|(y, _)| *y).unwrap_or(0.0);

    if total_in <= 0.0 || total_out <= 0.0 || years <= 0.0 {
        return SolveOutcome::Failed;
    }

    let rate = (total_in / total_out).powf(1.0 / years) - 1.0;
    if !rate.is_finite() {
        return SolveOutcome::Failed;
    }
    if in_band(rate) {
        SolveOutcome::Converged(rate)
    } else {
        SolveOutcome::OutOfBand(rate)
    }
}
