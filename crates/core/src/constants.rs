use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Tolerance absorbing rounding noise when comparing capital amounts.
pub const CAPITAL_TOLERANCE: Decimal = dec!(0.01);

/// Lower bound of the plausible annualized-rate band.
pub const RATE_BAND_MIN: f64 = -0.95;

/// Upper bound of the plausible annualized-rate band.
pub const RATE_BAND_MAX: f64 = 5.0;

/// Actual/365.25 day-count denominator.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Average month length in days, used when deriving month counts from dates.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Trading days per year, for volatility annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Hard cap on root-finding iterations inside the rate solver.
pub const MAX_SOLVER_ITERATIONS: usize = 64;

/// Minimum normalized-key length accepted by the name matcher.
/// Shorter keys are all boilerplate and would match almost anything.
pub const MIN_MATCH_KEY_LEN: usize = 3;
