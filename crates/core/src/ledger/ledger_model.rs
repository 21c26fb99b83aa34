//! Canonical ledger domain models.
//!
//! These are the immutable value types every later stage consumes. They
//! carry no derived state: capital repaid, outstanding capital and the
//! delay flag are recomputed each run by the lifecycle deriver and live
//! on its output, never on the sourced record.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

/// Source platform of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "La Première Brique")]
    LaPremiereBrique,
    #[serde(rename = "PretUp")]
    PretUp,
    #[serde(rename = "BienPrêter")]
    BienPreter,
    #[serde(rename = "Homunity")]
    Homunity,
    #[serde(rename = "PEA")]
    Pea,
    #[serde(rename = "Assurance_Vie")]
    AssuranceVie,
}

/// How a platform reports value: discrete capital events (crowdfunding
/// loans) or marked-to-market valuations (brokerage, insurance wrapper).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    CapitalEvents,
    MarkToMarket,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::LaPremiereBrique,
        Platform::PretUp,
        Platform::BienPreter,
        Platform::Homunity,
        Platform::Pea,
        Platform::AssuranceVie,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LaPremiereBrique => "La Première Brique",
            Platform::PretUp => "PretUp",
            Platform::BienPreter => "BienPrêter",
            Platform::Homunity => "Homunity",
            Platform::Pea => "PEA",
            Platform::AssuranceVie => "Assurance_Vie",
        }
    }

    pub fn kind(&self) -> PlatformKind {
        match self {
            Platform::Pea | Platform::AssuranceVie => PlatformKind::MarkToMarket,
            _ => PlatformKind::CapitalEvents,
        }
    }

    pub fn is_mark_to_market(&self) -> bool {
        self.kind() == PlatformKind::MarkToMarket
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ValidationError;

    /// Accepts both the canonical label and the short aliases used by
    /// the extraction layer's file naming.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "la première brique" | "la premiere brique" | "lpb" => Ok(Platform::LaPremiereBrique),
            "pretup" => Ok(Platform::PretUp),
            "bienprêter" | "bienpreter" => Ok(Platform::BienPreter),
            "homunity" => Ok(Platform::Homunity),
            "pea" => Ok(Platform::Pea),
            "assurance_vie" | "assurance vie" | "av" => Ok(Platform::AssuranceVie),
            other => Err(ValidationError::UnknownPlatform(other.to_string())),
        }
    }
}

/// Kind of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Deposit,
    Withdrawal,
    /// Cash leaving the platform wallet into a specific project.
    #[serde(rename = "investment")]
    InvestmentOutflow,
    Repayment,
    Interest,
    Dividend,
    Fee,
    Tax,
    Sale,
    Purchase,
    Adjustment,
    Other,
}

/// Direction of a flow relative to the investor's pocket: deposits and
/// investment subscriptions are `out` (money committed to a platform),
/// repayments, interest and withdrawals back to the bank are `in`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    In,
    Out,
}

impl FlowDirection {
    pub fn sign(&self) -> Decimal {
        match self {
            FlowDirection::In => Decimal::ONE,
            FlowDirection::Out => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowDirection::In => f.write_str("in"),
            FlowDirection::Out => f.write_str("out"),
        }
    }
}

/// Lifecycle status of an investment.
///
/// `Completed` and `Defaulted` are terminal; `Delayed` and `InProcedure`
/// are recoverable on later data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStatus {
    #[default]
    Active,
    Completed,
    Delayed,
    InProcedure,
    Defaulted,
}

impl InvestmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvestmentStatus::Completed | InvestmentStatus::Defaulted)
    }
}

/// A capital position opened on one platform, as sourced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: String,
    pub platform: Platform,
    pub project_name: String,
    pub counterparty: String,
    pub invested_amount: Decimal,
    /// Nominal annual rate in percent, when the platform exposes one.
    pub annual_rate: Option<Decimal>,
    /// Contractual duration in whole months.
    pub duration_months: Option<u32>,
    pub investment_date: NaiveDate,
    pub expected_end_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,
    /// Lifecycle status as reported by the source export.
    pub status: InvestmentStatus,
    /// Capital-repaid figure carried by some position tables. The
    /// transaction log wins whenever linked repayment flows exist; this
    /// hint is only consulted when none do.
    pub source_capital_repaid: Option<Decimal>,
}

/// One dated, signed money movement.
///
/// A flow references at most one investment (a weak relation resolved by
/// the linker when the export carries no usable key); an investment never
/// owns its flows.
///
/// Invariants: `sign(net_amount)` matches `direction`, and
/// `gross_amount >= |net_amount|`. Both are enforced at batch intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlow {
    pub id: String,
    pub investment_id: Option<String>,
    pub platform: Platform,
    pub kind: FlowKind,
    pub direction: FlowDirection,
    pub gross_amount: Decimal,
    /// Net amount, signed: negative when `direction` is `out`.
    pub net_amount: Decimal,
    pub tax_amount: Decimal,
    /// Capital component of a repayment, when the platform splits it out.
    pub capital_amount: Decimal,
    /// Interest component, when the platform splits it out.
    pub interest_amount: Decimal,
    pub transaction_date: NaiveDate,
    pub description: String,
}

impl CashFlow {
    /// Gross amount with the direction's sign applied.
    pub fn signed_gross(&self) -> Decimal {
        self.gross_amount * self.direction.sign()
    }

    pub fn is_inbound(&self) -> bool {
        self.direction == FlowDirection::In
    }
}

/// A marked-to-market holding, used for platforms that report valuations
/// rather than discrete capital events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPosition {
    pub id: String,
    pub platform: Platform,
    /// Security code, e.g. an ISIN.
    pub asset_id: String,
    pub asset_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub market_value: Decimal,
    pub valuation_date: NaiveDate,
}

/// A point-in-time cash balance on a platform. Only the most recent
/// balance per platform is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityBalance {
    pub platform: Platform,
    pub balance_date: NaiveDate,
    pub amount: Decimal,
}
