//! Monthly and annual realized-gain tables.
//!
//! Net gain per flow is its interest component minus its tax component;
//! fee flows count fully negative. Buckets are calendar months and years.

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::ledger::{CashFlow, FlowKind};
use crate::linker::LinkedLedger;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicPerformance {
    /// "YYYY-MM" → net gain of the month.
    pub monthly: BTreeMap<String, Decimal>,
    /// "YYYY" → net gain of the year.
    pub annual: BTreeMap<String, Decimal>,
}

/// Net-gain tables over a flow batch, using the schedule-corrected
/// splits where the linker found one.
pub fn periodic_performance(flows: &[&CashFlow], ledger: &LinkedLedger) -> PeriodicPerformance {
    let mut performance = PeriodicPerformance::default();

    for flow in flows {
        let net_gain = match flow.kind {
            FlowKind::Fee => -flow.gross_amount,
            _ => {
                let split = ledger.split_for(flow);
                split.interest - split.tax
            }
        };
        if net_gain.is_zero() {
            continue;
        }

        let month_key = format!("{:04}-{:02}", flow.transaction_date.year(), flow.transaction_date.month());
        let year_key = format!("{:04}", flow.transaction_date.year());
        *performance.monthly.entry(month_key).or_insert(Decimal::ZERO) += net_gain;
        *performance.annual.entry(year_key).or_insert(Decimal::ZERO) += net_gain;
    }

    performance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{FlowDirection, Platform};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flow(id: &str, kind: FlowKind, interest: Decimal, tax: Decimal, on: NaiveDate) -> CashFlow {
        CashFlow {
            id: id.to_string(),
            investment_id: None,
            platform: Platform::LaPremiereBrique,
            kind,
            direction: FlowDirection::In,
            gross_amount: dec!(100),
            net_amount: dec!(100),
            tax_amount: tax,
            capital_amount: Decimal::ZERO,
            interest_amount: interest,
            transaction_date: on,
            description: String::new(),
        }
    }

    #[test]
    fn test_gains_bucket_by_month_and_year() {
        let flows = [
            flow("a", FlowKind::Repayment, dec!(20), dec!(5), date(2023, 1, 10)),
            flow("b", FlowKind::Repayment, dec!(10), dec!(2), date(2023, 1, 25)),
            flow("c", FlowKind::Interest, dec!(30), dec!(0), date(2023, 4, 2)),
        ];
        let refs: Vec<&CashFlow> = flows.iter().collect();
        let ledger = LinkedLedger::default();
        let performance = periodic_performance(&refs, &ledger);

        assert_eq!(performance.monthly["2023-01"], dec!(23));
        assert_eq!(performance.monthly["2023-04"], dec!(30));
        assert_eq!(performance.annual["2023"], dec!(53));
    }

    #[test]
    fn test_fees_count_fully_negative() {
        let mut fee = flow("f", FlowKind::Fee, dec!(0), dec!(0), date(2023, 2, 1));
        fee.direction = FlowDirection::Out;
        fee.net_amount = dec!(-100);
        let refs: Vec<&CashFlow> = [&fee].to_vec();
        let ledger = LinkedLedger::default();
        let performance = periodic_performance(&refs, &ledger);
        assert_eq!(performance.monthly["2023-02"], dec!(-100));
    }

    #[test]
    fn test_empty_flows_are_neutral() {
        let ledger = LinkedLedger::default();
        assert_eq!(periodic_performance(&[], &ledger), PeriodicPerformance::default());
    }
}
