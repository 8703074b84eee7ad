pub mod builder;
pub mod dispatch;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::decimal::Money;
use crate::types::AccountDesignator;

pub use builder::PaymentBuilder;
pub use dispatch::build_payment;

/// one charge's contribution to a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostComponent {
    pub charge_identifier: String,
    pub amount: Money,
}

/// the cost components and ledger balance adjustments one action produces
///
/// amounts are already rounded to the product's minor currency unit
/// digits; there is exactly one cost component per charge identifier, and
/// the signed balance adjustments net to zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Payment {
    pub cost_components: Vec<CostComponent>,
    pub balance_adjustments: BTreeMap<AccountDesignator, Money>,
    pub date: Option<NaiveDate>,
}

impl Payment {
    pub fn cost_component(&self, charge_identifier: &str) -> Option<&CostComponent> {
        self.cost_components
            .iter()
            .find(|c| c.charge_identifier == charge_identifier)
    }

    pub fn adjustment(&self, designator: AccountDesignator) -> Money {
        self.balance_adjustments
            .get(&designator)
            .copied()
            .unwrap_or(Money::ZERO)
    }

    /// the sum of all signed balance adjustments
    pub fn net_adjustment(&self) -> Money {
        self.balance_adjustments
            .values()
            .fold(Money::ZERO, |acc, delta| acc + *delta)
    }

    /// total of all cost components
    pub fn total_cost(&self) -> Money {
        self.cost_components
            .iter()
            .fold(Money::ZERO, |acc, c| acc + c.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_lookup_and_totals() {
        let payment = Payment {
            cost_components: vec![
                CostComponent {
                    charge_identifier: "PROCESSING_FEE".to_string(),
                    amount: Money::from_str_exact("10.00").unwrap(),
                },
                CostComponent {
                    charge_identifier: "LOAN_ORIGINATION_FEE".to_string(),
                    amount: Money::from_str_exact("100.00").unwrap(),
                },
            ],
            balance_adjustments: BTreeMap::new(),
            date: None,
        };
        assert_eq!(
            payment.cost_component("PROCESSING_FEE").unwrap().amount,
            Money::from_str_exact("10.00").unwrap()
        );
        assert!(payment.cost_component("INTEREST").is_none());
        assert_eq!(payment.total_cost(), Money::from_major(110));
    }

    #[test]
    fn test_missing_adjustment_reads_as_zero() {
        let payment = Payment::default();
        assert_eq!(payment.adjustment(AccountDesignator::Entry), Money::ZERO);
        assert_eq!(payment.net_adjustment(), Money::ZERO);
    }
}
