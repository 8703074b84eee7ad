use serde::{Deserialize, Serialize};

use crate::charges::{ChargeDefinition, LossProvisionConfiguration, SegmentSet};
use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};
use crate::schedule::PaymentCycle;
use crate::types::{CaseId, CaseState, ProductId, TemporalUnit};

/// an individual lending product's configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub identifier: ProductId,
    pub name: String,
    /// digits after the decimal point of the product's currency
    pub minor_currency_unit_digits: u32,
    /// decimal precision interest rates are computed at
    pub rate_precision: u32,
    pub interest_range_minimum: Rate,
    pub interest_range_maximum: Rate,
    pub charge_definitions: Vec<ChargeDefinition>,
    pub segment_sets: Vec<SegmentSet>,
    pub loss_provision: LossProvisionConfiguration,
}

impl Product {
    /// check case parameters against the product's configured ranges
    pub fn accepts(&self, parameters: &CaseParameters) -> Result<()> {
        if parameters.interest_rate < self.interest_range_minimum
            || parameters.interest_rate > self.interest_range_maximum
        {
            return Err(LendingError::InvalidConfiguration {
                message: format!(
                    "interest rate {} outside product range [{}, {}]",
                    parameters.interest_rate,
                    self.interest_range_minimum,
                    self.interest_range_maximum
                ),
            });
        }
        if parameters.maximum_balance <= Money::ZERO {
            return Err(LendingError::InvalidConfiguration {
                message: "maximum balance must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// the parameters a customer's loan case was opened with
///
/// the persistence layer stores these as a json payload; `from_json` and
/// `to_json` are the round-trip it uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseParameters {
    pub customer_identifier: String,
    /// the approved principal ceiling
    pub maximum_balance: Money,
    pub interest_rate: Rate,
    pub term_maximum: u32,
    pub term_unit: TemporalUnit,
    pub payment_cycle: PaymentCycle,
    /// the configured size of each repayment; absent means "whatever is
    /// outstanding"
    pub payment_size: Option<Money>,
}

impl CaseParameters {
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| LendingError::InvalidConfiguration {
            message: format!("unparseable case parameters: {}", e),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| LendingError::InvalidConfiguration {
            message: format!("unserializable case parameters: {}", e),
        })
    }
}

/// a loan case as the persistence layer hands it to the core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseEntity {
    pub identifier: CaseId,
    pub current_state: CaseState,
}

/// everything the core needs to compute one action's postings
#[derive(Debug, Clone)]
pub struct DataContextOfAction {
    pub product: Product,
    pub case: CaseEntity,
    pub parameters: CaseParameters,
}

impl DataContextOfAction {
    pub fn new(product: Product, case: CaseEntity, parameters: CaseParameters) -> Result<Self> {
        product.accepts(&parameters)?;
        Ok(DataContextOfAction {
            product,
            case,
            parameters,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::*;
    use super::*;

    #[test]
    fn test_case_parameters_json_round_trip() {
        let parameters = weekly_case_parameters();
        let payload = parameters.to_json().unwrap();
        let restored = CaseParameters::from_json(&payload).unwrap();
        assert_eq!(restored, parameters);
    }

    #[test]
    fn test_garbage_payload_is_a_configuration_error() {
        let result = CaseParameters::from_json("{\"maximum_balance\":");
        assert!(matches!(
            result,
            Err(LendingError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_product_rejects_out_of_range_interest() {
        let product = standard_product();
        let mut parameters = weekly_case_parameters();
        parameters.interest_rate = Rate::from_percentage(120);
        assert!(product.accepts(&parameters).is_err());

        parameters.interest_rate = Rate::from_percentage(15);
        assert!(product.accepts(&parameters).is_ok());
    }

    #[test]
    fn test_data_context_validates_on_construction() {
        let mut parameters = weekly_case_parameters();
        parameters.maximum_balance = Money::ZERO;
        let result = DataContextOfAction::new(
            standard_product(),
            CaseEntity {
                identifier: uuid::Uuid::new_v4(),
                current_state: CaseState::Created,
            },
            parameters,
        );
        assert!(result.is_err());
    }
}
