use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::schedule::ScheduledAction;
use crate::types::{AccountDesignator, Action, ChargeMethod, ProportionalDesignator};

use super::{identifiers, ChargeDefinition, ScheduledCharge};

/// one step of a product's loss provisioning ladder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossProvisionStep {
    /// days late at which this step fires
    pub days_late: u32,
    /// percent of principal to provision at this step
    pub percent_provision: Decimal,
}

/// the days-late ladder mapping delinquency onto provisioning percentages
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LossProvisionConfiguration {
    pub steps: Vec<LossProvisionStep>,
}

impl LossProvisionConfiguration {
    pub fn new(steps: Vec<LossProvisionStep>) -> Self {
        LossProvisionConfiguration { steps }
    }

    fn step_for(&self, days_late: u32) -> Option<&LossProvisionStep> {
        self.steps.iter().find(|step| step.days_late == days_late)
    }

    /// synthesize the provisioning charge for the given delinquency, if the
    /// ladder defines a step for it
    ///
    /// the charge is read-only and proportional to principal, except at
    /// disbursement where it is proportional to the requested amount; a
    /// missing step means no charge, not an error.
    pub fn scheduled_charge_for_days_late(
        &self,
        days_late: u32,
        action: Action,
        when: NaiveDate,
    ) -> Option<ScheduledCharge> {
        let step = self.step_for(days_late)?;
        let proportional_to = if action == Action::Disburse {
            ProportionalDesignator::RequestedDisbursement
        } else {
            ProportionalDesignator::Principal
        };
        let definition = ChargeDefinition {
            identifier: identifiers::LOSS_PROVISIONING.to_string(),
            name: "Loss provisioning".to_string(),
            accrue_action: None,
            charge_action: action,
            amount: step.percent_provision,
            charge_method: ChargeMethod::Proportional,
            proportional_to: Some(proportional_to),
            from_account_designator: AccountDesignator::GeneralLossAllowance,
            accrual_account_designator: None,
            to_account_designator: AccountDesignator::ProductLossAllowance,
            for_cycle_size_unit: None,
            for_segment_set: None,
            from_segment: None,
            to_segment: None,
            read_only: true,
            charge_on_top: false,
        };
        Some(ScheduledCharge {
            scheduled_action: ScheduledAction::unperioded(action, when),
            charge_definition: definition,
            charge_range: None,
        })
    }
}
