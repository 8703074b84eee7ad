pub mod provision;
pub mod selector;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{LendingError, Result};
use crate::schedule::ScheduledAction;
use crate::types::{
    AccountDesignator, Action, ChargeMethod, ProportionalDesignator, TemporalUnit,
};

pub use provision::{LossProvisionConfiguration, LossProvisionStep};
pub use selector::scheduled_charges;

/// identifiers of the charges every individual loan product carries
pub mod identifiers {
    pub const PROCESSING_FEE: &str = "PROCESSING_FEE";
    pub const LOAN_ORIGINATION_FEE: &str = "LOAN_ORIGINATION_FEE";
    pub const DISBURSEMENT_FEE: &str = "DISBURSEMENT_FEE";
    pub const DISBURSE_PAYMENT: &str = "DISBURSE_PAYMENT";
    pub const INTEREST: &str = "INTEREST";
    pub const LATE_FEE: &str = "LATE_FEE";
    pub const LOSS_PROVISIONING: &str = "LOSS_PROVISIONING";
    pub const REPAY_FEES: &str = "REPAY_FEES";
    pub const REPAY_INTEREST: &str = "REPAY_INTEREST";
    pub const REPAY_PRINCIPAL: &str = "REPAY_PRINCIPAL";
    pub const WRITE_OFF: &str = "WRITE_OFF";
    pub const RECOVERY: &str = "RECOVERY";
    pub const IMPORT_BALANCE: &str = "IMPORT_BALANCE";
}

/// a fee or interest rule producing a monetary posting when an action occurs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeDefinition {
    pub identifier: String,
    pub name: String,
    /// the action this charge accrues on, when it accrues ahead of payment
    pub accrue_action: Option<Action>,
    /// the action this charge is settled or levied on
    pub charge_action: Action,
    /// literal amount for fixed charges, percentage for proportional ones,
    /// nominal annual rate for interest charges
    pub amount: Decimal,
    pub charge_method: ChargeMethod,
    pub proportional_to: Option<ProportionalDesignator>,
    pub from_account_designator: AccountDesignator,
    pub accrual_account_designator: Option<AccountDesignator>,
    pub to_account_designator: AccountDesignator,
    /// compounding cycle size for interest charges
    pub for_cycle_size_unit: Option<TemporalUnit>,
    pub for_segment_set: Option<String>,
    pub from_segment: Option<String>,
    pub to_segment: Option<String>,
    /// maintained by the system rather than product configuration
    pub read_only: bool,
    /// the proportional base includes cost components already accumulated
    pub charge_on_top: bool,
}

impl ChargeDefinition {
    /// validate the method/designator/segment field combinations
    pub fn validated(self) -> Result<Self> {
        let segmented = self.for_segment_set.is_some()
            || self.from_segment.is_some()
            || self.to_segment.is_some();
        if segmented
            && (self.for_segment_set.is_none()
                || self.from_segment.is_none()
                || self.to_segment.is_none())
        {
            return Err(LendingError::InvalidConfiguration {
                message: format!(
                    "charge {} has incomplete segment fields",
                    self.identifier
                ),
            });
        }
        match self.charge_method {
            ChargeMethod::Proportional | ChargeMethod::Interest => {
                if self.proportional_to.is_none() {
                    return Err(LendingError::InvalidConfiguration {
                        message: format!(
                            "charge {} is {:?} but names no proportionality designator",
                            self.identifier, self.charge_method
                        ),
                    });
                }
            }
            ChargeMethod::Fixed => {
                // the designator on a fixed charge exists only to pick the
                // balance that selects the tier
                if self.proportional_to.is_some() && !segmented {
                    return Err(LendingError::InvalidConfiguration {
                        message: format!(
                            "fixed charge {} names a proportionality designator without segments",
                            self.identifier
                        ),
                    });
                }
                if segmented && self.proportional_to.is_none() {
                    return Err(LendingError::InvalidConfiguration {
                        message: format!(
                            "segmented fixed charge {} names no tier-selection designator",
                            self.identifier
                        ),
                    });
                }
            }
        }
        Ok(self)
    }

    /// whether this definition fires on the given action: at its accrue
    /// action when it accrues, otherwise at its charge action
    pub fn fires_on(&self, action: Action) -> bool {
        match self.accrue_action {
            Some(accrue) => accrue == action,
            None => self.charge_action == action,
        }
    }

    /// whether this charge accrues on the given action
    pub fn accrues_on(&self, action: Action) -> bool {
        self.accrue_action == Some(action)
    }
}

/// a balance tier boundary used to pick a rate bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeRange {
    pub from: Decimal,
    /// open-ended if absent
    pub to: Option<Decimal>,
}

impl ChargeRange {
    pub fn new(from: Decimal, to: Option<Decimal>) -> Self {
        ChargeRange { from, to }
    }

    pub fn contains(&self, amount: Decimal) -> bool {
        match self.to {
            Some(to) => self.from <= amount && amount < to,
            None => self.from <= amount,
        }
    }
}

/// one tier of a named segment set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub identifier: String,
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
}

/// a named, ordered set of balance tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSet {
    pub identifier: String,
    pub segments: Vec<Segment>,
}

impl SegmentSet {
    /// derive segments by sorting lower bounds ascending and pairing each
    /// with the next entry's lower bound; the last tier is open-ended
    pub fn from_lower_bounds(identifier: &str, bounds: Vec<(String, Decimal)>) -> Self {
        let mut bounds = bounds;
        bounds.sort_by(|a, b| a.1.cmp(&b.1));
        let uppers: Vec<Option<Decimal>> = bounds
            .iter()
            .skip(1)
            .map(|(_, lower)| Some(*lower))
            .chain(std::iter::once(None))
            .collect();
        let segments = bounds
            .into_iter()
            .zip(uppers)
            .map(|((identifier, lower_bound), upper_bound)| Segment {
                identifier,
                lower_bound,
                upper_bound,
            })
            .collect();
        SegmentSet {
            identifier: identifier.to_string(),
            segments,
        }
    }

    fn segment(&self, identifier: &str) -> Result<&Segment> {
        self.segments
            .iter()
            .find(|s| s.identifier == identifier)
            .ok_or_else(|| LendingError::SegmentNotFound {
                segment_set_identifier: self.identifier.clone(),
                segment_identifier: identifier.to_string(),
            })
    }

    /// the range spanning from one named segment's lower bound to another
    /// named segment's upper bound
    pub fn range_between(&self, from_segment: &str, to_segment: &str) -> Result<ChargeRange> {
        let from = self.segment(from_segment)?.lower_bound;
        let to = self.segment(to_segment)?.upper_bound;
        Ok(ChargeRange::new(from, to))
    }
}

/// a charge attached to a projected action, not yet executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledCharge {
    pub scheduled_action: ScheduledAction,
    pub charge_definition: ChargeDefinition,
    pub charge_range: Option<ChargeRange>,
}

impl ScheduledCharge {
    /// the multi-key ordering tuple, computed once per element:
    /// action date, action ordinal, proportionality application rank,
    /// charge identifier
    ///
    /// charges with no proportionality designator tie at rank zero but sort
    /// after every charge that has one.
    pub fn sort_key(&self) -> (chrono::NaiveDate, u8, (u8, u8), String) {
        let rank = match self.charge_definition.proportional_to {
            Some(designator) => (0, designator.application_rank()),
            None => (1, 0),
        };
        (
            self.scheduled_action.when,
            self.scheduled_action.action.ordinal(),
            rank,
            self.charge_definition.identifier.clone(),
        )
    }
}

/// the charges every individual loan product is configured with
pub fn default_individual_loan_charges(
    processing_fee: Decimal,
    origination_fee: Decimal,
    nominal_interest_rate: Decimal,
    late_fee_percent: Decimal,
) -> Vec<ChargeDefinition> {
    vec![
        ChargeDefinition {
            identifier: identifiers::PROCESSING_FEE.to_string(),
            name: "Processing fee".to_string(),
            accrue_action: None,
            charge_action: Action::Disburse,
            amount: processing_fee,
            charge_method: ChargeMethod::Fixed,
            proportional_to: None,
            from_account_designator: AccountDesignator::Entry,
            accrual_account_designator: None,
            to_account_designator: AccountDesignator::ProcessingFeeIncome,
            for_cycle_size_unit: None,
            for_segment_set: None,
            from_segment: None,
            to_segment: None,
            read_only: false,
            charge_on_top: false,
        },
        ChargeDefinition {
            identifier: identifiers::LOAN_ORIGINATION_FEE.to_string(),
            name: "Loan origination fee".to_string(),
            accrue_action: None,
            charge_action: Action::Disburse,
            amount: origination_fee,
            charge_method: ChargeMethod::Fixed,
            proportional_to: None,
            from_account_designator: AccountDesignator::Entry,
            accrual_account_designator: None,
            to_account_designator: AccountDesignator::OriginationFeeIncome,
            for_cycle_size_unit: None,
            for_segment_set: None,
            from_segment: None,
            to_segment: None,
            read_only: false,
            charge_on_top: false,
        },
        ChargeDefinition {
            identifier: identifiers::DISBURSE_PAYMENT.to_string(),
            name: "Disburse payment".to_string(),
            accrue_action: None,
            charge_action: Action::Disburse,
            amount: Decimal::from(100),
            charge_method: ChargeMethod::Proportional,
            proportional_to: Some(ProportionalDesignator::RequestedDisbursement),
            from_account_designator: AccountDesignator::Entry,
            accrual_account_designator: None,
            to_account_designator: AccountDesignator::CustomerLoanPrincipal,
            for_cycle_size_unit: None,
            for_segment_set: None,
            from_segment: None,
            to_segment: None,
            read_only: true,
            charge_on_top: false,
        },
        ChargeDefinition {
            identifier: identifiers::INTEREST.to_string(),
            name: "Interest".to_string(),
            accrue_action: Some(Action::ApplyInterest),
            charge_action: Action::AcceptPayment,
            amount: nominal_interest_rate,
            charge_method: ChargeMethod::Interest,
            proportional_to: Some(ProportionalDesignator::Principal),
            from_account_designator: AccountDesignator::CustomerLoanInterest,
            accrual_account_designator: Some(AccountDesignator::InterestAccrual),
            to_account_designator: AccountDesignator::InterestIncome,
            for_cycle_size_unit: Some(TemporalUnit::Years),
            for_segment_set: None,
            from_segment: None,
            to_segment: None,
            read_only: true,
            charge_on_top: false,
        },
        ChargeDefinition {
            identifier: identifiers::LATE_FEE.to_string(),
            name: "Late fee".to_string(),
            accrue_action: Some(Action::MarkLate),
            charge_action: Action::AcceptPayment,
            amount: late_fee_percent,
            charge_method: ChargeMethod::Proportional,
            proportional_to: Some(ProportionalDesignator::RequestedRepayment),
            from_account_designator: AccountDesignator::CustomerLoanFees,
            accrual_account_designator: Some(AccountDesignator::LateFeeAccrual),
            to_account_designator: AccountDesignator::LateFeeIncome,
            for_cycle_size_unit: None,
            for_segment_set: None,
            from_segment: None,
            to_segment: None,
            read_only: false,
            charge_on_top: false,
        },
    ]
}
