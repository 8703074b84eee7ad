use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a loan case
pub type CaseId = Uuid;

/// unique identifier for a loan product
pub type ProductId = Uuid;

/// lifecycle actions a loan case can undergo
///
/// declaration order is the canonical ordinal used for deterministic
/// charge ordering, so variants must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Open,
    Import,
    Deny,
    Approve,
    Disburse,
    ApplyInterest,
    AcceptPayment,
    MarkLate,
    MarkInArrears,
    WriteOff,
    Recover,
    Close,
}

impl Action {
    /// ordinal used as the second key of the scheduled charge order
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }
}

/// loan case state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseState {
    /// case created but not yet opened for approval
    Created,
    /// opened, awaiting approval or denial
    Pending,
    /// approved, awaiting first disbursal
    Approved,
    /// disbursed and performing
    Active,
    /// terminal
    Closed,
}

/// symbolic account roles mapped to real ledger accounts at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountDesignator {
    /// the customer's entry (cash) account
    Entry,
    CustomerLoanPrincipal,
    CustomerLoanInterest,
    CustomerLoanFees,
    LoanFundsSource,
    ProcessingFeeIncome,
    OriginationFeeIncome,
    DisbursementFeeIncome,
    InterestIncome,
    InterestAccrual,
    LateFeeIncome,
    LateFeeAccrual,
    ProductLossAllowance,
    GeneralLossAllowance,
    Expense,
}

/// what a proportional charge is proportional to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProportionalDesignator {
    /// total outstanding balance: principal plus accrued interest and fees
    RunningBalance,
    /// principal outstanding only
    Principal,
    /// the configured balance range ceiling
    MaximumBalance,
    /// the requested (or configured) disbursement size
    RequestedDisbursement,
    /// the requested (or configured) repayment size
    RequestedRepayment,
}

impl ProportionalDesignator {
    /// fixed application rank, the third key of the scheduled charge order
    ///
    /// charges carrying a designator always sort before charges without one.
    pub fn application_rank(&self) -> u8 {
        match self {
            ProportionalDesignator::MaximumBalance => 1,
            ProportionalDesignator::RunningBalance => 2,
            ProportionalDesignator::Principal => 3,
            ProportionalDesignator::RequestedDisbursement => 4,
            ProportionalDesignator::RequestedRepayment => 5,
        }
    }
}

/// how a charge amount is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeMethod {
    /// a literal amount in currency units
    Fixed,
    /// a percentage of the proportional base
    Proportional,
    /// a compounded periodic rate applied to the proportional base
    Interest,
}

/// calendar unit of a payment cycle or term
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemporalUnit {
    Days,
    Weeks,
    Months,
    Years,
}
