pub mod actions;
pub mod cycle;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::period::Period;
use crate::types::Action;

pub use actions::{generate_repayment_periods, hypothetical_scheduled_actions, rough_end_of_term};
pub use cycle::PaymentCycle;

/// a lifecycle action projected onto the calendar, not yet executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub action: Action,
    pub when: NaiveDate,
    /// the sub-period this action covers (one day for interest accrual)
    pub action_period: Option<Period>,
    /// the repayment period this action settles into
    pub repayment_period: Option<Period>,
}

impl ScheduledAction {
    /// an action with no period attachment (open, approve, disburse, close)
    pub fn unperioded(action: Action, when: NaiveDate) -> Self {
        ScheduledAction {
            action,
            when,
            action_period: None,
            repayment_period: None,
        }
    }

    pub fn in_period(
        action: Action,
        when: NaiveDate,
        action_period: Period,
        repayment_period: Period,
    ) -> Self {
        ScheduledAction {
            action,
            when,
            action_period: Some(action_period),
            repayment_period: Some(repayment_period),
        }
    }

    /// whether this scheduled action falls due on the given date
    pub fn actionable_on(&self, date: NaiveDate) -> bool {
        self.when == date
    }

    /// whether this action settles into the final repayment period
    pub fn in_last_period(&self) -> bool {
        self.repayment_period.map(|p| p.is_last()).unwrap_or(false)
    }
}
