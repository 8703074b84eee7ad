use chrono::{Days, NaiveDate};

use crate::context::CaseParameters;
use crate::errors::{LendingError, Result};
use crate::period::Period;
use crate::types::Action;

use super::cycle::{advance, PaymentCycle};
use super::ScheduledAction;

/// nominal end of term by plain addition of the term to the disbursal date
///
/// the last repayment period may overrun this date, in which case the
/// period's end is the authoritative maturity date. repayment cadence wins
/// over the nominal term boundary.
pub fn rough_end_of_term(initial_disbursal: NaiveDate, parameters: &CaseParameters) -> NaiveDate {
    advance(
        initial_disbursal,
        parameters.term_unit,
        parameters.term_maximum,
    )
}

/// the sequence of repayment periods covering [start, end_of_term]
///
/// always non-empty; the final period is flagged as last even when its end
/// overruns `end_of_term`.
pub fn generate_repayment_periods(
    start: NaiveDate,
    end_of_term: NaiveDate,
    cycle: &PaymentCycle,
) -> Result<Vec<Period>> {
    let mut periods = Vec::new();
    let mut begin = start;
    loop {
        let end = cycle.next_payment_date(begin);
        if end <= begin {
            return Err(LendingError::NonTerminatingCycle {
                message: format!("payment cycle failed to advance past {}", begin),
            });
        }
        periods.push(Period::new(begin, end)?);
        if end >= end_of_term {
            break;
        }
        begin = end;
    }

    let last = periods
        .pop()
        .ok_or_else(|| LendingError::CalculationError {
            message: "repayment period generation produced no periods".to_string(),
        })?
        .mark_last();
    periods.push(last);
    Ok(periods)
}

/// the full projected calendar of lifecycle actions for a case
///
/// open, approve, and disburse fall on the disbursal date; each repayment
/// period contributes one interest accrual per day strictly inside it
/// (excluding its first day, including its end day) and one payment
/// acceptance at its end; close falls on the rough end of term.
pub fn hypothetical_scheduled_actions(
    initial_disbursal: NaiveDate,
    parameters: &CaseParameters,
) -> Result<Vec<ScheduledAction>> {
    let end_of_term = rough_end_of_term(initial_disbursal, parameters);
    let periods =
        generate_repayment_periods(initial_disbursal, end_of_term, &parameters.payment_cycle)?;

    let mut actions = vec![
        ScheduledAction::unperioded(Action::Open, initial_disbursal),
        ScheduledAction::unperioded(Action::Approve, initial_disbursal),
        ScheduledAction::unperioded(Action::Disburse, initial_disbursal),
    ];

    for period in &periods {
        let mut day = period.begin() + Days::new(1);
        while day <= period.end() {
            actions.push(ScheduledAction::in_period(
                Action::ApplyInterest,
                day,
                Period::single_day(day),
                *period,
            ));
            day = day + Days::new(1);
        }
        actions.push(ScheduledAction::in_period(
            Action::AcceptPayment,
            period.end(),
            *period,
            *period,
        ));
    }

    actions.push(ScheduledAction::unperioded(Action::Close, end_of_term));
    Ok(actions)
}
