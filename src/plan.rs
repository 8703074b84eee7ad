use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::balances::{RunningBalances, SimulatedRunningBalances};
use crate::context::DataContextOfAction;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::events::EventStore;
use crate::payments::{build_payment, Payment};
use crate::schedule::{generate_repayment_periods, hypothetical_scheduled_actions, rough_end_of_term};
use crate::types::Action;

/// one projected row of a loan's repayment plan, regenerated on each query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedPayment {
    /// effective compounded rate of the row's repayment period
    pub interest_rate: Rate,
    pub payment: Payment,
    pub remaining_principal: Money,
    pub date: NaiveDate,
}

/// a page of the projected repayment plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedPaymentPage {
    pub elements: Vec<PlannedPayment>,
    pub total_pages: usize,
    pub total_elements: usize,
}

/// project the full repayment plan by replaying the schedule pipeline
/// against fresh simulated balances
///
/// the walk is a pure, repeatable fold: disbursal books principal and
/// disbursement-time fees, every scheduled day accrues interest, and every
/// period end accepts the planned payment. the first row is the
/// disbursement itself, then one row per repayment period.
pub fn planned_payments(
    data_context: &DataContextOfAction,
    initial_disbursal: NaiveDate,
) -> Result<Vec<PlannedPayment>> {
    let parameters = &data_context.parameters;
    let product = &data_context.product;

    let end_of_term = rough_end_of_term(initial_disbursal, parameters);
    let periods =
        generate_repayment_periods(initial_disbursal, end_of_term, &parameters.payment_cycle)?;
    let actions = hypothetical_scheduled_actions(initial_disbursal, parameters)?;

    let daily = parameters.interest_rate.daily_rate(product.rate_precision);
    let payment_size = parameters.payment_size.unwrap_or_else(|| {
        let period_rate =
            daily.compounded_over_days(periods[0].duration_days().max(0) as u32, product.rate_precision);
        level_payment(parameters.maximum_balance, period_rate, periods.len() as u32)
            .round_minor_units(product.minor_currency_unit_digits)
    });

    let mut balances = SimulatedRunningBalances::new();
    let mut events = EventStore::new();
    let mut rows = Vec::new();

    for scheduled_action in actions {
        match scheduled_action.action {
            Action::Disburse => {
                let payment = build_payment(
                    data_context,
                    scheduled_action,
                    None,
                    0,
                    &mut balances,
                    &mut events,
                )?;
                rows.push(PlannedPayment {
                    interest_rate: Rate::ZERO,
                    payment,
                    remaining_principal: balances.principal_outstanding(),
                    date: scheduled_action.when,
                });
            }
            Action::ApplyInterest => {
                build_payment(
                    data_context,
                    scheduled_action,
                    None,
                    0,
                    &mut balances,
                    &mut events,
                )?;
            }
            Action::AcceptPayment => {
                let period = scheduled_action.repayment_period;
                let payment = build_payment(
                    data_context,
                    scheduled_action,
                    Some(payment_size),
                    0,
                    &mut balances,
                    &mut events,
                )?;
                let days = period.map(|p| p.duration_days().max(0) as u32).unwrap_or(0);
                rows.push(PlannedPayment {
                    interest_rate: daily.compounded_over_days(days, product.rate_precision),
                    payment,
                    remaining_principal: balances.principal_outstanding(),
                    date: scheduled_action.when,
                });
            }
            // the remaining actions produce no postings to project
            Action::Open
            | Action::Import
            | Action::Deny
            | Action::Approve
            | Action::MarkLate
            | Action::MarkInArrears
            | Action::WriteOff
            | Action::Recover
            | Action::Close => {}
        }
    }
    Ok(rows)
}

/// one page of the projection
pub fn planned_payments_page(
    data_context: &DataContextOfAction,
    page_index: usize,
    page_size: usize,
    initial_disbursal: NaiveDate,
) -> Result<PlannedPaymentPage> {
    let rows = planned_payments(data_context, initial_disbursal)?;
    let total_elements = rows.len();
    let total_pages = if page_size == 0 {
        0
    } else {
        (total_elements + page_size - 1) / page_size
    };
    let elements = rows
        .into_iter()
        .skip(page_index.saturating_mul(page_size))
        .take(page_size)
        .collect();
    Ok(PlannedPaymentPage {
        elements,
        total_pages,
        total_elements,
    })
}

/// level payment covering principal and interest over n periods at the
/// given period rate: P * r * (1+r)^n / ((1+r)^n - 1)
fn level_payment(principal: Money, period_rate: Rate, periods: u32) -> Money {
    if periods == 0 {
        return principal;
    }
    let r = period_rate.as_decimal();
    if r.is_zero() {
        return principal / Decimal::from(periods);
    }
    let mut compound = Decimal::ONE;
    let base = Decimal::ONE + r;
    for _ in 0..periods {
        compound *= base;
    }
    let numerator = principal.as_decimal() * r * compound;
    let denominator = compound - Decimal::ONE;
    Money::from_decimal(numerator / denominator)
}
