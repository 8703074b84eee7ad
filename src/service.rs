use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;

use crate::balances::RunningBalances;
use crate::context::DataContextOfAction;
use crate::decimal::Money;
use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::lifecycle::{allowed_next_actions, assert_action_allowed};
use crate::payments::{build_payment, Payment};
use crate::plan::{planned_payments_page, PlannedPaymentPage};
use crate::schedule::{
    generate_repayment_periods, hypothetical_scheduled_actions, rough_end_of_term,
    ScheduledAction,
};
use crate::types::{Action, CaseState};

/// the in-process computation service the command layer invokes
///
/// owns nothing but the event store; every computation runs against the
/// data context and running balances the caller supplies.
pub struct IndividualLending {
    pub events: EventStore,
}

impl Default for IndividualLending {
    fn default() -> Self {
        Self::new()
    }
}

impl IndividualLending {
    pub fn new() -> Self {
        IndividualLending {
            events: EventStore::new(),
        }
    }

    /// the actions permitted from a case state
    pub fn next_actions_for_state(&self, state: CaseState) -> &'static [Action] {
        allowed_next_actions(state)
    }

    /// compute the exact postings one action produces on one date
    ///
    /// the transition is checked before any builder runs. when the initial
    /// disbursal date is supplied, the action is located inside the
    /// projected schedule so period-scoped behavior (daily accrual
    /// periods, the final-period repayment override) applies; without it
    /// the action is computed without period attachments.
    pub fn cost_components_for_action(
        &mut self,
        data_context: &DataContextOfAction,
        action: Action,
        for_date: NaiveDate,
        initial_disbursal_date: Option<NaiveDate>,
        requested_amount: Option<Money>,
        days_late: u32,
        balances: &mut dyn RunningBalances,
    ) -> Result<Payment> {
        if let Err(rejection) = assert_action_allowed(data_context.case.current_state, action) {
            self.events.emit(Event::TransitionRejected {
                case_id: data_context.case.identifier,
                state: data_context.case.current_state,
                action,
            });
            return Err(rejection);
        }

        let scheduled_action = self
            .locate_scheduled_action(data_context, action, for_date, initial_disbursal_date)?
            .unwrap_or_else(|| ScheduledAction::unperioded(action, for_date));

        build_payment(
            data_context,
            scheduled_action,
            requested_amount,
            days_late,
            balances,
            &mut self.events,
        )
    }

    /// one page of the projected repayment plan, disbursing today when no
    /// initial disbursal date is given
    pub fn planned_payments_page(
        &mut self,
        data_context: &DataContextOfAction,
        page_index: usize,
        page_size: usize,
        initial_disbursal_date: Option<NaiveDate>,
        time_provider: &SafeTimeProvider,
    ) -> Result<PlannedPaymentPage> {
        let initial_disbursal =
            initial_disbursal_date.unwrap_or_else(|| time_provider.now().date_naive());

        let end_of_term = rough_end_of_term(initial_disbursal, &data_context.parameters);
        let periods = generate_repayment_periods(
            initial_disbursal,
            end_of_term,
            &data_context.parameters.payment_cycle,
        )?;
        self.events.emit(Event::ScheduleGenerated {
            case_id: data_context.case.identifier,
            periods: periods.len(),
            end_of_term,
        });

        planned_payments_page(data_context, page_index, page_size, initial_disbursal)
    }

    fn locate_scheduled_action(
        &self,
        data_context: &DataContextOfAction,
        action: Action,
        for_date: NaiveDate,
        initial_disbursal_date: Option<NaiveDate>,
    ) -> Result<Option<ScheduledAction>> {
        let initial_disbursal = match initial_disbursal_date {
            Some(date) => date,
            None => return Ok(None),
        };
        let actions =
            hypothetical_scheduled_actions(initial_disbursal, &data_context.parameters)?;
        Ok(actions
            .into_iter()
            .find(|a| a.action == action && a.actionable_on(for_date)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balances::SimulatedRunningBalances;
    use crate::charges::identifiers;
    use crate::context::test_fixtures::weekly_data_context;
    use crate::errors::LendingError;
    use crate::types::AccountDesignator;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn money(s: &str) -> Money {
        Money::from_str_exact(s).unwrap()
    }

    #[test]
    fn test_disallowed_action_fails_before_any_computation() {
        let mut service = IndividualLending::new();
        let context = weekly_data_context(); // state: created
        let mut balances = SimulatedRunningBalances::new();

        let result = service.cost_components_for_action(
            &context,
            Action::Disburse,
            date(2024, 1, 1),
            None,
            Some(money("2000.00")),
            0,
            &mut balances,
        );

        assert!(matches!(
            result,
            Err(LendingError::InvalidTransition { .. })
        ));
        // no balances were touched
        assert_eq!(balances.principal_outstanding(), Money::ZERO);
        assert!(service
            .events
            .events()
            .iter()
            .any(|e| matches!(e, Event::TransitionRejected { .. })));
    }

    #[test]
    fn test_disburse_cost_components_for_approved_case() {
        let mut service = IndividualLending::new();
        let mut context = weekly_data_context();
        context.case.current_state = CaseState::Approved;
        let mut balances = SimulatedRunningBalances::new();

        let payment = service
            .cost_components_for_action(
                &context,
                Action::Disburse,
                date(2024, 1, 1),
                Some(date(2024, 1, 1)),
                Some(money("2000.0000")),
                0,
                &mut balances,
            )
            .unwrap();

        assert_eq!(
            payment.cost_component(identifiers::PROCESSING_FEE).unwrap().amount,
            money("10.00")
        );
        assert_eq!(
            payment
                .cost_component(identifiers::LOAN_ORIGINATION_FEE)
                .unwrap()
                .amount,
            money("100.00")
        );
        assert!(payment.adjustment(AccountDesignator::Entry) <= money("-110.00"));
    }

    #[test]
    fn test_located_accept_payment_gets_final_period_override() {
        let mut service = IndividualLending::new();
        let mut context = weekly_data_context();
        context.case.current_state = CaseState::Active;
        let mut balances = SimulatedRunningBalances::new();
        balances.adjust(AccountDesignator::CustomerLoanPrincipal, money("600.00"));

        // jan 22 is the end of the last period of a jan 1 weekly schedule
        let payment = service
            .cost_components_for_action(
                &context,
                Action::AcceptPayment,
                date(2024, 1, 22),
                Some(date(2024, 1, 1)),
                Some(money("50.00")),
                0,
                &mut balances,
            )
            .unwrap();

        assert_eq!(
            payment.cost_component(identifiers::REPAY_PRINCIPAL).unwrap().amount,
            money("600.00")
        );
        assert_eq!(balances.principal_outstanding(), Money::ZERO);
    }

    #[test]
    fn test_next_actions_delegates_to_the_state_machine() {
        let service = IndividualLending::new();
        assert_eq!(
            service.next_actions_for_state(CaseState::Pending),
            &[Action::Deny, Action::Approve]
        );
        assert!(service.next_actions_for_state(CaseState::Closed).is_empty());
    }

    #[test]
    fn test_planned_payments_default_to_today() {
        let mut service = IndividualLending::new();
        let context = weekly_data_context();
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        ));

        let page = service
            .planned_payments_page(&context, 0, 10, None, &time)
            .unwrap();

        assert_eq!(page.total_elements, 4);
        assert_eq!(page.elements[0].date, date(2024, 1, 1));
        assert!(service
            .events
            .events()
            .iter()
            .any(|e| matches!(e, Event::ScheduleGenerated { periods: 3, .. })));
    }
}
