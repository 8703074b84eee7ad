use crate::balances::RunningBalances;
use crate::charges::{identifiers, scheduled_charges, ScheduledCharge};
use crate::context::DataContextOfAction;
use crate::decimal::Money;
use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::interest::PeriodRateCalculator;
use crate::payments::{Payment, PaymentBuilder};
use crate::schedule::ScheduledAction;
use crate::types::{AccountDesignator, Action};

/// build the payment one scheduled action produces
///
/// dispatch is an exhaustive match over the action kind; adding an action
/// variant without a builder arm is a compile error, never a silent no-op.
/// `requested_amount` is the disbursement size at DISBURSE, the payment
/// size at ACCEPT_PAYMENT, and the recovered amount at RECOVER.
pub fn build_payment(
    data_context: &DataContextOfAction,
    scheduled_action: ScheduledAction,
    requested_amount: Option<Money>,
    days_late: u32,
    balances: &mut dyn RunningBalances,
    events: &mut EventStore,
) -> Result<Payment> {
    let product = &data_context.product;
    let parameters = &data_context.parameters;

    let mut charges = scheduled_charges(
        &[scheduled_action],
        &product.charge_definitions,
        &product.segment_sets,
    )?;
    if matches!(
        scheduled_action.action,
        Action::Disburse | Action::MarkLate | Action::MarkInArrears
    ) {
        if let Some(provision) = product.loss_provision.scheduled_charge_for_days_late(
            days_late,
            scheduled_action.action,
            scheduled_action.when,
        ) {
            charges.push(provision);
            charges.sort_by_key(|charge| charge.sort_key());
        }
    }

    let rates = PeriodRateCalculator::compounded_rates(
        parameters.interest_rate,
        &charges,
        product.rate_precision,
    )?;

    let mut builder = PaymentBuilder::new(product, parameters).with_period_rates(rates);
    builder = match scheduled_action.action {
        Action::Disburse => builder.with_requested_disbursement(requested_amount),
        _ => builder.with_requested_payment(requested_amount),
    };

    let payment = match scheduled_action.action {
        Action::Open | Action::Deny | Action::Approve | Action::Close => {
            apply_all(&mut builder, &charges, balances)?;
            builder.build(scheduled_action.when)
        }
        Action::Import => {
            // balances arrive pre-seeded with the migrated loan's state;
            // the payment only records what was taken over
            builder.record_component(identifiers::IMPORT_BALANCE, balances.total_outstanding());
            builder.build(scheduled_action.when)
        }
        Action::Disburse => {
            apply_all(&mut builder, &charges, balances)?;
            builder.build(scheduled_action.when)
        }
        Action::ApplyInterest => {
            apply_all(&mut builder, &charges, balances)?;
            let payment = builder.build(scheduled_action.when);
            let accrued = payment.adjustment(AccountDesignator::CustomerLoanInterest);
            if accrued.is_positive() {
                events.emit(Event::InterestAccrued {
                    case_id: data_context.case.identifier,
                    amount: accrued,
                    for_date: scheduled_action.when,
                });
            }
            payment
        }
        Action::AcceptPayment => {
            apply_all(&mut builder, &charges, balances)?;
            accept_payment(
                data_context,
                scheduled_action,
                &mut builder,
                balances,
            );
            builder.build(scheduled_action.when)
        }
        Action::MarkLate | Action::MarkInArrears => {
            apply_all(&mut builder, &charges, balances)?;
            builder.build(scheduled_action.when)
        }
        Action::WriteOff => {
            write_off(data_context, &mut builder, balances, events);
            builder.build(scheduled_action.when)
        }
        Action::Recover => {
            let recovered = requested_amount.unwrap_or(Money::ZERO);
            builder.post_pair(
                AccountDesignator::Entry,
                AccountDesignator::GeneralLossAllowance,
                recovered,
                balances,
            );
            builder.record_component(identifiers::RECOVERY, recovered);
            builder.build(scheduled_action.when)
        }
    };

    events.emit(Event::PaymentBuilt {
        case_id: data_context.case.identifier,
        action: scheduled_action.action,
        for_date: scheduled_action.when,
        total_cost: payment.total_cost(),
    });
    Ok(payment)
}

fn apply_all(
    builder: &mut PaymentBuilder<'_>,
    charges: &[ScheduledCharge],
    balances: &mut dyn RunningBalances,
) -> Result<()> {
    for charge in charges {
        builder.apply_scheduled_charge(charge, balances)?;
    }
    Ok(())
}

/// fees first, then interest, then principal, never exceeding the payment
/// size; the final repayment period repays everything outstanding
/// regardless of the nominal size
fn accept_payment(
    data_context: &DataContextOfAction,
    scheduled_action: ScheduledAction,
    builder: &mut PaymentBuilder<'_>,
    balances: &mut dyn RunningBalances,
) {
    let fees = balances.fees_outstanding();
    let interest = balances.interest_outstanding();
    let principal = balances.principal_outstanding();
    let total = fees + interest + principal;

    let size = if scheduled_action.in_last_period() {
        total
    } else {
        builder.effective_payment_size().unwrap_or(total).min(total)
    };

    let fees_paid = size.min(fees);
    let interest_paid = (size - fees_paid).min(interest);
    let principal_paid = (size - fees_paid - interest_paid).min(principal);

    builder.post_pair(
        AccountDesignator::Entry,
        AccountDesignator::CustomerLoanFees,
        fees_paid,
        balances,
    );
    builder.post_pair(
        AccountDesignator::Entry,
        AccountDesignator::CustomerLoanInterest,
        interest_paid,
        balances,
    );
    builder.post_pair(
        AccountDesignator::Entry,
        AccountDesignator::CustomerLoanPrincipal,
        principal_paid,
        balances,
    );
    builder.record_component(identifiers::REPAY_FEES, fees_paid);
    builder.record_component(identifiers::REPAY_INTEREST, interest_paid);
    builder.record_component(identifiers::REPAY_PRINCIPAL, principal_paid);

    settle_accruals(data_context, builder, balances, fees_paid, interest_paid);
}

/// recognize income for settled accruals: what was paid against a
/// receivable releases the matching accrual up to what was accrued
fn settle_accruals(
    data_context: &DataContextOfAction,
    builder: &mut PaymentBuilder<'_>,
    balances: &mut dyn RunningBalances,
    fees_paid: Money,
    interest_paid: Money,
) {
    let mut fees_remaining = fees_paid;
    let mut interest_remaining = interest_paid;

    for definition in &data_context.product.charge_definitions {
        if definition.charge_action != Action::AcceptPayment {
            continue;
        }
        let accrual = match (definition.accrue_action, definition.accrual_account_designator) {
            (Some(_), Some(accrual)) => accrual,
            _ => continue,
        };
        let bucket = match definition.from_account_designator {
            AccountDesignator::CustomerLoanFees => &mut fees_remaining,
            AccountDesignator::CustomerLoanInterest => &mut interest_remaining,
            _ => continue,
        };
        let funded = balances.allowance_funded(accrual);
        let settled = (*bucket).min(funded);
        if settled.is_positive() {
            builder.post_pair(accrual, definition.to_account_designator, settled, balances);
            *bucket -= settled;
        }
    }
}

/// zero remaining principal, interest, and fees against the general loss
/// allowance; a shortfall is an operational warning, not a hard failure
fn write_off(
    data_context: &DataContextOfAction,
    builder: &mut PaymentBuilder<'_>,
    balances: &mut dyn RunningBalances,
    events: &mut EventStore,
) {
    let fees = balances.fees_outstanding();
    let interest = balances.interest_outstanding();
    let principal = balances.principal_outstanding();
    let total = fees + interest + principal;

    let funded = balances.allowance_funded(AccountDesignator::GeneralLossAllowance);
    if funded < total {
        events.emit(Event::WriteOffShortfall {
            case_id: data_context.case.identifier,
            required: total,
            funded,
        });
    }

    builder.post_pair(
        AccountDesignator::GeneralLossAllowance,
        AccountDesignator::CustomerLoanFees,
        fees,
        balances,
    );
    builder.post_pair(
        AccountDesignator::GeneralLossAllowance,
        AccountDesignator::CustomerLoanInterest,
        interest,
        balances,
    );
    builder.post_pair(
        AccountDesignator::GeneralLossAllowance,
        AccountDesignator::CustomerLoanPrincipal,
        principal,
        balances,
    );
    builder.record_component(identifiers::WRITE_OFF, total);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balances::SimulatedRunningBalances;
    use crate::context::test_fixtures::weekly_data_context;
    use crate::period::Period;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn money(s: &str) -> Money {
        Money::from_str_exact(s).unwrap()
    }

    #[test]
    fn test_disburse_books_fees_and_principal() {
        let context = weekly_data_context();
        let mut balances = SimulatedRunningBalances::new();
        let mut events = EventStore::new();

        let payment = build_payment(
            &context,
            ScheduledAction::unperioded(Action::Disburse, date(2024, 1, 1)),
            Some(money("2000.0000")),
            0,
            &mut balances,
            &mut events,
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
        // the entry account funds the principal and both fees
        assert!(payment.adjustment(AccountDesignator::Entry) <= money("-110.00"));
        assert_eq!(balances.principal_outstanding(), money("2000.00"));
        assert_eq!(payment.net_adjustment(), Money::ZERO);

        // the day-zero provisioning step fires proportional to the request
        assert_eq!(
            payment
                .cost_component(identifiers::LOSS_PROVISIONING)
                .unwrap()
                .amount,
            money("20.00")
        );
        assert_eq!(
            payment.adjustment(AccountDesignator::ProductLossAllowance),
            money("20.00")
        );
    }

    #[test]
    fn test_apply_interest_touches_only_accrual_designators() {
        let context = weekly_data_context();
        let mut balances = SimulatedRunningBalances::new();
        balances.adjust(AccountDesignator::CustomerLoanPrincipal, money("2000"));
        let mut events = EventStore::new();

        let action = ScheduledAction::in_period(
            Action::ApplyInterest,
            date(2024, 1, 2),
            Period::single_day(date(2024, 1, 2)),
            Period::new(date(2024, 1, 1), date(2024, 1, 8)).unwrap(),
        );
        let payment =
            build_payment(&context, action, None, 0, &mut balances, &mut events).unwrap();

        assert_eq!(payment.adjustment(AccountDesignator::Entry), Money::ZERO);
        let accrued = payment.adjustment(AccountDesignator::CustomerLoanInterest);
        assert_eq!(accrued, money("0.55"));
        assert_eq!(
            payment.adjustment(AccountDesignator::InterestAccrual),
            -accrued
        );
        assert!(events
            .events()
            .iter()
            .any(|e| matches!(e, Event::InterestAccrued { .. })));
    }

    #[test]
    fn test_accept_payment_pays_fees_before_interest_before_principal() {
        let context = weekly_data_context();
        let mut balances = SimulatedRunningBalances::new();
        balances.adjust(AccountDesignator::CustomerLoanFees, money("50.00"));
        balances.adjust(AccountDesignator::CustomerLoanInterest, money("30.00"));
        balances.adjust(AccountDesignator::CustomerLoanPrincipal, money("1000.00"));
        let mut events = EventStore::new();

        let action = ScheduledAction::in_period(
            Action::AcceptPayment,
            date(2024, 1, 8),
            Period::new(date(2024, 1, 1), date(2024, 1, 8)).unwrap(),
            Period::new(date(2024, 1, 1), date(2024, 1, 8)).unwrap(),
        );
        let payment = build_payment(
            &context,
            action,
            Some(money("49.00")),
            0,
            &mut balances,
            &mut events,
        )
        .unwrap();

        // a payment smaller than outstanding fees goes to fees alone
        assert_eq!(
            payment.cost_component(identifiers::REPAY_FEES).unwrap().amount,
            money("49.00")
        );
        assert_eq!(
            payment.cost_component(identifiers::REPAY_INTEREST).unwrap().amount,
            Money::ZERO
        );
        assert_eq!(
            payment.cost_component(identifiers::REPAY_PRINCIPAL).unwrap().amount,
            Money::ZERO
        );
        assert_eq!(balances.fees_outstanding(), money("1.00"));
        assert_eq!(balances.principal_outstanding(), money("1000.00"));
    }

    #[test]
    fn test_final_period_overrides_nominal_payment_size() {
        let context = weekly_data_context();
        let mut balances = SimulatedRunningBalances::new();
        balances.adjust(AccountDesignator::CustomerLoanInterest, money("3.83"));
        balances.adjust(AccountDesignator::CustomerLoanPrincipal, money("700.00"));
        let mut events = EventStore::new();

        let last = Period::new(date(2024, 1, 15), date(2024, 1, 22))
            .unwrap()
            .mark_last();
        let action = ScheduledAction::in_period(Action::AcceptPayment, date(2024, 1, 22), last, last);
        let payment = build_payment(
            &context,
            action,
            Some(money("100.00")),
            0,
            &mut balances,
            &mut events,
        )
        .unwrap();

        assert_eq!(
            payment.cost_component(identifiers::REPAY_PRINCIPAL).unwrap().amount,
            money("700.00")
        );
        assert_eq!(
            payment.cost_component(identifiers::REPAY_INTEREST).unwrap().amount,
            money("3.83")
        );
        assert_eq!(balances.total_outstanding(), Money::ZERO);
    }

    #[test]
    fn test_accept_payment_settles_interest_accrual() {
        let context = weekly_data_context();
        let mut balances = SimulatedRunningBalances::new();
        balances.adjust(AccountDesignator::CustomerLoanInterest, money("3.83"));
        balances.adjust(AccountDesignator::InterestAccrual, money("-3.83"));
        balances.adjust(AccountDesignator::CustomerLoanPrincipal, money("500.00"));
        let mut events = EventStore::new();

        let period = Period::new(date(2024, 1, 1), date(2024, 1, 8)).unwrap();
        let action =
            ScheduledAction::in_period(Action::AcceptPayment, date(2024, 1, 8), period, period);
        let payment = build_payment(
            &context,
            action,
            Some(money("100.00")),
            0,
            &mut balances,
            &mut events,
        )
        .unwrap();

        // 3.83 interest paid releases the accrual into income
        assert_eq!(
            payment.adjustment(AccountDesignator::InterestAccrual),
            money("3.83")
        );
        assert_eq!(
            payment.adjustment(AccountDesignator::InterestIncome),
            money("-3.83")
        );
        assert_eq!(
            balances.balance(AccountDesignator::InterestAccrual),
            Money::ZERO
        );
        assert_eq!(payment.net_adjustment(), Money::ZERO);
    }

    #[test]
    fn test_write_off_with_insufficient_allowance_warns_but_proceeds() {
        let context = weekly_data_context();
        let mut balances = SimulatedRunningBalances::new();
        balances.adjust(AccountDesignator::CustomerLoanPrincipal, money("800.00"));
        balances.adjust(AccountDesignator::CustomerLoanInterest, money("40.00"));
        // only 500 funded against 840 required
        balances.adjust(AccountDesignator::GeneralLossAllowance, money("-500.00"));
        let mut events = EventStore::new();

        let payment = build_payment(
            &context,
            ScheduledAction::unperioded(Action::WriteOff, date(2024, 3, 1)),
            None,
            0,
            &mut balances,
            &mut events,
        )
        .unwrap();

        assert_eq!(
            payment.cost_component(identifiers::WRITE_OFF).unwrap().amount,
            money("840.00")
        );
        assert_eq!(balances.total_outstanding(), Money::ZERO);
        assert!(events.events().iter().any(|e| matches!(
            e,
            Event::WriteOffShortfall { required, funded, .. }
                if *required == money("840.00") && *funded == money("500.00")
        )));
        assert_eq!(payment.net_adjustment(), Money::ZERO);
    }

    #[test]
    fn test_write_off_with_sufficient_allowance_is_silent() {
        let context = weekly_data_context();
        let mut balances = SimulatedRunningBalances::new();
        balances.adjust(AccountDesignator::CustomerLoanPrincipal, money("300.00"));
        balances.adjust(AccountDesignator::GeneralLossAllowance, money("-500.00"));
        let mut events = EventStore::new();

        build_payment(
            &context,
            ScheduledAction::unperioded(Action::WriteOff, date(2024, 3, 1)),
            None,
            0,
            &mut balances,
            &mut events,
        )
        .unwrap();

        assert!(!events
            .events()
            .iter()
            .any(|e| matches!(e, Event::WriteOffShortfall { .. })));
    }

    #[test]
    fn test_recover_credits_the_allowance() {
        let context = weekly_data_context();
        let mut balances = SimulatedRunningBalances::new();
        let mut events = EventStore::new();

        let payment = build_payment(
            &context,
            ScheduledAction::unperioded(Action::Recover, date(2024, 4, 1)),
            Some(money("150.00")),
            0,
            &mut balances,
            &mut events,
        )
        .unwrap();

        assert_eq!(
            payment.adjustment(AccountDesignator::Entry),
            money("150.00")
        );
        assert_eq!(
            payment.adjustment(AccountDesignator::GeneralLossAllowance),
            money("-150.00")
        );
        assert_eq!(
            payment.cost_component(identifiers::RECOVERY).unwrap().amount,
            money("150.00")
        );
    }

    #[test]
    fn test_mark_late_accrues_late_fee_and_provision_step() {
        let context = weekly_data_context();
        let mut balances = SimulatedRunningBalances::new();
        balances.adjust(AccountDesignator::CustomerLoanPrincipal, money("2000.00"));
        let mut events = EventStore::new();

        let payment = build_payment(
            &context,
            ScheduledAction::unperioded(Action::MarkLate, date(2024, 2, 1)),
            None,
            30,
            &mut balances,
            &mut events,
        )
        .unwrap();

        // the 30-day step provisions 35% of principal
        assert_eq!(
            payment
                .cost_component(identifiers::LOSS_PROVISIONING)
                .unwrap()
                .amount,
            money("700.00")
        );
        // the late fee accrues into customer fees
        let late_fee = payment.cost_component(identifiers::LATE_FEE).unwrap().amount;
        assert!(late_fee.is_positive());
        assert_eq!(balances.fees_outstanding(), late_fee);
        assert_eq!(payment.net_adjustment(), Money::ZERO);
    }

    #[test]
    fn test_import_records_seeded_balances_without_adjustments() {
        let context = weekly_data_context();
        let mut seed = std::collections::BTreeMap::new();
        seed.insert(AccountDesignator::CustomerLoanPrincipal, money("750.00"));
        let mut balances = SimulatedRunningBalances::seeded(seed);
        let mut events = EventStore::new();

        let payment = build_payment(
            &context,
            ScheduledAction::unperioded(Action::Import, date(2024, 1, 1)),
            None,
            0,
            &mut balances,
            &mut events,
        )
        .unwrap();

        assert_eq!(
            payment
                .cost_component(identifiers::IMPORT_BALANCE)
                .unwrap()
                .amount,
            money("750.00")
        );
        assert!(payment.balance_adjustments.is_empty());
        assert_eq!(balances.principal_outstanding(), money("750.00"));
    }

    #[test]
    fn test_administrative_actions_build_empty_payments() {
        let context = weekly_data_context();
        let mut balances = SimulatedRunningBalances::new();
        let mut events = EventStore::new();

        for action in [Action::Open, Action::Approve, Action::Deny, Action::Close] {
            let payment = build_payment(
                &context,
                ScheduledAction::unperioded(action, date(2024, 1, 1)),
                None,
                0,
                &mut balances,
                &mut events,
            )
            .unwrap();
            assert!(payment.cost_components.is_empty());
            assert_eq!(payment.net_adjustment(), Money::ZERO);
        }
    }
}
