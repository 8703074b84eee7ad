use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::balances::RunningBalances;
use crate::charges::ScheduledCharge;
use crate::context::{CaseParameters, Product};
use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};
use crate::interest::PeriodRateCalculator;
use crate::period::Period;
use crate::types::{AccountDesignator, ChargeMethod, ProportionalDesignator};

/// the shared charge application engine behind every per-action builder
///
/// charges must be fed in comparator order: proportional bases read the
/// running balances as earlier charges left them, which is what makes
/// charge-on-charge amounts reproducible.
pub struct PaymentBuilder<'a> {
    product: &'a Product,
    parameters: &'a CaseParameters,
    requested_disbursement: Option<Money>,
    requested_payment: Option<Money>,
    period_rates: BTreeMap<Period, Rate>,
    components: Vec<(String, Money)>,
    adjustments: BTreeMap<AccountDesignator, Money>,
}

impl<'a> PaymentBuilder<'a> {
    pub fn new(product: &'a Product, parameters: &'a CaseParameters) -> Self {
        PaymentBuilder {
            product,
            parameters,
            requested_disbursement: None,
            requested_payment: None,
            period_rates: BTreeMap::new(),
            components: Vec::new(),
            adjustments: BTreeMap::new(),
        }
    }

    pub fn with_requested_disbursement(mut self, amount: Option<Money>) -> Self {
        self.requested_disbursement = amount;
        self
    }

    pub fn with_requested_payment(mut self, amount: Option<Money>) -> Self {
        self.requested_payment = amount;
        self
    }

    /// supply the compounded per-period rates interest charges draw on
    pub fn with_period_rates(mut self, rates: BTreeMap<Period, Rate>) -> Self {
        self.period_rates = rates;
        self
    }

    /// the disbursement amount in effect: requested, else the ceiling
    pub fn effective_disbursement(&self) -> Money {
        self.requested_disbursement
            .unwrap_or(self.parameters.maximum_balance)
    }

    /// the repayment size in effect: requested, else configured, else none
    pub fn effective_payment_size(&self) -> Option<Money> {
        self.requested_payment.or(self.parameters.payment_size)
    }

    fn round(&self, amount: Money) -> Money {
        amount.round_minor_units(self.product.minor_currency_unit_digits)
    }

    fn components_total(&self) -> Money {
        self.components
            .iter()
            .fold(Money::ZERO, |acc, (_, amount)| acc + *amount)
    }

    /// the amount a charge's proportionality designator names right now
    fn base_amount(
        &self,
        designator: ProportionalDesignator,
        charge_on_top: bool,
        balances: &dyn RunningBalances,
    ) -> Money {
        let base = match designator {
            ProportionalDesignator::RunningBalance => balances.total_outstanding(),
            ProportionalDesignator::Principal => balances.principal_outstanding(),
            ProportionalDesignator::MaximumBalance => self.parameters.maximum_balance,
            ProportionalDesignator::RequestedDisbursement => self.effective_disbursement(),
            ProportionalDesignator::RequestedRepayment => self
                .effective_payment_size()
                .unwrap_or_else(|| balances.total_outstanding()),
        };
        if charge_on_top {
            base + self.components_total()
        } else {
            base
        }
    }

    /// apply one scheduled charge against the running balances
    ///
    /// a tiered charge whose range does not contain its base is omitted;
    /// accruing charges applied at their accrue action debit the receivable
    /// and credit the accrual designator, all other charges move from their
    /// source to their target designator.
    pub fn apply_scheduled_charge(
        &mut self,
        charge: &ScheduledCharge,
        balances: &mut dyn RunningBalances,
    ) -> Result<()> {
        let definition = &charge.charge_definition;

        let base = definition
            .proportional_to
            .map(|d| self.base_amount(d, definition.charge_on_top, balances));

        if let (Some(range), Some(base)) = (charge.charge_range, base) {
            if !range.contains(base.as_decimal()) {
                return Ok(());
            }
        }

        let amount = match definition.charge_method {
            ChargeMethod::Fixed => Money::from_decimal(definition.amount),
            ChargeMethod::Proportional => {
                let base = base.ok_or_else(|| LendingError::InvalidConfiguration {
                    message: format!(
                        "proportional charge {} has no base amount",
                        definition.identifier
                    ),
                })?;
                base.percentage(definition.amount)
            }
            ChargeMethod::Interest => {
                let base = base.ok_or_else(|| LendingError::InvalidConfiguration {
                    message: format!(
                        "interest charge {} has no base amount",
                        definition.identifier
                    ),
                })?;
                base.apply_rate(self.rate_for(charge)?)
            }
        };
        let amount = self.round(amount);
        if amount.is_zero() {
            return Ok(());
        }

        if definition.accrues_on(charge.scheduled_action.action) {
            let accrual = definition.accrual_account_designator.ok_or_else(|| {
                LendingError::InvalidConfiguration {
                    message: format!(
                        "accruing charge {} has no accrual account designator",
                        definition.identifier
                    ),
                }
            })?;
            self.post(definition.from_account_designator, amount, balances);
            self.post(accrual, -amount, balances);
        } else {
            self.post(definition.from_account_designator, -amount, balances);
            self.post(definition.to_account_designator, amount, balances);
        }

        self.record_component(&definition.identifier, amount);
        Ok(())
    }

    fn rate_for(&self, charge: &ScheduledCharge) -> Result<Rate> {
        let period = charge.scheduled_action.action_period.ok_or_else(|| {
            LendingError::CalculationError {
                message: format!(
                    "interest charge {} scheduled without an action period",
                    charge.charge_definition.identifier
                ),
            }
        })?;
        if let Some(rate) = self.period_rates.get(&period) {
            return Ok(*rate);
        }
        let daily = self
            .parameters
            .interest_rate
            .daily_rate(self.product.rate_precision);
        Ok(PeriodRateCalculator::compounded_rate_for(
            daily,
            &period,
            self.product.rate_precision,
        ))
    }

    /// record an explicit double-entry leg pair computed by an action
    /// specific builder
    pub fn post_pair(
        &mut self,
        debit: AccountDesignator,
        credit: AccountDesignator,
        amount: Money,
        balances: &mut dyn RunningBalances,
    ) {
        let amount = self.round(amount);
        if amount.is_zero() {
            return;
        }
        self.post(debit, amount, balances);
        self.post(credit, -amount, balances);
    }

    /// record a cost component, merging with any earlier component of the
    /// same charge; zero components are kept so callers always see the
    /// full component set of an action
    pub fn record_component(&mut self, charge_identifier: &str, amount: Money) {
        let amount = self.round(amount);
        if let Some((_, existing)) = self
            .components
            .iter_mut()
            .find(|(identifier, _)| identifier == charge_identifier)
        {
            *existing += amount;
        } else {
            self.components.push((charge_identifier.to_string(), amount));
        }
    }

    fn post(
        &mut self,
        designator: AccountDesignator,
        delta: Money,
        balances: &mut dyn RunningBalances,
    ) {
        balances.adjust(designator, delta);
        let entry = self.adjustments.entry(designator).or_insert(Money::ZERO);
        *entry += delta;
    }

    pub fn build(self, date: NaiveDate) -> super::Payment {
        super::Payment {
            cost_components: self
                .components
                .into_iter()
                .map(|(charge_identifier, amount)| super::CostComponent {
                    charge_identifier,
                    amount,
                })
                .collect(),
            balance_adjustments: self.adjustments,
            date: Some(date),
        }
    }
}
