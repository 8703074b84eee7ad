use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use crate::charges::ScheduledCharge;
use crate::decimal::Rate;
use crate::errors::{LendingError, Result};
use crate::period::Period;
use crate::types::{Action, TemporalUnit};

/// converts a nominal annual rate into compounded per-period accrual rates
///
/// every distinct action period carried by an interest accrual charge gets
/// its own effective rate: the daily rate compounded multiplicatively over
/// the period's day count. adjacent sub-periods feeding the same repayment
/// period therefore combine as (1+r)^n - 1, never as n*r.
pub struct PeriodRateCalculator;

impl PeriodRateCalculator {
    /// per-period compounded rates for all interest accrual periods among
    /// the given scheduled charges
    pub fn compounded_rates(
        nominal_annual_rate: Rate,
        scheduled_charges: &[ScheduledCharge],
        precision: u32,
    ) -> Result<BTreeMap<Period, Rate>> {
        let daily = nominal_annual_rate.daily_rate(precision);
        let mut rates = BTreeMap::new();
        for charge in scheduled_charges {
            if charge.scheduled_action.action != Action::ApplyInterest {
                continue;
            }
            let period = charge.scheduled_action.action_period.ok_or_else(|| {
                LendingError::CalculationError {
                    message: "interest accrual scheduled without an action period".to_string(),
                }
            })?;
            rates
                .entry(period)
                .or_insert_with(|| Self::compounded_rate_for(daily, &period, precision));
        }
        Ok(rates)
    }

    /// the effective rate of a single accrual period
    pub fn compounded_rate_for(daily_rate: Rate, period: &Period, precision: u32) -> Rate {
        let days = period.duration_days().max(0) as u32;
        daily_rate.compounded_over_days(days, precision)
    }

    /// the fraction of a year one temporal unit covers, used to scale
    /// cycle-sized charges
    pub fn fraction_of_year(unit: TemporalUnit) -> Decimal {
        match unit {
            TemporalUnit::Days => Decimal::ONE / dec!(365.2425),
            TemporalUnit::Weeks => dec!(7) / dec!(365.2425),
            TemporalUnit::Months => Decimal::ONE / dec!(12),
            TemporalUnit::Years => Decimal::ONE,
        }
    }
}
