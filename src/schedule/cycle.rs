use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::{LendingError, Result};
use crate::types::TemporalUnit;

/// calendar granularity used to decide which alignments apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Frame {
    Day,
    Week,
    Month,
    Year,
}

fn unit_frame(unit: TemporalUnit) -> Frame {
    match unit {
        TemporalUnit::Days => Frame::Day,
        TemporalUnit::Weeks => Frame::Week,
        TemporalUnit::Months => Frame::Month,
        TemporalUnit::Years => Frame::Year,
    }
}

/// repayment cadence of a loan case
///
/// alignment fields are all optional and zero-based:
/// - `alignment_day` is a day of week (0 = monday) when a week alignment
///   is active or the unit is weeks, otherwise a day of month clamped to
///   the month's length
/// - `alignment_week` counts occurrences of the aligned weekday within
///   the month; the sentinel `-1` selects the last calendar day of the
///   month instead
/// - `alignment_month` is a month of year, only effective for yearly
///   cadences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCycle {
    temporal_unit: TemporalUnit,
    period: u32,
    alignment_day: Option<u32>,
    alignment_week: Option<i32>,
    alignment_month: Option<u32>,
}

/// sentinel for `alignment_week`: the last calendar day of the month
pub const LAST_DAY_OF_MONTH: i32 = -1;

impl PaymentCycle {
    pub fn new(
        temporal_unit: TemporalUnit,
        period: u32,
        alignment_day: Option<u32>,
        alignment_week: Option<i32>,
        alignment_month: Option<u32>,
    ) -> Result<Self> {
        if period == 0 {
            return Err(LendingError::NonTerminatingCycle {
                message: "payment cycle period is zero".to_string(),
            });
        }
        if let Some(month) = alignment_month {
            if month > 11 {
                return Err(LendingError::InvalidConfiguration {
                    message: format!("alignment month {} out of range 0..=11", month),
                });
            }
        }
        if let Some(week) = alignment_week {
            if week < LAST_DAY_OF_MONTH || week > 3 {
                return Err(LendingError::InvalidConfiguration {
                    message: format!("alignment week {} out of range -1..=3", week),
                });
            }
        }
        if let Some(day) = alignment_day {
            let week_aligned =
                alignment_week.is_some() || temporal_unit == TemporalUnit::Weeks;
            if week_aligned && day > 6 {
                return Err(LendingError::InvalidConfiguration {
                    message: format!("alignment day of week {} out of range 0..=6", day),
                });
            }
            if !week_aligned && day > 30 {
                return Err(LendingError::InvalidConfiguration {
                    message: format!("alignment day of month {} out of range 0..=30", day),
                });
            }
        }
        Ok(PaymentCycle {
            temporal_unit,
            period,
            alignment_day,
            alignment_week,
            alignment_month,
        })
    }

    /// an unaligned cadence
    pub fn unaligned(temporal_unit: TemporalUnit, period: u32) -> Result<Self> {
        PaymentCycle::new(temporal_unit, period, None, None, None)
    }

    pub fn temporal_unit(&self) -> TemporalUnit {
        self.temporal_unit
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// whether day alignment is to be read as a day of week
    fn week_aligned(&self) -> bool {
        self.alignment_week.is_some() || self.temporal_unit == TemporalUnit::Weeks
    }

    /// the next scheduled payment date after `last`
    ///
    /// fixed pipeline: increment by the cycle length, orient to the start
    /// of the enclosing frame of the coarsest specified alignment (capped
    /// at the cycle unit's own granularity), then apply alignments from
    /// coarsest to finest.
    pub fn next_payment_date(&self, last: NaiveDate) -> NaiveDate {
        let incremented = advance(last, self.temporal_unit, self.period);
        let oriented = self.orient(incremented);
        self.align(oriented)
    }

    fn orient(&self, date: NaiveDate) -> NaiveDate {
        let desired = if self.alignment_month.is_some() {
            Frame::Year
        } else if self.alignment_week.is_some() {
            Frame::Month
        } else if self.alignment_day.is_some() {
            if self.week_aligned() {
                Frame::Week
            } else {
                Frame::Month
            }
        } else {
            return date;
        };

        match desired.min(unit_frame(self.temporal_unit)) {
            Frame::Year => date.with_day(1).and_then(|d| d.with_month(1)).unwrap_or(date),
            Frame::Month => date.with_day(1).unwrap_or(date),
            Frame::Week => start_of_week(date),
            Frame::Day => date,
        }
    }

    fn align(&self, date: NaiveDate) -> NaiveDate {
        let unit = unit_frame(self.temporal_unit);
        let mut date = date;

        if let Some(month) = self.alignment_month {
            if Frame::Month <= unit {
                date = set_month_clamped(date, month + 1);
            }
        }

        if let Some(week) = self.alignment_week {
            if Frame::Week <= unit {
                if week == LAST_DAY_OF_MONTH {
                    date = last_day_of_month(date);
                    // day alignment only adjusts when the weekday disagrees,
                    // moving backward to stay inside the month
                    if let Some(day) = self.alignment_day {
                        let target = weekday_from_index(day);
                        if date.weekday() != target {
                            date = previous_weekday(date, target);
                        }
                    }
                } else {
                    let target = weekday_from_index(self.alignment_day.unwrap_or(0));
                    date = next_or_same_weekday(date, target) + Days::new(7 * week as u64);
                }
                return date;
            }
        }

        if let Some(day) = self.alignment_day {
            if self.week_aligned() {
                date = start_of_week(date) + Days::new(day as u64);
            } else {
                date = set_day_clamped(date, day + 1);
            }
        }

        date
    }
}

/// advance a date by whole temporal units
pub(crate) fn advance(date: NaiveDate, unit: TemporalUnit, count: u32) -> NaiveDate {
    match unit {
        TemporalUnit::Days => date + Days::new(count as u64),
        TemporalUnit::Weeks => date + Days::new(7 * count as u64),
        TemporalUnit::Months => date + Months::new(count),
        TemporalUnit::Years => date + Months::new(12 * count),
    }
}

fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.weekday().num_days_from_monday() as u64)
}

fn weekday_from_index(index: u32) -> Weekday {
    match index % 7 {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

fn next_or_same_weekday(date: NaiveDate, target: Weekday) -> NaiveDate {
    let offset = (7 + target.num_days_from_monday() as i64
        - date.weekday().num_days_from_monday() as i64)
        % 7;
    date + Days::new(offset as u64)
}

fn previous_weekday(date: NaiveDate, target: Weekday) -> NaiveDate {
    let offset = (7 + date.weekday().num_days_from_monday() as i64
        - target.num_days_from_monday() as i64)
        % 7;
    let offset = if offset == 0 { 7 } else { offset };
    date - Days::new(offset as u64)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let day = days_in_month(date.year(), date.month());
    date.with_day(day).unwrap_or(date)
}

fn set_day_clamped(date: NaiveDate, day: u32) -> NaiveDate {
    let day = day.min(days_in_month(date.year(), date.month()));
    date.with_day(day).unwrap_or(date)
}

fn set_month_clamped(date: NaiveDate, month: u32) -> NaiveDate {
    let day = date.day().min(days_in_month(date.year(), month));
    date.with_day(day)
        .and_then(|d| d.with_month(month))
        .unwrap_or(date)
}
