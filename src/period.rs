use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};

use crate::errors::{LendingError, Result};

/// a half-open date interval [begin, end)
///
/// the last repayment period of a schedule carries the `is_last` flag so
/// that final-period adjustments take priority over earlier periods when
/// periods are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    begin: NaiveDate,
    end: NaiveDate,
    is_last: bool,
}

impl Period {
    pub fn new(begin: NaiveDate, end: NaiveDate) -> Result<Self> {
        if begin > end {
            return Err(LendingError::InvalidPeriod { begin, end });
        }
        Ok(Period {
            begin,
            end,
            is_last: false,
        })
    }

    /// a one-day period ending on the given date
    pub fn single_day(end: NaiveDate) -> Self {
        Period {
            begin: end.pred_opt().unwrap_or(end),
            end,
            is_last: false,
        }
    }

    pub fn begin(&self) -> NaiveDate {
        self.begin
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn is_last(&self) -> bool {
        self.is_last
    }

    pub fn mark_last(mut self) -> Self {
        self.is_last = true;
        self
    }

    /// containment over the half-open interval [begin, end)
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.begin <= date && date < self.end
    }

    /// the period's settlement date sits on the end boundary, so boundary
    /// actions test against (begin, end]
    pub fn contains_settlement(&self, date: NaiveDate) -> bool {
        self.begin < date && date <= self.end
    }

    pub fn duration_days(&self) -> i64 {
        (self.end - self.begin).num_days()
    }

    /// ordering key: end desc, begin desc, last period first on ties
    fn sort_key(&self) -> (Reverse<NaiveDate>, Reverse<NaiveDate>, Reverse<bool>) {
        (Reverse(self.end), Reverse(self.begin), Reverse(self.is_last))
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
