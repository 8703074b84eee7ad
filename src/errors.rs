use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{Action, CaseState};

#[derive(Error, Debug)]
pub enum LendingError {
    #[error("action {action:?} not permitted from state {state:?}")]
    InvalidTransition {
        state: CaseState,
        action: Action,
    },

    #[error("no payment builder mapped for action {action:?}")]
    UnmappedAction {
        action: Action,
    },

    #[error("payment cycle cannot terminate: {message}")]
    NonTerminatingCycle {
        message: String,
    },

    #[error("charge {charge_identifier} names no segment set")]
    NoSegmentConfigured {
        charge_identifier: String,
    },

    #[error("segment {segment_identifier} not found in segment set {segment_set_identifier}")]
    SegmentNotFound {
        segment_set_identifier: String,
        segment_identifier: String,
    },

    #[error("invalid period: begin {begin} is after end {end}")]
    InvalidPeriod {
        begin: NaiveDate,
        end: NaiveDate,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LendingError>;
