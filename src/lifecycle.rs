use crate::errors::{LendingError, Result};
use crate::types::{Action, CaseState};

/// the actions permitted from each case state
///
/// the table is fixed and total; closed is terminal. recovery after a
/// write-off is a posting computation, not a state transition, so RECOVER
/// does not appear here.
pub fn allowed_next_actions(state: CaseState) -> &'static [Action] {
    match state {
        CaseState::Created => &[Action::Open, Action::Import],
        CaseState::Pending => &[Action::Deny, Action::Approve],
        CaseState::Approved => &[Action::Disburse, Action::Close],
        CaseState::Active => &[
            Action::Close,
            Action::AcceptPayment,
            Action::MarkLate,
            Action::ApplyInterest,
            Action::Disburse,
            Action::MarkInArrears,
            Action::WriteOff,
        ],
        CaseState::Closed => &[],
    }
}

/// reject an action before any payment builder runs
pub fn assert_action_allowed(state: CaseState, action: Action) -> Result<()> {
    if allowed_next_actions(state).contains(&action) {
        Ok(())
    } else {
        Err(LendingError::InvalidTransition { state, action })
    }
}

/// the state a permitted action moves the case into
pub fn state_after(state: CaseState, action: Action) -> Result<CaseState> {
    assert_action_allowed(state, action)?;
    Ok(match action {
        Action::Open => CaseState::Pending,
        Action::Import => CaseState::Active,
        Action::Deny => CaseState::Closed,
        Action::Approve => CaseState::Approved,
        Action::Disburse => CaseState::Active,
        Action::Close => CaseState::Closed,
        Action::AcceptPayment
        | Action::ApplyInterest
        | Action::MarkLate
        | Action::MarkInArrears
        | Action::WriteOff
        | Action::Recover => state,
    })
}
