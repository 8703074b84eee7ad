use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{Action, CaseId, CaseState};

/// all events the engine can emit while computing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ScheduleGenerated {
        case_id: CaseId,
        periods: usize,
        end_of_term: NaiveDate,
    },
    PaymentBuilt {
        case_id: CaseId,
        action: Action,
        for_date: NaiveDate,
        total_cost: Money,
    },
    InterestAccrued {
        case_id: CaseId,
        amount: Money,
        for_date: NaiveDate,
    },
    /// the general loss allowance did not cover a write-off; the write-off
    /// proceeds anyway, this is an operational warning
    WriteOffShortfall {
        case_id: CaseId,
        required: Money,
        funded: Money,
    },
    TransitionRejected {
        case_id: CaseId,
        state: CaseState,
        action: Action,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_event_store_collects_and_drains() {
        let mut store = EventStore::new();
        let case_id = Uuid::new_v4();
        store.emit(Event::WriteOffShortfall {
            case_id,
            required: Money::from_major(500),
            funded: Money::from_major(300),
        });
        assert_eq!(store.events().len(), 1);

        let drained = store.take_events();
        assert_eq!(drained.len(), 1);
        assert!(store.events().is_empty());
    }
}
