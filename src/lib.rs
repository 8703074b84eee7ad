pub mod balances;
pub mod charges;
pub mod context;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod interest;
pub mod lifecycle;
pub mod payments;
pub mod period;
pub mod plan;
pub mod schedule;
pub mod service;
pub mod types;

// re-export key types
pub use balances::{LedgerReader, LedgerRunningBalances, RunningBalances, SimulatedRunningBalances};
pub use charges::{
    ChargeDefinition, ChargeRange, LossProvisionConfiguration, LossProvisionStep,
    ScheduledCharge, Segment, SegmentSet,
};
pub use context::{CaseEntity, CaseParameters, DataContextOfAction, Product};
pub use decimal::{Money, Rate};
pub use errors::{LendingError, Result};
pub use events::{Event, EventStore};
pub use interest::PeriodRateCalculator;
pub use lifecycle::{allowed_next_actions, assert_action_allowed, state_after};
pub use payments::{build_payment, CostComponent, Payment, PaymentBuilder};
pub use period::Period;
pub use plan::{planned_payments, planned_payments_page, PlannedPayment, PlannedPaymentPage};
pub use schedule::{PaymentCycle, ScheduledAction};
pub use service::IndividualLending;
pub use types::{
    AccountDesignator, Action, CaseId, CaseState, ChargeMethod, ProductId,
    ProportionalDesignator, TemporalUnit,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
