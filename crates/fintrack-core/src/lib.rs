//! fintrack-core
//!
//! Ledger, recurrence scheduling, aggregation and the smaller aggregate services.
//! Depends on fintrack-domain. Persistence goes through the injected [`RecordStore`].

pub mod aggregation;
pub mod category_service;
mod collection;
pub mod error;
pub mod goal_service;
pub mod ledger;
pub mod notification_service;
pub mod scheduler;
pub mod simulation;
pub mod storage;
pub mod time;

pub use aggregation::*;
pub use category_service::CategoryService;
pub use error::CoreError;
pub use goal_service::GoalService;
pub use ledger::{BalanceChange, Ledger, LedgerSettings, Reconciliation};
pub use notification_service::NotificationService;
pub use scheduler::{GenerationReport, RecurrenceScheduler, RuleFailure, RuleState, SchedulerSettings};
pub use simulation::*;
pub use storage::{MemoryStore, RecordStore, WriteBatch};
pub use time::{Clock, FixedClock, SystemClock};
