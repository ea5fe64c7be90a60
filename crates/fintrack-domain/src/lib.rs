//! fintrack-domain
//!
//! Pure domain models (Money, Transaction, Category, Goal, RecurringRule, Notification).
//! No I/O, no storage. Only data types, enums and the arithmetic they own.

pub mod category;
pub mod common;
pub mod goal;
pub mod money;
pub mod notification;
pub mod recurring;
pub mod transaction;

pub use category::*;
pub use common::*;
pub use goal::*;
pub use money::*;
pub use notification::*;
pub use recurring::*;
pub use transaction::*;
