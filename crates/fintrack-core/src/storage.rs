use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::CoreError;

/// Collection names shared by every backend.
pub mod collections {
    pub const TRANSACTIONS: &str = "transactions";
    pub const CATEGORIES: &str = "categories";
    pub const GOALS: &str = "goals";
    pub const RECURRING: &str = "recurring";
    pub const NOTIFICATIONS: &str = "notifications";

    pub const ALL: [&str; 5] = [TRANSACTIONS, CATEGORIES, GOALS, RECURRING, NOTIFICATIONS];
}

/// Scalar holding the persisted running balance.
pub const BALANCE_KEY: &str = "balance";

/// A set of writes a backend applies together.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    collections: Vec<(String, Vec<Value>)>,
    scalars: Vec<(String, Decimal)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_collection(&mut self, collection: impl Into<String>, records: Vec<Value>) {
        self.collections.push((collection.into(), records));
    }

    pub fn put_scalar(&mut self, key: impl Into<String>, value: Decimal) {
        self.scalars.push((key.into(), value));
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty() && self.scalars.is_empty()
    }

    pub fn into_parts(self) -> (Vec<(String, Vec<Value>)>, Vec<(String, Decimal)>) {
        (self.collections, self.scalars)
    }
}

/// Abstraction over persistence backends holding named record collections and scalars.
///
/// Records are opaque JSON values; a missing collection loads as empty and a
/// missing scalar loads as `None`.
pub trait RecordStore: Send + Sync {
    fn load(&self, collection: &str) -> Result<Vec<Value>, CoreError>;
    fn save(&self, collection: &str, records: Vec<Value>) -> Result<(), CoreError>;
    fn load_scalar(&self, key: &str) -> Result<Option<Decimal>, CoreError>;
    fn save_scalar(&self, key: &str, value: Decimal) -> Result<(), CoreError>;

    /// Applies every write in `batch`.
    ///
    /// The default applies writes one by one and is not atomic; backends that
    /// can persist both halves together must override it.
    fn commit(&self, batch: WriteBatch) -> Result<(), CoreError> {
        let (collections, scalars) = batch.into_parts();
        for (name, records) in collections {
            self.save(&name, records)?;
        }
        for (key, value) in scalars {
            self.save_scalar(&key, value)?;
        }
        Ok(())
    }
}

/// Loads and decodes every record of `collection`.
pub fn load_records<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: &str,
) -> Result<Vec<T>, CoreError> {
    store
        .load(collection)?
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(CoreError::from))
        .collect()
}

pub fn to_records<T: Serialize>(items: &[T]) -> Result<Vec<Value>, CoreError> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(CoreError::from))
        .collect()
}

pub fn save_records<T: Serialize>(
    store: &dyn RecordStore,
    collection: &str,
    items: &[T],
) -> Result<(), CoreError> {
    store.save(collection, to_records(items)?)
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: HashMap<String, Vec<Value>>,
    scalars: HashMap<String, Decimal>,
}

/// In-process store. `commit` applies a batch under a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordStore for MemoryStore {
    fn load(&self, collection: &str) -> Result<Vec<Value>, CoreError> {
        Ok(self
            .state()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    fn save(&self, collection: &str, records: Vec<Value>) -> Result<(), CoreError> {
        self.state()
            .collections
            .insert(collection.to_string(), records);
        Ok(())
    }

    fn load_scalar(&self, key: &str) -> Result<Option<Decimal>, CoreError> {
        Ok(self.state().scalars.get(key).copied())
    }

    fn save_scalar(&self, key: &str, value: Decimal) -> Result<(), CoreError> {
        self.state().scalars.insert(key.to_string(), value);
        Ok(())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), CoreError> {
        let (collections, scalars) = batch.into_parts();
        let mut state = self.state();
        state.collections.extend(collections);
        state.scalars.extend(scalars);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fintrack_domain::{Money, Transaction};
    use serde_json::json;

    #[test]
    fn missing_collection_and_scalar_load_empty() {
        let store = MemoryStore::new();
        assert!(store.load("nothing").expect("load").is_empty());
        assert_eq!(store.load_scalar("nothing").expect("scalar"), None);
    }

    #[test]
    fn commit_applies_collections_and_scalars() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.put_collection("things", vec![json!({"a": 1})]);
        batch.put_scalar(BALANCE_KEY, Decimal::new(1050, 2));
        store.commit(batch).expect("commit");

        assert_eq!(store.load("things").expect("load"), vec![json!({"a": 1})]);
        assert_eq!(
            store.load_scalar(BALANCE_KEY).expect("scalar"),
            Some(Decimal::new(1050, 2))
        );
    }

    #[test]
    fn stored_transaction_decodes_with_money_amount() {
        let store = MemoryStore::new();
        let id = uuid::Uuid::new_v4();
        store
            .save(
                collections::TRANSACTIONS,
                vec![json!({
                    "id": id,
                    "description": "Groceries",
                    "amount": "236.5",
                    "kind": "expense",
                    "category": "Food",
                    "occurredAt": "2024-03-14T12:00:00Z",
                    "createdAt": "2024-03-14T12:00:00Z"
                })],
            )
            .expect("save");

        let loaded: Vec<Transaction> =
            load_records(&store, collections::TRANSACTIONS).expect("decode");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, id);
        assert_eq!(loaded[0].amount, Money::from_minor(23650));
        assert_eq!(loaded[0].amount.to_string(), "236.50");
        assert_eq!(loaded[0].recurring_ref, None);
    }

    #[test]
    fn malformed_record_surfaces_serde_error() {
        let store = MemoryStore::new();
        store
            .save("numbers", vec![json!("not a number")])
            .expect("save");
        let err = load_records::<u32>(&store, "numbers").expect_err("decode should fail");
        assert!(matches!(err, CoreError::Serde(_)));
    }
}
