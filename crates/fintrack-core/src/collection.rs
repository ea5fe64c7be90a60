//! Locked load/modify/save helpers shared by the single-collection services.

use std::{
    marker::PhantomData,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use fintrack_domain::{Identifiable, Timestamped};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::{
    storage::{load_records, save_records, RecordStore},
    CoreError,
};

/// One persisted collection plus the lock serialising its read-modify-write cycles.
pub(crate) struct Repository<T> {
    store: Arc<dyn RecordStore>,
    collection: &'static str,
    entity: &'static str,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Identifiable + Clone,
{
    pub(crate) fn new(
        store: Arc<dyn RecordStore>,
        collection: &'static str,
        entity: &'static str,
    ) -> Self {
        Self {
            store,
            collection,
            entity,
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads without taking the lock. Callers mutating the result must hold [`Self::lock`].
    pub(crate) fn load(&self) -> Result<Vec<T>, CoreError> {
        load_records(self.store.as_ref(), self.collection)
    }

    pub(crate) fn save(&self, items: &[T]) -> Result<(), CoreError> {
        save_records(self.store.as_ref(), self.collection, items)
    }

    pub(crate) fn not_found(&self, id: Uuid) -> CoreError {
        CoreError::not_found(self.entity, id)
    }

    pub(crate) fn get(&self, id: Uuid) -> Result<T, CoreError> {
        self.load()?
            .into_iter()
            .find(|item| item.id() == id)
            .ok_or_else(|| self.not_found(id))
    }

    pub(crate) fn insert(&self, item: T) -> Result<T, CoreError> {
        let _guard = self.lock();
        let mut items = self.load()?;
        items.push(item.clone());
        self.save(&items)?;
        Ok(item)
    }

    /// Applies `change` to the record with `id` and persists the collection.
    pub(crate) fn modify<F>(&self, id: Uuid, change: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut T, &[T]) -> Result<(), CoreError>,
    {
        let _guard = self.lock();
        let mut items = self.load()?;
        let index = position_of(&items, id).ok_or_else(|| self.not_found(id))?;
        let mut updated = items[index].clone();
        change(&mut updated, &items)?;
        items[index] = updated.clone();
        self.save(&items)?;
        Ok(updated)
    }

    pub(crate) fn remove(&self, id: Uuid) -> Result<T, CoreError> {
        let _guard = self.lock();
        let mut items = self.load()?;
        let index = position_of(&items, id).ok_or_else(|| self.not_found(id))?;
        let removed = items.remove(index);
        self.save(&items)?;
        Ok(removed)
    }
}

pub(crate) fn position_of<T: Identifiable>(items: &[T], id: Uuid) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// Orders by creation time, newest first. Ties keep reverse insertion order.
pub(crate) fn newest_first<T: Timestamped>(mut items: Vec<T>) -> Vec<T> {
    items.reverse();
    items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    items
}
