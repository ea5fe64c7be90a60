//! Category management. Transactions point at categories by name only, so
//! renaming or deleting a category never rewrites existing transactions.

use std::sync::Arc;

use fintrack_domain::{Category, CategoryPatch};
use tracing::info;
use uuid::Uuid;

use crate::{
    collection::Repository,
    storage::{collections, RecordStore},
    time::Clock,
    CoreError,
};

pub struct CategoryService {
    categories: Repository<Category>,
    clock: Arc<dyn Clock>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            categories: Repository::new(store, collections::CATEGORIES, "Category"),
            clock,
        }
    }

    /// Returns all categories, seeding the default set into an empty store first.
    pub fn list(&self) -> Result<Vec<Category>, CoreError> {
        let _guard = self.categories.lock();
        let existing = self.categories.load()?;
        if !existing.is_empty() {
            return Ok(existing);
        }
        let now = self.clock.now();
        let defaults: Vec<Category> = Category::defaults()
            .into_iter()
            .map(|mut category| {
                category.created_at = Some(now);
                category
            })
            .collect();
        self.categories.save(&defaults)?;
        info!(count = defaults.len(), "Seeded default categories");
        Ok(defaults)
    }

    pub fn category(&self, id: Uuid) -> Result<Category, CoreError> {
        self.categories.get(id)
    }

    /// Case-insensitive lookup by the name transactions refer to.
    pub fn find_by_name(&self, name: &str) -> Result<Option<Category>, CoreError> {
        Ok(self
            .list()?
            .into_iter()
            .find(|category| category.matches_name(name)))
    }

    pub fn create(&self, mut category: Category) -> Result<Category, CoreError> {
        category.name = category.name.trim().to_string();
        validate_name(&category.name)?;
        let _guard = self.categories.lock();
        let mut items = self.categories.load()?;
        ensure_unique(&items, &category.name, None)?;
        category.created_at = Some(self.clock.now());
        items.push(category.clone());
        self.categories.save(&items)?;
        info!(category = %category.name, "Category created");
        Ok(category)
    }

    pub fn update(&self, id: Uuid, patch: CategoryPatch) -> Result<Category, CoreError> {
        if let Some(name) = &patch.name {
            validate_name(name.trim())?;
        }
        let now = self.clock.now();
        self.categories.modify(id, |category, all| {
            if let Some(name) = &patch.name {
                ensure_unique(all, name.trim(), Some(id))?;
            }
            patch.apply_to(category, now);
            Ok(())
        })
    }

    /// Removes a category. Transactions that name it keep the name.
    pub fn delete(&self, id: Uuid) -> Result<Category, CoreError> {
        let removed = self.categories.remove(id)?;
        info!(category = %removed.name, "Category deleted");
        Ok(removed)
    }
}

fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::Validation("category name must not be empty".into()));
    }
    Ok(())
}

fn ensure_unique(items: &[Category], name: &str, except: Option<Uuid>) -> Result<(), CoreError> {
    let clash = items
        .iter()
        .any(|c| Some(c.id) != except && c.matches_name(name));
    if clash {
        return Err(CoreError::Validation(format!(
            "category `{name}` already exists"
        )));
    }
    Ok(())
}
