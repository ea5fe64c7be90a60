//! Spending and income categories.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, transaction::TransactionKind};

pub const DEFAULT_ICON: &str = "💵";
pub const DEFAULT_COLOR: &str = "#636e72";

/// Groups transactions for reporting. Transactions reference categories by `name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "Category::default_icon")]
    pub icon: String,
    #[serde(default = "Category::default_color")]
    pub color: String,
    pub kind: CategoryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Category {
    pub fn new(name: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            icon: Self::default_icon(),
            color: Self::default_color(),
            kind,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_style(mut self, icon: impl Into<String>, color: impl Into<String>) -> Self {
        self.icon = icon.into();
        self.color = color.into();
        self
    }

    /// Returns `true` when transactions of `kind` may be filed under this category.
    pub fn accepts(&self, kind: TransactionKind) -> bool {
        match (self.kind, kind) {
            (CategoryKind::Both, _) => true,
            (CategoryKind::Income, TransactionKind::Income) => true,
            (CategoryKind::Expense, TransactionKind::Expense) => true,
            _ => false,
        }
    }

    /// Case-insensitive match against the soft-reference key.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }

    /// The category set seeded into an empty store.
    pub fn defaults() -> Vec<Category> {
        [
            ("Food", "🍔", "#ff6b6b", CategoryKind::Expense),
            ("Transport", "🚗", "#4ecdc4", CategoryKind::Expense),
            ("Housing", "🏠", "#45b7d1", CategoryKind::Expense),
            ("Health", "⚕️", "#96ceb4", CategoryKind::Expense),
            ("Education", "📚", "#ffeaa7", CategoryKind::Expense),
            ("Leisure", "🎮", "#dfe6e9", CategoryKind::Expense),
            ("Shopping", "🛍️", "#fd79a8", CategoryKind::Expense),
            ("Bills", "💳", "#fdcb6e", CategoryKind::Expense),
            ("Salary", "💼", "#00b894", CategoryKind::Income),
            ("Freelance", "💻", "#00cec9", CategoryKind::Income),
            ("Investments", "📈", "#0984e3", CategoryKind::Income),
            ("Other", DEFAULT_ICON, DEFAULT_COLOR, CategoryKind::Both),
        ]
        .into_iter()
        .map(|(name, icon, color, kind)| Category::new(name, kind).with_style(icon, color))
        .collect()
    }

    fn default_icon() -> String {
        DEFAULT_ICON.into()
    }

    fn default_color() -> String {
        DEFAULT_COLOR.into()
    }
}

impl Identifiable for Category {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Supported category types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
    Both,
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CategoryKind::Income => "Income",
            CategoryKind::Expense => "Expense",
            CategoryKind::Both => "Both",
        };
        f.write_str(label)
    }
}

/// Partial update for a category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub kind: Option<CategoryKind>,
}

impl CategoryPatch {
    pub fn apply_to(&self, category: &mut Category, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            category.name = name.trim().to_string();
        }
        if let Some(icon) = &self.icon {
            category.icon = icon.clone();
        }
        if let Some(color) = &self.color {
            category.color = color.clone();
        }
        if let Some(kind) = self.kind {
            category.kind = kind;
        }
        category.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_both_directions() {
        let defaults = Category::defaults();
        assert_eq!(defaults.len(), 12);
        let other = defaults.iter().find(|c| c.name == "Other").unwrap();
        assert!(other.accepts(TransactionKind::Income));
        assert!(other.accepts(TransactionKind::Expense));
        let salary = defaults.iter().find(|c| c.name == "Salary").unwrap();
        assert!(!salary.accepts(TransactionKind::Expense));
    }

    #[test]
    fn missing_style_fields_fall_back_to_defaults() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "name": "Pets",
            "kind": "expense"
        });
        let category: Category = serde_json::from_value(json).unwrap();
        assert_eq!(category.icon, DEFAULT_ICON);
        assert_eq!(category.color, DEFAULT_COLOR);
    }
}
