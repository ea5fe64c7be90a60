//! Ledger entries and the inputs used to create or patch them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, money::Money};

/// Direction of a ledger entry relative to the balance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Signed contribution of `amount` to the running balance.
    pub fn signed(self, amount: Money) -> Money {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub description: String,
    pub amount: Money,
    pub kind: TransactionKind,
    /// Soft reference to a [`crate::Category`] by name. Never validated or cascaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Rule that materialised this entry, if any. Not an ownership link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_ref: Option<Uuid>,
}

impl Transaction {
    /// Builds a persisted record from validated input.
    pub fn from_input(input: NewTransaction, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: input.description,
            amount: input.amount,
            kind: input.kind,
            category: normalize_category(input.category),
            occurred_at: input.occurred_at.unwrap_or(now),
            created_at: now,
            updated_at: None,
            recurring_ref: input.recurring_ref,
        }
    }

    /// Contribution of this entry to the balance (income positive, expense negative).
    pub fn signed_amount(&self) -> Money {
        self.kind.signed(self.amount)
    }

    /// Category name, or `fallback` when the entry is uncategorised.
    pub fn category_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.category.as_deref().unwrap_or(fallback)
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Timestamped for Transaction {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

/// Caller-supplied fields for a new ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub description: String,
    pub amount: Money,
    pub kind: TransactionKind,
    pub category: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub recurring_ref: Option<Uuid>,
}

impl NewTransaction {
    pub fn new(description: impl Into<String>, amount: Money, kind: TransactionKind) -> Self {
        Self {
            description: description.into(),
            amount,
            kind,
            category: None,
            occurred_at: None,
            recurring_ref: None,
        }
    }

    pub fn income(description: impl Into<String>, amount: Money) -> Self {
        Self::new(description, amount, TransactionKind::Income)
    }

    pub fn expense(description: impl Into<String>, amount: Money) -> Self {
        Self::new(description, amount, TransactionKind::Expense)
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn occurred_at(mut self, when: DateTime<Utc>) -> Self {
        self.occurred_at = Some(when);
        self
    }

    pub fn from_rule(mut self, rule_id: Uuid) -> Self {
        self.recurring_ref = Some(rule_id);
        self
    }
}

/// Partial update for a transaction; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl TransactionPatch {
    pub fn amount(amount: Money) -> Self {
        Self {
            amount: Some(amount),
            ..Self::default()
        }
    }

    /// Merges the patch into `txn`, stamping `updated_at`.
    pub fn apply_to(&self, txn: &mut Transaction, now: DateTime<Utc>) {
        if let Some(description) = &self.description {
            txn.description = description.clone();
        }
        if let Some(amount) = self.amount {
            txn.amount = amount;
        }
        if let Some(kind) = self.kind {
            txn.kind = kind;
        }
        if let Some(category) = &self.category {
            txn.category = normalize_category(Some(category.clone()));
        }
        if let Some(occurred_at) = self.occurred_at {
            txn.occurred_at = occurred_at;
        }
        txn.touch(now);
    }
}

fn normalize_category(category: Option<String>) -> Option<String> {
    category
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}
