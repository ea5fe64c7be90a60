//! Recurring transaction rules and their due-ness policy.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{de::Deserializer, ser::Serializer, Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::*,
    money::Money,
    transaction::{NewTransaction, TransactionKind},
};

/// How often a rule materialises a transaction.
///
/// Daily and weekly are elapsed-duration thresholds; monthly and yearly are
/// calendar-boundary checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// A stored value this version does not understand. Kept verbatim so it
    /// round-trips, and reported instead of evaluated.
    Unsupported(String),
}

impl Frequency {
    pub fn as_str(&self) -> &str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
            Frequency::Unsupported(raw) => raw,
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly,
            "monthly" => Frequency::Monthly,
            "yearly" => Frequency::Yearly,
            _ => Frequency::Unsupported(value.to_string()),
        }
    }

    /// Whether enough calendar time separates `reference` from `now`.
    ///
    /// Returns `None` for [`Frequency::Unsupported`]. Monthly and yearly only
    /// compare calendar fields, so a `now` in an earlier month than the
    /// reference still counts as a different month.
    pub fn is_due(&self, reference: DateTime<Utc>, now: DateTime<Utc>) -> Option<bool> {
        let due = match self {
            Frequency::Daily => now - reference >= Duration::days(1),
            Frequency::Weekly => now - reference >= Duration::days(7),
            Frequency::Monthly => {
                now.month() != reference.month() || now.year() != reference.year()
            }
            Frequency::Yearly => now.year() != reference.year(),
            Frequency::Unsupported(_) => return None,
        };
        Some(due)
    }

    pub fn label(&self) -> &str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
            Frequency::Yearly => "Yearly",
            Frequency::Unsupported(raw) => raw,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Frequency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Frequency::parse(&value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringRule {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub description: String,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub frequency: Frequency,
    #[serde(default = "RecurringRule::default_active")]
    pub active: bool,
    /// Written only by the scheduler.
    #[serde(default)]
    pub last_generated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RecurringRule {
    pub fn from_input(input: NewRecurringRule, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: input.kind,
            description: input.description,
            amount: input.amount,
            category: input.category,
            frequency: input.frequency,
            active: true,
            last_generated_at: None,
            created_at: now,
            updated_at: None,
        }
    }

    /// Point in time due-ness is measured from.
    pub fn reference(&self) -> DateTime<Utc> {
        self.last_generated_at.unwrap_or(self.created_at)
    }

    /// Transaction input for one materialisation, tagged with this rule's id.
    pub fn materialize(&self, suffix: &str, now: DateTime<Utc>) -> NewTransaction {
        let mut input = NewTransaction::new(
            format!("{}{}", self.description, suffix),
            self.amount,
            self.kind,
        )
        .occurred_at(now)
        .from_rule(self.id);
        input.category = self.category.clone();
        input
    }

    fn default_active() -> bool {
        true
    }
}

impl Identifiable for RecurringRule {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Timestamped for RecurringRule {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecurringRule {
    pub kind: TransactionKind,
    pub description: String,
    pub amount: Money,
    pub category: Option<String>,
    pub frequency: Frequency,
}

impl NewRecurringRule {
    pub fn new(
        kind: TransactionKind,
        description: impl Into<String>,
        amount: Money,
        frequency: Frequency,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            amount,
            category: None,
            frequency,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Editable rule fields. `active` and `last_generated_at` have dedicated operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecurringRulePatch {
    pub kind: Option<TransactionKind>,
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub category: Option<String>,
    pub frequency: Option<Frequency>,
}

impl RecurringRulePatch {
    pub fn apply_to(&self, rule: &mut RecurringRule, now: DateTime<Utc>) {
        if let Some(kind) = self.kind {
            rule.kind = kind;
        }
        if let Some(description) = &self.description {
            rule.description = description.clone();
        }
        if let Some(amount) = self.amount {
            rule.amount = amount;
        }
        if let Some(category) = &self.category {
            rule.category = Some(category.clone());
        }
        if let Some(frequency) = &self.frequency {
            rule.frequency = frequency.clone();
        }
        rule.touch(now);
    }
}
