//! Recurring rules and their materialisation into ledger transactions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fintrack_domain::{
    Frequency, NewRecurringRule, RecurringRule, RecurringRulePatch, Timestamped, Transaction,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    collection::{newest_first, Repository},
    ledger::Ledger,
    storage::{collections, RecordStore},
    time::Clock,
    CoreError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Appended to the rule description on every generated transaction.
    pub description_suffix: String,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            description_suffix: " (Recurring)".into(),
        }
    }
}

/// Where a rule stands relative to a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    Inactive,
    Pending,
    Due,
    /// The stored frequency is not one this build can evaluate.
    Unschedulable,
}

/// A rule that could not be materialised during a generation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFailure {
    pub rule_id: Uuid,
    pub description: String,
    pub reason: String,
}

impl RuleFailure {
    fn new(rule: &RecurringRule, reason: impl Into<String>) -> Self {
        Self {
            rule_id: rule.id,
            description: rule.description.clone(),
            reason: reason.into(),
        }
    }
}

/// What one generation pass produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    pub generated: Vec<Transaction>,
    pub failures: Vec<RuleFailure>,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Converts a report with failures into [`CoreError::PartialBatchFailure`].
    pub fn into_result(self) -> Result<Vec<Transaction>, CoreError> {
        if self.failures.is_empty() {
            Ok(self.generated)
        } else {
            Err(CoreError::PartialBatchFailure {
                generated: self.generated,
                failures: self.failures,
            })
        }
    }
}

/// Owns the recurring rules and creates their transactions through the [`Ledger`].
pub struct RecurrenceScheduler {
    rules: Repository<RecurringRule>,
    ledger: Arc<Ledger>,
    clock: Arc<dyn Clock>,
    settings: SchedulerSettings,
}

impl RecurrenceScheduler {
    pub fn new(store: Arc<dyn RecordStore>, ledger: Arc<Ledger>, clock: Arc<dyn Clock>) -> Self {
        Self::with_settings(store, ledger, clock, SchedulerSettings::default())
    }

    pub fn with_settings(
        store: Arc<dyn RecordStore>,
        ledger: Arc<Ledger>,
        clock: Arc<dyn Clock>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            rules: Repository::new(store, collections::RECURRING, "Recurring rule"),
            ledger,
            clock,
            settings,
        }
    }

    /// Rules ordered newest first.
    pub fn list(&self) -> Result<Vec<RecurringRule>, CoreError> {
        Ok(newest_first(self.rules.load()?))
    }

    pub fn rule(&self, id: Uuid) -> Result<RecurringRule, CoreError> {
        self.rules.get(id)
    }

    pub fn create(&self, input: NewRecurringRule) -> Result<RecurringRule, CoreError> {
        input.amount.ensure_positive()?;
        validate_description(&input.description)?;
        validate_frequency(&input.frequency)?;
        let rule = self
            .rules
            .insert(RecurringRule::from_input(input, self.clock.now()))?;
        info!(rule_id = %rule.id, frequency = %rule.frequency, "Recurring rule created");
        Ok(rule)
    }

    pub fn update(&self, id: Uuid, patch: RecurringRulePatch) -> Result<RecurringRule, CoreError> {
        if let Some(amount) = patch.amount {
            amount.ensure_positive()?;
        }
        if let Some(description) = &patch.description {
            validate_description(description)?;
        }
        if let Some(frequency) = &patch.frequency {
            validate_frequency(frequency)?;
        }
        let now = self.clock.now();
        self.rules.modify(id, |rule, _| {
            patch.apply_to(rule, now);
            Ok(())
        })
    }

    /// Removes a rule. Transactions it already produced stay in the ledger.
    pub fn delete(&self, id: Uuid) -> Result<RecurringRule, CoreError> {
        let removed = self.rules.remove(id)?;
        info!(rule_id = %id, "Recurring rule deleted");
        Ok(removed)
    }

    /// Flips the `active` flag.
    pub fn toggle(&self, id: Uuid) -> Result<RecurringRule, CoreError> {
        let now = self.clock.now();
        let rule = self.rules.modify(id, |rule, _| {
            rule.active = !rule.active;
            rule.touch(now);
            Ok(())
        })?;
        info!(rule_id = %id, active = rule.active, "Recurring rule toggled");
        Ok(rule)
    }

    pub fn state(&self, rule: &RecurringRule, now: DateTime<Utc>) -> RuleState {
        if !rule.active {
            return RuleState::Inactive;
        }
        match rule.frequency.is_due(rule.reference(), now) {
            Some(true) => RuleState::Due,
            Some(false) => RuleState::Pending,
            None => RuleState::Unschedulable,
        }
    }

    /// Runs [`Self::generate_pending`] at the clock's current time.
    pub fn generate_due(&self) -> Result<GenerationReport, CoreError> {
        self.generate_pending(self.clock.now())
    }

    /// Materialises one transaction for every active rule due at `now`.
    ///
    /// A rule's `last_generated_at` is persisted right after its transaction is
    /// recorded, so a later pass with the same `now` generates nothing. Rules
    /// that cannot be materialised are reported and left untouched; the pass
    /// continues with the remaining rules. Only failures to load the rules
    /// abort the whole pass.
    pub fn generate_pending(&self, now: DateTime<Utc>) -> Result<GenerationReport, CoreError> {
        let _guard = self.rules.lock();
        let mut rules = self.rules.load()?;
        let mut report = GenerationReport::default();

        for index in 0..rules.len() {
            let rule = &rules[index];
            match self.state(rule, now) {
                RuleState::Inactive | RuleState::Pending => continue,
                RuleState::Unschedulable => {
                    warn!(rule_id = %rule.id, frequency = %rule.frequency, "Unsupported frequency");
                    report.failures.push(RuleFailure::new(
                        rule,
                        format!("unsupported frequency `{}`", rule.frequency.as_str()),
                    ));
                    continue;
                }
                RuleState::Due => {}
            }

            let input = rule.materialize(&self.settings.description_suffix, now);
            match self.ledger.create(input) {
                Ok(txn) => {
                    rules[index].last_generated_at = Some(now);
                    if let Err(err) = self.rules.save(&rules) {
                        warn!(rule_id = %rules[index].id, error = %err, "Generated transaction but could not stamp rule");
                        report
                            .failures
                            .push(RuleFailure::new(&rules[index], err.to_string()));
                    }
                    debug!(rule_id = %rules[index].id, transaction_id = %txn.id, "Rule materialised");
                    report.generated.push(txn);
                }
                Err(err) => {
                    warn!(rule_id = %rule.id, error = %err, "Rule could not be materialised");
                    report.failures.push(RuleFailure::new(rule, err.to_string()));
                }
            }
        }

        info!(
            generated = report.generated.len(),
            failed = report.failures.len(),
            "Recurring generation finished"
        );
        Ok(report)
    }
}

fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.trim().is_empty() {
        return Err(CoreError::Validation("description must not be empty".into()));
    }
    Ok(())
}

fn validate_frequency(frequency: &Frequency) -> Result<(), CoreError> {
    if let Frequency::Unsupported(raw) = frequency {
        return Err(CoreError::Validation(format!(
            "unsupported frequency `{raw}`"
        )));
    }
    Ok(())
}
