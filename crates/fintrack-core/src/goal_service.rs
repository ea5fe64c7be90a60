//! Savings goals. Contributions are tracked on the goal only and never move
//! the ledger balance.

use std::sync::Arc;

use fintrack_domain::{Goal, GoalPatch, GoalProgress, Money, NewGoal, Timestamped};
use tracing::info;
use uuid::Uuid;

use crate::{
    collection::{newest_first, Repository},
    storage::{collections, RecordStore},
    time::Clock,
    CoreError,
};

pub struct GoalService {
    goals: Repository<Goal>,
    clock: Arc<dyn Clock>,
}

impl GoalService {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            goals: Repository::new(store, collections::GOALS, "Goal"),
            clock,
        }
    }

    pub fn list(&self) -> Result<Vec<Goal>, CoreError> {
        Ok(newest_first(self.goals.load()?))
    }

    pub fn goal(&self, id: Uuid) -> Result<Goal, CoreError> {
        self.goals.get(id)
    }

    pub fn create(&self, mut input: NewGoal) -> Result<Goal, CoreError> {
        input.name = input.name.trim().to_string();
        validate_name(&input.name)?;
        input.target_amount.ensure_positive()?;
        let goal = self.goals.insert(Goal::from_input(input, self.clock.now()))?;
        info!(goal_id = %goal.id, target = %goal.target_amount, "Goal created");
        Ok(goal)
    }

    pub fn update(&self, id: Uuid, patch: GoalPatch) -> Result<Goal, CoreError> {
        if let Some(name) = &patch.name {
            validate_name(name.trim())?;
        }
        if let Some(target) = patch.target_amount {
            target.ensure_positive()?;
        }
        let now = self.clock.now();
        self.goals.modify(id, |goal, _| {
            patch.apply_to(goal, now);
            Ok(())
        })
    }

    pub fn delete(&self, id: Uuid) -> Result<Goal, CoreError> {
        let removed = self.goals.remove(id)?;
        info!(goal_id = %id, "Goal deleted");
        Ok(removed)
    }

    /// Adds a contribution to the goal's saved amount.
    pub fn add_progress(&self, id: Uuid, amount: Money) -> Result<Goal, CoreError> {
        amount.ensure_positive()?;
        let now = self.clock.now();
        let goal = self.goals.modify(id, |goal, _| {
            goal.current_amount = goal.current_amount.checked_add(amount)?;
            goal.touch(now);
            Ok(())
        })?;
        info!(goal_id = %id, %amount, saved = %goal.current_amount, "Goal contribution recorded");
        Ok(goal)
    }

    /// Progress figures for `goal` as of the service clock.
    pub fn progress(&self, goal: &Goal) -> GoalProgress {
        goal.progress(self.clock.now())
    }
}

fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::Validation("goal name must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ledger::Ledger, storage::MemoryStore, time::FixedClock};
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn setup() -> (Arc<MemoryStore>, Arc<FixedClock>, GoalService) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let service = GoalService::new(store.clone(), clock.clone());
        (store, clock, service)
    }

    #[test]
    fn contributions_accumulate_without_touching_balance() {
        let (store, clock, service) = setup();
        let ledger = Ledger::new(store, clock);
        let goal = service
            .create(NewGoal::new("Trip", Money::from_major(1000), date(2024, 3, 31)))
            .expect("create");
        assert!(goal.current_amount.is_zero());

        service
            .add_progress(goal.id, Money::from_major(150))
            .expect("first");
        let goal = service
            .add_progress(goal.id, Money::from_major(100))
            .expect("second");

        assert_eq!(goal.current_amount, Money::from_major(250));
        assert!(ledger.balance().expect("balance").is_zero());

        let progress = service.progress(&goal);
        assert_eq!(progress.months_left, 3);
        assert_eq!(progress.monthly_target, Money::from_major(250));
    }

    #[test]
    fn rejects_invalid_input() {
        let (_, _, service) = setup();
        assert!(matches!(
            service.create(NewGoal::new("", Money::from_major(10), date(2024, 2, 1))),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            service.create(NewGoal::new("Car", Money::ZERO, date(2024, 2, 1))),
            Err(CoreError::InvalidAmount(_))
        ));
        let goal = service
            .create(NewGoal::new("Car", Money::from_major(10), date(2024, 2, 1)))
            .expect("create");
        assert!(matches!(
            service.add_progress(goal.id, Money::from_major(-1)),
            Err(CoreError::InvalidAmount(_))
        ));
        assert!(matches!(
            service.add_progress(Uuid::new_v4(), Money::from_major(1)),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn list_is_newest_first_and_update_keeps_savings() {
        let (_, clock, service) = setup();
        let first = service
            .create(NewGoal::new("A", Money::from_major(10), date(2024, 6, 1)))
            .expect("a");
        clock.advance(Duration::minutes(1));
        let second = service
            .create(NewGoal::new("B", Money::from_major(10), date(2024, 6, 1)))
            .expect("b");
        let ids: Vec<Uuid> = service.list().expect("list").iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        service
            .add_progress(first.id, Money::from_major(4))
            .expect("save");
        let patch = GoalPatch {
            target_amount: Some(Money::from_major(20)),
            ..GoalPatch::default()
        };
        let updated = service.update(first.id, patch).expect("update");
        assert_eq!(updated.current_amount, Money::from_major(4));
        assert_eq!(updated.target_amount, Money::from_major(20));

        service.delete(second.id).expect("delete");
        assert_eq!(service.list().expect("list").len(), 1);
    }
}
