use std::sync::Arc;

use fintrack_domain::Notification;
use tracing::debug;
use uuid::Uuid;

use crate::{
    collection::{newest_first, Repository},
    storage::{collections, RecordStore},
    time::Clock,
    CoreError,
};

/// In-app notification inbox.
pub struct NotificationService {
    notifications: Repository<Notification>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            notifications: Repository::new(store, collections::NOTIFICATIONS, "Notification"),
            clock,
        }
    }

    pub fn list(&self) -> Result<Vec<Notification>, CoreError> {
        Ok(newest_first(self.notifications.load()?))
    }

    pub fn push(&self, title: &str, message: &str) -> Result<Notification, CoreError> {
        let notification = self
            .notifications
            .insert(Notification::new(title, message, self.clock.now()))?;
        debug!(notification_id = %notification.id, "Notification pushed");
        Ok(notification)
    }

    pub fn mark_as_read(&self, id: Uuid) -> Result<Notification, CoreError> {
        self.notifications.modify(id, |notification, _| {
            notification.read = true;
            Ok(())
        })
    }

    /// Marks everything read and returns how many entries changed.
    pub fn mark_all_as_read(&self) -> Result<usize, CoreError> {
        let _guard = self.notifications.lock();
        let mut items = self.notifications.load()?;
        let mut changed = 0;
        for notification in items.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed += 1;
        }
        if changed > 0 {
            self.notifications.save(&items)?;
        }
        Ok(changed)
    }

    pub fn unread_count(&self) -> Result<usize, CoreError> {
        Ok(self
            .notifications
            .load()?
            .iter()
            .filter(|n| !n.read)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{storage::MemoryStore, time::FixedClock};
    use chrono::{Duration, Utc};

    #[test]
    fn read_state_transitions() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let service = NotificationService::new(Arc::new(MemoryStore::new()), clock.clone());
        let welcome = service.push("Welcome", "Hello").expect("push");
        clock.advance(Duration::seconds(5));
        service.push("Budget", "Over budget").expect("push");
        clock.advance(Duration::seconds(5));
        service.push("Goal", "Halfway there").expect("push");

        assert_eq!(service.list().expect("list")[0].title, "Goal");
        assert_eq!(service.unread_count().expect("count"), 3);

        assert!(service.mark_as_read(welcome.id).expect("read").read);
        assert_eq!(service.unread_count().expect("count"), 2);
        assert_eq!(service.mark_all_as_read().expect("all"), 2);
        assert_eq!(service.mark_all_as_read().expect("again"), 0);
        assert_eq!(service.unread_count().expect("count"), 0);

        assert!(matches!(
            service.mark_as_read(Uuid::new_v4()),
            Err(CoreError::NotFound { .. })
        ));
    }
}
