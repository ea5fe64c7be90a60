//! In-app notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            message: message.into(),
            read: false,
            created_at: now,
        }
    }
}

impl Identifiable for Notification {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Timestamped for Notification {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self, _now: DateTime<Utc>) {}
}
