use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which part of the graph an activity-feed event touched
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Like,
    Friend,
    Review,
}

/// What was done to the entity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventOperation {
    Add,
    Remove,
    Update,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Like => "LIKE",
            EventType::Friend => "FRIEND",
            EventType::Review => "REVIEW",
        }
    }
}

impl FromStr for EventType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIKE" => Ok(EventType::Like),
            "FRIEND" => Ok(EventType::Friend),
            "REVIEW" => Ok(EventType::Review),
            other => Err(AppError::Internal(format!("unknown event type: {other}"))),
        }
    }
}

impl EventOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOperation::Add => "ADD",
            EventOperation::Remove => "REMOVE",
            EventOperation::Update => "UPDATE",
        }
    }
}

impl FromStr for EventOperation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADD" => Ok(EventOperation::Add),
            "REMOVE" => Ok(EventOperation::Remove),
            "UPDATE" => Ok(EventOperation::Update),
            other => Err(AppError::Internal(format!(
                "unknown event operation: {other}"
            ))),
        }
    }
}

/// One immutable row of the activity feed.
///
/// Stamped with a millisecond timestamp at construction; the id is assigned
/// by the storage on append.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Storage-assigned identifier (0 until appended)
    #[serde(rename = "eventId")]
    pub id: i64,
    /// Milliseconds since the Unix epoch, non-decreasing per process
    pub timestamp: i64,
    /// The user who performed the action
    pub user_id: i64,
    pub event_type: EventType,
    pub operation: EventOperation,
    /// Id of the film, friend, or review acted upon
    pub entity_id: i64,
}

impl Event {
    pub fn new(user_id: i64, event_type: EventType, operation: EventOperation, entity_id: i64) -> Self {
        Self {
            id: 0,
            timestamp: next_timestamp_millis(),
            user_id,
            event_type,
            operation,
            entity_id,
        }
    }
}

/// Wall-clock milliseconds clamped so successive calls never go backwards,
/// even if the system clock does.
fn next_timestamp_millis() -> i64 {
    static LAST: AtomicI64 = AtomicI64::new(0);
    let now = Utc::now().timestamp_millis();
    let prev = LAST.fetch_max(now, Ordering::AcqRel);
    prev.max(now)
}
