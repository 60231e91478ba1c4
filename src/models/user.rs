use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A registered user together with the set of user ids they follow.
///
/// Friendship is a directed edge: `friends` holds the ids this user follows,
/// which says nothing about who follows them back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Storage-assigned identifier (0 until persisted)
    pub id: i64,
    pub email: String,
    pub login: String,
    /// Display name; the service substitutes the login when this is blank
    pub name: String,
    pub birthday: NaiveDate,
    #[serde(default)]
    pub friends: BTreeSet<i64>,
}
