use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Director;

/// Genre reference row (read-only lookup table). Payloads may carry just
/// the id; the name is filled in from the catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Genre {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// MPA age rating reference row (read-only lookup table). Payloads may
/// carry just the id, like [`Genre`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mpa {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// A catalogued film with its reference attributes and the set of users who
/// liked it.
///
/// Genres and directors are kept as ordered sets so membership is free of
/// duplicates and listings come out id-ascending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    /// Storage-assigned identifier (0 until persisted)
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub release_date: NaiveDate,
    /// Duration in minutes
    pub duration: i64,
    pub mpa: Option<Mpa>,
    #[serde(default)]
    pub genres: BTreeSet<Genre>,
    #[serde(default)]
    pub directors: BTreeSet<Director>,
    #[serde(default)]
    pub likes: BTreeSet<i64>,
}

impl Film {
    /// Number of distinct users who liked this film
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    /// Calendar year of the release date
    pub fn release_year(&self) -> i32 {
        self.release_date.year()
    }
}
