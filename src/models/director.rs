use serde::{Deserialize, Serialize};

/// Film director reference row; unlike genres and MPA ratings this table is
/// user-mutable. Film payloads may reference a director by bare id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Director {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}
