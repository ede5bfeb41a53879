use serde::{Deserialize, Serialize};

/// A registered account as stored in the persisted document.
///
/// `password` always holds the argon2 PHC string, never the plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_chirpy_red: bool,
}

/// A short post. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: u64,
    pub author_id: u64,
    pub body: String,
}

/// Ordering of chirp listings by identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Parse the `sort` query value. Only `desc` selects descending order;
    /// anything else, including no value, falls back to ascending.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("desc") => Self::Descending,
            _ => Self::Ascending,
        }
    }
}
