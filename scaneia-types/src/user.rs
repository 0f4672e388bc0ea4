use serde::{Deserialize, Serialize};

/// A registered account.
///
/// Credentials (password hash, session tokens) live in adjacent store tables
/// and are never part of this record, so it is safe to serialize to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Milliseconds since the UNIX epoch, assigned by the store at signup.
    pub created_at: u64,
}
