use serde::{Deserialize, Serialize};

/// A website registered by a user for scanning.
///
/// The description is generated by the URL risk-summary prompt when the site
/// is added; it is free text and may be edited later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    /// Identifier of the owning [`User`](crate::User). All site and scan
    /// operations are checked against this field.
    pub owner_id: String,
    pub url: String,
    pub description: String,
    /// Milliseconds since the UNIX epoch, assigned by the store.
    pub created_at: u64,
    /// Bumped by the store on every update.
    pub updated_at: u64,
}
