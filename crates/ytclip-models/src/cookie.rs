//! Session cookie metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the long-lived session cookie whose expiry gates the whole credential set.
pub const TRACKED_COOKIE_NAME: &str = "VISITOR_INFO1_LIVE";

/// Name reported when the tracked cookie is absent and the expiry is estimated.
pub const ESTIMATED_COOKIE_NAME: &str = "ESTIMATED";

/// Expiry information extracted from a Netscape cookie file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieInfo {
    pub name: String,
    pub expires_at: DateTime<Utc>,
    pub is_valid: bool,
}

impl CookieInfo {
    /// Whether the expiry was estimated rather than read from the file.
    pub fn is_estimated(&self) -> bool {
        self.name == ESTIMATED_COOKIE_NAME
    }
}
