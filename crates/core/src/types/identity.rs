//! Cached identity of the logged-in user.

use serde::{Deserialize, Serialize};

use super::{Email, UserId};

/// The user record cached on the client after login.
///
/// The backend session is the source of truth; this is the copy the client
/// keeps between runs. Field names match the backend's login response
/// (`{id, nome, email}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Backend user ID.
    pub id: UserId,
    /// Full display name.
    #[serde(rename = "nome")]
    pub name: String,
    /// Account email, used as the default checkout address.
    pub email: Email,
}

impl UserIdentity {
    /// First word of the display name, used in the header greeting.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or_default()
    }
}
