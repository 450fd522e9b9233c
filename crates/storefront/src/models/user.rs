//! User record types.

use serde::{Deserialize, Serialize};

use copperleaf_core::{AuthProvider, Email, Role, UserId};

/// The user record as served by the authentication service and cached in the
/// session.
///
/// Replaced wholesale on refresh, never partially patched. A record
/// synthesized from third-party redirect fallback parameters carries no `id`;
/// the next authoritative `/api/auth/me` fetch corrects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<AuthProvider>,
    #[serde(default)]
    pub mfa_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
}

impl UserRecord {
    /// Name to greet the user with: username when set, else the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or_else(|| self.email.as_str())
    }
}
