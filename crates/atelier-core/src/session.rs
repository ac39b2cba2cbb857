//! Current-user identity, supplied to the orchestrator as a capability.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub uid: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl SessionUser {
    pub fn new(uid: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.into(),
            email: None,
            photo_url: None,
        }
    }
}

/// Read-only view of who is acting.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<SessionUser>;
}

/// Session holder the auth layer writes and the orchestrator reads.
#[derive(Debug, Default)]
pub struct SharedSession {
    user: RwLock<Option<SessionUser>>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: SessionUser) -> Self {
        Self {
            user: RwLock::new(Some(user)),
        }
    }

    pub fn sign_in(&self, user: SessionUser) {
        tracing::info!("[Session] signed in as {}", user.uid);
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }

    pub fn sign_out(&self) {
        tracing::info!("[Session] signed out");
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl IdentityProvider for SharedSession {
    fn current_user(&self) -> Option<SessionUser> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl IdentityProvider for Option<SessionUser> {
    fn current_user(&self) -> Option<SessionUser> {
        self.clone()
    }
}
