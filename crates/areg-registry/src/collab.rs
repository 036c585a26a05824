//! Collaboration sessions and subscriptions.
//!
//! Both are keyed stores whose only tie to the core is an existence check,
//! an access check, and an audit entry.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use areg_types::{AssetId, Principal, Sequence, SessionId};

use crate::error::{RegistryError, RegistryResult};
use crate::validation::check_session_title;

/// Requested session window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub title: String,
    pub starts_at: Sequence,
    pub ends_at: Sequence,
}

impl SessionRequest {
    pub fn validate(&self) -> RegistryResult<()> {
        check_session_title(&self.title)?;
        if !self.ends_at.is_after(&self.starts_at) {
            return Err(RegistryError::Validation(format!(
                "session must end after it starts ({} .. {})",
                self.starts_at, self.ends_at
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborationSession {
    pub id: SessionId,
    pub asset: AssetId,
    pub title: String,
    pub organizer: Principal,
    pub starts_at: Sequence,
    pub ends_at: Sequence,
    pub created_at: Sequence,
}

/// Session and subscription storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborationBook {
    sessions: BTreeMap<SessionId, CollaborationSession>,
    subscriptions: BTreeMap<AssetId, BTreeSet<Principal>>,
}

impl CollaborationBook {
    pub fn insert_session(&mut self, session: CollaborationSession) -> RegistryResult<()> {
        if self.sessions.contains_key(&session.id) {
            return Err(RegistryError::DuplicateEntry(format!("{} already exists", session.id)));
        }
        self.sessions.insert(session.id, session);
        Ok(())
    }

    pub fn session(&self, id: SessionId) -> Option<&CollaborationSession> {
        self.sessions.get(&id)
    }

    pub fn sessions_for(&self, asset: AssetId) -> Vec<&CollaborationSession> {
        self.sessions.values().filter(|s| s.asset == asset).collect()
    }

    pub fn is_subscribed(&self, asset: AssetId, user: &Principal) -> bool {
        self.subscriptions
            .get(&asset)
            .is_some_and(|subs| subs.contains(user))
    }

    /// Returns `true` if the subscription is new.
    pub fn subscribe(&mut self, asset: AssetId, user: &Principal) -> bool {
        self.subscriptions.entry(asset).or_default().insert(user.clone())
    }

    pub fn subscribers(&self, asset: AssetId) -> Vec<Principal> {
        self.subscriptions
            .get(&asset)
            .map(|subs| subs.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Highest session id stored.
    pub fn last_session(&self) -> Option<SessionId> {
        self.sessions.keys().next_back().copied()
    }

    pub fn session_count(&self) -> u64 {
        self.sessions.len() as u64
    }

    pub fn subscription_count(&self) -> u64 {
        self.subscriptions.values().map(|s| s.len() as u64).sum()
    }
}
