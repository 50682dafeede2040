//! Guest records and resolution of the guest id from an invitation link.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::INVITATION_SEGMENT;
use crate::types::GuestId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GuestStatus {
    Pending,
    Accepted,
}

impl GuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "accepted" => Self::Accepted,
            _ => Self::Pending,
        }
    }
}

/// A guest invited by the host. The id is what appears in the invitation
/// link; nothing here is authenticated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Guest {
    pub id: GuestId,
    pub name: String,
    pub mobile: Option<String>,
    pub status: GuestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guest {
    pub fn has_accepted(&self) -> bool {
        self.status == GuestStatus::Accepted
    }
}

/// Derive the guest id from an invitation URL path.
///
/// `/{guestId}` and `/invitation/{guestId}` carry an id; `/` and
/// `/invitation` do not. Query strings and fragments are ignored.
pub fn resolve_guest_id(path: &str) -> Option<GuestId> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();

    let candidate = match parts.as_slice() {
        [INVITATION_SEGMENT] => return None,
        [id] => *id,
        [INVITATION_SEGMENT, id] => *id,
        _ => return None,
    };
    GuestId::parse(candidate).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_welcome_path() {
        assert_eq!(resolve_guest_id("/g42").unwrap().as_str(), "g42");
        assert_eq!(resolve_guest_id("/g42/").unwrap().as_str(), "g42");
    }

    #[test]
    fn test_resolve_invitation_path() {
        assert_eq!(resolve_guest_id("/invitation/g42").unwrap().as_str(), "g42");
        assert_eq!(
            resolve_guest_id("/invitation/g42?utm=whatsapp#events")
                .unwrap()
                .as_str(),
            "g42"
        );
    }

    #[test]
    fn test_resolve_without_guest() {
        assert!(resolve_guest_id("/").is_none());
        assert!(resolve_guest_id("").is_none());
        assert!(resolve_guest_id("/invitation").is_none());
        assert!(resolve_guest_id("/a/b/c").is_none());
        assert!(resolve_guest_id("/invitation/..").is_none());
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(GuestStatus::from_str_lossy(GuestStatus::Accepted.as_str()), GuestStatus::Accepted);
        assert_eq!(GuestStatus::from_str_lossy("whatever"), GuestStatus::Pending);
    }
}
