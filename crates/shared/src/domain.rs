use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(EventId);
id_newtype!(AssetId);

/// An event record as the data service returns it. `assets` is populated
/// only by the single-event read and `attendee_count` only by the per-user
/// read; both stay at their defaults otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub attendee_count: Option<u64>,
}

/// Join row linking a user to an event. Read-only on this side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMembership {
    pub user_id: UserId,
    pub event_id: EventId,
    pub created_at: DateTime<Utc>,
}

/// Media item attached to an event. Opaque beyond its URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub event_id: EventId,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Descriptor returned by the media upload service. Never persisted locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    pub public_id: String,
    pub secure_url: String,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub format: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_newtypes_serialize_transparently() {
        let id = EventId::new("3f6c");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"3f6c\"");
        let back: EventId = serde_json::from_str("\"3f6c\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn blank_ids_are_detected() {
        assert!(UserId::new("   ").is_blank());
        assert!(!UserId::new("u-1").is_blank());
    }

    #[test]
    fn event_defaults_apply_for_list_shape() {
        let event: Event = serde_json::from_str(
            r#"{"id":"e-1","name":"Launch","created_at":"2026-01-05T10:00:00Z"}"#,
        )
        .unwrap();
        assert!(event.assets.is_empty());
        assert!(event.attendee_count.is_none());
        assert!(event.description.is_none());
    }
}
