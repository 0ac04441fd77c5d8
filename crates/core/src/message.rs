//! Payloads exchanged between pages and the worker.
//!
//! Both directions use JSON objects tagged by a `type` field, e.g.
//! `{"type": "CACHE_TOOLS", "tools": ["/tools/a.html"]}`.

use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Commands a page can send to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageMessage {
    /// Leave the waiting state and activate now.
    SkipWaiting,
    /// Fetch and store each listed URL.
    CacheTools { tools: Vec<String> },
}

impl PageMessage {
    /// Interpret a raw payload.
    ///
    /// Returns None for anything malformed or with an unknown `type`.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Notifications the worker broadcasts to connected pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Ask the page to re-check the subscription expiry.
    CheckExpiry { timestamp: String },
    /// Ask the page to push its user data.
    SyncUserData { timestamp: String },
}

impl WorkerMessage {
    pub fn check_expiry() -> Self {
        Self::CheckExpiry { timestamp: now() }
    }

    pub fn sync_user_data() -> Self {
        Self::SyncUserData { timestamp: now() }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Platform-originated background events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum BackgroundTrigger {
    /// One-off sync, tag `sync-user-data`.
    SyncUserData,
    /// Periodic sync, tag `check-expiry-daily`.
    CheckExpiryDaily,
}

impl BackgroundTrigger {
    pub const SYNC_USER_DATA_TAG: &'static str = "sync-user-data";
    pub const CHECK_EXPIRY_TAG: &'static str = "check-expiry-daily";

    /// Map a sync tag to a trigger. Unknown tags yield None.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            Self::SYNC_USER_DATA_TAG => Some(Self::SyncUserData),
            Self::CHECK_EXPIRY_TAG => Some(Self::CheckExpiryDaily),
            _ => None,
        }
    }

    /// The message pages receive for this trigger.
    pub fn message(self) -> WorkerMessage {
        match self {
            Self::SyncUserData => WorkerMessage::sync_user_data(),
            Self::CheckExpiryDaily => WorkerMessage::check_expiry(),
        }
    }
}
