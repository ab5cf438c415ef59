//! Data model exchanged between the cookie cache, the operator and the host page.
//!
//! Identifiers and preferences are signed by the operator; the client never looks
//! inside the signature and keeps every field it does not understand in an
//! `extra` map so values round-trip through the cache unchanged.
//!
//! Field names follow the operator's JSON (camelCase).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;

/// A pseudonymous user identifier issued by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    /// Opaque identifier value.
    pub value: String,

    /// Whether the operator retains the identifier across sessions.
    ///
    /// Absent means `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persisted: Option<bool>,

    /// Version, type, source and signature as sent by the operator.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identifier {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self {
            value: value.into(),
            persisted: None,
            extra: Map::new(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted != Some(false)
    }
}

/// Signed consent choices. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences(pub Value);

/// The aggregate returned to the host page and stored in the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdsAndOptionalPreferences {
    #[serde(default)]
    pub identifiers: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

impl IdsAndOptionalPreferences {
    /// The aggregate meaning "the operator has no data for this user".
    pub fn not_participating() -> Self {
        Self::default()
    }

    /// Identifiers the operator will keep; only these are cached.
    pub fn persisted_identifiers(&self) -> Vec<Identifier> {
        self.identifiers
            .iter()
            .filter(|id| id.is_persisted())
            .cloned()
            .collect()
    }

    pub fn has_persisted_identifier(&self) -> bool {
        self.identifiers.iter().any(Identifier::is_persisted)
    }
}

/// An unsigned write request: identifiers plus the preferences to store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdsAndPreferences {
    pub identifiers: Vec<Identifier>,
    pub preferences: Preferences,
}

/// Preference choices before signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedPreferences {
    pub version: String,
    pub data: Value,
}

/// Input of the preference signing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPreferences {
    pub identifiers: Vec<Identifier>,
    pub unsigned_preferences: UnsignedPreferences,
}

/// Signed operator response as returned by the read and write endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorResponse {
    pub body: IdsAndOptionalPreferences,

    /// Sender, receiver, timestamp and signature.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Error description carried back by a redirect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    #[serde(default)]
    pub message: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "(no message)")
        } else {
            write!(f, "{}", self.message)
        }
    }
}

/// Payload carried in the query string when the operator redirects back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<OperatorResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// Answer of the 3PC verification endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Verify3pcResponse {
    #[serde(default)]
    pub timestamp: Option<f64>,
}

impl Verify3pcResponse {
    /// A positive timestamp means the test cookie came back.
    pub fn is_supported(&self) -> bool {
        self.timestamp.is_some_and(|ts| ts > 0.0)
    }
}
