//! Message envelope and the identifiers that travel inside it.
//!
//! Every message crossing the hub is a JSON object. The hub only cares about a
//! handful of envelope fields; everything else is payload and is relayed
//! verbatim:
//!
//! | field    | meaning |
//! |----------|---------|
//! | `type`   | `CONNECT`, `CONNACK`, `PUBLISH`, or any application-defined value |
//! | `target` | destination application id (absent on `CONNECT`) |
//! | `source` | sender application id, always written by the hub |
//! | `token`  | session token (absent on the first `CONNECT`) |
//! | `viaHub` | `true` on everything the hub relays or acknowledges |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

const FIELD_TYPE: &str = "type";
const FIELD_TARGET: &str = "target";
const FIELD_SOURCE: &str = "source";
const FIELD_TOKEN: &str = "token";
const FIELD_VIA_HUB: &str = "viaHub";

/// Identifier of the application living in a frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AppId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AppId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-connection secret shared between the hub and exactly one frame.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are secrets; keep them out of `{:?}` output in logs.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(..)")
    }
}

/// The `type` field of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    Connect,
    Connack,
    Publish,
    /// Application-defined type; relayed nowhere, only traced.
    Other(String),
}

impl MessageType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "CONNECT" => Self::Connect,
            "CONNACK" => Self::Connack,
            "PUBLISH" => Self::Publish,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Connect => "CONNECT",
            Self::Connack => "CONNACK",
            Self::Publish => "PUBLISH",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A JSON object message with typed access to the envelope fields.
///
/// Unknown fields are preserved, so payloads survive enrichment untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Envelope(Map<String, Value>);

impl Envelope {
    /// Wrap a raw value. Returns `None` unless it is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Handshake acknowledgement sent back to a freshly connected frame.
    pub fn connack(app_id: &AppId, token: &Token) -> Self {
        let mut map = Map::new();
        map.insert(FIELD_TYPE.into(), Value::from(MessageType::Connack.as_str()));
        map.insert(FIELD_VIA_HUB.into(), Value::Bool(true));
        map.insert(FIELD_TARGET.into(), Value::from(app_id.as_str()));
        map.insert(FIELD_TOKEN.into(), Value::from(token.as_str()));
        Self(map)
    }

    pub fn kind(&self) -> Option<MessageType> {
        self.str_field(FIELD_TYPE).map(MessageType::parse)
    }

    pub fn target(&self) -> Option<&str> {
        self.str_field(FIELD_TARGET)
    }

    pub fn source(&self) -> Option<&str> {
        self.str_field(FIELD_SOURCE)
    }

    pub fn token(&self) -> Option<&str> {
        self.str_field(FIELD_TOKEN)
    }

    pub fn via_hub(&self) -> bool {
        matches!(self.0.get(FIELD_VIA_HUB), Some(Value::Bool(true)))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set_source(&mut self, app_id: &AppId) {
        self.0
            .insert(FIELD_SOURCE.into(), Value::from(app_id.as_str()));
    }

    pub fn set_token(&mut self, token: &Token) {
        self.0.insert(FIELD_TOKEN.into(), Value::from(token.as_str()));
    }

    pub fn set_via_hub(&mut self) {
        self.0.insert(FIELD_VIA_HUB.into(), Value::Bool(true));
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Pretty JSON rendering used in warning dumps.
    pub fn dump(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| format!("{:?}", self.0))
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

impl From<Envelope> for Value {
    fn from(envelope: Envelope) -> Self {
        envelope.into_value()
    }
}
