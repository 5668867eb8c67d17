//! The bus wire format: a tagged JSON document with `kind`, `metadata` and
//! `contents`, exchanged as the payload frame of a two-frame pub/sub message.
//!
//! `contents` stays raw on the envelope; the typed accessors extract it once
//! the kind is known. Unknown kinds and unknown fields decode fine, so newer
//! bus peers never break an older bridge.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Schema version every envelope carries today.
pub const VERSION: &str = "v1";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kind {
    Status,
    Update,
    Confirmation,
    Metric,
    /// Forward compatibility: kinds this bridge does not know are carried,
    /// not rejected.
    #[serde(other)]
    Other,
}

/// One tagged numeric record, a measurement or an update depending on the
/// envelope kind. `ts` is set by bus peers that timestamp their points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub tag: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<u64>,
}

/// `Status` contents: read-only telemetry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub measurements: Vec<Point>,
}

/// `Update` contents: writable control values. `recipient` and `confirm`
/// are used by bus peers that want addressed or confirmed updates; both stay
/// off the wire when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub updates: Vec<Point>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub recipient: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub confirm: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default = "default_version")]
    pub version: String,
    pub kind: Kind,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub contents: Value,
}

fn default_version() -> String {
    VERSION.to_string()
}

#[derive(Error, Debug)]
#[error("decoding envelope: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

impl From<DecodeError> for flow_node::node::NodeError {
    fn from(err: DecodeError) -> Self {
        flow_node::node::NodeError::Other(err.to_string())
    }
}

impl Envelope {
    /// Parses the payload frame. Fails on invalid JSON or a missing `kind`;
    /// unknown fields are ignored.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(raw)?)
    }

    /// Serializes for transmission. Round-trips through [`Envelope::decode`].
    pub fn encode(&self) -> Result<Vec<u8>, DecodeError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn new_status(sender: &str, status: Status) -> Self {
        Self::new(Kind::Status, sender, serde_json::to_value(status))
    }

    pub fn new_update(sender: &str, update: Update) -> Self {
        Self::new(Kind::Update, sender, serde_json::to_value(update))
    }

    fn new(kind: Kind, sender: &str, contents: serde_json::Result<Value>) -> Self {
        Self {
            version: VERSION.to_string(),
            kind,
            metadata: HashMap::from([("sender".to_string(), sender.to_string())]),
            contents: contents.expect("envelope contents serialize to JSON"),
        }
    }

    /// Typed contents of a `Status` envelope. `None` for any other kind, or
    /// when the contents do not fit the schema.
    pub fn status(&self) -> Option<Status> {
        (self.kind == Kind::Status)
            .then(|| serde_json::from_value(self.contents.clone()).ok())
            .flatten()
    }

    /// Typed contents of an `Update` envelope.
    pub fn update(&self) -> Option<Update> {
        (self.kind == Kind::Update)
            .then(|| serde_json::from_value(self.contents.clone()).ok())
            .flatten()
    }
}
