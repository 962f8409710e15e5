//! Response messages.
//!
//! The server answers every request with RECORD zero or more times
//! followed by exactly one SUCCESS, FAILURE or IGNORED.

use std::collections::HashMap;
use std::fmt;

use super::signature;
use crate::bolt::error::BoltError;
use crate::bolt::packstream::{Structure, Value};

/// A decoded server response.
#[derive(Debug, Clone)]
pub enum BoltResponse {
    Success(SuccessMessage),
    Record(RecordMessage),
    Failure(FailureMessage),
    Ignored,
}

impl BoltResponse {
    pub fn name(&self) -> &'static str {
        match self {
            BoltResponse::Success(_) => "SUCCESS",
            BoltResponse::Record(_) => "RECORD",
            BoltResponse::Failure(_) => "FAILURE",
            BoltResponse::Ignored => "IGNORED",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BoltResponse::Success(_))
    }

    pub fn is_record(&self) -> bool {
        matches!(self, BoltResponse::Record(_))
    }

    /// Parse a framed value into a response.
    pub fn from_value(value: Value) -> Result<Self, BoltError> {
        let s = value
            .into_structure()
            .ok_or_else(|| BoltError::Protocol("response is not a structure".to_owned()))?;
        Self::from_structure(s)
    }

    pub fn from_structure(s: Structure) -> Result<Self, BoltError> {
        match s.signature {
            signature::SUCCESS => Ok(BoltResponse::Success(SuccessMessage::from_structure(s)?)),
            signature::RECORD => Ok(BoltResponse::Record(RecordMessage::from_structure(s)?)),
            signature::FAILURE => Ok(BoltResponse::Failure(FailureMessage::from_structure(s)?)),
            signature::IGNORED => Ok(BoltResponse::Ignored),
            other => Err(BoltError::Protocol(format!(
                "unknown response signature 0x{other:02X}"
            ))),
        }
    }
}

/// SUCCESS and its metadata map.
#[derive(Debug, Clone, Default)]
pub struct SuccessMessage {
    pub metadata: HashMap<String, Value>,
}

impl SuccessMessage {
    pub fn from_structure(s: Structure) -> Result<Self, BoltError> {
        let metadata = match s.fields.into_iter().next() {
            Some(Value::Map(m)) => m,
            Some(other) => {
                return Err(BoltError::Protocol(format!(
                    "SUCCESS metadata must be a map, got {}",
                    other.type_name()
                )))
            }
            None => HashMap::new(),
        };
        Ok(Self { metadata })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Column names from a RUN SUCCESS.
    pub fn fields(&self) -> Option<Vec<String>> {
        self.metadata.get("fields").and_then(Value::as_string_list)
    }

    /// Statement handle from a RUN SUCCESS (Bolt 4+).
    pub fn qid(&self) -> Option<i64> {
        self.metadata.get("qid").and_then(Value::as_int)
    }

    /// Whether the stream has more records after a sized PULL.
    pub fn has_more(&self) -> bool {
        self.metadata
            .get("has_more")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn bookmark(&self) -> Option<&str> {
        self.metadata.get("bookmark").and_then(Value::as_str)
    }

    pub fn server(&self) -> Option<&str> {
        self.metadata.get("server").and_then(Value::as_str)
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.metadata.get("connection_id").and_then(Value::as_str)
    }

    pub fn db(&self) -> Option<&str> {
        self.metadata.get("db").and_then(Value::as_str)
    }

    /// Statement type from a terminal streaming SUCCESS (`r`, `w`, ...).
    pub fn statement_type(&self) -> Option<&str> {
        self.metadata.get("type").and_then(Value::as_str)
    }

    pub fn stats(&self) -> Option<&HashMap<String, Value>> {
        self.metadata.get("stats").and_then(Value::as_map)
    }

    /// Server hint map from a HELLO/INIT SUCCESS.
    pub fn hints(&self) -> Option<&HashMap<String, Value>> {
        self.metadata.get("hints").and_then(Value::as_map)
    }

    /// Routing table map from a ROUTE SUCCESS.
    pub fn routing_table(&self) -> Option<&HashMap<String, Value>> {
        self.metadata.get("rt").and_then(Value::as_map)
    }
}

/// RECORD: one row of values.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMessage {
    pub values: Vec<Value>,
}

impl RecordMessage {
    pub fn from_structure(s: Structure) -> Result<Self, BoltError> {
        let values = match s.fields.into_iter().next() {
            Some(Value::List(items)) => items,
            Some(other) => {
                return Err(BoltError::Protocol(format!(
                    "RECORD payload must be a list, got {}",
                    other.type_name()
                )))
            }
            None => Vec::new(),
        };
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// FAILURE: a server error code plus human message.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureMessage {
    pub code: String,
    pub message: String,
}

impl FailureMessage {
    pub fn from_structure(s: Structure) -> Result<Self, BoltError> {
        let metadata = s
            .fields
            .first()
            .and_then(Value::as_map)
            .ok_or_else(|| BoltError::Protocol("FAILURE requires a metadata map".to_owned()))?;
        let code = metadata
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or("Neo.DatabaseError.General.UnknownError")
            .to_owned();
        let message = metadata
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        Ok(Self { code, message })
    }

    /// Transient errors are worth retrying.
    pub fn is_transient(&self) -> bool {
        self.code.starts_with("Neo.TransientError")
    }

    pub fn is_client_error(&self) -> bool {
        self.code.starts_with("Neo.ClientError")
    }

    /// Credential and authorization failures.
    pub fn is_security_error(&self) -> bool {
        self.code.contains(".Security.")
    }

    /// Failures that indicate the socket itself is unusable.
    pub fn is_connection_error(&self) -> bool {
        self.code.contains("Connection") || self.code.ends_with("DatabaseUnavailable")
    }
}

impl fmt::Display for FailureMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
