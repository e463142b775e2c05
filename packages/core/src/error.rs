//! Error types for resource requests.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::PathError;

/// Machine-checkable failure category of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or invalid input.
    BadRequest,
    /// Unknown path or identity.
    NotFound,
    /// Duplicate identity on create, or duplicate route.
    Conflict,
    /// Revision mismatch.
    PreconditionFailed,
    /// Unrecognized action or disallowed operation.
    NotSupported,
    /// Failure inside the request machinery itself.
    Internal,
}

impl ErrorKind {
    /// HTTP-style status code for this kind.
    pub fn code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::PreconditionFailed => 412,
            ErrorKind::Internal => 500,
            ErrorKind::NotSupported => 501,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::PreconditionFailed => "Precondition Failed",
            ErrorKind::Internal => "Internal Server Error",
            ErrorKind::NotSupported => "Not Implemented",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// A typed request failure.
///
/// Every operation in this workspace reports failures through
/// `Result<_, ResourceError>`; nothing is retried.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct ResourceError {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: Option<Value>,
}

impl ResourceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PreconditionFailed, message)
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotSupported, message)
    }

    /// `NotSupported` with the stock reason as message.
    pub fn not_supported_default() -> Self {
        Self::not_supported("Operation is not supported")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attach structured detail.
    #[must_use]
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// JSON rendering used by front-ends.
    pub fn to_json(&self) -> Value {
        let mut object = serde_json::Map::new();
        object.insert("code".to_string(), Value::from(self.code()));
        object.insert("reason".to_string(), Value::from(self.kind.reason()));
        object.insert("message".to_string(), Value::from(self.message.clone()));
        if let Some(detail) = &self.detail {
            object.insert("detail".to_string(), detail.clone());
        }
        Value::Object(object)
    }
}

impl From<PathError> for ResourceError {
    fn from(e: PathError) -> Self {
        ResourceError::bad_request(e.to_string())
    }
}
