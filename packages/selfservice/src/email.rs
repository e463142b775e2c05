//! The e-mail singleton: an action-only resource exposing `send`.
//!
//! Nothing is delivered. A validated message is handed to an [`EmailSink`],
//! which by default writes it to the log.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use crest_core::{ActionResponse, Context, Request, RequestHandler, ResourceError, Response};

/// Name of the only supported action.
pub const ACTION_SEND: &str = "send";

/// A validated message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub message: String,
}

impl Email {
    /// Validate action content. Fields are checked in the order `to`, `from`,
    /// `subject`, `message`; the first one that is missing, not a string or
    /// empty is reported.
    pub fn from_content(content: &Value) -> Result<Self, ResourceError> {
        Ok(Self {
            to: required_field(content, "to")?,
            from: required_field(content, "from")?,
            subject: required_field(content, "subject")?,
            message: required_field(content, "message")?,
        })
    }
}

fn required_field(content: &Value, name: &str) -> Result<String, ResourceError> {
    match content.get(name).and_then(Value::as_str) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ResourceError::bad_request(format!(
            "Field {} is not specified",
            name
        ))),
    }
}

/// Where sent messages go.
pub trait EmailSink: Send + Sync {
    fn send(&self, email: &Email) -> Result<(), ResourceError>;
}

/// Writes each message to the log at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EmailSink for TracingSink {
    fn send(&self, email: &Email) -> Result<(), ResourceError> {
        tracing::info!(
            to = %email.to,
            from = %email.from,
            "Sending email to \"{}\" from \"{}\" with subject \"{}\" and message \"{}\".",
            email.to,
            email.from,
            email.subject,
            email.message
        );
        Ok(())
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Email>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first.
    pub fn sent(&self) -> Vec<Email> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EmailSink for RecordingSink {
    fn send(&self, email: &Email) -> Result<(), ResourceError> {
        self.sent
            .lock()
            .map_err(|_| ResourceError::internal("email outbox lock poisoned"))?
            .push(email.clone());
        Ok(())
    }
}

impl<S: EmailSink + ?Sized> EmailSink for std::sync::Arc<S> {
    fn send(&self, email: &Email) -> Result<(), ResourceError> {
        (**self).send(email)
    }
}

/// Action-only singleton resource. `send` is the one supported action;
/// every other request kind is answered with `NotSupported`.
#[derive(Debug, Default)]
pub struct EmailService<S = TracingSink> {
    sink: S,
}

impl<S: EmailSink> EmailService<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn send(&self, content: &Value) -> Result<Value, ResourceError> {
        let email = Email::from_content(content)?;
        self.sink.send(&email)?;
        Ok(json!({"status": "okay"}))
    }
}

#[async_trait]
impl<S: EmailSink> RequestHandler for EmailService<S> {
    async fn handle(&self, _context: &Context, request: Request) -> Result<Response, ResourceError> {
        match request {
            Request::Action { path, .. } if !path.is_empty() => Err(ResourceError::not_found(
                format!("No resource {} below the email singleton", path),
            )),
            Request::Action {
                action, content, ..
            } => {
                if action == ACTION_SEND {
                    self.send(&content)
                        .map(|body| ActionResponse::new(body).into())
                } else {
                    Err(ResourceError::not_supported(format!(
                        "Unknown action {}",
                        action
                    )))
                }
            }
            Request::Read { .. }
            | Request::Update { .. }
            | Request::Patch { .. }
            | Request::Create { .. }
            | Request::Delete { .. }
            | Request::Query { .. } => Err(ResourceError::not_supported_default()),
        }
    }
}
