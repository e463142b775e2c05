//! Successful results of requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ResourceError;

/// A single resource as returned by create/read/update/patch/delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub content: Value,
}

impl ResourceResponse {
    pub fn new(id: impl Into<String>, revision: Option<String>, content: Value) -> Self {
        Self {
            id: id.into(),
            revision,
            content,
        }
    }
}

/// Result payload of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub content: Value,
}

impl ActionResponse {
    pub fn new(content: Value) -> Self {
        Self { content }
    }
}

/// One page of a collection query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub resources: Vec<ResourceResponse>,
    #[serde(rename = "totalResults")]
    pub total_results: usize,
    #[serde(rename = "remainingResults")]
    pub remaining_results: usize,
}

/// Any successful outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Response {
    Resource(ResourceResponse),
    Action(ActionResponse),
    Query(QueryResponse),
}

impl Response {
    pub fn into_resource(self) -> Result<ResourceResponse, ResourceError> {
        match self {
            Response::Resource(r) => Ok(r),
            other => Err(unexpected("resource", &other)),
        }
    }

    pub fn into_action(self) -> Result<ActionResponse, ResourceError> {
        match self {
            Response::Action(r) => Ok(r),
            other => Err(unexpected("action", &other)),
        }
    }

    pub fn into_query(self) -> Result<QueryResponse, ResourceError> {
        match self {
            Response::Query(r) => Ok(r),
            other => Err(unexpected("query", &other)),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Response::Resource(_) => "resource",
            Response::Action(_) => "action",
            Response::Query(_) => "query",
        }
    }
}

impl From<ResourceResponse> for Response {
    fn from(r: ResourceResponse) -> Self {
        Response::Resource(r)
    }
}

impl From<ActionResponse> for Response {
    fn from(r: ActionResponse) -> Self {
        Response::Action(r)
    }
}

impl From<QueryResponse> for Response {
    fn from(r: QueryResponse) -> Self {
        Response::Query(r)
    }
}

fn unexpected(wanted: &str, got: &Response) -> ResourceError {
    ResourceError::internal(format!(
        "expected a {} response, handler returned a {} response",
        wanted,
        got.kind()
    ))
}
