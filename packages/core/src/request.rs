//! The closed set of requests a handler can receive.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patch::PatchOperation;
use crate::ResourcePath;

/// Kind of a [`Request`], used for logging and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Create,
    Read,
    Update,
    Patch,
    Delete,
    Action,
    Query,
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestType::Create => "create",
            RequestType::Read => "read",
            RequestType::Update => "update",
            RequestType::Patch => "patch",
            RequestType::Delete => "delete",
            RequestType::Action => "action",
            RequestType::Query => "query",
        };
        f.write_str(name)
    }
}

/// Equality filter for collection queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    /// JSON pointer of the field to compare, e.g. `/name`.
    pub field: String,
    pub equals: Value,
}

/// A request addressed to a path.
///
/// Handlers match on this exhaustively and answer the kinds they don't
/// support with `NotSupported`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Request {
    Create {
        path: ResourcePath,
        #[serde(default, rename = "newResourceId", skip_serializing_if = "Option::is_none")]
        new_resource_id: Option<String>,
        #[serde(default)]
        content: Value,
    },
    Read {
        path: ResourcePath,
    },
    Update {
        path: ResourcePath,
        #[serde(default)]
        content: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        revision: Option<String>,
    },
    Patch {
        path: ResourcePath,
        #[serde(default)]
        operations: Vec<PatchOperation>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        revision: Option<String>,
    },
    Delete {
        path: ResourcePath,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        revision: Option<String>,
    },
    Action {
        path: ResourcePath,
        action: String,
        #[serde(default)]
        content: Value,
    },
    Query {
        path: ResourcePath,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<QueryFilter>,
        #[serde(default, rename = "pageSize", skip_serializing_if = "Option::is_none")]
        page_size: Option<usize>,
        #[serde(default, rename = "pagedResultsOffset")]
        paged_results_offset: usize,
    },
}

impl Request {
    pub fn create(path: ResourcePath, new_resource_id: Option<String>, content: Value) -> Self {
        Request::Create {
            path,
            new_resource_id,
            content,
        }
    }

    pub fn read(path: ResourcePath) -> Self {
        Request::Read { path }
    }

    pub fn update(path: ResourcePath, content: Value, revision: Option<String>) -> Self {
        Request::Update {
            path,
            content,
            revision,
        }
    }

    pub fn patch(
        path: ResourcePath,
        operations: Vec<PatchOperation>,
        revision: Option<String>,
    ) -> Self {
        Request::Patch {
            path,
            operations,
            revision,
        }
    }

    pub fn delete(path: ResourcePath, revision: Option<String>) -> Self {
        Request::Delete { path, revision }
    }

    pub fn action(path: ResourcePath, action: impl Into<String>, content: Value) -> Self {
        Request::Action {
            path,
            action: action.into(),
            content,
        }
    }

    pub fn query(path: ResourcePath) -> Self {
        Request::Query {
            path,
            filter: None,
            page_size: None,
            paged_results_offset: 0,
        }
    }

    pub fn path(&self) -> &ResourcePath {
        match self {
            Request::Create { path, .. }
            | Request::Read { path }
            | Request::Update { path, .. }
            | Request::Patch { path, .. }
            | Request::Delete { path, .. }
            | Request::Action { path, .. }
            | Request::Query { path, .. } => path,
        }
    }

    fn path_mut(&mut self) -> &mut ResourcePath {
        match self {
            Request::Create { path, .. }
            | Request::Read { path }
            | Request::Update { path, .. }
            | Request::Patch { path, .. }
            | Request::Delete { path, .. }
            | Request::Action { path, .. }
            | Request::Query { path, .. } => path,
        }
    }

    /// The same request addressed to another path.
    #[must_use]
    pub fn with_path(mut self, path: ResourcePath) -> Self {
        *self.path_mut() = path;
        self
    }

    pub fn request_type(&self) -> RequestType {
        match self {
            Request::Create { .. } => RequestType::Create,
            Request::Read { .. } => RequestType::Read,
            Request::Update { .. } => RequestType::Update,
            Request::Patch { .. } => RequestType::Patch,
            Request::Delete { .. } => RequestType::Delete,
            Request::Action { .. } => RequestType::Action,
            Request::Query { .. } => RequestType::Query,
        }
    }
}
