//! crest core: resource routing with pluggable resource providers.
//!
//! - `ResourcePath`: `/`-separated path addressing a resource
//! - `Request`: closed set of create/read/update/patch/delete/action/query
//! - `Response` / `ResourceError`: the two outcomes of every request
//! - `RequestHandler`: the seam resource providers implement
//! - `Router`: longest-prefix dispatch from route templates to handlers
//! - `Connection`: caller-side handle, with deferred results via `Promise`
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use crest_core::{Context, ConnectionFactory, InternalConnectionFactory, Router};
//!
//! let mut router = Router::new();
//! router.add_route("/users", users_backend)?;
//!
//! let factory = InternalConnectionFactory::new(Arc::new(router));
//! let connection = factory.connection()?;
//! let andy = connection.read(&Context::root(), "/users/andy123").await?;
//! ```

mod connection;
mod error;
mod handler;
pub mod patch;
mod path;
mod path_trie;
mod request;
mod response;
mod router;

pub use connection::{Connection, ConnectionFactory, InternalConnectionFactory, Promise};
pub use error::{ErrorKind, ResourceError};
pub use handler::{Context, HandlerBox, RequestHandler};
pub use patch::{apply_patch, PatchKind, PatchOperation};
pub use path::{PathError, ResourcePath};
pub use path_trie::PathTrie;
pub use request::{QueryFilter, Request, RequestType};
pub use response::{ActionResponse, QueryResponse, ResourceResponse, Response};
pub use router::Router;
