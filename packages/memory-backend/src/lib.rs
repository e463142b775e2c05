//! In-memory collection resource provider.
//!
//! `MemoryBackend` keeps a keyed set of JSON documents in process memory and
//! answers create/read/update/patch/delete/query requests for them. Nothing
//! survives a restart.
//!
//! # Example
//!
//! ```rust,ignore
//! use crest_core::Router;
//! use crest_memory_backend::MemoryBackend;
//!
//! let mut router = Router::new();
//! router.add_route("/users", MemoryBackend::new())?;
//! ```

mod backend;
mod document;

pub use backend::{MemoryBackend, MemoryBackendConfig};
pub use document::{format_revision, FIELD_ID, FIELD_REVISION, INITIAL_REVISION};
