//! Self-service example: a user collection and an e-mail action behind a
//! crest router.
//!
//! | Path     | Provider                      | Operations                         |
//! |----------|-------------------------------|------------------------------------|
//! | `/users` | [`MemoryBackend`]             | create, read, update, patch, delete, query |
//! | `/email` | [`EmailService`]              | action `send`                      |
//!
//! [`initialise`] builds the router, seeds three demo users and hands back a
//! connection factory.
//!
//! [`MemoryBackend`]: crest_memory_backend::MemoryBackend

pub mod config;
pub mod demo;
pub mod email;
mod error;
pub mod frontend;
mod initialiser;
pub mod logging;

pub use config::{Config, ConfigError, LogConfig, Overrides, LOG_ENV};
pub use demo::{create_demo_data, seed_tolerating_conflicts, DemoUser, DEMO_USERS};
pub use email::{Email, EmailService, EmailSink, RecordingSink, TracingSink};
pub use error::Error;
pub use frontend::{list_resources, serve_lines, FrontendError, FrontendStats};
pub use initialiser::{build_router, initialise, initialise_with_sink};
