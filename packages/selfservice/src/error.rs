use crest_core::ResourceError;

use crate::config::ConfigError;
use crate::frontend::FrontendError;

/// Everything that can stop the example binary.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request failed: {0}")]
    Resource(#[from] ResourceError),

    #[error("Front-end error: {0}")]
    Frontend(#[from] FrontendError),

    #[error("Invalid log filter: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
