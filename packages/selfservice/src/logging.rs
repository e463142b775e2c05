//! Tracing subscriber setup for the binary.

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Default directives when neither the config nor `RUST_LOG` set any.
pub const DEFAULT_FILTER: &str = "info";

/// Build the filter: explicit directives win, then `RUST_LOG`, then
/// [`DEFAULT_FILTER`]. Explicit directives that fail to parse are an error.
pub fn filter(config: &LogConfig) -> Result<EnvFilter, ParseError> {
    if let Some(directives) = config.filter.as_deref() {
        return EnvFilter::try_new(directives);
    }
    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(config: &LogConfig) -> Result<(), ParseError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(config)?)
        .with_writer(std::io::stderr);

    let _ = if config.json {
        builder.json().with_target(false).try_init()
    } else {
        builder.try_init()
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        let config = LogConfig {
            filter: Some("crest_core=debug".to_string()),
            json: false,
        };
        assert_eq!(filter(&config).unwrap().to_string(), "crest_core=debug");
    }

    #[test]
    fn invalid_explicit_filter_is_reported() {
        let config = LogConfig {
            filter: Some("crest_core=notalevel".to_string()),
            json: false,
        };
        assert!(filter(&config).is_err());
        assert!(init(&config).is_err());
    }

    #[test]
    fn init_twice_is_harmless() {
        let config = LogConfig::default();
        init(&config).unwrap();
        init(&config).unwrap();
    }
}
