//! Configuration for the self-service example.
//!
//! Sources, lowest precedence first: [`Config::default`], an optional TOML
//! file, the [`LOG_ENV`] variable for the log filter, then command-line flags
//! ([`Overrides`]).
//!
//! ```toml
//! users_path = "/users"
//! email_path = "/email"
//! seed_demo_data = true
//!
//! [memory]
//! enforce_revisions = true
//!
//! [log]
//! filter = "info,crest_core=debug"
//! json = false
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crest_memory_backend::MemoryBackendConfig;

/// Environment variable holding log filter directives.
pub const LOG_ENV: &str = "CREST_LOG";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Logging options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives; `RUST_LOG` applies when unset.
    pub filter: Option<String>,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Route of the user collection.
    pub users_path: String,
    /// Route of the e-mail singleton.
    pub email_path: String,
    /// Seed the demo users at startup.
    pub seed_demo_data: bool,
    pub memory: MemoryBackendConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            users_path: "/users".to_string(),
            email_path: "/email".to_string(),
            seed_demo_data: true,
            memory: MemoryBackendConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Values given on the command line. Unset fields leave the config alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub users_path: Option<String>,
    pub email_path: Option<String>,
    pub no_seed: bool,
    pub log_filter: Option<String>,
    pub log_json: bool,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Layer the environment filter, then `overrides`, on top of `self`.
    pub fn apply_overrides(mut self, env_filter: Option<String>, overrides: &Overrides) -> Self {
        if let Some(filter) = env_filter {
            self.log.filter = Some(filter);
        }
        if let Some(users_path) = &overrides.users_path {
            self.users_path = users_path.clone();
        }
        if let Some(email_path) = &overrides.email_path {
            self.email_path = email_path.clone();
        }
        if overrides.no_seed {
            self.seed_demo_data = false;
        }
        if let Some(filter) = &overrides.log_filter {
            self.log.filter = Some(filter.clone());
        }
        if overrides.log_json {
            self.log.json = true;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.users_path, "/users");
        assert_eq!(config.email_path, "/email");
        assert!(config.seed_demo_data);
        assert!(config.memory.enforce_revisions);
        assert_eq!(config.log, LogConfig::default());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            users_path = "/people"
            seed_demo_data = false

            [memory]
            enforce_revisions = false

            [log]
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(config.users_path, "/people");
        assert_eq!(config.email_path, "/email");
        assert!(!config.seed_demo_data);
        assert!(!config.memory.enforce_revisions);
        assert!(config.log.json);
        assert_eq!(config.log.filter, None);
    }

    #[test]
    fn invalid_toml_is_reported() {
        let err = Config::from_toml_str("users_path = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "email_path = \"/mail\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.email_path, "/mail");
    }

    fn from_file() -> Config {
        Config::from_toml_str(
            r#"
            users_path = "/people"
            seed_demo_data = true

            [log]
            filter = "warn"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn no_overrides_keep_file_values() {
        let config = from_file().apply_overrides(None, &Overrides::default());
        assert_eq!(config, from_file());
    }

    #[test]
    fn env_filter_beats_file() {
        let config = from_file().apply_overrides(Some("debug".to_string()), &Overrides::default());
        assert_eq!(config.log.filter.as_deref(), Some("debug"));
        assert_eq!(config.users_path, "/people");
    }

    #[test]
    fn flags_beat_env_and_file() {
        let overrides = Overrides {
            users_path: Some("/members".to_string()),
            email_path: Some("/mail".to_string()),
            no_seed: true,
            log_filter: Some("crest_core=trace".to_string()),
            log_json: true,
        };
        let config = from_file().apply_overrides(Some("debug".to_string()), &overrides);
        assert_eq!(config.users_path, "/members");
        assert_eq!(config.email_path, "/mail");
        assert!(!config.seed_demo_data);
        assert_eq!(config.log.filter.as_deref(), Some("crest_core=trace"));
        assert!(config.log.json);
    }

    #[test]
    fn unset_flags_do_not_reset_file_values() {
        let file = Config::from_toml_str(
            r#"
            seed_demo_data = false

            [log]
            json = true
            "#,
        )
        .unwrap();
        let config = file.apply_overrides(None, &Overrides::default());
        assert!(!config.seed_demo_data);
        assert!(config.log.json);
    }

    #[test]
    fn missing_file_names_path() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
