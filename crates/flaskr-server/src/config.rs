//! Server configuration: built-in defaults, then either the instance
//! `config.toml` or caller-supplied overrides.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the optional config file inside the instance directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Name of the database file inside the instance directory.
pub const DATABASE_FILE_NAME: &str = "flaskr.sqlite";

/// Secret used when nothing else is configured. Fine for development only.
pub const DEFAULT_SECRET_KEY: &str = "dev";

/// Fully resolved, immutable configuration for one application instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Opaque secret value.
    pub secret_key: String,

    /// Path to the SQLite database file.
    pub database: PathBuf,

    /// Instance directory holding local runtime data.
    pub instance_path: PathBuf,

    /// Busy timeout applied to every connection, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Server network settings.
    pub server: ServerConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "flaskr_server=debug,info").
    pub level: String,

    /// Whether to output logs in JSON format.
    pub json: bool,
}

/// A partial configuration. Every key is optional; keys that are set replace
/// the corresponding default.
///
/// This is the shape of both the instance `config.toml` and the mapping a
/// caller can pass to [`crate::create_app`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigOverrides {
    pub secret_key: Option<String>,
    pub database: Option<PathBuf>,
    pub busy_timeout_ms: Option<u64>,
    pub host: Option<IpAddr>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub log_json: Option<bool>,
}

/// Where the non-default values of a [`Config`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No instance file and no overrides.
    Defaults,
    /// Loaded from the instance `config.toml`.
    InstanceFile(PathBuf),
    /// Supplied by the caller.
    Overrides,
}

impl ConfigSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Defaults => "defaults",
            ConfigSource::InstanceFile(_) => "instance-file",
            ConfigSource::Overrides => "overrides",
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the configuration file.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Config {
    /// Built-in defaults for an instance rooted at `instance_path`.
    pub fn defaults(instance_path: &Path) -> Self {
        Self {
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            database: instance_path.join(DATABASE_FILE_NAME),
            instance_path: instance_path.to_path_buf(),
            busy_timeout_ms: 5_000,
            server: ServerConfig {
                host: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
                port: 5000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }

    /// Returns a copy with every key set in `overrides` replaced.
    pub fn merged(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(secret_key) = overrides.secret_key {
            self.secret_key = secret_key;
        }
        if let Some(database) = overrides.database {
            self.database = database;
        }
        if let Some(busy_timeout_ms) = overrides.busy_timeout_ms {
            self.busy_timeout_ms = busy_timeout_ms;
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = json;
        }
        self
    }

    /// Whether the secret is still the development default.
    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }
}

/// Resolves the configuration for an instance.
///
/// Without `overrides`, `<instance>/config.toml` is merged over the defaults
/// if it exists. With `overrides`, they are merged instead and the file is
/// not read.
///
/// # Errors
///
/// Returns `ConfigError` if the instance file exists but cannot be read or
/// parsed.
pub fn load_config(
    instance_path: &Path,
    overrides: Option<ConfigOverrides>,
) -> Result<(Config, ConfigSource), ConfigError> {
    let defaults = Config::defaults(instance_path);

    if let Some(overrides) = overrides {
        return Ok((defaults.merged(overrides), ConfigSource::Overrides));
    }

    let path = instance_path.join(CONFIG_FILE_NAME);
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            let file: ConfigOverrides =
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?;
            Ok((defaults.merged(file), ConfigSource::InstanceFile(path)))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "instance config not found, using defaults");
            Ok((defaults, ConfigSource::Defaults))
        }
        Err(source) => Err(ConfigError::FileRead { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_live_in_the_instance_directory() {
        let config = Config::defaults(Path::new("/srv/flaskr"));
        assert_eq!(config.secret_key, "dev");
        assert_eq!(config.database, PathBuf::from("/srv/flaskr/flaskr.sqlite"));
        assert_eq!(config.server.port, 5000);
        assert!(config.uses_default_secret());
    }

    #[test]
    fn overrides_replace_only_the_keys_they_set() {
        let base = Config::defaults(Path::new("instance"));
        let merged = base.clone().merged(ConfigOverrides {
            database: Some(PathBuf::from("/tmp/test.sqlite")),
            ..ConfigOverrides::default()
        });

        assert_eq!(merged.database, PathBuf::from("/tmp/test.sqlite"));
        assert_eq!(merged.secret_key, base.secret_key);
        assert_eq!(merged.server, base.server);
        assert_eq!(merged.logging, base.logging);
    }

    #[test]
    fn missing_instance_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let (config, source) = load_config(dir.path(), None).expect("load should succeed");
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config, Config::defaults(dir.path()));
    }

    #[test]
    fn instance_file_is_merged_over_defaults() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "secret_key = \"from-file\"\nport = 8080\n",
        )
        .unwrap();

        let (config, source) = load_config(dir.path(), None).unwrap();
        assert_eq!(
            source,
            ConfigSource::InstanceFile(dir.path().join(CONFIG_FILE_NAME))
        );
        assert_eq!(config.secret_key, "from-file");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database, dir.path().join(DATABASE_FILE_NAME));
    }

    #[test]
    fn overrides_take_the_place_of_the_instance_file() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "secret_key = \"from-file\"\n").unwrap();

        let (config, source) = load_config(
            dir.path(),
            Some(ConfigOverrides {
                port: Some(9000),
                ..ConfigOverrides::default()
            }),
        )
        .unwrap();

        assert_eq!(source, ConfigSource::Overrides);
        assert_eq!(config.secret_key, "dev", "instance file must not be read");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn malformed_instance_file_is_an_error() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "port = \"not a number\"\n").unwrap();

        let err = load_config(dir.path(), None).expect_err("parse should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
