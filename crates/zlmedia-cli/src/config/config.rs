//! `AppConfig` struct, TOML read/write, and connection setting resolution.

use std::fs::OpenOptions;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Base URL used when no flag, environment variable, or file sets one.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:80";

/// Environment variable overriding the base URL.
const ENV_BASE_URL: &str = "ZLM_BASE_URL";

/// Environment variable overriding the secret.
const ENV_SECRET: &str = "ZLM_SECRET";

/// File mode for a config file holding the secret.
#[cfg(unix)]
const SECRET_FILE_MODE: u32 = 0o600;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Server connection settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// `[server]` table.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server base URL, e.g. `http://127.0.0.1:80`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// API secret (`api.secret` in the server's config.ini).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// On Unix a file holding the secret is restricted to the owner (`0600`)
    /// before anything is written to it.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation, permission change, or file
    /// write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        #[cfg(unix)]
        let has_secret = self.server.secret.is_some();

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        if has_secret {
            options.mode(SECRET_FILE_MODE);
        }
        let mut file = options
            .open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        // `mode` only applies on creation; tighten an existing file too.
        #[cfg(unix)]
        if has_secret {
            file.set_permissions(std::fs::Permissions::from_mode(SECRET_FILE_MODE))
                .with_context(|| format!("failed to set mode of {}", path.display()))?;
        }

        file.write_all(content.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// Copies every value set in `overrides` into the `[server]` table.
    ///
    /// Returns `true` if anything was set.
    pub fn apply(&mut self, overrides: &ConnectionOverrides) -> bool {
        let mut changed = false;
        if let Some(url) = &overrides.base_url {
            self.server.base_url = Some(url.clone());
            changed = true;
        }
        if let Some(secret) = &overrides.secret {
            self.server.secret = Some(secret.clone());
            changed = true;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.server.timeout_secs = Some(secs);
            changed = true;
        }
        changed
    }

    /// Returns a copy safe to print, with the secret masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.server.secret.is_some() {
            copy.server.secret = Some(String::from("<redacted>"));
        }
        copy
    }
}

/// Connection values given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOverrides {
    /// `--base-url`
    pub base_url: Option<String>,
    /// `--secret`
    pub secret: Option<String>,
    /// `--timeout`
    pub timeout_secs: Option<u64>,
}

/// Fully resolved connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Server base URL.
    pub base_url: String,
    /// API secret.
    pub secret: String,
    /// Request timeout; `None` keeps the client default.
    pub timeout: Option<Duration>,
}

impl ConnectionSettings {
    /// Merges flags, environment, and file settings, in that order of
    /// precedence. `env` looks up one environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if no source provides a secret.
    pub fn resolve<F>(
        overrides: &ConnectionOverrides,
        file: &ServerConfig,
        env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|value| !value.is_empty());

        let base_url = overrides
            .base_url
            .clone()
            .or_else(|| lookup(ENV_BASE_URL))
            .or_else(|| file.base_url.clone())
            .unwrap_or_else(|| String::from(DEFAULT_BASE_URL));

        let Some(secret) = overrides
            .secret
            .clone()
            .or_else(|| lookup(ENV_SECRET))
            .or_else(|| file.secret.clone())
        else {
            bail!("secret is not configured; pass --secret, set {ENV_SECRET}, or run `zlmctl config set --secret <SECRET>`");
        };

        let timeout = overrides
            .timeout_secs
            .or(file.timeout_secs)
            .map(Duration::from_secs);

        Ok(Self {
            base_url,
            secret,
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn file_config() -> ServerConfig {
        ServerConfig {
            base_url: Some(String::from("http://file:8080")),
            secret: Some(String::from("file-secret")),
            timeout_secs: Some(20),
        }
    }

    #[test]
    fn test_default_config() {
        // Arrange & Act
        let config = AppConfig::default();

        // Assert
        assert!(config.server.base_url.is_none());
        assert!(config.server.secret.is_none());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = AppConfig {
            server: file_config(),
        };

        // Act
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(loaded, config);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_with_secret_is_owner_only() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        let config = AppConfig {
            server: file_config(),
        };

        // Act
        config.save(&path).unwrap();

        // Assert
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, SECRET_FILE_MODE);
        assert!(std::fs::read_to_string(&path).unwrap().contains("file-secret"));
    }

    #[test]
    fn test_load_server_table() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nbase_url = \"http://10.0.0.5\"\nsecret = \"abc\"\n",
        )
        .unwrap();

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config.server.base_url.as_deref(), Some("http://10.0.0.5"));
        assert_eq!(config.server.secret.as_deref(), Some("abc"));
        assert!(config.server.timeout_secs.is_none());
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\n").unwrap();

        // Act
        let result = AppConfig::load(&path);

        // Assert
        assert!(result.unwrap_err().to_string().contains("failed to parse"));
    }

    #[test]
    fn test_apply_overrides() {
        // Arrange
        let mut config = AppConfig::default();
        let overrides = ConnectionOverrides {
            secret: Some(String::from("new")),
            ..ConnectionOverrides::default()
        };

        // Act
        let changed = config.apply(&overrides);
        let unchanged = config.apply(&ConnectionOverrides::default());

        // Assert
        assert!(changed);
        assert!(!unchanged);
        assert_eq!(config.server.secret.as_deref(), Some("new"));
    }

    #[test]
    fn test_redacted_masks_secret() {
        // Arrange
        let config = AppConfig {
            server: file_config(),
        };

        // Act
        let text = toml::to_string_pretty(&config.redacted()).unwrap();

        // Assert
        assert!(!text.contains("file-secret"));
        assert!(text.contains("<redacted>"));
    }

    #[test]
    fn test_resolve_flag_beats_env_and_file() {
        // Arrange
        let overrides = ConnectionOverrides {
            base_url: Some(String::from("http://flag")),
            secret: Some(String::from("flag-secret")),
            timeout_secs: Some(3),
        };
        let env = |name: &str| Some(format!("env-{name}"));

        // Act
        let settings = ConnectionSettings::resolve(&overrides, &file_config(), env).unwrap();

        // Assert
        assert_eq!(settings.base_url, "http://flag");
        assert_eq!(settings.secret, "flag-secret");
        assert_eq!(settings.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_resolve_env_beats_file() {
        // Arrange
        let env = |name: &str| match name {
            "ZLM_BASE_URL" => Some(String::from("http://env")),
            "ZLM_SECRET" => Some(String::from("env-secret")),
            _ => None,
        };

        // Act
        let settings =
            ConnectionSettings::resolve(&ConnectionOverrides::default(), &file_config(), env)
                .unwrap();

        // Assert
        assert_eq!(settings.base_url, "http://env");
        assert_eq!(settings.secret, "env-secret");
        assert_eq!(settings.timeout, Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_resolve_empty_env_is_ignored() {
        // Arrange
        let env = |_: &str| Some(String::new());

        // Act
        let settings =
            ConnectionSettings::resolve(&ConnectionOverrides::default(), &file_config(), env)
                .unwrap();

        // Assert
        assert_eq!(settings.secret, "file-secret");
    }

    #[test]
    fn test_resolve_defaults_base_url() {
        // Arrange
        let overrides = ConnectionOverrides {
            secret: Some(String::from("s")),
            ..ConnectionOverrides::default()
        };

        // Act
        let settings =
            ConnectionSettings::resolve(&overrides, &ServerConfig::default(), no_env).unwrap();

        // Assert
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert!(settings.timeout.is_none());
    }

    #[test]
    fn test_resolve_missing_secret_fails() {
        // Arrange & Act
        let result = ConnectionSettings::resolve(
            &ConnectionOverrides::default(),
            &ServerConfig::default(),
            no_env,
        );

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("secret is not configured")
        );
    }
}
