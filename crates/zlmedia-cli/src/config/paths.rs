//! Config file location.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Application directory under the XDG config home.
const APP_DIR: &str = "zlmctl";

/// Environment variable naming the config directory directly.
const ENV_CONFIG_DIR: &str = "ZLM_CONFIG_DIR";

/// Resolves the config file path.
///
/// The first match wins:
/// 1. `{dir}/config.toml` when `--dir` is given.
/// 2. `$ZLM_CONFIG_DIR/config.toml`.
/// 3. `$XDG_CONFIG_HOME/zlmctl/config.toml` (absolute paths only).
/// 4. `$HOME/.config/zlmctl/config.toml`.
///
/// `env` looks up one environment variable; empty values count as unset.
///
/// # Errors
///
/// Returns an error if none of the sources yields a directory.
pub fn resolve_config_path<F>(dir: Option<&Path>, env: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| env(name).filter(|value| !value.is_empty());

    if let Some(d) = dir {
        return Ok(d.join(CONFIG_FILE));
    }
    if let Some(d) = lookup(ENV_CONFIG_DIR) {
        return Ok(PathBuf::from(d).join(CONFIG_FILE));
    }

    let xdg = lookup("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|p| p.is_absolute());
    let config_home = match (xdg, lookup("HOME")) {
        (Some(xdg), _) => xdg,
        (None, Some(home)) => PathBuf::from(home).join(".config"),
        (None, None) => {
            bail!("cannot locate the config file; set HOME or {ENV_CONFIG_DIR}, or pass --dir")
        }
    };
    Ok(config_home.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn env_of(vars: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars.to_vec();
        move |name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| String::from(*v))
        }
    }

    #[test]
    fn test_dir_flag_beats_environment() {
        // Arrange
        let env = env_of(&[("ZLM_CONFIG_DIR", "/etc/zlm"), ("HOME", "/home/op")]);

        // Act
        let path = resolve_config_path(Some(Path::new("/srv/zlm")), env).unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/srv/zlm/config.toml"));
    }

    #[test]
    fn test_config_dir_env_beats_xdg() {
        // Arrange
        let env = env_of(&[
            ("ZLM_CONFIG_DIR", "/etc/zlm"),
            ("XDG_CONFIG_HOME", "/home/op/.cfg"),
        ]);

        // Act
        let path = resolve_config_path(None, env).unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/etc/zlm/config.toml"));
    }

    #[test]
    fn test_xdg_config_home_beats_home() {
        // Arrange
        let env = env_of(&[("XDG_CONFIG_HOME", "/home/op/.cfg"), ("HOME", "/home/op")]);

        // Act
        let path = resolve_config_path(None, env).unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/home/op/.cfg/zlmctl/config.toml"));
    }

    #[test]
    fn test_relative_xdg_and_empty_override_fall_back_to_home() {
        // Arrange
        let env = env_of(&[
            ("ZLM_CONFIG_DIR", ""),
            ("XDG_CONFIG_HOME", "relative/cfg"),
            ("HOME", "/home/op"),
        ]);

        // Act
        let path = resolve_config_path(None, env).unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/home/op/.config/zlmctl/config.toml"));
    }

    #[test]
    fn test_no_location_fails() {
        // Arrange & Act
        let result = resolve_config_path(None, env_of(&[]));

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("cannot locate the config file")
        );
    }
}
