//! Out-of-band configuration: credentials from the environment or a `.env`
//! file. Nothing secret is ever compiled in or logged.

use crate::error::ConfigError;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Portal (source site) account.
pub const PORTAL_USERNAME: &str = "PORTAL_USERNAME";
pub const PORTAL_PASSWORD: &str = "PORTAL_PASSWORD";

/// Broker account.
pub const MQTT_USERNAME: &str = "MQTT_USERNAME";
pub const MQTT_PASSWORD: &str = "MQTT_PASSWORD";

/// A username/password pair. `Debug` never shows the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read a required pair of variables.
    pub fn from_env(user_var: &str, pass_var: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            username: required(user_var)?,
            password: required(pass_var)?,
        })
    }

    /// Read an optional pair: both set gives credentials, neither gives
    /// `None`, one without the other is an error.
    pub fn optional_from_env(user_var: &str, pass_var: &str) -> Result<Option<Self>, ConfigError> {
        match (std::env::var(user_var).ok(), std::env::var(pass_var).ok()) {
            (None, None) => Ok(None),
            (Some(_), Some(_)) => Self::from_env(user_var, pass_var).map(Some),
            (Some(_), None) => Err(ConfigError::Partial {
                set: user_var.to_string(),
                unset: pass_var.to_string(),
            }),
            (None, Some(_)) => Err(ConfigError::Partial {
                set: pass_var.to_string(),
                unset: user_var.to_string(),
            }),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn required(var: &str) -> Result<String, ConfigError> {
    let value = std::env::var(var).map_err(|_| ConfigError::Missing(var.to_string()))?;
    if value.trim().is_empty() {
        return Err(ConfigError::Empty(var.to_string()));
    }
    Ok(value)
}

/// Load variables from an env file into the process environment.
///
/// With an explicit path the file must exist. Without one, a `.env` in the
/// working directory or its parents is used if present. Variables already
/// set in the environment win.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|source| ConfigError::EnvFile {
                path: path.display().to_string(),
                source,
            })?;
            debug!(path = %path.display(), "loaded env file");
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::dotenv() {
            Ok(found) => {
                debug!(path = %found.display(), "loaded env file");
                Ok(Some(found))
            }
            Err(e) if e.not_found() => Ok(None),
            Err(source) => Err(ConfigError::EnvFile {
                path: ".env".to_string(),
                source,
            }),
        },
    }
}
