//! Application identifiers.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Identifies one application in one environment of the configuration store.
/// Rendered and parsed as `env/app`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[display("{environment}/{application}")]
#[serde(try_from = "String", into = "String")]
pub struct ApplicationRef {
    environment: String,
    application: String,
}

impl ApplicationRef {
    pub fn new(environment: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            application: application.into(),
        }
    }

    /// Derive an identifier from a configuration file name such as `dev/flubber.json`.
    ///
    /// Shared files (`about.json`, `flubber.json`) and environment-level
    /// `about` files do not describe a deployment and yield `None`.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let stem = strip_extension(file_name);
        if stem.contains("about") {
            return None;
        }
        stem.parse().ok()
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn application(&self) -> &str {
        &self.application
    }
}

fn strip_extension(file_name: &str) -> &str {
    let name_start = file_name.rfind('/').map(|i| i + 1).unwrap_or(0);
    match file_name[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &file_name[..name_start + dot],
        _ => file_name,
    }
}

impl std::str::FromStr for ApplicationRef {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((env, app)) if !env.is_empty() && !app.is_empty() && !app.contains('/') => {
                Ok(Self::new(env, app))
            }
            _ => Err(Error::Validation(format!(
                "'{}' is not an application reference of the form env/app",
                s
            ))),
        }
    }
}

impl TryFrom<String> for ApplicationRef {
    type Error = Error;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ApplicationRef> for String {
    fn from(id: ApplicationRef) -> Self {
        id.to_string()
    }
}
