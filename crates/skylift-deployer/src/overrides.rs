//! Deploy-time configuration overrides.
//!
//! Overrides are given on the command line as `[env/]file:<json>` and sent
//! with every deploy call, keyed by file name.

use serde_json::Value;
use skylift_core::{Error, Result};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    files: BTreeMap<String, Value>,
}

impl Overrides {
    /// Parse `file:json` arguments. A later override for the same file replaces an earlier one.
    pub fn parse<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut files = BTreeMap::new();
        for arg in raw {
            let (file, value) = parse_one(arg.as_ref())?;
            files.insert(file, value);
        }
        Ok(Self { files })
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &BTreeMap<String, Value> {
        &self.files
    }
}

fn parse_one(arg: &str) -> Result<(String, Value)> {
    let (file, json) = arg.split_once(':').ok_or_else(|| {
        Error::Validation(format!(
            "override '{}' must have the form [env/]file:<json>",
            arg
        ))
    })?;

    let file = file.trim();
    if file.is_empty() {
        return Err(Error::Validation(format!(
            "override '{}' is missing a file name",
            arg
        )));
    }

    let value = serde_json::from_str(json)
        .map_err(|e| Error::Validation(format!("{} is not valid json: {}", json, e)))?;

    Ok((file.to_string(), value))
}
