//! Listing commands.

use super::Global;
use crate::output;
use anyhow::{Context, Result};
use skylift_core::deployer::SpecProvider;
use std::process::ExitCode;

pub async fn apps(global: &Global, term: Option<String>) -> Result<ExitCode> {
    let config = global.load_config()?;
    let refs = global
        .api_client(&config)
        .application_refs()
        .await
        .with_context(|| format!("Failed to list applications in {}", config.affiliation))?;

    let refs: Vec<_> = match term.as_deref() {
        Some(term) => refs.into_iter().filter(|r| r.to_string().contains(term)).collect(),
        None => refs,
    };

    output::print_apps(&refs, global.format)?;
    Ok(ExitCode::SUCCESS)
}

pub fn clusters(global: &Global) -> Result<ExitCode> {
    let config = global.load_config()?;
    output::print_clusters(&config, global.format)?;
    Ok(ExitCode::SUCCESS)
}
