//! Deploy and redeploy commands.

use super::Global;
use crate::output;
use crate::prompt::TerminalPrompt;
use crate::SelectArgs;
use anyhow::{Context, Result};
use skylift_deployer::{
    DeployWorkflow, Dispatcher, HttpClientProvider, MatchMode, Operation, Outcome, Overrides,
    SelectionBuilder,
};
use std::process::ExitCode;
use std::sync::Arc;

/// Exit status for runs that ended before dispatch without an error.
const EXIT_NOT_DISPATCHED: u8 = 2;

pub async fn deploy(global: &Global, select: SelectArgs, overrides: Vec<String>) -> Result<ExitCode> {
    // Overrides are checked before anything is fetched.
    let overrides = Overrides::parse(&overrides)?;
    run(global, select, Operation::deploy(overrides)).await
}

pub async fn redeploy(global: &Global, select: SelectArgs) -> Result<ExitCode> {
    run(global, select, Operation::Redeploy).await
}

async fn run(global: &Global, select: SelectArgs, operation: Operation) -> Result<ExitCode> {
    let selection = SelectionBuilder::new(operation)
        .with_terms(select.terms)
        .with_match_mode(if select.all { MatchMode::All } else { MatchMode::Unique })
        .with_excludes(select.excludes)
        .with_cluster(select.cluster)
        .with_override_token(global.token.clone())
        .with_confirmation(!select.yes)
        .build()?;

    let config = global.load_config()?;
    let specs = global.api_client(&config);
    let dispatcher = Dispatcher::new(Arc::new(HttpClientProvider::new(&config.affiliation)));

    let mut workflow = DeployWorkflow::new(
        Arc::new(specs),
        config.clusters.clone(),
        dispatcher,
        &config.affiliation,
    );
    if selection.confirm() {
        workflow = workflow.with_prompt(Arc::new(TerminalPrompt::new()));
    }

    let outcome = workflow
        .run(&selection)
        .await
        .with_context(|| format!("Failed to {}", selection.operation().verb()))?;

    match outcome {
        Outcome::Completed(report) => {
            output::print_report(&report, global.format)?;
            Ok(if report.success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Outcome::Cancelled => {
            eprintln!("Cancelled, nothing was {}ed", selection.operation().verb());
            Ok(ExitCode::from(EXIT_NOT_DISPATCHED))
        }
        Outcome::NothingToDo => {
            eprintln!("No applications left to {}", selection.operation().verb());
            Ok(ExitCode::from(EXIT_NOT_DISPATCHED))
        }
    }
}
