//! End-to-end deploy workflow.

use crate::aggregate::DeployReport;
use crate::dispatch::Dispatcher;
use crate::gate::{Prompt, choose_candidates, confirm_dispatch};
use crate::partition::partition;
use crate::resolver::resolve;
use crate::selection::Selection;
use skylift_core::deployer::{DeploymentSpec, SpecProvider};
use skylift_core::{ApplicationRef, ClusterRegistry, Error, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    /// Partitions were dispatched; the report holds every result.
    Completed(DeployReport),
    /// The user declined at the confirmation gate.
    Cancelled,
    /// The selection was empty once excludes and the cluster filter were applied.
    NothingToDo,
}

/// Runs a selection from search terms to aggregated results.
pub struct DeployWorkflow {
    specs: Arc<dyn SpecProvider>,
    registry: ClusterRegistry,
    dispatcher: Dispatcher,
    prompt: Option<Arc<dyn Prompt>>,
    affiliation: String,
}

impl DeployWorkflow {
    pub fn new(
        specs: Arc<dyn SpecProvider>,
        registry: ClusterRegistry,
        dispatcher: Dispatcher,
        affiliation: impl Into<String>,
    ) -> Self {
        Self {
            specs,
            registry,
            dispatcher,
            prompt: None,
            affiliation: affiliation.into(),
        }
    }

    /// Use a prompt for confirmation and for picking among ambiguous matches.
    pub fn with_prompt(mut self, prompt: Arc<dyn Prompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Execute the selection.
    ///
    /// Every error returned here happens before anything is dispatched. Once
    /// dispatch starts, failures only show up in the report.
    pub async fn run(&self, selection: &Selection) -> Result<Outcome> {
        let verb = selection.operation().verb();

        if let Some(name) = selection.cluster() {
            match self.registry.get(name) {
                None => {
                    return Err(Error::Configuration(format!("no such cluster '{}'", name)));
                }
                Some(cluster) if !cluster.reachable => {
                    return Err(Error::Configuration(format!("{} cluster is not reachable", name)));
                }
                Some(_) => {}
            }
        }
        let prompt = match (selection.confirm(), &self.prompt) {
            (false, _) => None,
            (true, Some(prompt)) => Some(prompt.as_ref()),
            (true, None) => {
                return Err(Error::Configuration(
                    "confirmation requested but no prompt is available".to_string(),
                ));
            }
        };

        let pool = self.specs.application_refs().await?;
        debug!(affiliation = %self.affiliation, candidates = pool.len(), "Loaded identifier pool");

        let selected = self.resolve_terms(selection, &pool, prompt)?;
        let selected = selection.excludes().apply(selected.into_iter().collect());
        if selected.is_empty() {
            info!("Every match was excluded");
            return Ok(Outcome::NothingToDo);
        }
        info!(applications = selected.len(), "Resolved selection");

        let fetched = self.specs.deployment_specs(&selected).await?;
        let mut specs = match_specs(&selected, fetched)?;
        if let Some(cluster) = selection.cluster() {
            let before = specs.len();
            specs.retain(|s| s.cluster == cluster);
            debug!(cluster, skipped = before - specs.len(), "Applied cluster filter");
        }
        if specs.is_empty() {
            info!("No deployment specs left to dispatch");
            return Ok(Outcome::NothingToDo);
        }

        let partitions = partition(specs, &self.registry, selection.override_token())?;

        if let Some(prompt) = prompt {
            if !confirm_dispatch(prompt, &partitions, verb, &self.affiliation)? {
                info!("Declined at confirmation");
                return Ok(Outcome::Cancelled);
            }
        }

        let bundles = self
            .dispatcher
            .dispatch(partitions, selection.operation())
            .await;
        let report = DeployReport::aggregate(bundles);
        info!(
            results = report.len(),
            failed = report.failed().count(),
            "Run completed"
        );
        Ok(Outcome::Completed(report))
    }

    /// Resolve every term independently and take the union.
    fn resolve_terms(
        &self,
        selection: &Selection,
        pool: &[ApplicationRef],
        prompt: Option<&dyn Prompt>,
    ) -> Result<BTreeSet<ApplicationRef>> {
        let mut selected = BTreeSet::new();

        for term in selection.terms() {
            let matches = match resolve(term, pool, selection.match_mode()) {
                Ok(matches) => matches,
                Err(Error::Ambiguous { search, candidates }) => match prompt {
                    Some(prompt) => {
                        let chosen = choose_candidates(prompt, selection.operation().verb(), &candidates)?;
                        pool.iter()
                            .filter(|r| chosen.contains(&r.to_string()))
                            .cloned()
                            .collect()
                    }
                    None => return Err(Error::Ambiguous { search, candidates }),
                },
                Err(e) => return Err(e),
            };
            debug!(term = %term, matched = matches.len(), "Resolved term");
            selected.extend(matches);
        }

        Ok(selected)
    }
}

/// Pair every selected identifier with exactly one fetched spec.
///
/// A selected identifier without a spec fails the run. Specs that were not
/// asked for, and repeats of one already seen, are dropped.
fn match_specs(
    selected: &[ApplicationRef],
    fetched: Vec<DeploymentSpec>,
) -> Result<Vec<DeploymentSpec>> {
    let wanted: BTreeSet<&ApplicationRef> = selected.iter().collect();
    let mut seen = BTreeSet::new();
    let mut specs = Vec::with_capacity(selected.len());

    for spec in fetched {
        let id = spec.id();
        if !wanted.contains(&id) {
            warn!(application = %id, "Ignoring deployment spec that was not requested");
            continue;
        }
        if !seen.insert(id.clone()) {
            warn!(application = %id, "Ignoring repeated deployment spec");
            continue;
        }
        specs.push(spec);
    }

    let missing: Vec<String> = selected
        .iter()
        .filter(|id| !seen.contains(*id))
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(Error::Configuration(format!(
            "no deployment spec for {}",
            missing.join(", ")
        )));
    }

    Ok(specs)
}
