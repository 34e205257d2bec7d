//! Interactive checkpoints before anything is dispatched.

use crate::partition::Partition;
use skylift_core::{Error, Result};

/// Tabular detail shown alongside a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

/// A yes/no question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub message: String,
    /// Answer assumed when the user just presses enter.
    pub default: bool,
    pub details: Option<Table>,
}

/// Terminal interaction used by the gate and by ambiguity resolution.
pub trait Prompt: Send + Sync {
    /// Ask a yes/no question. Aborting the prompt returns `Error::Cancelled`.
    fn confirm(&self, question: &Question) -> Result<bool>;

    /// Let the user pick any subset of `items`.
    fn select(&self, message: &str, items: &[String]) -> Result<Vec<String>>;
}

/// Ask whether the selection should go ahead.
///
/// Every application is listed with its namespace and cluster. Only a
/// single-item selection defaults to yes. An aborted prompt counts as no.
pub fn confirm_dispatch(
    prompt: &dyn Prompt,
    partitions: &[Partition],
    verb: &str,
    affiliation: &str,
) -> Result<bool> {
    let mut rows: Vec<Vec<String>> = partitions
        .iter()
        .flat_map(|p| {
            p.specs.iter().map(move |s| {
                vec![
                    p.cluster.name.clone(),
                    s.namespace.clone(),
                    s.name.clone(),
                ]
            })
        })
        .collect();
    rows.sort_by(|a, b| a[2].cmp(&b[2]));

    let question = Question {
        message: format!(
            "Do you want to {} {} application(s) in affiliation {}?",
            verb,
            rows.len(),
            affiliation
        ),
        default: rows.len() == 1,
        details: Some(Table {
            header: vec!["CLUSTER", "NAMESPACE", "APPLICATION"],
            rows,
        }),
    };

    answer(prompt.confirm(&question))
}

/// Offer the candidates of an ambiguous search term.
///
/// The user may take all of them, or pick a subset. Aborting the pick
/// selects nothing.
pub fn choose_candidates(
    prompt: &dyn Prompt,
    verb: &str,
    candidates: &[String],
) -> Result<Vec<String>> {
    let rows = candidates
        .iter()
        .map(|c| match c.split_once('/') {
            Some((env, app)) => vec![env.to_string(), app.to_string()],
            None => vec![String::new(), c.clone()],
        })
        .collect();

    let question = Question {
        message: format!("Add all {} application(s) to {}?", candidates.len(), verb),
        default: true,
        details: Some(Table {
            header: vec!["ENVIRONMENT", "APPLICATION"],
            rows,
        }),
    };

    if answer(prompt.confirm(&question))? {
        return Ok(candidates.to_vec());
    }
    match prompt.select(&format!("Which applications do you want to {}?", verb), candidates) {
        Err(Error::Cancelled) => Ok(Vec::new()),
        other => other,
    }
}

fn answer(response: Result<bool>) -> Result<bool> {
    match response {
        Err(Error::Cancelled) => Ok(false),
        other => other,
    }
}
