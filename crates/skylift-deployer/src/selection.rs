//! The per-invocation selection.
//!
//! Everything a run needs to know about what the user asked for is collected
//! here once, validated, and then only read.

use crate::overrides::Overrides;
use crate::resolver::{ExcludeFilter, MatchMode};
use skylift_core::{Error, Result};
use std::sync::Arc;

/// What to do with the selected applications.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Deploy from stored configuration, with overrides shared by every partition.
    Deploy { overrides: Arc<Overrides> },
    /// Redeploy running application deployments.
    Redeploy,
}

impl Operation {
    pub fn deploy(overrides: Overrides) -> Self {
        Operation::Deploy {
            overrides: Arc::new(overrides),
        }
    }

    /// Verb used in prompts and messages.
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Deploy { .. } => "deploy",
            Operation::Redeploy => "redeploy",
        }
    }
}

/// Immutable description of one run.
#[derive(Debug, Clone)]
pub struct Selection {
    terms: Vec<String>,
    match_mode: MatchMode,
    excludes: ExcludeFilter,
    cluster: Option<String>,
    override_token: Option<String>,
    confirm: bool,
    operation: Operation,
}

impl Selection {
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    pub fn excludes(&self) -> &ExcludeFilter {
        &self.excludes
    }

    /// Only specs targeting this cluster are kept.
    pub fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    /// Token used instead of each cluster's own.
    pub fn override_token(&self) -> Option<&str> {
        self.override_token.as_deref()
    }

    /// Whether the user is asked before anything is dispatched.
    pub fn confirm(&self) -> bool {
        self.confirm
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }
}

/// Builder for creating a Selection.
pub struct SelectionBuilder {
    operation: Operation,
    terms: Vec<String>,
    match_mode: MatchMode,
    excludes: Vec<String>,
    cluster: Option<String>,
    override_token: Option<String>,
    confirm: bool,
}

impl SelectionBuilder {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            terms: Vec::new(),
            match_mode: MatchMode::Unique,
            excludes: Vec::new(),
            cluster: None,
            override_token: None,
            confirm: true,
        }
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.terms.push(term.into());
        self
    }

    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms.extend(terms.into_iter().map(Into::into));
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn with_excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_cluster(mut self, cluster: Option<String>) -> Self {
        self.cluster = cluster;
        self
    }

    pub fn with_override_token(mut self, token: Option<String>) -> Self {
        self.override_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_confirmation(mut self, confirm: bool) -> Self {
        self.confirm = confirm;
        self
    }

    /// Validate and freeze the selection.
    pub fn build(self) -> Result<Selection> {
        let terms: Vec<String> = self
            .terms
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Err(Error::Validation(format!(
                "nothing to {}: give at least one application or environment",
                self.operation.verb()
            )));
        }

        Ok(Selection {
            terms,
            match_mode: self.match_mode,
            excludes: ExcludeFilter::new(&self.excludes)?,
            cluster: self.cluster.filter(|c| !c.is_empty()),
            override_token: self.override_token,
            confirm: self.confirm,
            operation: self.operation,
        })
    }
}
