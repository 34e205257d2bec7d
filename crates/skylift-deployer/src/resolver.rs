//! Search term resolution and exclude filtering.

use regex::Regex;
use skylift_core::{Error, Result};
use std::fmt::Display;

/// How a search term matching several candidates is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// More than one match is an `Ambiguous` error.
    #[default]
    Unique,
    /// Every match is accepted.
    All,
}

/// Resolve a search term against the candidate pool.
///
/// An exact match always wins, even when other candidates contain the term.
/// Otherwise every candidate containing the term matches; results are sorted
/// by their rendered form.
pub fn resolve<T>(search: &str, pool: &[T], mode: MatchMode) -> Result<Vec<T>>
where
    T: Display + Clone,
{
    let keyed: Vec<(String, &T)> = pool.iter().map(|c| (c.to_string(), c)).collect();

    if let Some((_, exact)) = keyed.iter().find(|(key, _)| key == search) {
        return Ok(vec![(*exact).clone()]);
    }

    let mut matches: Vec<&(String, &T)> = keyed
        .iter()
        .filter(|(key, _)| key.contains(search))
        .collect();
    matches.sort_by(|a, b| a.0.cmp(&b.0));
    matches.dedup_by(|a, b| a.0 == b.0);

    match (matches.len(), mode) {
        (0, _) => Err(Error::NotFound(search.to_string())),
        (1, _) | (_, MatchMode::All) => Ok(matches.into_iter().map(|(_, c)| (*c).clone()).collect()),
        _ => Err(Error::Ambiguous {
            search: search.to_string(),
            candidates: matches.into_iter().map(|(key, _)| key.clone()).collect(),
        }),
    }
}

/// Ordered list of patterns; a candidate survives only if it matches none of them.
#[derive(Debug, Clone, Default)]
pub struct ExcludeFilter {
    patterns: Vec<Regex>,
}

impl ExcludeFilter {
    /// Compile the patterns, failing with a `Validation` error on the first invalid one.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| {
                    Error::Validation(format!("invalid exclude pattern '{}': {}", p.as_ref(), e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_excluded(&self, candidate: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(candidate))
    }

    /// Narrow the candidates one pattern at a time, in the order supplied.
    pub fn apply<T: Display>(&self, mut candidates: Vec<T>) -> Vec<T> {
        for pattern in &self.patterns {
            candidates.retain(|c| !pattern.is_match(&c.to_string()));
        }
        candidates
    }
}
