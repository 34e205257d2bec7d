//! Merging of per-partition results into one report.

use crate::dispatch::ResultBundle;
use serde::Serialize;
use skylift_core::deployer::DeployResult;

/// Every result of a run, sorted by application name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub results: Vec<DeployResult>,
}

impl DeployReport {
    /// Flatten the bundles and sort by application name.
    ///
    /// The sort is stable, so equally named applications keep the order
    /// they had within and across bundles.
    pub fn aggregate(bundles: Vec<ResultBundle>) -> Self {
        let mut results: Vec<DeployResult> =
            bundles.into_iter().flat_map(|b| b.results).collect();
        results.sort_by(|a, b| a.application_name.cmp(&b.application_name));
        Self { results }
    }

    /// True only when there is at least one result and every result succeeded.
    pub fn success(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| r.success)
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> impl Iterator<Item = &DeployResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
