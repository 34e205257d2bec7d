//! Concurrent dispatch of partitions.
//!
//! Every partition gets its own task. A task always reports exactly one
//! bundle, whatever happens to the remote call, so the fan-in only has to
//! count bundles.

use crate::partition::{Destination, Partition};
use crate::selection::Operation;
use skylift_core::deployer::{DeployClient, DeployResult, DeploymentSpec};
use skylift_core::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Hands out a deploy client for a partition's cluster.
pub trait ClientProvider: Send + Sync {
    fn client_for(&self, partition: &Partition) -> Result<Arc<dyn DeployClient>>;
}

/// Results produced by one partition task.
#[derive(Debug, Clone)]
pub struct ResultBundle {
    pub destination: Destination,
    pub results: Vec<DeployResult>,
}

/// Fans partitions out to concurrent tasks and collects their bundles.
#[derive(Clone)]
pub struct Dispatcher {
    clients: Arc<dyn ClientProvider>,
}

impl Dispatcher {
    pub fn new(clients: Arc<dyn ClientProvider>) -> Self {
        Self { clients }
    }

    /// Dispatch every partition and wait for all of them.
    ///
    /// Returns one bundle per partition in completion order. Per-partition
    /// failures become failed results; nothing here returns an error.
    pub async fn dispatch(&self, partitions: Vec<Partition>, operation: &Operation) -> Vec<ResultBundle> {
        let expected = partitions.len();
        if expected == 0 {
            return Vec::new();
        }

        let (tx, mut rx) = mpsc::channel(expected);
        let mut unreported: BTreeMap<Destination, Vec<DeploymentSpec>> = BTreeMap::new();

        for partition in partitions {
            unreported.insert(partition.destination.clone(), partition.specs.clone());

            let tx = tx.clone();
            let clients = self.clients.clone();
            let operation = operation.clone();
            tokio::spawn(async move {
                let bundle = run_partition(clients.as_ref(), &partition, &operation).await;
                let _ = tx.send(bundle).await;
            });
        }
        drop(tx);

        let mut bundles = Vec::with_capacity(expected);
        while bundles.len() < expected {
            match rx.recv().await {
                Some(bundle) => {
                    unreported.remove(&bundle.destination);
                    bundles.push(bundle);
                }
                // Every sender is gone: some task died before reporting.
                None => break,
            }
        }

        for (destination, specs) in unreported {
            error!(%destination, "Dispatch task ended without reporting");
            bundles.push(ResultBundle {
                destination,
                results: specs
                    .iter()
                    .map(|s| DeployResult::failed(s, "dispatch task ended without reporting"))
                    .collect(),
            });
        }

        bundles
    }
}

/// Run one partition to completion and package its results.
///
/// Remote results are passed through as returned. A count that differs from
/// the partition size is only logged, so one result per application holds
/// for local failures but is not enforced on remote answers.
async fn run_partition(
    clients: &dyn ClientProvider,
    partition: &Partition,
    operation: &Operation,
) -> ResultBundle {
    let destination = &partition.destination;
    info!(%destination, applications = partition.len(), operation = operation.verb(), "Dispatching partition");

    let results = match call_remote(clients, partition, operation).await {
        Ok(results) => {
            if results.len() != partition.len() {
                warn!(
                    %destination,
                    expected = partition.len(),
                    received = results.len(),
                    "Remote returned an unexpected number of results"
                );
            }
            info!(%destination, "Partition completed");
            results
        }
        Err(e) => {
            warn!(%destination, error = %e, "Partition failed");
            let reason = e.to_string();
            partition
                .specs
                .iter()
                .map(|s| DeployResult::failed(s, reason.clone()))
                .collect()
        }
    };

    ResultBundle {
        destination: destination.clone(),
        results,
    }
}

async fn call_remote(
    clients: &dyn ClientProvider,
    partition: &Partition,
    operation: &Operation,
) -> Result<Vec<DeployResult>> {
    if !partition.cluster.reachable {
        return Err(Error::Unreachable {
            cluster: partition.cluster.name.clone(),
        });
    }

    let client = clients.client_for(partition)?;
    match operation {
        Operation::Deploy { overrides } => {
            client
                .deploy(&partition.deploy_payload(overrides.files()))
                .await
        }
        Operation::Redeploy => {
            let redeployed = client.redeploy(&partition.redeploy_payload()).await?;
            Ok(redeployed
                .results
                .into_iter()
                .map(|r| r.into_deploy_result(&partition.cluster.name))
                .collect())
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::overrides::Overrides;
    use crate::partition::partition;
    use async_trait::async_trait;
    use skylift_core::deployer::{DeployPayload, RedeployPayload, RedeployResult, RedeployResults};
    use skylift_core::{Cluster, ClusterRegistry};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use url::Url;

    /// How the fake remote behaves for one cluster.
    #[derive(Clone)]
    pub(crate) enum Behaviour {
        Succeed { delay_ms: u64 },
        Fail(String),
        Panic,
        /// Answers for the first application only.
        AnswerFirst,
    }

    /// In-memory stand-in for the remote API, one behaviour per cluster.
    pub(crate) struct MockClients {
        behaviours: HashMap<String, Behaviour>,
        pub(crate) calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    }

    impl MockClients {
        pub(crate) fn new(behaviours: &[(&str, Behaviour)]) -> Self {
            Self {
                behaviours: behaviours
                    .iter()
                    .map(|(c, b)| (c.to_string(), b.clone()))
                    .collect(),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub(crate) fn calls_to(&self, cluster: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(c, _)| c == cluster)
                .count()
        }
    }

    struct MockClient {
        cluster: String,
        behaviour: Behaviour,
        calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    }

    impl MockClient {
        async fn respond(&self, apps: Vec<(String, String)>) -> Result<Vec<(String, String)>> {
            self.calls.lock().unwrap().push((
                self.cluster.clone(),
                apps.iter().map(|(_, name)| name.clone()).collect(),
            ));
            match &self.behaviour {
                Behaviour::Succeed { delay_ms } => {
                    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                    Ok(apps)
                }
                Behaviour::Fail(message) => Err(Error::Transport(message.clone())),
                Behaviour::Panic => panic!("remote exploded"),
                Behaviour::AnswerFirst => Ok(apps.into_iter().take(1).collect()),
            }
        }
    }

    #[async_trait]
    impl DeployClient for MockClient {
        async fn deploy(&self, payload: &DeployPayload) -> Result<Vec<DeployResult>> {
            let apps = payload
                .application_ids
                .iter()
                .map(|id| (id.environment().to_string(), id.application().to_string()))
                .collect();
            let deployed = self.respond(apps).await?;
            Ok(deployed
                .into_iter()
                .map(|(env, name)| DeployResult {
                    success: true,
                    reason: String::new(),
                    deploy_id: format!("{}-{}", self.cluster, name),
                    application_name: name,
                    namespace: env,
                    cluster: self.cluster.clone(),
                })
                .collect())
        }

        async fn redeploy(&self, payload: &RedeployPayload) -> Result<RedeployResults> {
            let apps = payload
                .application_deployment_refs
                .iter()
                .map(|r| (r.namespace.clone(), r.name.clone()))
                .collect();
            let redeployed = self.respond(apps).await?;
            Ok(RedeployResults {
                success: true,
                message: String::new(),
                results: redeployed
                    .into_iter()
                    .map(|(namespace, name)| RedeployResult {
                        success: true,
                        reason: String::new(),
                        application_ref: skylift_core::deployer::ApplicationDeploymentRef::new(
                            namespace, name,
                        ),
                    })
                    .collect(),
            })
        }
    }

    impl ClientProvider for MockClients {
        fn client_for(&self, partition: &Partition) -> Result<Arc<dyn DeployClient>> {
            let behaviour = self
                .behaviours
                .get(&partition.cluster.name)
                .cloned()
                .ok_or_else(|| Error::Internal(format!("no behaviour for {}", partition.cluster.name)))?;
            Ok(Arc::new(MockClient {
                cluster: partition.cluster.name.clone(),
                behaviour,
                calls: self.calls.clone(),
            }))
        }
    }

    pub(crate) fn registry() -> ClusterRegistry {
        vec![
            Cluster::new("east", Url::parse("https://east.example.com").unwrap()),
            Cluster::new("west", Url::parse("https://west.example.com").unwrap()).unreachable(),
            Cluster::new("north", Url::parse("https://north.example.com").unwrap()),
        ]
        .into_iter()
        .collect()
    }

    fn specs(entries: &[(&str, &str, &str)]) -> Vec<DeploymentSpec> {
        entries
            .iter()
            .map(|(name, cluster, env)| DeploymentSpec::new(*name, *env, *cluster, "1"))
            .collect()
    }

    fn flatten(bundles: &[ResultBundle]) -> Vec<DeployResult> {
        bundles.iter().flat_map(|b| b.results.clone()).collect()
    }

    #[tokio::test]
    async fn test_unreachable_cluster_is_never_called() {
        let clients = Arc::new(MockClients::new(&[("east", Behaviour::Succeed { delay_ms: 0 })]));
        let dispatcher = Dispatcher::new(clients.clone());
        let partitions = partition(
            specs(&[("foo", "east", "dev"), ("bar", "east", "dev"), ("baz", "west", "dev")]),
            &registry(),
            None,
        )
        .unwrap();

        let bundles = dispatcher
            .dispatch(partitions, &Operation::deploy(Overrides::default()))
            .await;
        assert_eq!(bundles.len(), 2);

        let results = flatten(&bundles);
        assert_eq!(results.len(), 3);

        let baz = results.iter().find(|r| r.application_name == "baz").unwrap();
        assert!(!baz.success);
        assert_eq!(baz.reason, "Cluster is not reachable");
        assert_eq!(baz.deploy_id, "-");

        assert_eq!(clients.calls_to("west"), 0);
        assert_eq!(clients.calls_to("east"), 1);
        assert!(results.iter().filter(|r| r.cluster == "east").all(|r| r.success));
    }

    #[tokio::test]
    async fn test_transport_failure_is_contained_to_its_partition() {
        let clients = Arc::new(MockClients::new(&[
            ("east", Behaviour::Fail("connection refused".to_string())),
            ("north", Behaviour::Succeed { delay_ms: 0 }),
        ]));
        let dispatcher = Dispatcher::new(clients);
        let partitions = partition(
            specs(&[("foo", "east", "dev"), ("bar", "east", "dev"), ("qux", "north", "dev")]),
            &registry(),
            None,
        )
        .unwrap();

        let results = flatten(&dispatcher.dispatch(partitions, &Operation::Redeploy).await);
        assert_eq!(results.len(), 3);

        for name in ["foo", "bar"] {
            let r = results.iter().find(|r| r.application_name == name).unwrap();
            assert!(!r.success);
            assert_eq!(r.reason, "request failed: connection refused");
            assert_eq!(r.deploy_id, "-");
        }
        let qux = results.iter().find(|r| r.application_name == "qux").unwrap();
        assert!(qux.success);
        assert_eq!(qux.cluster, "north");
    }

    #[tokio::test]
    async fn test_one_bundle_per_partition_regardless_of_completion_order() {
        let clients = Arc::new(MockClients::new(&[
            ("east", Behaviour::Succeed { delay_ms: 50 }),
            ("north", Behaviour::Succeed { delay_ms: 0 }),
        ]));
        let dispatcher = Dispatcher::new(clients.clone());
        let partitions = partition(
            specs(&[
                ("a", "east", "dev"),
                ("b", "east", "prod"),
                ("c", "north", "dev"),
                ("d", "north", "test"),
                ("e", "east", "dev"),
            ]),
            &registry(),
            None,
        )
        .unwrap();
        assert_eq!(partitions.len(), 4);

        let bundles = dispatcher
            .dispatch(partitions, &Operation::deploy(Overrides::default()))
            .await;
        assert_eq!(bundles.len(), 4);
        assert_eq!(flatten(&bundles).len(), 5);
        assert_eq!(clients.calls.lock().unwrap().len(), 4);

        let mut destinations: Vec<_> = bundles.iter().map(|b| b.destination.to_string()).collect();
        destinations.sort();
        destinations.dedup();
        assert_eq!(destinations.len(), 4);
    }

    #[tokio::test]
    async fn test_panicking_task_still_yields_results() {
        let clients = Arc::new(MockClients::new(&[
            ("east", Behaviour::Panic),
            ("north", Behaviour::Succeed { delay_ms: 0 }),
        ]));
        let dispatcher = Dispatcher::new(clients);
        let partitions = partition(
            specs(&[("foo", "east", "dev"), ("qux", "north", "dev")]),
            &registry(),
            None,
        )
        .unwrap();

        let results = flatten(&dispatcher.dispatch(partitions, &Operation::Redeploy).await);
        assert_eq!(results.len(), 2);
        let foo = results.iter().find(|r| r.application_name == "foo").unwrap();
        assert!(!foo.success);
        assert_eq!(foo.reason, "dispatch task ended without reporting");
    }

    #[tokio::test]
    async fn test_short_remote_answer_is_passed_through() {
        let clients = Arc::new(MockClients::new(&[("east", Behaviour::AnswerFirst)]));
        let dispatcher = Dispatcher::new(clients);
        let partitions = partition(
            specs(&[("foo", "east", "dev"), ("bar", "east", "dev")]),
            &registry(),
            None,
        )
        .unwrap();

        let results = flatten(&dispatcher.dispatch(partitions, &Operation::Redeploy).await);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].application_name, "foo");
        assert!(results[0].success);
    }

    #[tokio::test]
    async fn test_no_partitions() {
        let dispatcher = Dispatcher::new(Arc::new(MockClients::new(&[])));
        assert!(dispatcher.dispatch(Vec::new(), &Operation::Redeploy).await.is_empty());
    }
}
