//! Selection, partitioning and concurrent dispatch of deployments.
//!
//! A run flows through:
//! - `resolver`: search terms to application identifiers, minus excludes
//! - `partition`: deployment specs grouped by (cluster, namespace)
//! - `gate`: optional interactive confirmation
//! - `dispatch`: one task per partition, one result bundle per task
//! - `aggregate`: sorted results and the overall verdict
//!
//! `workflow` wires these together; `http` talks to the remote API.

pub mod aggregate;
pub mod dispatch;
pub mod gate;
pub mod http;
pub mod overrides;
pub mod partition;
pub mod resolver;
pub mod selection;
pub mod workflow;

pub use aggregate::DeployReport;
pub use dispatch::{ClientProvider, Dispatcher, ResultBundle};
pub use gate::{Prompt, Question, Table};
pub use http::{ApiClient, HttpClientProvider};
pub use overrides::Overrides;
pub use partition::{Destination, Partition};
pub use resolver::{ExcludeFilter, MatchMode};
pub use selection::{Operation, Selection, SelectionBuilder};
pub use workflow::{DeployWorkflow, Outcome};
