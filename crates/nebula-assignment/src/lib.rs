pub mod assignment_stats;
pub mod codec;
pub mod error;
pub mod inference_stats;
pub mod node;
pub mod node_stats;
pub mod routing;
pub mod telemetry;

pub use assignment_stats::{AssignmentStats, DeploymentTotals};
pub use error::StatsError;
pub use inference_stats::InferenceStats;
pub use node::DiscoveryNode;
pub use node_stats::{NodeState, NodeStats, StartedNodeMetrics};
pub use routing::{RoutingState, RoutingStateAndReason};
