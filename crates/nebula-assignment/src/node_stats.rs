use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{require_positive, StatsError};
use crate::node::DiscoveryNode;
use crate::routing::{RoutingState, RoutingStateAndReason};

/// Counters reported by a node whose replica is servable.
///
/// When `inference_count` is zero the two averages and `last_access` are
/// absent rather than zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartedNodeMetrics {
    pub inference_count: u64,

    /// Mean inference time in milliseconds since the replica started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_inference_time_ms: Option<f64>,

    /// Mean inference time in milliseconds over the most recent period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_inference_time_ms_last_period: Option<f64>,

    pub pending_count: u32,
    pub error_count: u32,
    pub rejected_execution_count: u32,
    pub timeout_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_access: Option<DateTime<Utc>>,

    pub start_time: DateTime<Utc>,
    pub threads_per_allocation: u32,
    pub number_of_allocations: u32,

    /// Passed through as reported; not part of any failure accounting.
    pub peak_throughput_per_minute: u64,
    pub throughput_last_minute: u64,
}

impl StartedNodeMetrics {
    /// Errors, rejected executions and timeouts. Pending requests are queue
    /// pressure, not failures.
    pub fn failure_count(&self) -> u64 {
        u64::from(self.error_count)
            + u64::from(self.rejected_execution_count)
            + u64::from(self.timeout_count)
    }

    fn validate(&self) -> Result<(), StatsError> {
        require_positive("threads_per_allocation", self.threads_per_allocation)?;
        require_positive("number_of_allocations", self.number_of_allocations)?;
        require_valid_average("avg_inference_time_ms", self.avg_inference_time_ms)?;
        require_valid_average(
            "avg_inference_time_ms_last_period",
            self.avg_inference_time_ms_last_period,
        )?;
        Ok(())
    }

    fn check_no_phantom_data(&self, node: &DiscoveryNode) -> Result<(), StatsError> {
        if self.inference_count > 0 {
            return Ok(());
        }
        let field = if self.avg_inference_time_ms.is_some() {
            "avg_inference_time_ms"
        } else if self.avg_inference_time_ms_last_period.is_some() {
            "avg_inference_time_ms_last_period"
        } else if self.last_access.is_some() {
            "last_access"
        } else {
            return Ok(());
        };
        Err(StatsError::InferenceDataWithoutInferences {
            node_id: node.node_id().to_string(),
            field,
        })
    }
}

fn require_valid_average(field: &'static str, value: Option<f64>) -> Result<(), StatsError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(StatsError::InvalidAverage { field, value: v }),
        _ => Ok(()),
    }
}

// Averages compare bitwise so that Eq and Hash agree.
impl PartialEq for StartedNodeMetrics {
    fn eq(&self, other: &Self) -> bool {
        self.inference_count == other.inference_count
            && self.avg_inference_time_ms.map(f64::to_bits)
                == other.avg_inference_time_ms.map(f64::to_bits)
            && self.avg_inference_time_ms_last_period.map(f64::to_bits)
                == other.avg_inference_time_ms_last_period.map(f64::to_bits)
            && self.pending_count == other.pending_count
            && self.error_count == other.error_count
            && self.rejected_execution_count == other.rejected_execution_count
            && self.timeout_count == other.timeout_count
            && self.last_access == other.last_access
            && self.start_time == other.start_time
            && self.threads_per_allocation == other.threads_per_allocation
            && self.number_of_allocations == other.number_of_allocations
            && self.peak_throughput_per_minute == other.peak_throughput_per_minute
            && self.throughput_last_minute == other.throughput_last_minute
    }
}

impl Eq for StartedNodeMetrics {}

impl Hash for StartedNodeMetrics {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inference_count.hash(state);
        self.avg_inference_time_ms.map(f64::to_bits).hash(state);
        self.avg_inference_time_ms_last_period.map(f64::to_bits).hash(state);
        self.pending_count.hash(state);
        self.error_count.hash(state);
        self.rejected_execution_count.hash(state);
        self.timeout_count.hash(state);
        self.last_access.hash(state);
        self.start_time.hash(state);
        self.threads_per_allocation.hash(state);
        self.number_of_allocations.hash(state);
        self.peak_throughput_per_minute.hash(state);
        self.throughput_last_minute.hash(state);
    }
}

/// The two shapes a node's stats can take.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum NodeState {
    /// The replica never became servable; only the routing label is known.
    NotStarted { routing_state: RoutingStateAndReason },
    Started(StartedNodeMetrics),
}

/// One node's contribution to a deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "NodeStatsRecord")]
pub struct NodeStats {
    node: DiscoveryNode,
    state: NodeState,
}

impl NodeStats {
    pub fn for_not_started_state(
        node: DiscoveryNode,
        routing_state: RoutingState,
        reason: Option<String>,
    ) -> Self {
        Self {
            node,
            state: NodeState::NotStarted {
                routing_state: RoutingStateAndReason::new(routing_state, reason),
            },
        }
    }

    /// Builds the started shape.
    ///
    /// Callers must leave the averages and `last_access` unset when
    /// `inference_count` is zero; debug builds assert this.
    pub fn for_started_state(
        node: DiscoveryNode,
        metrics: StartedNodeMetrics,
    ) -> Result<Self, StatsError> {
        debug_assert!(
            metrics.check_no_phantom_data(&node).is_ok(),
            "node [{}] has zero inferences but reports latency or last access",
            node.node_id()
        );
        metrics.validate()?;
        Ok(Self {
            node,
            state: NodeState::Started(metrics),
        })
    }

    pub fn node(&self) -> &DiscoveryNode {
        &self.node
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn is_started(&self) -> bool {
        matches!(self.state, NodeState::Started(_))
    }

    pub fn routing_state(&self) -> RoutingState {
        match &self.state {
            NodeState::NotStarted { routing_state } => routing_state.state,
            NodeState::Started(_) => RoutingState::Started,
        }
    }

    pub fn routing_state_and_reason(&self) -> RoutingStateAndReason {
        match &self.state {
            NodeState::NotStarted { routing_state } => routing_state.clone(),
            NodeState::Started(_) => RoutingStateAndReason::new(RoutingState::Started, None),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.state {
            NodeState::NotStarted { routing_state } => routing_state.reason.as_deref(),
            NodeState::Started(_) => None,
        }
    }

    pub fn metrics(&self) -> Option<&StartedNodeMetrics> {
        match &self.state {
            NodeState::Started(metrics) => Some(metrics),
            NodeState::NotStarted { .. } => None,
        }
    }

    pub fn inference_count(&self) -> Option<u64> {
        self.metrics().map(|m| m.inference_count)
    }

    pub fn avg_inference_time_ms(&self) -> Option<f64> {
        self.metrics().and_then(|m| m.avg_inference_time_ms)
    }

    pub fn avg_inference_time_ms_last_period(&self) -> Option<f64> {
        self.metrics().and_then(|m| m.avg_inference_time_ms_last_period)
    }

    pub fn pending_count(&self) -> Option<u32> {
        self.metrics().map(|m| m.pending_count)
    }

    pub fn error_count(&self) -> Option<u32> {
        self.metrics().map(|m| m.error_count)
    }

    pub fn rejected_execution_count(&self) -> Option<u32> {
        self.metrics().map(|m| m.rejected_execution_count)
    }

    pub fn timeout_count(&self) -> Option<u32> {
        self.metrics().map(|m| m.timeout_count)
    }

    pub fn failure_count(&self) -> Option<u64> {
        self.metrics().map(StartedNodeMetrics::failure_count)
    }

    pub fn last_access(&self) -> Option<DateTime<Utc>> {
        self.metrics().and_then(|m| m.last_access)
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.metrics().map(|m| m.start_time)
    }

    pub fn threads_per_allocation(&self) -> Option<u32> {
        self.metrics().map(|m| m.threads_per_allocation)
    }

    pub fn number_of_allocations(&self) -> Option<u32> {
        self.metrics().map(|m| m.number_of_allocations)
    }

    pub fn peak_throughput_per_minute(&self) -> Option<u64> {
        self.metrics().map(|m| m.peak_throughput_per_minute)
    }

    pub fn throughput_last_minute(&self) -> Option<u64> {
        self.metrics().map(|m| m.throughput_last_minute)
    }
}

#[derive(Deserialize)]
struct NodeStatsRecord {
    node: DiscoveryNode,
    state: NodeState,
}

impl TryFrom<NodeStatsRecord> for NodeStats {
    type Error = StatsError;

    fn try_from(record: NodeStatsRecord) -> Result<Self, Self::Error> {
        if let NodeState::Started(metrics) = &record.state {
            metrics.check_no_phantom_data(&record.node)?;
            metrics.validate()?;
        }
        Ok(Self {
            node: record.node,
            state: record.state,
        })
    }
}
