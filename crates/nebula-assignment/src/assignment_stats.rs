use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{require_non_empty, require_positive, StatsError};
use crate::inference_stats::InferenceStats;
use crate::node_stats::{NodeState, NodeStats};

/// Cluster-wide statistics snapshot for one deployment.
///
/// Node stats are kept in the order they were gathered; [`node_stats`]
/// presents them sorted by node id, and equality compares that sorted view.
///
/// [`node_stats`]: AssignmentStats::node_stats
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "AssignmentStatsRecord")]
pub struct AssignmentStats {
    model_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    threads_per_allocation: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    number_of_allocations: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    queue_capacity: Option<u32>,

    start_time: DateTime<Utc>,

    node_stats: Vec<NodeStats>,
}

impl AssignmentStats {
    pub fn new(
        model_id: impl Into<String>,
        threads_per_allocation: Option<u32>,
        number_of_allocations: Option<u32>,
        queue_capacity: Option<u32>,
        start_time: DateTime<Utc>,
        node_stats: Vec<NodeStats>,
    ) -> Result<Self, StatsError> {
        let model_id = model_id.into();
        require_non_empty("model_id", &model_id)?;
        if let Some(v) = threads_per_allocation {
            require_positive("threads_per_allocation", v)?;
        }
        if let Some(v) = number_of_allocations {
            require_positive("number_of_allocations", v)?;
        }
        if let Some(v) = queue_capacity {
            require_positive("queue_capacity", v)?;
        }
        Ok(Self {
            model_id,
            threads_per_allocation,
            number_of_allocations,
            queue_capacity,
            start_time,
            node_stats,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn threads_per_allocation(&self) -> Option<u32> {
        self.threads_per_allocation
    }

    pub fn number_of_allocations(&self) -> Option<u32> {
        self.number_of_allocations
    }

    pub fn queue_capacity(&self) -> Option<u32> {
        self.queue_capacity
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Node stats sorted ascending by node id. Recomputed on every call.
    pub fn node_stats(&self) -> Vec<&NodeStats> {
        let mut sorted: Vec<&NodeStats> = self.node_stats.iter().collect();
        sorted.sort_by(|a, b| a.node().node_id().cmp(b.node().node_id()));
        sorted
    }

    /// Node stats in the order they were supplied. No ordering guarantee.
    pub fn node_stats_unordered(&self) -> &[NodeStats] {
        &self.node_stats
    }

    /// Sums inference and failure counts over started nodes.
    ///
    /// Not-started nodes contribute nothing. Failures are errors plus
    /// rejected executions plus timeouts; sums saturate at `u64::MAX`.
    pub fn overall_inference_stats(&self) -> InferenceStats {
        let mut stats = InferenceStats::empty(self.model_id.clone());
        for metrics in self.node_stats.iter().filter_map(NodeStats::metrics) {
            stats.inference_count = stats.inference_count.saturating_add(metrics.inference_count);
            stats.failure_count = stats.failure_count.saturating_add(metrics.failure_count());
        }
        tracing::trace!(
            model_id = %self.model_id,
            nodes = self.node_stats.len(),
            inference_count = stats.inference_count,
            failure_count = stats.failure_count,
            "computed overall inference stats"
        );
        stats
    }

    /// Deployment-wide roll-up of every per-node counter.
    pub fn totals(&self) -> DeploymentTotals {
        let mut totals = DeploymentTotals::default();
        let mut weighted_time_ms = 0.0;
        let mut weighted_count = 0.0;

        for node in &self.node_stats {
            let metrics = match node.state() {
                NodeState::Started(metrics) => metrics,
                NodeState::NotStarted { .. } => {
                    totals.not_started_nodes += 1;
                    continue;
                }
            };
            totals.started_nodes += 1;
            totals.inference_count = totals.inference_count.saturating_add(metrics.inference_count);
            totals.pending_count += u64::from(metrics.pending_count);
            totals.error_count += u64::from(metrics.error_count);
            totals.rejected_execution_count += u64::from(metrics.rejected_execution_count);
            totals.timeout_count += u64::from(metrics.timeout_count);
            totals.peak_throughput_per_minute = totals
                .peak_throughput_per_minute
                .saturating_add(metrics.peak_throughput_per_minute);
            totals.throughput_last_minute = totals
                .throughput_last_minute
                .saturating_add(metrics.throughput_last_minute);

            if let Some(avg) = metrics
                .avg_inference_time_ms
                .filter(|_| metrics.inference_count > 0)
            {
                weighted_time_ms += avg * metrics.inference_count as f64;
                weighted_count += metrics.inference_count as f64;
            }
            totals.last_access = totals.last_access.max(metrics.last_access);
        }

        if weighted_count > 0.0 {
            totals.average_inference_time_ms = Some(weighted_time_ms / weighted_count);
        }
        totals
    }
}

impl PartialEq for AssignmentStats {
    fn eq(&self, other: &Self) -> bool {
        self.model_id == other.model_id
            && self.threads_per_allocation == other.threads_per_allocation
            && self.number_of_allocations == other.number_of_allocations
            && self.queue_capacity == other.queue_capacity
            && self.start_time == other.start_time
            && self.node_stats() == other.node_stats()
    }
}

impl Eq for AssignmentStats {}

impl Hash for AssignmentStats {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.model_id.hash(state);
        self.threads_per_allocation.hash(state);
        self.number_of_allocations.hash(state);
        self.queue_capacity.hash(state);
        self.start_time.hash(state);
        self.node_stats().hash(state);
    }
}

#[derive(Deserialize)]
struct AssignmentStatsRecord {
    model_id: String,
    #[serde(default)]
    threads_per_allocation: Option<u32>,
    #[serde(default)]
    number_of_allocations: Option<u32>,
    #[serde(default)]
    queue_capacity: Option<u32>,
    start_time: DateTime<Utc>,
    #[serde(default)]
    node_stats: Vec<NodeStats>,
}

impl TryFrom<AssignmentStatsRecord> for AssignmentStats {
    type Error = StatsError;

    fn try_from(record: AssignmentStatsRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.model_id,
            record.threads_per_allocation,
            record.number_of_allocations,
            record.queue_capacity,
            record.start_time,
            record.node_stats,
        )
    }
}

/// Sums of every per-node counter across started nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeploymentTotals {
    pub started_nodes: usize,
    pub not_started_nodes: usize,
    pub inference_count: u64,
    pub pending_count: u64,
    pub error_count: u64,
    pub rejected_execution_count: u64,
    pub timeout_count: u64,
    pub peak_throughput_per_minute: u64,
    pub throughput_last_minute: u64,

    /// Mean inference time weighted by each node's inference count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_inference_time_ms: Option<f64>,

    /// Most recent access across all nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_access: Option<DateTime<Utc>>,
}

impl DeploymentTotals {
    pub fn failure_count(&self) -> u64 {
        self.error_count + self.rejected_execution_count + self.timeout_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    use crate::node_stats::tests::{make_metrics, make_node, make_not_started, make_started};
    use crate::node_stats::StartedNodeMetrics;
    use crate::routing::RoutingState;

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn make_assignment(model_id: &str, nodes: Vec<NodeStats>) -> AssignmentStats {
        AssignmentStats::new(model_id, Some(2), Some(3), Some(1024), start_time(), nodes).unwrap()
    }

    fn mixed_nodes() -> Vec<NodeStats> {
        vec![
            make_started("node_started_1", 10, 5, 12, 3),
            make_started("node_started_2", 12, 15, 4, 2),
            make_not_started("node_not_started_3", RoutingState::Failed, Some("a good reason")),
        ]
    }

    #[test]
    fn test_overall_inference_stats() {
        let stats = make_assignment("my-model", mixed_nodes()).overall_inference_stats();
        assert_eq!(stats.model_id, "my-model");
        assert_eq!(stats.inference_count, 22);
        assert_eq!(stats.failure_count, 41);
    }

    #[test]
    fn test_overall_inference_stats_with_no_nodes() {
        let stats = make_assignment("my-model", vec![]).overall_inference_stats();
        assert_eq!(stats, InferenceStats::empty("my-model"));
    }

    #[test]
    fn test_overall_inference_stats_with_only_not_started_nodes() {
        let nodes = vec![
            make_not_started("node_not_started_1", RoutingState::Starting, None),
            make_not_started("node_not_started_2", RoutingState::Stopped, Some("a good reason")),
            make_not_started("node_not_started_3", RoutingState::Started, None),
        ];
        let stats = make_assignment("my-model", nodes).overall_inference_stats();
        assert_eq!(stats.inference_count, 0);
        assert_eq!(stats.failure_count, 0);
    }

    #[test]
    fn test_pending_and_throughput_excluded_from_failures() {
        let mut metrics = make_metrics(5, 1, 1, 1);
        metrics.pending_count = 1000;
        metrics.peak_throughput_per_minute = 99;
        metrics.throughput_last_minute = 42;
        let node = NodeStats::for_started_state(make_node("n1"), metrics).unwrap();
        let stats = make_assignment("m", vec![node]).overall_inference_stats();
        assert_eq!(stats.failure_count, 3);
    }

    #[test]
    fn test_overall_inference_stats_matches_started_sums() {
        let mut nodes = Vec::new();
        let mut expected_inferences = 0u64;
        let mut expected_failures = 0u64;
        for i in 0..20u32 {
            let id = format!("node_{i:02}");
            if i % 3 == 0 {
                nodes.push(make_not_started(&id, RoutingState::ALL[i as usize % 5], None));
            } else {
                let count = u64::from(i) * 7;
                nodes.push(make_started(&id, count, i, i * 2, i % 4));
                expected_inferences += count;
                expected_failures += u64::from(i + i * 2 + i % 4);
            }
        }
        let stats = make_assignment("m", nodes).overall_inference_stats();
        assert_eq!(stats.inference_count, expected_inferences);
        assert_eq!(stats.failure_count, expected_failures);
    }

    #[test]
    fn test_overall_inference_stats_invariant_under_permutation() {
        let mut nodes = mixed_nodes();
        nodes.push(make_started("node_started_4", 0, 0, 1, 0));
        nodes.push(make_not_started("node_not_started_5", RoutingState::Stopping, None));
        let expected = make_assignment("m", nodes.clone()).overall_inference_stats();

        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..32 {
            nodes.shuffle(&mut rng);
            assert_eq!(make_assignment("m", nodes.clone()).overall_inference_stats(), expected);
        }
    }

    #[test]
    fn test_overall_inference_stats_saturates() {
        let nodes = vec![
            make_started("a", u64::MAX, 0, 0, 0),
            make_started("b", 5, 0, 0, 0),
        ];
        let stats = make_assignment("m", nodes).overall_inference_stats();
        assert_eq!(stats.inference_count, u64::MAX);
    }

    #[test]
    fn test_node_stats_sorted_by_node_id() {
        let mut nodes = mixed_nodes();
        nodes.push(make_started("node_a", 1, 0, 0, 0));
        let mut rng = StdRng::seed_from_u64(3);
        nodes.shuffle(&mut rng);
        let assignment = make_assignment("m", nodes);

        let ids: Vec<&str> = assignment.node_stats().iter().map(|n| n.node().node_id()).collect();
        assert_eq!(
            ids,
            vec!["node_a", "node_not_started_3", "node_started_1", "node_started_2"]
        );
        assert_eq!(assignment.node_stats(), assignment.node_stats());
    }

    #[test]
    fn test_equality_ignores_input_order() {
        let nodes = mixed_nodes();
        let mut reversed = nodes.clone();
        reversed.reverse();
        assert_eq!(make_assignment("m", nodes), make_assignment("m", reversed));
    }

    #[test]
    fn test_equality_compares_optional_config() {
        let a = AssignmentStats::new("m", None, Some(1), None, start_time(), vec![]).unwrap();
        let b = AssignmentStats::new("m", Some(1), Some(1), None, start_time(), vec![]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_model_id_rejected() {
        let err = AssignmentStats::new("", None, None, None, start_time(), vec![]).unwrap_err();
        assert!(matches!(err, StatsError::EmptyField { field: "model_id" }));
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let err = AssignmentStats::new("m", None, None, Some(0), start_time(), vec![]).unwrap_err();
        assert!(matches!(err, StatsError::NonPositive { field: "queue_capacity", .. }));
    }

    #[test]
    fn test_totals() {
        let mut slow: StartedNodeMetrics = make_metrics(30, 1, 0, 0);
        slow.avg_inference_time_ms = Some(20.0);
        slow.last_access = Some(Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap());
        let mut fast = make_metrics(10, 0, 2, 1);
        fast.avg_inference_time_ms = Some(4.0);

        let nodes = vec![
            NodeStats::for_started_state(make_node("slow"), slow).unwrap(),
            NodeStats::for_started_state(make_node("fast"), fast).unwrap(),
            make_started("idle", 0, 0, 0, 0),
            make_not_started("down", RoutingState::Failed, Some("oom")),
        ];
        let assignment = make_assignment("m", nodes);
        let totals = assignment.totals();

        assert_eq!(totals.started_nodes, 3);
        assert_eq!(totals.not_started_nodes, 1);
        assert_eq!(totals.inference_count, 40);
        assert_eq!(totals.pending_count, 21);
        assert_eq!(totals.failure_count(), 4);
        assert_eq!(totals.peak_throughput_per_minute, 900);
        assert_eq!(totals.throughput_last_minute, 360);
        assert_eq!(totals.average_inference_time_ms, Some(16.0));
        assert_eq!(
            totals.last_access,
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap())
        );

        let overall = assignment.overall_inference_stats();
        assert_eq!(overall.inference_count, totals.inference_count);
        assert_eq!(overall.failure_count, totals.failure_count());
    }

    #[test]
    fn test_shared_snapshot_readers_agree() {
        use std::sync::Arc;

        let assignment = Arc::new(make_assignment("m", mixed_nodes()));
        let results: Vec<InferenceStats> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let assignment = Arc::clone(&assignment);
                    s.spawn(move || assignment.overall_inference_stats())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(results.iter().all(|r| r.inference_count == 22 && r.failure_count == 41));
    }

    #[test]
    fn test_totals_average_with_huge_counts() {
        let mut a = make_metrics(u64::MAX, 0, 0, 0);
        a.avg_inference_time_ms = Some(10.0);
        let mut b = make_metrics(u64::MAX, 0, 0, 0);
        b.avg_inference_time_ms = Some(10.0);
        let nodes = vec![
            NodeStats::for_started_state(make_node("a"), a).unwrap(),
            NodeStats::for_started_state(make_node("b"), b).unwrap(),
        ];
        let totals = make_assignment("m", nodes).totals();
        assert_eq!(totals.inference_count, u64::MAX);
        assert_eq!(totals.average_inference_time_ms, Some(10.0));
    }

    #[test]
    fn test_totals_without_inferences() {
        let nodes = vec![
            make_started("idle", 0, 0, 0, 0),
            make_not_started("down", RoutingState::Starting, None),
        ];
        let totals = make_assignment("m", nodes).totals();
        assert_eq!(totals.average_inference_time_ms, None);
        assert_eq!(totals.last_access, None);
    }
}
