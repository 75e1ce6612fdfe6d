use std::fmt;

use serde::{Deserialize, Serialize};

/// Deployment-wide inference and failure totals, consumed by dashboards and
/// the autoscaler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct InferenceStats {
    pub model_id: String,
    pub inference_count: u64,
    pub failure_count: u64,
}

impl InferenceStats {
    pub fn empty(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            inference_count: 0,
            failure_count: 0,
        }
    }
}

impl fmt::Display for InferenceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] inferences={} failures={}",
            self.model_id, self.inference_count, self.failure_count
        )
    }
}
