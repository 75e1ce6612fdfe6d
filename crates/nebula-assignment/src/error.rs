use thiserror::Error;

/// Errors raised while building or moving assignment statistics.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: u32 },

    #[error("{field} must be a finite, non-negative number of milliseconds, got {value}")]
    InvalidAverage { field: &'static str, value: f64 },

    /// A started node with zero inferences must not carry latency or access data.
    #[error("node [{node_id}] reports zero inferences but has {field} set")]
    InferenceDataWithoutInferences {
        node_id: String,
        field: &'static str,
    },

    #[error("failed to encode stats: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode stats: {0}")]
    Decode(#[source] serde_json::Error),
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), StatsError> {
    if value.is_empty() {
        return Err(StatsError::EmptyField { field });
    }
    Ok(())
}

pub(crate) fn require_positive(field: &'static str, value: u32) -> Result<(), StatsError> {
    if value == 0 {
        return Err(StatsError::NonPositive { field, value });
    }
    Ok(())
}
