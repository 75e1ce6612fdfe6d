//! Record/replay encoding for stats that cross process boundaries.
//!
//! Snapshots are JSON. Absent optional fields are omitted on encode and read
//! back as `None`, and decoding runs the same validation as the constructors,
//! so a bad record fails as a whole instead of producing a partial value.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StatsError;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StatsError> {
    serde_json::to_vec(value).map_err(StatsError::Encode)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StatsError> {
    serde_json::from_slice(bytes).map_err(|e| {
        tracing::debug!(error = %e, "rejected stats record");
        StatsError::Decode(e)
    })
}
