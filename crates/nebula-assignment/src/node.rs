use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::{require_non_empty, StatsError};

/// A cluster member as seen by the coordinator.
///
/// Ordering compares `node_id` first, so sorting by node gives the same
/// order as sorting by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "DiscoveryNodeRecord")]
pub struct DiscoveryNode {
    node_id: String,
    address: SocketAddr,
    version: String,
}

impl DiscoveryNode {
    pub fn new(
        node_id: impl Into<String>,
        address: SocketAddr,
        version: impl Into<String>,
    ) -> Result<Self, StatsError> {
        let node_id = node_id.into();
        require_non_empty("node_id", &node_id)?;
        Ok(Self {
            node_id,
            address,
            version: version.into(),
        })
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

#[derive(Deserialize)]
struct DiscoveryNodeRecord {
    node_id: String,
    address: SocketAddr,
    version: String,
}

impl TryFrom<DiscoveryNodeRecord> for DiscoveryNode {
    type Error = StatsError;

    fn try_from(record: DiscoveryNodeRecord) -> Result<Self, Self::Error> {
        Self::new(record.node_id, record.address, record.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_node_id_rejected() {
        let err = DiscoveryNode::new("", "127.0.0.1:9300".parse().unwrap(), "1.0.0").unwrap_err();
        assert!(matches!(err, StatsError::EmptyField { field: "node_id" }));
    }

    #[test]
    fn test_ordering_follows_node_id() {
        let a = DiscoveryNode::new("node_a", "10.0.0.9:9300".parse().unwrap(), "1.0.0").unwrap();
        let b = DiscoveryNode::new("node_b", "10.0.0.1:9300".parse().unwrap(), "1.0.0").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_decode_rejects_empty_node_id() {
        let json = r#"{"node_id":"","address":"127.0.0.1:9300","version":"1.0.0"}"#;
        assert!(serde_json::from_str::<DiscoveryNode>(json).is_err());
    }
}
