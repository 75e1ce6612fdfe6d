use anyhow::{bail, Context, Result};
use reqwest::Client;

use nebula_assignment::{codec, AssignmentStats};

use crate::config::SnapshotSource;

pub fn auth(builder: reqwest::RequestBuilder, token: Option<&String>) -> reqwest::RequestBuilder {
    match token {
        Some(t) => builder.bearer_auth(t),
        None => builder,
    }
}

/// Build a v2 API URL from the gateway base URL.
pub fn v2_url(gateway_url: &str, path: &str) -> String {
    format!(
        "{}/v1/admin/v2{}",
        gateway_url.trim_end_matches('/'),
        path
    )
}

pub async fn load_snapshot(
    client: &Client,
    gateway_url: &str,
    token: Option<&String>,
    source: &SnapshotSource,
) -> Result<AssignmentStats> {
    let bytes = match source {
        SnapshotSource::File(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read snapshot {}", path.display()))?,
        SnapshotSource::Gateway { model_id } => {
            let url = v2_url(gateway_url, &format!("/models/{}/stats", model_id));
            tracing::debug!(%url, "fetching assignment stats");
            let resp = auth(client.get(&url), token).send().await?;
            if !resp.status().is_success() {
                bail!("failed to fetch stats for '{}': {}", model_id, resp.text().await?);
            }
            resp.bytes().await?.to_vec()
        }
    };

    let stats: AssignmentStats = codec::decode(&bytes).context("invalid stats snapshot")?;
    tracing::debug!(
        model_id = stats.model_id(),
        nodes = stats.node_stats_unordered().len(),
        "loaded assignment stats"
    );
    Ok(stats)
}
