mod args;
mod client;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use reqwest::Client;

use nebula_assignment::telemetry::{init_tracing, TelemetryConfig};
use nebula_assignment::AssignmentStats;

use crate::args::{Args, Command, SourceArgs};
use crate::client::load_snapshot;
use crate::config::build_source;
use crate::output::{print_nodes, print_summary, print_totals};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let provider = init_tracing(&TelemetryConfig {
        service_name: "nebula-stats".to_string(),
        otlp_endpoint: args.otlp_endpoint.clone(),
        otlp_token: args.otlp_token.clone(),
    });

    let result = run(args).await;

    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "failed to flush traces");
        }
    }
    result
}

async fn run(args: Args) -> Result<()> {
    let client = Client::new();
    let token = args.token.as_ref();

    match &args.command {
        Command::Summary { source, json } => {
            let stats = load(&client, &args.gateway_url, token, source)
                .await?
                .overall_inference_stats();
            tracing::info!(%stats, "overall inference stats");
            if *json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_summary(&stats);
            }
        }
        Command::Nodes { source } => {
            let stats = load(&client, &args.gateway_url, token, source).await?;
            print_nodes(&stats);
        }
        Command::Totals { source, json } => {
            let stats = load(&client, &args.gateway_url, token, source).await?;
            let totals = stats.totals();
            if *json {
                println!("{}", serde_json::to_string_pretty(&totals)?);
            } else {
                print_totals(stats.model_id(), &totals);
            }
        }
    }
    Ok(())
}

async fn load(
    client: &Client,
    gateway_url: &str,
    token: Option<&String>,
    source: &SourceArgs,
) -> Result<AssignmentStats> {
    let source = build_source(source.clone())?;
    load_snapshot(client, gateway_url, token, &source).await
}
