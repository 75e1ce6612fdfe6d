use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "nebula-stats")]
#[command(about = "Inspect deployment assignment statistics", long_about = None)]
pub struct Args {
    /// Gateway URL
    #[arg(
        long,
        env = "NEBULA_GATEWAY_URL",
        default_value = "http://127.0.0.1:8081"
    )]
    pub gateway_url: String,

    /// Gateway API token (Authorization: Bearer)
    #[arg(long, env = "NEBULA_GATEWAY_TOKEN")]
    pub token: Option<String>,

    /// OTLP/HTTP endpoint for trace export
    #[arg(long, env = "NEBULA_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Bearer token for the OTLP endpoint
    #[arg(long, env = "NEBULA_OTLP_TOKEN")]
    pub otlp_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Overall inference and failure counts for a deployment
    Summary {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Per-node stats, ordered by node id
    Nodes {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Deployment-wide roll-up of every node counter
    Totals {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the totals as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Where to read the stats snapshot from.
#[derive(Debug, Clone, ClapArgs)]
pub struct SourceArgs {
    /// Read a JSON snapshot from disk
    #[arg(long, conflicts_with = "model")]
    pub file: Option<PathBuf>,

    /// Fetch the snapshot for this model id from the gateway
    #[arg(long)]
    pub model: Option<String>,
}
