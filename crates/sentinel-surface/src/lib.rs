//! HTTP/SSE, stdio, and dashboard surfaces for the Sentinel governance engine

use clap::Parser;

pub mod config;
pub mod dashboard;
pub mod http;
pub mod state;
pub mod stdio;

#[derive(Parser, Debug)]
#[command(name = "sentinel-surface")]
#[command(about = "Sentinel governance engine: blast radius, policy, historical, and cost scoring for agent-proposed actions", long_about = None)]
pub struct Cli {
    /// Run the stdio tool protocol instead of the HTTP server
    #[arg(long)]
    pub stdio: bool,

    /// Topology snapshot file (mock mode)
    #[arg(long)]
    pub topology: Option<String>,

    /// Policy pack file (mock mode)
    #[arg(short, long)]
    pub policy: Option<String>,

    /// Incident history file (mock mode)
    #[arg(long)]
    pub incidents: Option<String>,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
