//! Command line entry points
//!
//! - `serve`: run the HTTP API
//! - `query`: answer one query in-process and print the response
//! - `analyze`: analyze one query in-process and print the analysis

pub mod query;
pub mod serve;

use clap::{Args, Parser, Subcommand};

/// MathFlow orchestrator - routes queries through reasoning, computation and visualization
#[derive(Parser)]
#[command(name = "mathflow-orchestrator")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Answer a single query and print the JSON response
    Query(QueryArgs),

    /// Analyze a single query and print the JSON analysis
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Query text
    pub text: String,

    /// Leave the step log out of the response
    #[arg(long)]
    pub no_steps: bool,

    /// Leave visualization URLs out of the response
    #[arg(long)]
    pub no_visualization: bool,

    /// Leave the additional context out of the response
    #[arg(long)]
    pub no_additional_context: bool,

    #[arg(long)]
    pub conversation_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Query text
    pub text: String,

    #[arg(long)]
    pub conversation_id: Option<String>,
}
