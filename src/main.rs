use clap::Parser;
use mathflow_orchestrator::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Query(args) => cli::query::run_query(args).await,
        Command::Analyze(args) => cli::query::run_analyze(args).await,
    }
}
