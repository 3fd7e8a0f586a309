//! oracle-agent - SSH agent acting as an Ed25519 signing oracle

use anyhow::Result;
use clap::Parser;

use oracle_agent::cli::{Cli, Commands, commands};
use oracle_agent::logging::{self, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format: LogFormat = cli.log_format.parse()?;
    logging::init(cli.verbose, cli.quiet, format)?;

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, cli.config).await?,
        Commands::Keygen(args) => commands::keygen::execute(args).await?,
        Commands::List(args) => commands::list::execute(args).await?,
        Commands::Sign(args) => commands::sign::execute(args).await?,
        Commands::Config(args) => commands::config::execute(args, cli.config).await?,
        Commands::Version => commands::version::execute(cli.verbose).await?,
    }

    Ok(())
}
