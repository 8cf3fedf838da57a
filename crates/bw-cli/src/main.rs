//! Boardwalk CLI - promotes BI dashboards across environment accounts

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod context;

use cli::Cli;
use commands::{deploy, init, synth, trigger};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        cli::Commands::Synth(args) => synth::execute(args, &cli.global).await,
        cli::Commands::Init(args) => init::execute(args, &cli.global).await,
        cli::Commands::Deploy(args) => deploy::execute(args, &cli.global).await,
        cli::Commands::Trigger(args) => trigger::execute(args, &cli.global).await,
    }
}
