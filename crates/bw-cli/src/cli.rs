//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// Boardwalk - promotes BI dashboards and their asset graphs across accounts
#[derive(Parser, Debug)]
#[command(name = "bw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize the document pair locally without publishing anything
    Synth(SynthArgs),

    /// Synthesize and publish the parameter fill-in contract per stage
    Init(InitArgs),

    /// Validate operator parameters and package deployable archives
    Deploy(DeployArgs),

    /// Event trigger: deploy if the asset is tracked, no-op otherwise
    Trigger(TriggerArgs),
}

/// Arguments for the synth command
#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Dashboard id to promote
    pub dashboard_id: String,

    /// Emit externally-supplied parameters for connection attributes,
    /// overriding the configured default
    #[arg(long)]
    pub remap: bool,
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Dashboard id to promote
    pub dashboard_id: String,

    /// Emit externally-supplied parameters for connection attributes,
    /// overriding the configured default
    #[arg(long)]
    pub remap: bool,
}

/// Arguments for the deploy command
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Dashboard id to promote
    pub dashboard_id: String,

    /// Emit externally-supplied parameters for connection attributes,
    /// overriding the configured default
    #[arg(long)]
    pub remap: bool,
}

/// Arguments for the trigger command
#[derive(Args, Debug)]
pub struct TriggerArgs {
    /// Asset id carried by the triggering event
    pub asset_id: String,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
