//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, OutputFlags};
use crate::commands;

/// Provision, inspect and verify declarative VM configurations
#[derive(Parser)]
#[command(
    name = "provcheck",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (any non-empty `NO_COLOR` other than a falsey
    /// word such as `0` or `false` also disables it)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply, inspect, assert and destroy every scenario
    Run(commands::SuiteArgs),

    /// Dry-run every scenario without creating resources
    Plan(commands::SuiteArgs),

    /// Destroy leftovers of a suite's configurations
    Destroy(commands::SuiteArgs),

    /// Check a suite file without running it
    Validate(commands::SuiteArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or any scenario failed.
    pub async fn run(self) -> Result<()> {
        let Cli {
            no_color,
            quiet,
            json,
            command,
        } = self;

        if let Command::Version = command {
            let ctx = crate::output::OutputContext::new(no_color, quiet);
            return commands::version::run(&ctx, json);
        }

        let app = AppContext::new(&OutputFlags {
            no_color,
            quiet,
            json,
        })?;
        match command {
            Command::Run(args) => commands::run::run(&app, &args).await,
            Command::Plan(args) => commands::plan::run(&app, &args).await,
            Command::Destroy(args) => commands::destroy::run(&app, &args).await,
            Command::Validate(args) => commands::validate::run(&app, &args),
            Command::Version => Ok(()),
        }
    }
}
