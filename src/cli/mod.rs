//! # Command Line
//!
//! `todoprobe run` drives the scenario catalogue, `todoprobe features` the
//! feature files. Exit status is `0` when everything passed, `1` when any
//! scenario failed and `2` when the run could not start.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{Overrides, ReportOverrides};
use crate::report::ReportFormat;
use crate::testing::scenario::{Group, Resource};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the todo manager service
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout in milliseconds (0 keeps the client default)
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Log at debug level
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Log errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the scenario catalogue in a shuffled order
    Run(RunArgs),

    /// Run Gherkin feature files against the service
    Features(FeatureArgs),

    /// Print the names of the selected scenarios
    List(SelectArgs),

    /// Check that the service answers on `/`
    Ping,

    /// Ask the service to stop
    Shutdown,
}

#[derive(Args, Debug, Default)]
pub struct SelectArgs {
    /// Only scenarios probing this resource
    #[arg(long, value_enum)]
    pub resource: Option<Resource>,

    /// Only scenarios in this group
    #[arg(long, value_enum)]
    pub group: Option<Group>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Only scenarios whose name contains this text
    #[arg(long)]
    pub filter: Option<String>,

    /// Seed for the shuffle, to replay an earlier order
    #[arg(long)]
    pub seed: Option<u64>,

    /// Leave the service as the scenarios left it
    #[arg(long)]
    pub no_restore: bool,

    /// Stop the service once the run is over
    #[arg(long)]
    pub shutdown: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct FeatureArgs {
    /// Feature files or directories holding them
    #[arg(default_value = "features")]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Default)]
pub struct OutputArgs {
    /// Report format printed to stdout and written to --report
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Also write the report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Cli {
    /// Flags that take precedence over the config file and environment.
    pub fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            base_url: self.base_url.clone(),
            timeout_ms: self.timeout_ms,
            ..Overrides::default()
        };
        let output = match &self.command {
            Command::Run(args) => {
                overrides.seed = args.seed;
                overrides.restore = args.no_restore.then_some(false);
                Some(&args.output)
            }
            Command::Features(args) => Some(&args.output),
            Command::List(_) | Command::Ping | Command::Shutdown => None,
        };
        if let Some(output) = output {
            overrides.report = ReportOverrides {
                format: output.format,
                path: output.report.clone(),
            };
        }
        overrides
    }

    /// Default log filter when `TODOPROBE_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}
