mod cli;
mod config;
mod domain;
mod fixtures;
mod http;
mod report;
mod scenarios;
mod state;
mod steps;
mod testing;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use cli::{Cli, Command};
use config::{ProbeConfig, ReportConfig};
use http::ApiClient;
use steps::runner::FeatureRunner;
use testing::runner::{RunReport, Runner};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(error) = init_tracing(cli.log_level()) {
        eprintln!("{error:#}");
    }

    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = ProbeConfig::load_with(&cli.overrides()).context("failed to load configuration")?;
    let client = ApiClient::connect(&config.client_config()).context("failed to build the HTTP client")?;

    match cli.command {
        Command::Run(args) => {
            let selected = scenarios::select(args.select.resource, args.select.group, args.filter.as_deref());
            if selected.is_empty() {
                tracing::warn!("no scenario matches the selection");
            }
            let report = Runner::new()
                .with_seed(config.seed)
                .with_restore(config.restore)
                .run(&client, selected)
                .context("scenario run aborted")?;
            emit(&report, &config.report)?;
            if args.shutdown {
                client.shutdown().context("failed to shut the service down")?;
            }
            Ok(exit_code(&report))
        }
        Command::Features(args) => {
            let registry = steps::bindings::standard().context("invalid step pattern")?;
            let features = steps::feature::load_features(&args.paths).context("failed to load feature files")?;
            tracing::debug!(bindings = registry.len(), features = features.len(), "features loaded");
            let report = FeatureRunner::new(&client, &registry)
                .run(&features)
                .context("feature run aborted")?;
            emit(&report, &config.report)?;
            Ok(exit_code(&report))
        }
        Command::List(args) => {
            for scenario in scenarios::select(args.resource, args.group, None) {
                println!("{}", scenario.name);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Ping => match client.ensure_ready() {
            Ok(()) => {
                println!("API is running at {}", client.base_url());
                Ok(ExitCode::SUCCESS)
            }
            Err(error) if error.is_unreachable() => {
                println!("API is not running at {}", client.base_url());
                tracing::debug!(%error, "ping failed");
                Ok(ExitCode::FAILURE)
            }
            Err(error) => {
                println!("{error}");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Shutdown => {
            client.shutdown().context("failed to shut the service down")?;
            println!("shutdown requested at {}", client.base_url());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn emit(report: &RunReport, output: &ReportConfig) -> anyhow::Result<()> {
    print!("{}", report::render(report, output.format)?);
    if let Some(path) = &output.path {
        report::write_report(path, report, output.format)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }
    Ok(())
}

fn exit_code(report: &RunReport) -> ExitCode {
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("TODOPROBE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}
