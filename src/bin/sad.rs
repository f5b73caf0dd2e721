use anyhow::Result;
use sad::config::{
    parse_args, CliArgs, CliOutcome, ConfigSourceError, EnvPrefixes, EnvSnapshot, OptionSources,
};
use sad::deploy::{DeployError, Deployer};
use sad::remote::OpenSshTransport;
use sad::types::{DeploymentPlan, DeploymentReport};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

const EXIT_HELP: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match parse_args(std::env::args()) {
        Ok(CliOutcome::Options(cli)) => cli,
        Ok(CliOutcome::Help(usage)) => {
            println!("{usage}");
            return ExitCode::from(EXIT_HELP);
        }
        Err(ConfigSourceError::Flag { message, usage }) => {
            println!("Error parsing command line arguments: {}", message.trim_end());
            println!("{usage}");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli).await {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            if let Some(output) = e.downcast_ref::<DeployError>().and_then(|e| e.remote_output()) {
                eprintln!("Remote output:\n{}", output.trim_end());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &CliArgs) -> Result<DeploymentReport> {
    let filter = init_tracing();
    let snapshot = EnvSnapshot::capture();
    let prefixes = EnvPrefixes::default();

    let options = OptionSources::load(cli, &snapshot, &prefixes)?.resolve();
    if let (Some(filter), Some(true)) = (filter, options.debug) {
        filter.reload(EnvFilter::new("sad=debug"))?;
    }

    let options = options.into_verified()?;
    info!("Starting deployment of {}", options.deployment_name());

    let plan = DeploymentPlan::prepare(&options, &snapshot, prefixes.deploy())?;
    let report = Deployer::new(OpenSshTransport::new()).deploy(&plan).await?;
    Ok(report)
}

/// Installs the subscriber before any option source is read. A `SAD_LOG`
/// filter is final; otherwise the returned handle raises the level once the
/// debug option is resolved.
fn init_tracing() -> Option<FilterHandle> {
    let from_env = EnvFilter::try_from_env("SAD_LOG").ok();
    let pinned = from_env.is_some();
    let (filter, handle) =
        reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new("sad=info")));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    (!pinned).then_some(handle)
}

fn print_report(report: &DeploymentReport) {
    println!(
        "Deployed {} to {} in {}",
        report.deployment_name, report.target, report.remote_dir
    );
    for file in &report.files {
        println!("  {} ({} bytes, sha256 {})", file.remote_path, file.size, file.sha256);
    }
    let output = report.start_output.trim_end();
    if !output.is_empty() {
        println!("{output}");
    }
}
