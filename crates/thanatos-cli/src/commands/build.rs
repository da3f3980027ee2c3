use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thanatos_build::{
    BuildCoordinator, BuildOutcome, BuildOutcomeError, BuildStepReporter, ShellInvoker,
};
use thanatos_core::artifact::sha256_hex;
use thanatos_core::config::{load_config, BuilderConfig};
use thanatos_core::request::parse_request_json;
use thanatos_core::BuildId;
use thanatos_report::{HttpStepReporter, LogStepReporter};
use tracing::info;

pub struct BuildArgs {
    pub request: PathBuf,
    pub build_id: String,
    pub output: PathBuf,
    pub config: PathBuf,
    pub command: Option<String>,
}

pub struct BuildOutput {
    pub artifact_path: PathBuf,
    pub sha256: String,
}

pub fn run(args: BuildArgs) -> Result<BuildOutput> {
    let config = load_config(&args.config)?;
    let contents = fs::read_to_string(&args.request)
        .with_context(|| format!("failed to read build request '{}'", args.request.display()))?;
    let mut request = parse_request_json(&contents)?;
    if let Some(command) = args.command {
        request.build_command = command;
    }

    let reporter = select_reporter(&config)?;
    let invoker = ShellInvoker::new(config.shell.clone());
    let coordinator = BuildCoordinator::from_config(invoker, reporter, &config)?;
    info!(
        agent_code_root = %coordinator.agent_code_root().display(),
        "resolved agent source root"
    );

    let BuildOutcome {
        artifact,
        reporting_errors,
    } = coordinator.build(&BuildId::new(args.build_id), &request);
    let bytes = match artifact {
        Ok(bytes) => bytes,
        Err(error) => {
            return Err(BuildOutcomeError {
                build: Some(error),
                reporting: reporting_errors,
            }
            .into())
        }
    };

    // The payload is kept even when the controlling system missed updates.
    write_artifact(&args.output, &bytes)?;
    if !reporting_errors.is_empty() {
        return Err(BuildOutcomeError {
            build: None,
            reporting: reporting_errors,
        }
        .into());
    }
    Ok(BuildOutput {
        artifact_path: args.output,
        sha256: sha256_hex(&bytes),
    })
}

fn select_reporter(config: &BuilderConfig) -> Result<Box<dyn BuildStepReporter>> {
    let Some(endpoint) = &config.reporter.endpoint else {
        return Ok(Box::new(LogStepReporter));
    };
    let token = match &config.reporter.token_env {
        Some(name) => Some(
            std::env::var(name)
                .with_context(|| format!("missing {} environment variable", name))?,
        ),
        None => None,
    };
    let reporter = HttpStepReporter::new(endpoint.clone(), token)
        .context("failed to build status reporter")?;
    info!(endpoint = %reporter.endpoint(), "reporting build steps over http");
    Ok(Box::new(reporter))
}

fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
    fs::write(path, bytes)
        .with_context(|| format!("failed to write payload to '{}'", path.display()))
}
