//! Sequences one payload build: resolve profile, install target, compile,
//! locate. Every stage reports a build step whether it passes or fails.

use std::path::{Path, PathBuf};

use thanatos_core::config::{BuilderConfig, ConfigError, ToolchainCommands};
use thanatos_core::platform::validate_target_triple;
use thanatos_core::{
    BuildId, BuildRequest, BuildStage, BuildStepUpdate, C2Profile, ProfileResolutionError,
    UnsupportedPlatformError,
};
use thiserror::Error;
use tracing::{info, info_span, warn};

use crate::installer::{TargetInstallError, TargetInstaller, TargetStatus};
use crate::invoker::{ToolchainInvocationError, ToolchainInvoker};
use crate::locator::{read_artifact, ArtifactLocator, ArtifactNotFoundError};
use crate::report::{BuildStepReporter, ReportingError};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    ProfileResolution(#[from] ProfileResolutionError),
    #[error(transparent)]
    TargetInstall(#[from] TargetInstallError),
    #[error(transparent)]
    ToolchainInvocation(#[from] ToolchainInvocationError),
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatformError),
    #[error(transparent)]
    ArtifactNotFound(#[from] ArtifactNotFoundError),
}

/// A build that stopped at `stage`.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    pub stage: BuildStage,
    #[source]
    pub source: BuildError,
}

impl StageError {
    /// Operator-facing text sent with the failed build step.
    pub fn summary(&self) -> String {
        self.source.to_string()
    }
}

/// Everything one call to [`BuildCoordinator::build`] produced.
///
/// Step-reporting failures never change the build result; they are carried
/// next to it so callers see both.
#[derive(Debug)]
pub struct BuildOutcome {
    pub artifact: Result<Vec<u8>, StageError>,
    pub reporting_errors: Vec<ReportingError>,
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        self.artifact.is_ok() && self.reporting_errors.is_empty()
    }

    pub fn into_result(self) -> Result<Vec<u8>, BuildOutcomeError> {
        match self.artifact {
            Ok(bytes) if self.reporting_errors.is_empty() => Ok(bytes),
            Ok(_) => Err(BuildOutcomeError {
                build: None,
                reporting: self.reporting_errors,
            }),
            Err(error) => Err(BuildOutcomeError {
                build: Some(error),
                reporting: self.reporting_errors,
            }),
        }
    }
}

/// Build and reporting failures joined together, one per line.
#[derive(Debug, Error)]
#[error("{}", join_errors(.build, .reporting))]
pub struct BuildOutcomeError {
    #[source]
    pub build: Option<StageError>,
    pub reporting: Vec<ReportingError>,
}

fn join_errors(build: &Option<StageError>, reporting: &[ReportingError]) -> String {
    build
        .iter()
        .map(ToString::to_string)
        .chain(reporting.iter().map(ToString::to_string))
        .collect::<Vec<String>>()
        .join("\n")
}

pub struct BuildCoordinator<I, R> {
    invoker: I,
    reporter: R,
    locator: ArtifactLocator,
    toolchain: ToolchainCommands,
    install_targets: bool,
}

impl<I: ToolchainInvoker, R: BuildStepReporter> BuildCoordinator<I, R> {
    pub fn new(invoker: I, reporter: R, agent_code_root: impl Into<PathBuf>) -> Self {
        Self {
            invoker,
            reporter,
            locator: ArtifactLocator::new(agent_code_root),
            toolchain: ToolchainCommands::default(),
            install_targets: true,
        }
    }

    /// Resolves the agent source root once, up front; a working directory
    /// that cannot be determined fails here rather than mid-build.
    pub fn from_config(invoker: I, reporter: R, config: &BuilderConfig) -> Result<Self, ConfigError> {
        let root = config.agent_code_root()?;
        Ok(Self::new(invoker, reporter, root)
            .with_toolchain_commands(config.toolchain.clone())
            .with_target_install(config.install_targets))
    }

    pub fn with_toolchain_commands(mut self, commands: ToolchainCommands) -> Self {
        self.toolchain = commands;
        self
    }

    pub fn with_target_install(mut self, enabled: bool) -> Self {
        self.install_targets = enabled;
        self
    }

    pub fn agent_code_root(&self) -> &Path {
        self.locator.agent_code_root()
    }

    pub fn build(&self, build_id: &BuildId, request: &BuildRequest) -> BuildOutcome {
        let span = info_span!("payload_build", build_id = %build_id, target = %request.target_triple);
        let _guard = span.enter();
        info!(
            os = %request.selected_os,
            format = %request.output_format,
            "starting payload build"
        );

        let mut reporting_errors = Vec::new();
        let artifact = self.run_stages(build_id, request, &mut reporting_errors);
        match &artifact {
            Ok(bytes) => info!(size = bytes.len(), "payload build finished"),
            Err(error) => warn!(stage = %error.stage, "payload build failed"),
        }
        BuildOutcome {
            artifact,
            reporting_errors,
        }
    }

    fn run_stages(
        &self,
        build_id: &BuildId,
        request: &BuildRequest,
        reporting: &mut Vec<ReportingError>,
    ) -> Result<Vec<u8>, StageError> {
        // Checked before anything spawns: a request without a usable
        // profile or with a malformed triple never reaches the toolchain.
        let profile = self.stage(
            build_id,
            BuildStage::ResolveProfile,
            reporting,
            || {
                validate_target_triple(&request.target_triple)?;
                Ok(request.profiles.resolve()?)
            },
            |profile: &C2Profile| format!("Selected C2 profile '{}'", profile),
        )?;

        self.stage(
            build_id,
            BuildStage::InstallTarget,
            reporting,
            || self.install_target(&request.target_triple),
            |status: &Option<TargetStatus>| match status {
                None => "Target installation disabled".to_string(),
                Some(TargetStatus::AlreadyInstalled) => {
                    format!("Target '{}' already installed", request.target_triple)
                }
                Some(TargetStatus::Installed) => {
                    format!("Installed target '{}'", request.target_triple)
                }
            },
        )?;

        self.stage(
            build_id,
            BuildStage::Compile,
            reporting,
            || {
                self.invoker
                    .run(self.agent_code_root(), &request.build_command)
                    .map_err(BuildError::from)
            },
            |_output: &Vec<u8>| format!("Compiled agent for '{}'", request.target_triple),
        )?;

        self.stage(
            build_id,
            BuildStage::Locate,
            reporting,
            || {
                let path = self.locator.locate(request, profile)?;
                let bytes = read_artifact(&path)?;
                Ok((path, bytes))
            },
            |(path, bytes): &(PathBuf, Vec<u8>)| {
                format!("Read {} bytes from '{}'", bytes.len(), path.display())
            },
        )
        .map(|(_path, bytes)| bytes)
    }

    fn install_target(&self, target: &str) -> Result<Option<TargetStatus>, BuildError> {
        if !self.install_targets {
            return Ok(None);
        }
        let installer = TargetInstaller::new(&self.invoker, self.agent_code_root(), &self.toolchain);
        Ok(Some(installer.ensure_target(target)?))
    }

    fn stage<T>(
        &self,
        build_id: &BuildId,
        stage: BuildStage,
        reporting: &mut Vec<ReportingError>,
        run: impl FnOnce() -> Result<T, BuildError>,
        describe: impl FnOnce(&T) -> String,
    ) -> Result<T, StageError> {
        let span = info_span!("build_stage", stage = %stage);
        let _guard = span.enter();
        match run() {
            Ok(value) => {
                let message = describe(&value);
                info!(detail = %message, "stage completed");
                self.send(BuildStepUpdate::succeeded(build_id, stage, message), reporting);
                Ok(value)
            }
            Err(source) => {
                let error = StageError { stage, source };
                warn!(error = %error, "stage failed");
                self.send(BuildStepUpdate::failed(build_id, stage, error.summary()), reporting);
                Err(error)
            }
        }
    }

    fn send(&self, update: BuildStepUpdate, reporting: &mut Vec<ReportingError>) {
        if let Err(error) = self.reporter.report(&update) {
            warn!(step = %update.step_name, error = %error, "failed to report build step");
            reporting.push(error);
        }
    }
}
