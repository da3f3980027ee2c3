pub mod coordinator;
pub mod installer;
pub mod invoker;
pub mod locator;
pub mod report;

pub use coordinator::{BuildCoordinator, BuildError, BuildOutcome, BuildOutcomeError, StageError};
pub use installer::{TargetInstallError, TargetInstaller, TargetStatus};
pub use invoker::{InvocationFailure, ShellInvoker, ToolchainInvocationError, ToolchainInvoker};
pub use locator::{read_artifact, ArtifactLocator, ArtifactNotFoundError};
pub use report::{BuildStepReporter, ReportingError};
