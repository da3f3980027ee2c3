pub mod artifact;
pub mod build_step;
pub mod config;
pub mod platform;
pub mod request;

pub use build_step::{BuildId, BuildStage, BuildStepUpdate};
pub use platform::{Architecture, SelectedOs, UnsupportedPlatformError};
pub use request::{BuildRequest, C2Profile, OutputFormat, ProfileResolutionError, ProfileSelection};

/// Crate-name prefix shared by every agent artifact the toolchain emits.
pub const AGENT_NAME: &str = "thanatos";
