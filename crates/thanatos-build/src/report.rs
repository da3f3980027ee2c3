use thanatos_core::{BuildId, BuildStepUpdate};
use thiserror::Error;

/// A build-step update that could not be delivered to the controlling
/// system. Independent of whether the build itself succeeded.
#[derive(Debug, Error)]
#[error("failed to report build step '{step_name}' for build {build_id}: {message}")]
pub struct ReportingError {
    pub build_id: BuildId,
    pub step_name: String,
    pub message: String,
}

impl ReportingError {
    pub fn new(update: &BuildStepUpdate, message: impl Into<String>) -> Self {
        Self {
            build_id: update.build_id.clone(),
            step_name: update.step_name.clone(),
            message: message.into(),
        }
    }
}

pub trait BuildStepReporter {
    fn report(&self, update: &BuildStepUpdate) -> Result<(), ReportingError>;
}

impl<T: BuildStepReporter + ?Sized> BuildStepReporter for &T {
    fn report(&self, update: &BuildStepUpdate) -> Result<(), ReportingError> {
        (**self).report(update)
    }
}

impl<T: BuildStepReporter + ?Sized> BuildStepReporter for Box<T> {
    fn report(&self, update: &BuildStepUpdate) -> Result<(), ReportingError> {
        (**self).report(update)
    }
}
