use thanatos_build::{BuildStepReporter, ReportingError};
use thanatos_core::BuildStepUpdate;
use tracing::{info, warn};

/// Reporter for standalone runs with no status endpoint: build steps only
/// go to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogStepReporter;

impl BuildStepReporter for LogStepReporter {
    fn report(&self, update: &BuildStepUpdate) -> Result<(), ReportingError> {
        if update.success {
            info!(
                build_id = %update.build_id,
                step = %update.step_name,
                "{}",
                update.message
            );
        } else {
            warn!(
                build_id = %update.build_id,
                step = %update.step_name,
                "{}",
                update.message
            );
        }
        Ok(())
    }
}
