use std::path::Path;

use thanatos_core::config::ToolchainCommands;
use thanatos_core::platform::validate_target_triple;
use thiserror::Error;
use tracing::{debug, info};

use crate::invoker::{ToolchainInvocationError, ToolchainInvoker};

#[derive(Debug, Error)]
pub enum TargetInstallError {
    #[error("failed to list installed targets: {0}")]
    List(#[source] ToolchainInvocationError),
    #[error("failed to install target '{target}': {source}")]
    Install {
        target: String,
        #[source]
        source: ToolchainInvocationError,
    },
    #[error("invalid target triple '{0}'")]
    InvalidTarget(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetStatus {
    AlreadyInstalled,
    Installed,
}

/// Makes sure a compilation target is available to the toolchain.
pub struct TargetInstaller<'a, I: ?Sized> {
    invoker: &'a I,
    working_dir: &'a Path,
    commands: &'a ToolchainCommands,
}

impl<'a, I: ToolchainInvoker + ?Sized> TargetInstaller<'a, I> {
    pub fn new(invoker: &'a I, working_dir: &'a Path, commands: &'a ToolchainCommands) -> Self {
        Self {
            invoker,
            working_dir,
            commands,
        }
    }

    pub fn installed_targets(&self) -> Result<Vec<String>, TargetInstallError> {
        let output = self
            .invoker
            .run(self.working_dir, &self.commands.list_targets)
            .map_err(TargetInstallError::List)?;
        Ok(parse_installed_targets(&String::from_utf8_lossy(&output)))
    }

    pub fn ensure_target(&self, target: &str) -> Result<TargetStatus, TargetInstallError> {
        if validate_target_triple(target).is_err() {
            return Err(TargetInstallError::InvalidTarget(target.to_string()));
        }
        let installed = self.installed_targets()?;
        if installed.iter().any(|entry| entry == target) {
            debug!(target = %target, "target already installed");
            return Ok(TargetStatus::AlreadyInstalled);
        }

        info!(target = %target, "installing missing target");
        let command = format!("{} {}", self.commands.install_target, target);
        self.invoker
            .run(self.working_dir, &command)
            .map_err(|source| TargetInstallError::Install {
                target: target.to_string(),
                source,
            })?;
        Ok(TargetStatus::Installed)
    }
}

/// Accepts `rustup target list --installed` output (one triple per line) as
/// well as the full listing, where only entries marked `(installed)` count.
pub fn parse_installed_targets(listing: &str) -> Vec<String> {
    let marked = listing.contains("(installed)");
    listing
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let triple = parts.next()?;
            match (marked, parts.next()) {
                (false, None) | (true, Some("(installed)")) => Some(triple.to_string()),
                _ => None,
            }
        })
        .collect()
}
