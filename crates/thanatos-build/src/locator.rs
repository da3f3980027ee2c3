use std::path::{Path, PathBuf};

use thanatos_core::artifact::{artifact_path, ArtifactDigest};
use thanatos_core::{BuildRequest, C2Profile, UnsupportedPlatformError};
use thiserror::Error;
use tracing::info;

/// The compile reported success but nothing readable sits where the
/// toolchain should have written the payload.
#[derive(Debug, Error)]
#[error("built payload not found at '{}': {source}", path.display())]
pub struct ArtifactNotFoundError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Clone, Debug)]
pub struct ArtifactLocator {
    agent_code_root: PathBuf,
}

impl ArtifactLocator {
    pub fn new(agent_code_root: impl Into<PathBuf>) -> Self {
        Self {
            agent_code_root: agent_code_root.into(),
        }
    }

    pub fn agent_code_root(&self) -> &Path {
        &self.agent_code_root
    }

    pub fn locate(
        &self,
        request: &BuildRequest,
        profile: C2Profile,
    ) -> Result<PathBuf, UnsupportedPlatformError> {
        artifact_path(&self.agent_code_root, request, profile)
    }
}

pub fn read_artifact(path: &Path) -> Result<Vec<u8>, ArtifactNotFoundError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactNotFoundError {
        path: path.to_path_buf(),
        source,
    })?;
    let digest = ArtifactDigest::of(&bytes);
    info!(
        path = %path.display(),
        size = digest.size,
        sha256 = %digest.sha256,
        "read built payload"
    );
    Ok(bytes)
}
