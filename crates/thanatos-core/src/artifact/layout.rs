use std::path::{Path, PathBuf};

use crate::platform::{validate_target_triple, UnsupportedPlatformError};
use crate::request::{BuildRequest, C2Profile};

use super::naming::artifact_filename;

pub const TARGET_DIR_NAME: &str = "target";
pub const RELEASE_PROFILE_DIR: &str = "release";

/// `<agent_code_root>/target/<triple>/release`, the directory cargo writes
/// cross-compiled release artifacts into.
pub fn release_dir(agent_code_root: &Path, target_triple: &str) -> PathBuf {
    agent_code_root
        .join(TARGET_DIR_NAME)
        .join(target_triple)
        .join(RELEASE_PROFILE_DIR)
}

pub fn artifact_path(
    agent_code_root: &Path,
    request: &BuildRequest,
    profile: C2Profile,
) -> Result<PathBuf, UnsupportedPlatformError> {
    validate_target_triple(&request.target_triple)?;
    let filename = artifact_filename(profile, &request.selected_os, request.output_format)?;
    Ok(release_dir(agent_code_root, &request.target_triple).join(filename))
}
