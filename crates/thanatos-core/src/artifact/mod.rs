pub mod digest;
pub mod layout;
pub mod naming;

pub use digest::{sha256_hex, ArtifactDigest};
pub use layout::{artifact_path, release_dir, RELEASE_PROFILE_DIR, TARGET_DIR_NAME};
pub use naming::{artifact_filename, ArtifactKind};
