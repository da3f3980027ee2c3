use crate::platform::{SelectedOs, UnsupportedPlatformError};
use crate::request::{C2Profile, OutputFormat};
use crate::AGENT_NAME;

/// Cargo target kind the agent crate emits for each output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    Binary,
    Cdylib,
}

impl ArtifactKind {
    pub fn for_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Executable => ArtifactKind::Binary,
            OutputFormat::SharedLibrary => ArtifactKind::Cdylib,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Binary => "binary",
            ArtifactKind::Cdylib => "cdylib",
        }
    }
}

/// File name cargo gives the agent artifact for a profile/OS/format triple.
pub fn artifact_filename(
    profile: C2Profile,
    os: &SelectedOs,
    format: OutputFormat,
) -> Result<String, UnsupportedPlatformError> {
    let stem = format!(
        "{}_{}_{}",
        AGENT_NAME,
        profile.name(),
        ArtifactKind::for_format(format).suffix()
    );
    match (os, format) {
        (SelectedOs::Linux, OutputFormat::Executable) => Ok(stem),
        (SelectedOs::Linux, OutputFormat::SharedLibrary) => Ok(format!("lib{}.so", stem)),
        (SelectedOs::Windows, OutputFormat::Executable) => Ok(format!("{}.exe", stem)),
        (SelectedOs::Windows, OutputFormat::SharedLibrary) => Ok(format!("{}.dll", stem)),
        (SelectedOs::Unrecognized(value), _) => Err(UnsupportedPlatformError::Os(value.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_filenames_match_cargo_output() {
        let cases = [
            (SelectedOs::Linux, OutputFormat::Executable, "thanatos_http_binary"),
            (SelectedOs::Linux, OutputFormat::SharedLibrary, "libthanatos_http_cdylib.so"),
            (SelectedOs::Windows, OutputFormat::Executable, "thanatos_http_binary.exe"),
            (SelectedOs::Windows, OutputFormat::SharedLibrary, "thanatos_http_cdylib.dll"),
        ];
        for (os, format, expected) in cases {
            let name = artifact_filename(C2Profile::Http, &os, format).expect("name");
            assert_eq!(name, expected);
        }
    }

    #[test]
    fn unrecognized_os_is_rejected_for_every_format() {
        let os = SelectedOs::from("macOS");
        for format in [OutputFormat::Executable, OutputFormat::SharedLibrary] {
            let result = artifact_filename(C2Profile::Http, &os, format);
            assert_eq!(result, Err(UnsupportedPlatformError::Os("macOS".to_string())));
        }
    }
}
