use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::{
    default_target_triple, validate_target_triple, Architecture, SelectedOs,
    UnsupportedPlatformError,
};

/// Communication profile compiled into the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum C2Profile {
    Http,
}

impl C2Profile {
    pub const ALL: &'static [C2Profile] = &[C2Profile::Http];

    pub fn name(self) -> &'static str {
        match self {
            C2Profile::Http => "http",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|profile| profile.name().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for C2Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProfileResolutionError {
    #[error("no C2 profile selected for the payload")]
    NoneSelected,
    #[error("C2 profile '{0}' is not supported by this agent")]
    Unsupported(String),
    #[error("exactly one C2 profile must be selected, found {}", .0.join(", "))]
    Ambiguous(Vec<String>),
}

/// Profile names the operator selected for a payload.
///
/// An empty selection is a valid value here; it only becomes an error when
/// [`ProfileSelection::resolve`] is asked for the single profile to build.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileSelection(Vec<String>);

impl ProfileSelection {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(profile: C2Profile) -> Self {
        Self(vec![profile.name().to_string()])
    }

    pub fn resolve(&self) -> Result<C2Profile, ProfileResolutionError> {
        let mut resolved: Vec<C2Profile> = Vec::new();
        for name in &self.0 {
            let profile = C2Profile::from_name(name)
                .ok_or_else(|| ProfileResolutionError::Unsupported(name.clone()))?;
            if !resolved.contains(&profile) {
                resolved.push(profile);
            }
        }
        match resolved.as_slice() {
            [] => Err(ProfileResolutionError::NoneSelected),
            [profile] => Ok(*profile),
            many => Err(ProfileResolutionError::Ambiguous(
                many.iter().map(|profile| profile.name().to_string()).collect(),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[serde(alias = "Executable")]
    Executable,
    #[serde(alias = "Shared Library", alias = "shared library", alias = "cdylib")]
    SharedLibrary,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            OutputFormat::Executable => "executable",
            OutputFormat::SharedLibrary => "shared library",
        };
        f.write_str(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildRequest {
    pub target_triple: String,
    pub profiles: ProfileSelection,
    pub output_format: OutputFormat,
    pub selected_os: SelectedOs,
    pub build_command: String,
}

impl BuildRequest {
    /// Request that runs the default release build for `target_triple`.
    pub fn with_default_command(
        target_triple: impl Into<String>,
        profiles: ProfileSelection,
        output_format: OutputFormat,
        selected_os: SelectedOs,
    ) -> Self {
        let target_triple = target_triple.into();
        let build_command = default_build_command(&target_triple);
        Self {
            target_triple,
            profiles,
            output_format,
            selected_os,
            build_command,
        }
    }
}

pub fn default_build_command(target_triple: &str) -> String {
    format!("cargo build --release --target {}", target_triple)
}

/// Wire form of a build request handed over by the payload-parameter layer.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequestSpec {
    #[serde(default)]
    pub target_triple: Option<String>,
    #[serde(default)]
    pub architecture: Option<Architecture>,
    #[serde(default)]
    pub profiles: ProfileSelection,
    pub output_format: OutputFormat,
    #[serde(rename = "selectedOS", alias = "selectedOs")]
    pub selected_os: SelectedOs,
    #[serde(default)]
    pub build_command: Option<String>,
}

impl BuildRequestSpec {
    pub fn into_request(self) -> Result<BuildRequest, UnsupportedPlatformError> {
        let target_triple = match self.target_triple.filter(|value| !value.trim().is_empty()) {
            Some(value) => value.trim().to_string(),
            None => default_target_triple(&self.selected_os, self.architecture.unwrap_or_default())?,
        };
        validate_target_triple(&target_triple)?;
        let build_command = self
            .build_command
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| default_build_command(&target_triple));
        Ok(BuildRequest {
            target_triple,
            profiles: self.profiles,
            output_format: self.output_format,
            selected_os: self.selected_os,
            build_command,
        })
    }
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to parse build request: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Platform(#[from] UnsupportedPlatformError),
}

pub fn parse_request_json(contents: &str) -> Result<BuildRequest, RequestError> {
    let spec: BuildRequestSpec = serde_json::from_str(contents)?;
    Ok(spec.into_request()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_http_selection_resolves() {
        let selection = ProfileSelection::new(["http"]);
        assert_eq!(selection.resolve(), Ok(C2Profile::Http));
    }

    #[test]
    fn empty_selection_never_defaults() {
        let selection = ProfileSelection::none();
        assert_eq!(selection.resolve(), Err(ProfileResolutionError::NoneSelected));
    }

    #[test]
    fn unknown_profile_is_reported_by_name() {
        let selection = ProfileSelection::new(["http", "smb"]);
        assert_eq!(
            selection.resolve(),
            Err(ProfileResolutionError::Unsupported("smb".to_string()))
        );
    }

    #[test]
    fn repeated_profile_counts_once() {
        let selection = ProfileSelection::new(["http", "HTTP"]);
        assert_eq!(selection.resolve(), Ok(C2Profile::Http));
    }

    #[test]
    fn request_json_fills_defaults() {
        let request = parse_request_json(
            r#"{"profiles":["http"],"outputFormat":"executable","selectedOS":"Linux"}"#,
        )
        .expect("request");
        assert_eq!(request.target_triple, "x86_64-unknown-linux-gnu");
        assert_eq!(
            request.build_command,
            "cargo build --release --target x86_64-unknown-linux-gnu"
        );
        assert_eq!(request.output_format, OutputFormat::Executable);
    }

    #[test]
    fn request_json_keeps_explicit_values() {
        let request = parse_request_json(
            r#"{
                "targetTriple": "i686-pc-windows-gnu",
                "profiles": ["http"],
                "outputFormat": "shared_library",
                "selectedOS": "Windows",
                "buildCommand": "make windows"
            }"#,
        )
        .expect("request");
        assert_eq!(request.target_triple, "i686-pc-windows-gnu");
        assert_eq!(request.build_command, "make windows");
        assert_eq!(request.selected_os, SelectedOs::Windows);
        assert_eq!(request.output_format, OutputFormat::SharedLibrary);
    }

    #[test]
    fn unknown_os_without_triple_is_rejected() {
        let error = parse_request_json(
            r#"{"profiles":["http"],"outputFormat":"executable","selectedOS":"macOS"}"#,
        )
        .expect_err("error");
        assert!(matches!(error, RequestError::Platform(_)));
    }

    #[test]
    fn dot_only_triple_is_rejected() {
        let error = parse_request_json(
            r#"{"targetTriple":"..","profiles":["http"],"outputFormat":"executable","selectedOS":"Linux"}"#,
        )
        .expect_err("error");
        assert!(matches!(
            error,
            RequestError::Platform(UnsupportedPlatformError::InvalidTriple(ref value)) if value == ".."
        ));
    }

    #[test]
    fn shell_syntax_in_triple_never_reaches_default_command() {
        let error = parse_request_json(
            r#"{"targetTriple":"x86_64-unknown-linux-gnu; id","profiles":["http"],"outputFormat":"executable","selectedOS":"Linux"}"#,
        )
        .expect_err("error");
        assert!(matches!(
            error,
            RequestError::Platform(UnsupportedPlatformError::InvalidTriple(_))
        ));
    }
}
