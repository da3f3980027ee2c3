use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Operating system the payload is built for, as selected by the operator.
///
/// Values the builder does not know how to name artifacts for are kept
/// verbatim so they can be reported instead of being silently dropped.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SelectedOs {
    Linux,
    Windows,
    Unrecognized(String),
}

impl SelectedOs {
    pub fn as_str(&self) -> &str {
        match self {
            SelectedOs::Linux => "Linux",
            SelectedOs::Windows => "Windows",
            SelectedOs::Unrecognized(value) => value,
        }
    }
}

impl fmt::Display for SelectedOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SelectedOs {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("linux") {
            SelectedOs::Linux
        } else if trimmed.eq_ignore_ascii_case("windows") {
            SelectedOs::Windows
        } else {
            SelectedOs::Unrecognized(trimmed.to_string())
        }
    }
}

impl Serialize for SelectedOs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SelectedOs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(SelectedOs::from(value.as_str()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    #[default]
    #[serde(alias = "amd64", alias = "x64")]
    X86_64,
    #[serde(alias = "i686")]
    X86,
}

impl Architecture {
    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::X86 => "x86",
        }
    }

    fn triple_prefix(self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::X86 => "i686",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UnsupportedPlatformError {
    #[error("unsupported OS '{0}'; expected Linux or Windows")]
    Os(String),
    #[error("invalid target triple '{0}'")]
    InvalidTriple(String),
}

/// Toolchain triple used when the request does not name one.
///
/// Windows payloads are cross-compiled with the GNU toolchain so the builder
/// container does not need the MSVC linker.
pub fn default_target_triple(
    os: &SelectedOs,
    arch: Architecture,
) -> Result<String, UnsupportedPlatformError> {
    let suffix = match os {
        SelectedOs::Linux => "unknown-linux-gnu",
        SelectedOs::Windows => "pc-windows-gnu",
        SelectedOs::Unrecognized(value) => {
            return Err(UnsupportedPlatformError::Os(value.clone()))
        }
    };
    Ok(format!("{}-{}", arch.triple_prefix(), suffix))
}

/// A triple is spliced into shell commands and into
/// `target/<triple>/release`, so it must be one token that starts with an
/// ASCII letter or digit: no separators, no shell syntax, no `.`/`..`.
pub fn validate_target_triple(value: &str) -> Result<(), UnsupportedPlatformError> {
    let starts_alphanumeric = value
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_alphanumeric());
    let allowed = value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.');
    if starts_alphanumeric && allowed {
        Ok(())
    } else {
        Err(UnsupportedPlatformError::InvalidTriple(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_names_parse_case_insensitively() {
        assert_eq!(SelectedOs::from("Linux"), SelectedOs::Linux);
        assert_eq!(SelectedOs::from("windows"), SelectedOs::Windows);
        assert_eq!(
            SelectedOs::from("macOS"),
            SelectedOs::Unrecognized("macOS".to_string())
        );
    }

    #[test]
    fn default_triples_follow_os_and_arch() {
        let cases = [
            (SelectedOs::Linux, Architecture::X86_64, "x86_64-unknown-linux-gnu"),
            (SelectedOs::Linux, Architecture::X86, "i686-unknown-linux-gnu"),
            (SelectedOs::Windows, Architecture::X86_64, "x86_64-pc-windows-gnu"),
            (SelectedOs::Windows, Architecture::X86, "i686-pc-windows-gnu"),
        ];
        for (os, arch, expected) in cases {
            assert_eq!(default_target_triple(&os, arch).expect("triple"), expected);
        }
    }

    #[test]
    fn unrecognized_os_has_no_default_triple() {
        let os = SelectedOs::from("macOS");
        let error = default_target_triple(&os, Architecture::X86_64).expect_err("error");
        assert_eq!(error, UnsupportedPlatformError::Os("macOS".to_string()));
    }

    #[test]
    fn known_triples_are_valid() {
        for triple in [
            "x86_64-unknown-linux-gnu",
            "i686-pc-windows-gnu",
            "thumbv7em-none-eabihf",
            "x86_64-unknown-linux-gnu.json",
        ] {
            assert_eq!(validate_target_triple(triple), Ok(()));
        }
    }

    #[test]
    fn path_and_shell_tokens_are_not_triples() {
        for triple in ["", ".", "..", "../x86_64", "-x86_64", "x86_64;id", "x86 64", "a/b"] {
            assert_eq!(
                validate_target_triple(triple),
                Err(UnsupportedPlatformError::InvalidTriple(triple.to_string()))
            );
        }
    }
}
