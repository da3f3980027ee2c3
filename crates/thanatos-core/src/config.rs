use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "thanatos-builder.yaml";
pub const DEFAULT_AGENT_CODE_PATH: &str = "../agent";
pub const DEFAULT_LIST_TARGETS_COMMAND: &str = "rustup target list --installed";
pub const DEFAULT_INSTALL_TARGET_COMMAND: &str = "rustup target add";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("config field '{field}' must not be empty")]
    EmptyField { field: &'static str },
    #[error("failed to get the current working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuilderConfigFile {
    agent_code_path: Option<String>,
    shell: Option<String>,
    shell_args: Option<Vec<String>>,
    install_targets: Option<bool>,
    list_targets_command: Option<String>,
    install_target_command: Option<String>,
    reporter: Option<ReporterConfigFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReporterConfigFile {
    endpoint: Option<String>,
    token_env: Option<String>,
}

/// Shell used to run toolchain commands, e.g. `/bin/bash -c <command>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShellSettings {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ShellSettings {
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                program: "cmd".to_string(),
                args: vec!["/C".to_string()],
            }
        } else {
            Self {
                program: "/bin/bash".to_string(),
                args: vec!["-c".to_string()],
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolchainCommands {
    pub list_targets: String,
    pub install_target: String,
}

impl Default for ToolchainCommands {
    fn default() -> Self {
        Self {
            list_targets: DEFAULT_LIST_TARGETS_COMMAND.to_string(),
            install_target: DEFAULT_INSTALL_TARGET_COMMAND.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReporterSettings {
    pub endpoint: Option<String>,
    pub token_env: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuilderConfig {
    pub agent_code_path: PathBuf,
    pub shell: ShellSettings,
    pub install_targets: bool,
    pub toolchain: ToolchainCommands,
    pub reporter: ReporterSettings,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            agent_code_path: PathBuf::from(DEFAULT_AGENT_CODE_PATH),
            shell: ShellSettings::default(),
            install_targets: true,
            toolchain: ToolchainCommands::default(),
            reporter: ReporterSettings::default(),
        }
    }
}

impl BuilderConfig {
    /// Agent source root, resolved against the process working directory
    /// when `agent_code_path` is relative.
    pub fn agent_code_root(&self) -> Result<PathBuf, ConfigError> {
        if self.agent_code_path.is_absolute() {
            return Ok(self.agent_code_path.clone());
        }
        let cwd = std::env::current_dir().map_err(ConfigError::WorkingDirectory)?;
        Ok(self.agent_code_root_from(&cwd))
    }

    pub fn agent_code_root_from(&self, base: &Path) -> PathBuf {
        if self.agent_code_path.is_absolute() {
            self.agent_code_path.clone()
        } else {
            base.join(&self.agent_code_path)
        }
    }
}

/// Loads the builder config; a missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<BuilderConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no builder config, using defaults");
        return Ok(BuilderConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<BuilderConfig, ConfigError> {
    if contents.trim().is_empty() {
        return Ok(BuilderConfig::default());
    }
    let file: BuilderConfigFile = serde_yaml::from_str(contents)?;
    let defaults = BuilderConfig::default();

    let agent_code_path = match file.agent_code_path {
        Some(value) => PathBuf::from(non_empty("agent_code_path", value)?),
        None => defaults.agent_code_path,
    };
    let shell = match file.shell {
        Some(program) => ShellSettings {
            program: non_empty("shell", program)?,
            args: file.shell_args.unwrap_or(defaults.shell.args),
        },
        None => ShellSettings {
            args: file.shell_args.unwrap_or(defaults.shell.args),
            ..defaults.shell
        },
    };
    let toolchain = ToolchainCommands {
        list_targets: match file.list_targets_command {
            Some(value) => non_empty("list_targets_command", value)?,
            None => defaults.toolchain.list_targets,
        },
        install_target: match file.install_target_command {
            Some(value) => non_empty("install_target_command", value)?,
            None => defaults.toolchain.install_target,
        },
    };
    let reporter = file
        .reporter
        .map(|reporter| ReporterSettings {
            endpoint: reporter.endpoint.filter(|value| !value.trim().is_empty()),
            token_env: reporter.token_env.filter(|value| !value.trim().is_empty()),
        })
        .unwrap_or_default();

    Ok(BuilderConfig {
        agent_code_path,
        shell,
        install_targets: file.install_targets.unwrap_or(defaults.install_targets),
        toolchain,
        reporter,
    })
}

fn non_empty(field: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyField { field });
    }
    Ok(value)
}
