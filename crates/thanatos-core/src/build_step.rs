use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier the controlling system assigns to one payload build.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(String);

impl BuildId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reportable stages of a payload build, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuildStage {
    ResolveProfile,
    InstallTarget,
    Compile,
    Locate,
}

impl BuildStage {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildStage::ResolveProfile => "resolve-profile",
            BuildStage::InstallTarget => "install-target",
            BuildStage::Compile => "compile",
            BuildStage::Locate => "locate",
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStepUpdate {
    pub build_id: BuildId,
    pub step_name: String,
    pub success: bool,
    pub message: String,
}

impl BuildStepUpdate {
    pub fn succeeded(build_id: &BuildId, stage: BuildStage, message: impl Into<String>) -> Self {
        Self {
            build_id: build_id.clone(),
            step_name: stage.as_str().to_string(),
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(build_id: &BuildId, stage: BuildStage, message: impl Into<String>) -> Self {
        Self {
            build_id: build_id.clone(),
            step_name: stage.as_str().to_string(),
            success: false,
            message: message.into(),
        }
    }
}
