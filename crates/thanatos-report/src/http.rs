use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use thanatos_build::{BuildStepReporter, ReportingError};
use thanatos_core::BuildStepUpdate;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts each build step as JSON to the controlling system's status endpoint.
pub struct HttpStepReporter {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpStepReporter {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("thanatos-builder")
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Body the status API may answer with; an explicit `success: false` is a
/// rejected update even on a 2xx status.
#[derive(Debug, Default, Deserialize)]
struct StepResponse {
    success: Option<bool>,
    error: Option<String>,
}

impl BuildStepReporter for HttpStepReporter {
    fn report(&self, update: &BuildStepUpdate) -> Result<(), ReportingError> {
        let mut request = self.client.post(&self.endpoint).json(update);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .map_err(|err| ReportingError::new(update, format!("request failed: {}", err)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReportingError::new(
                update,
                format!("status endpoint returned {}", status),
            ));
        }

        let body = response
            .text()
            .map_err(|err| ReportingError::new(update, format!("failed to read response: {}", err)))?;
        let parsed: StepResponse = if body.trim().is_empty() {
            StepResponse::default()
        } else {
            serde_json::from_str(&body).unwrap_or_default()
        };
        if parsed.success == Some(false) {
            return Err(ReportingError::new(
                update,
                parsed
                    .error
                    .unwrap_or_else(|| "status endpoint rejected the update".to_string()),
            ));
        }

        debug!(step = %update.step_name, endpoint = %self.endpoint, "reported build step");
        Ok(())
    }
}
