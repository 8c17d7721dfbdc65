use std::sync::Arc;

use serde_json::{Map, Value};

use crate::api::envelope::Envelope;
use crate::backend::{AppList, BackendSelector, Backends, JobApi, ProfileOutput};
use crate::config::JobBrowserConfig;
use crate::error::GatewayError;
use crate::types::{is_truthy, JobInterface};

/// Outcome of a single job lookup
#[derive(Debug, Clone, PartialEq)]
pub enum AppLookup {
    Found(Value),
    /// The backend answered with its own `{status: -1, message}` document
    Failed(Map<String, Value>),
}

/// Job-browser operations over the registered job backends
pub struct JobService<'a> {
    backends: &'a Backends,
    disable_killing_jobs: bool,
}

impl<'a> JobService<'a> {
    pub fn new(backends: &'a Backends, config: &JobBrowserConfig) -> Self {
        Self {
            backends,
            disable_killing_jobs: config.disable_killing_jobs,
        }
    }

    fn api(&self, selector: &BackendSelector) -> Result<Arc<dyn JobApi>, GatewayError> {
        Ok(self.backends.job_api(selector)?)
    }

    pub async fn apps(
        &self,
        selector: &BackendSelector,
        filters: &Map<String, Value>,
    ) -> Result<AppList, GatewayError> {
        tracing::debug!(interface = %selector.interface, filters = filters.len(), "listing apps");
        Ok(self.api(selector)?.apps(filters).await?)
    }

    /// Fetch one app. `offset` is only forwarded for schedules, defaulting to 1.
    pub async fn app(
        &self,
        selector: &BackendSelector,
        app_id: &str,
        offset: Option<i64>,
    ) -> Result<AppLookup, GatewayError> {
        let offset = match selector.interface {
            JobInterface::Schedules => Some(offset.unwrap_or(1)),
            _ => None,
        };

        let app = self.api(selector)?.app(app_id, offset).await?;
        Ok(classify_app(app))
    }

    /// Refuse kills while killing is disabled
    pub fn check_action(&self, operation: &Value) -> Result<(), GatewayError> {
        let action = operation.get("action").and_then(Value::as_str).unwrap_or_default();
        if action == "kill" && self.disable_killing_jobs {
            return Err(GatewayError::forbidden("Killing jobs is disabled"));
        }
        Ok(())
    }

    /// Run an action on a set of apps. Kills are refused before any backend
    /// is constructed when killing is disabled.
    pub async fn action(
        &self,
        selector: &BackendSelector,
        app_ids: &[String],
        operation: Value,
    ) -> Result<Envelope, GatewayError> {
        self.check_action(&operation)?;
        let action = operation.get("action").and_then(Value::as_str).unwrap_or_default();

        tracing::info!(interface = %selector.interface, action, apps = app_ids.len(), "running job action");
        let result = self.api(selector)?.action(app_ids, &operation).await?;
        Ok(action_envelope(operation, result))
    }

    pub async fn logs(
        &self,
        selector: &BackendSelector,
        app_id: &str,
        app_type: &str,
        log_name: &str,
        is_embeddable: bool,
    ) -> Result<Value, GatewayError> {
        Ok(self
            .api(selector)?
            .logs(app_id, app_type, log_name, is_embeddable)
            .await?)
    }

    pub async fn profile(
        &self,
        selector: &BackendSelector,
        app_id: &str,
        app_type: &str,
        app_property: &str,
        app_filters: &Map<String, Value>,
    ) -> Result<ProfileOutput, GatewayError> {
        Ok(self
            .api(selector)?
            .profile(app_id, app_type, app_property, app_filters)
            .await?)
    }
}

fn classify_app(app: Value) -> AppLookup {
    let failed = app.get("status").and_then(Value::as_i64) == Some(Envelope::FAILURE as i64)
        && app.get("message").map(is_truthy).unwrap_or(false);
    match app {
        Value::Object(doc) if failed => AppLookup::Failed(doc),
        other => AppLookup::Found(other),
    }
}

/// Merge an action result into an envelope. The backend decides the status
/// (absent means failure); `operation` is echoed back.
fn action_envelope(operation: Value, mut result: Map<String, Value>) -> Envelope {
    let status = result
        .remove("status")
        .and_then(|s| s.as_i64())
        .unwrap_or(Envelope::FAILURE as i64);
    let message = result
        .remove("message")
        .map(|m| match m {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .filter(|m| !m.is_empty());

    let mut envelope = if status == Envelope::SUCCESS as i64 {
        Envelope::success()
    } else {
        Envelope::failure(message.unwrap_or_else(|| "Action failed".to_string()))
    };
    envelope = envelope.with("operation", operation);
    envelope.payload.extend(result);
    envelope
}
