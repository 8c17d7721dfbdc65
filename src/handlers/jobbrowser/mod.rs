// handlers/jobbrowser/mod.rs - Job browser endpoints (/jobbrowser/api/*)
//
// Form fields are JSON-encoded. The interface comes from the path segment
// when the route has one, otherwise from the `interface` field.

pub mod action;
pub mod job;
pub mod jobs;
pub mod logs;
pub mod profile;
pub mod query_store;

pub use action::post as action;
pub use job::post as job;
pub use jobs::post as jobs;
pub use logs::post as logs;
pub use profile::post as profile;
pub use query_store::{download_bundle, query_proxy};

use serde_json::{Map, Value};

use crate::backend::BackendSelector;
use crate::error::GatewayError;
use crate::middleware::RequestUser;
use crate::params::RequestParams;
use crate::types::JobInterface;

pub(crate) fn resolve_interface(
    interface: Option<String>,
    params: &RequestParams,
) -> Result<JobInterface, GatewayError> {
    match interface {
        Some(name) => name.parse(),
        None => params.json::<String>("interface")?.parse(),
    }
}

pub(crate) fn selector(
    user: &RequestUser,
    interface: JobInterface,
    params: &RequestParams,
) -> Result<BackendSelector, GatewayError> {
    Ok(BackendSelector {
        user: user.name.clone(),
        interface,
        cluster: params.json_or("cluster", Value::Object(Map::new()))?,
    })
}
