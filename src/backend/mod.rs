//! Backend capability contracts and the registry that selects an implementation
//! for a job interface or policy component.
//!
//! The gateway never talks to job trackers, the policy service or the
//! metastore directly; it only needs the capability sets below. Concrete
//! clients are registered per variant, either the HTTP bridge from
//! [`remote`] or anything else implementing the traits (tests register
//! in-memory doubles).

pub mod remote;
pub mod solr;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::BackendsConfig;
use crate::types::{Component, JobInterface, PrivilegeRecord};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{0}")]
    Failed(String),

    #[error("No backend configured for {0}")]
    NotConfigured(String),

    #[error("Backend request failed: {0}")]
    Transport(String),

    #[error("Backend returned malformed data: {0}")]
    Malformed(String),
}

impl BackendError {
    pub fn failed(message: impl Into<String>) -> Self {
        BackendError::Failed(message.into())
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Result of a job listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppList {
    #[serde(default)]
    pub apps: Vec<Value>,
    #[serde(default)]
    pub total: Option<Value>,
}

/// Profile data is either JSON or a ready-made document passed through untouched
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileOutput {
    Json(Value),
    Raw { content_type: String, body: Vec<u8> },
}

/// Privileges attached to one authorizable, keyed by role name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizablePrivileges {
    pub authorizable: Value,
    pub roles: BTreeMap<String, Vec<Map<String, Value>>>,
}

#[async_trait]
pub trait JobApi: Send + Sync {
    async fn apps(&self, filters: &Map<String, Value>) -> BackendResult<AppList>;

    async fn app(&self, app_id: &str, offset: Option<i64>) -> BackendResult<Value>;

    async fn action(
        &self,
        app_ids: &[String],
        operation: &Value,
    ) -> BackendResult<Map<String, Value>>;

    async fn logs(
        &self,
        app_id: &str,
        app_type: &str,
        log_name: &str,
        is_embeddable: bool,
    ) -> BackendResult<Value>;

    async fn profile(
        &self,
        app_id: &str,
        app_type: &str,
        app_property: &str,
        app_filters: &Map<String, Value>,
    ) -> BackendResult<ProfileOutput>;
}

#[async_trait]
pub trait SentryApi: Send + Sync {
    async fn list_sentry_roles_by_group(&self, group_name: Option<&str>) -> BackendResult<Vec<Value>>;

    async fn list_sentry_privileges_by_role(
        &self,
        service_name: &str,
        role_name: &str,
    ) -> BackendResult<Vec<Value>>;

    async fn create_sentry_role(&self, role_name: &str) -> BackendResult<()>;

    async fn drop_sentry_role(&self, role_name: &str) -> BackendResult<()>;

    async fn alter_sentry_role_grant_privilege(
        &self,
        role_name: &str,
        privilege: &PrivilegeRecord,
    ) -> BackendResult<()>;

    async fn alter_sentry_role_revoke_privilege(
        &self,
        role_name: &str,
        privilege: &PrivilegeRecord,
    ) -> BackendResult<()>;

    async fn alter_sentry_role_add_groups(&self, role_name: &str, groups: &[String]) -> BackendResult<()>;

    async fn alter_sentry_role_delete_groups(&self, role_name: &str, groups: &[String]) -> BackendResult<()>;

    async fn list_sentry_privileges_by_authorizable(
        &self,
        authorizable_set: &[Value],
        groups: Option<&[String]>,
    ) -> BackendResult<Vec<AuthorizablePrivileges>>;

    async fn drop_sentry_privileges(&self, authorizable_hierarchy: &Map<String, Value>) -> BackendResult<()>;

    async fn rename_sentry_privilege(
        &self,
        old_authorizable: &Value,
        new_authorizable: &Value,
    ) -> BackendResult<()>;

    async fn list_sentry_privileges_for_provider(
        &self,
        groups: &Value,
        role_set: &Value,
        authorizable_hierarchy: &Value,
    ) -> BackendResult<Value>;
}

/// Collection listing of the indexing service
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn collections(&self, user: &str) -> BackendResult<Vec<String>>;
}

/// Database/table browsing of the metastore
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn autocomplete(
        &self,
        user: &str,
        database: Option<&str>,
        table: Option<&str>,
    ) -> BackendResult<Value>;
}

/// Identifies which job backend to construct for a request
#[derive(Debug, Clone)]
pub struct BackendSelector {
    pub user: String,
    pub interface: JobInterface,
    pub cluster: Value,
}

pub type JobApiFactory =
    Arc<dyn Fn(&BackendSelector) -> BackendResult<Arc<dyn JobApi>> + Send + Sync>;
pub type SentryApiFactory =
    Arc<dyn Fn(&str, Component) -> BackendResult<Arc<dyn SentryApi>> + Send + Sync>;

/// Lookup table from backend variant to constructor
#[derive(Clone, Default)]
pub struct Backends {
    jobs: HashMap<JobInterface, JobApiFactory>,
    sentry: HashMap<Component, SentryApiFactory>,
    search: Option<Arc<dyn SearchApi>>,
    catalog: Option<Arc<dyn CatalogApi>>,
}

impl Backends {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the HTTP bridge for every family with a configured URL
    pub fn from_config(config: &BackendsConfig, client: reqwest::Client) -> BackendResult<Self> {
        let mut backends = Self::new();

        if let Some(url) = &config.job_api_url {
            let bridge = Arc::new(remote::RemoteBridge::new(client.clone(), url)?);
            for interface in JobInterface::ALL {
                let bridge = bridge.clone();
                backends = backends.with_job_api(interface, move |selector| {
                    Ok(Arc::new(remote::RemoteJobApi::new(bridge.clone(), selector.clone())) as Arc<dyn JobApi>)
                });
            }
        }

        if let Some(url) = &config.sentry_api_url {
            let bridge = Arc::new(remote::RemoteBridge::new(client.clone(), url)?);
            for component in Component::ALL {
                let bridge = bridge.clone();
                backends = backends.with_sentry_api(component, move |user, component| {
                    Ok(Arc::new(remote::RemoteSentryApi::new(bridge.clone(), user, component))
                        as Arc<dyn SentryApi>)
                });
            }
        }

        if let Some(url) = &config.catalog_api_url {
            let bridge = Arc::new(remote::RemoteBridge::new(client.clone(), url)?);
            backends = backends.with_catalog_api(Arc::new(remote::RemoteCatalogApi::new(bridge)));
        }

        if let Some(url) = &config.solr_url {
            backends = backends.with_search_api(Arc::new(solr::SolrClient::new(client, url)?));
        }

        Ok(backends)
    }

    pub fn with_job_api<F>(mut self, interface: JobInterface, factory: F) -> Self
    where
        F: Fn(&BackendSelector) -> BackendResult<Arc<dyn JobApi>> + Send + Sync + 'static,
    {
        self.jobs.insert(interface, Arc::new(factory));
        self
    }

    pub fn with_sentry_api<F>(mut self, component: Component, factory: F) -> Self
    where
        F: Fn(&str, Component) -> BackendResult<Arc<dyn SentryApi>> + Send + Sync + 'static,
    {
        self.sentry.insert(component, Arc::new(factory));
        self
    }

    pub fn with_search_api(mut self, api: Arc<dyn SearchApi>) -> Self {
        self.search = Some(api);
        self
    }

    pub fn with_catalog_api(mut self, api: Arc<dyn CatalogApi>) -> Self {
        self.catalog = Some(api);
        self
    }

    pub fn job_api(&self, selector: &BackendSelector) -> BackendResult<Arc<dyn JobApi>> {
        let factory = self
            .jobs
            .get(&selector.interface)
            .ok_or_else(|| BackendError::NotConfigured(format!("interface {}", selector.interface)))?;
        factory(selector)
    }

    pub fn sentry_api(&self, user: &str, component: Component) -> BackendResult<Arc<dyn SentryApi>> {
        let factory = self
            .sentry
            .get(&component)
            .ok_or_else(|| BackendError::NotConfigured(format!("component {}", component)))?;
        factory(user, component)
    }

    pub fn search_api(&self) -> BackendResult<Arc<dyn SearchApi>> {
        self.search
            .clone()
            .ok_or_else(|| BackendError::NotConfigured("the search index".to_string()))
    }

    pub fn catalog_api(&self) -> BackendResult<Arc<dyn CatalogApi>> {
        self.catalog
            .clone()
            .ok_or_else(|| BackendError::NotConfigured("the metastore catalog".to_string()))
    }

    pub fn job_interfaces(&self) -> Vec<JobInterface> {
        JobInterface::ALL
            .into_iter()
            .filter(|interface| self.jobs.contains_key(interface))
            .collect()
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends")
            .field("jobs", &self.job_interfaces())
            .field("sentry", &self.sentry.keys().collect::<Vec<_>>())
            .field("search", &self.search.is_some())
            .field("catalog", &self.catalog.is_some())
            .finish()
    }
}
