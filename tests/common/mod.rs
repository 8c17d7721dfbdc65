#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use hue_gateway::backend::{
    AppList, AuthorizablePrivileges, BackendError, BackendResult, BackendSelector, CatalogApi, JobApi,
    ProfileOutput, SearchApi, SentryApi,
};
use hue_gateway::config::GatewayConfig;
use hue_gateway::types::{Component, JobInterface, PrivilegeRecord};
use hue_gateway::{app, AppState, Backends};

pub const ALICE: &str = "alice";

/// Backend calls seen by the test doubles, in order
#[derive(Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<(String, Value)>>>);

impl Calls {
    pub fn record(&self, operation: &str, args: Value) {
        self.0.lock().unwrap().push((operation.to_string(), args));
    }

    pub fn all(&self) -> Vec<(String, Value)> {
        self.0.lock().unwrap().clone()
    }

    pub fn named(&self, operation: &str) -> Vec<Value> {
        self.all()
            .into_iter()
            .filter(|(op, _)| op == operation)
            .map(|(_, args)| args)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }
}

/// Canned job backend
#[derive(Clone, Default)]
pub struct MockJobs {
    pub calls: Calls,
    pub apps: Vec<Value>,
    pub total: Option<Value>,
    pub app: Value,
    pub action_result: Map<String, Value>,
    pub profile: Option<ProfileOutput>,
    pub fail: Option<String>,
}

impl MockJobs {
    fn check(&self) -> BackendResult<()> {
        match &self.fail {
            Some(message) => Err(BackendError::failed(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl JobApi for MockJobs {
    async fn apps(&self, filters: &Map<String, Value>) -> BackendResult<AppList> {
        self.calls.record("apps", Value::Object(filters.clone()));
        self.check()?;
        Ok(AppList {
            apps: self.apps.clone(),
            total: self.total.clone(),
        })
    }

    async fn app(&self, app_id: &str, offset: Option<i64>) -> BackendResult<Value> {
        self.calls.record("app", json!({"app_id": app_id, "offset": offset}));
        self.check()?;
        Ok(self.app.clone())
    }

    async fn action(&self, app_ids: &[String], operation: &Value) -> BackendResult<Map<String, Value>> {
        self.calls.record("action", json!({"app_ids": app_ids, "operation": operation}));
        self.check()?;
        Ok(self.action_result.clone())
    }

    async fn logs(&self, app_id: &str, app_type: &str, log_name: &str, is_embeddable: bool) -> BackendResult<Value> {
        self.calls.record(
            "logs",
            json!({"app_id": app_id, "type": app_type, "name": log_name, "is_embeddable": is_embeddable}),
        );
        self.check()?;
        Ok(Value::String(format!("{} log of {}", log_name, app_id)))
    }

    async fn profile(
        &self,
        app_id: &str,
        app_type: &str,
        app_property: &str,
        app_filters: &Map<String, Value>,
    ) -> BackendResult<ProfileOutput> {
        self.calls.record(
            "profile",
            json!({"app_id": app_id, "app_type": app_type, "app_property": app_property, "app_filters": app_filters}),
        );
        self.check()?;
        Ok(self.profile.clone().unwrap_or(ProfileOutput::Json(json!({"tasks": []}))))
    }
}

/// Canned policy service
#[derive(Clone, Default)]
pub struct MockSentry {
    pub calls: Calls,
    pub roles: Vec<Value>,
    pub privileges: Vec<Value>,
    pub by_authorizable: Vec<AuthorizablePrivileges>,
    pub fail: Option<String>,
    /// Fail only this operation, after recording it
    pub fail_on: Option<&'static str>,
}

impl MockSentry {
    fn check(&self) -> BackendResult<()> {
        match &self.fail {
            Some(message) => Err(BackendError::failed(message.clone())),
            None => Ok(()),
        }
    }

    fn check_op(&self, operation: &str) -> BackendResult<()> {
        self.check()?;
        match self.fail_on {
            Some(failing) if failing == operation => Err(BackendError::failed(format!("{} refused", operation))),
            _ => Ok(()),
        }
    }
}

fn record_value(privilege: &PrivilegeRecord) -> Value {
    serde_json::to_value(privilege).unwrap()
}

#[async_trait]
impl SentryApi for MockSentry {
    async fn list_sentry_roles_by_group(&self, group_name: Option<&str>) -> BackendResult<Vec<Value>> {
        self.calls.record("list_sentry_roles_by_group", json!({"groupName": group_name}));
        self.check_op("list_sentry_roles_by_group")?;
        Ok(self.roles.clone())
    }

    async fn list_sentry_privileges_by_role(&self, service_name: &str, role_name: &str) -> BackendResult<Vec<Value>> {
        self.calls.record(
            "list_sentry_privileges_by_role",
            json!({"serviceName": service_name, "roleName": role_name}),
        );
        self.check_op("list_sentry_privileges_by_role")?;
        Ok(self.privileges.clone())
    }

    async fn create_sentry_role(&self, role_name: &str) -> BackendResult<()> {
        self.calls.record("create_sentry_role", json!({"roleName": role_name}));
        self.check_op("create_sentry_role")
    }

    async fn drop_sentry_role(&self, role_name: &str) -> BackendResult<()> {
        self.calls.record("drop_sentry_role", json!({"roleName": role_name}));
        self.check_op("drop_sentry_role")
    }

    async fn alter_sentry_role_grant_privilege(&self, role_name: &str, privilege: &PrivilegeRecord) -> BackendResult<()> {
        self.calls.record(
            "alter_sentry_role_grant_privilege",
            json!({"roleName": role_name, "privilege": record_value(privilege)}),
        );
        self.check_op("alter_sentry_role_grant_privilege")
    }

    async fn alter_sentry_role_revoke_privilege(&self, role_name: &str, privilege: &PrivilegeRecord) -> BackendResult<()> {
        self.calls.record(
            "alter_sentry_role_revoke_privilege",
            json!({"roleName": role_name, "privilege": record_value(privilege)}),
        );
        self.check_op("alter_sentry_role_revoke_privilege")
    }

    async fn alter_sentry_role_add_groups(&self, role_name: &str, groups: &[String]) -> BackendResult<()> {
        self.calls.record("alter_sentry_role_add_groups", json!({"roleName": role_name, "groups": groups}));
        self.check_op("alter_sentry_role_add_groups")
    }

    async fn alter_sentry_role_delete_groups(&self, role_name: &str, groups: &[String]) -> BackendResult<()> {
        self.calls.record("alter_sentry_role_delete_groups", json!({"roleName": role_name, "groups": groups}));
        self.check_op("alter_sentry_role_delete_groups")
    }

    async fn list_sentry_privileges_by_authorizable(
        &self,
        authorizable_set: &[Value],
        groups: Option<&[String]>,
    ) -> BackendResult<Vec<AuthorizablePrivileges>> {
        self.calls.record(
            "list_sentry_privileges_by_authorizable",
            json!({"authorizableSet": authorizable_set, "groups": groups}),
        );
        self.check_op("list_sentry_privileges_by_authorizable")?;
        Ok(self.by_authorizable.clone())
    }

    async fn drop_sentry_privileges(&self, authorizable_hierarchy: &Map<String, Value>) -> BackendResult<()> {
        self.calls.record("drop_sentry_privileges", Value::Object(authorizable_hierarchy.clone()));
        self.check_op("drop_sentry_privileges")
    }

    async fn rename_sentry_privilege(&self, old_authorizable: &Value, new_authorizable: &Value) -> BackendResult<()> {
        self.calls.record(
            "rename_sentry_privilege",
            json!({"oldAuthorizable": old_authorizable, "newAuthorizable": new_authorizable}),
        );
        self.check_op("rename_sentry_privilege")
    }

    async fn list_sentry_privileges_for_provider(
        &self,
        groups: &Value,
        role_set: &Value,
        authorizable_hierarchy: &Value,
    ) -> BackendResult<Value> {
        self.calls.record(
            "list_sentry_privileges_for_provider",
            json!({"groups": groups, "roleSet": role_set, "authorizableHierarchy": authorizable_hierarchy}),
        );
        self.check_op("list_sentry_privileges_for_provider")?;
        Ok(json!(["server=server1->db=sales->action=select"]))
    }
}

pub struct MockSearch(pub Vec<String>);

#[async_trait]
impl SearchApi for MockSearch {
    async fn collections(&self, _user: &str) -> BackendResult<Vec<String>> {
        Ok(self.0.clone())
    }
}

#[derive(Clone, Default)]
pub struct MockCatalog {
    pub calls: Calls,
    pub reply: Option<Value>,
}

#[async_trait]
impl CatalogApi for MockCatalog {
    async fn autocomplete(&self, user: &str, database: Option<&str>, table: Option<&str>) -> BackendResult<Value> {
        self.calls
            .record("autocomplete", json!({"user": user, "database": database, "table": table}));
        if let Some(reply) = &self.reply {
            return Ok(reply.clone());
        }
        Ok(match (database, table) {
            (None, _) => json!({"databases": ["default", "sales"]}),
            (Some(_), None) => json!({"tables_meta": [{"name": "orders", "type": "Table", "comment": ""}]}),
            (Some(_), Some(_)) => json!({"columns": ["id", "total"]}),
        })
    }
}

/// Register `jobs` for every job interface, recording the selector of each construction
pub fn with_jobs(backends: Backends, jobs: MockJobs, selectors: Calls) -> Backends {
    JobInterface::ALL.into_iter().fold(backends, |backends, interface| {
        let jobs = jobs.clone();
        let selectors = selectors.clone();
        backends.with_job_api(interface, move |selector: &BackendSelector| {
            selectors.record(
                "construct",
                json!({"user": selector.user, "interface": selector.interface.as_str(), "cluster": selector.cluster}),
            );
            Ok(Arc::new(jobs.clone()) as Arc<dyn JobApi>)
        })
    })
}

/// Register `sentry` for both components, recording who it is built for
pub fn with_sentry(backends: Backends, sentry: MockSentry, constructed: Calls) -> Backends {
    Component::ALL.into_iter().fold(backends, |backends, component| {
        let sentry = sentry.clone();
        let constructed = constructed.clone();
        backends.with_sentry_api(component, move |user, component| {
            constructed.record("construct", json!({"user": user, "component": component.as_str()}));
            Ok(Arc::new(sentry.clone()) as Arc<dyn SentryApi>)
        })
    })
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a form as `alice`
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("X-Remote-User", ALICE)
            .form(form)
            .send()
            .await
            .expect("request")
    }

    pub async fn post_form_json(&self, path: &str, form: &[(&str, &str)]) -> Value {
        self.post_form(path, form).await.json().await.expect("json body")
    }
}

/// Serve the gateway in-process on an ephemeral port
pub async fn spawn(config: GatewayConfig, backends: Backends) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = AppState::new(config, backends, reqwest::Client::new());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });

    TestServer {
        addr,
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
    }
}

/// Serve an arbitrary router in-process, for fake upstreams
pub async fn spawn_router(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{}", addr)
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub fn roles_on(authorizable: Value, roles: &[(&str, Vec<Value>)]) -> AuthorizablePrivileges {
    let roles: BTreeMap<String, Vec<Map<String, Value>>> = roles
        .iter()
        .map(|(name, privileges)| (name.to_string(), privileges.iter().cloned().map(object).collect()))
        .collect();
    AuthorizablePrivileges { authorizable, roles }
}
