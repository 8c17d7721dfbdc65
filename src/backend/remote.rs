//! HTTP bridge to backend adapters.
//!
//! Each capability call becomes `POST <base>/<target>/<operation>` with a JSON
//! body `{user, <target kind>, cluster?, args}`; the adapter answers with the
//! operation's JSON result, or a non-2xx status with `{message}` / `{error}`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use super::{
    AppList, AuthorizablePrivileges, BackendError, BackendResult, BackendSelector, CatalogApi,
    JobApi, ProfileOutput, SentryApi,
};
use crate::types::{Component, PrivilegeRecord};

#[derive(Deserialize)]
struct AdapterErrorResp {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

/// Shared HTTP plumbing for the remote adapters
#[derive(Debug, Clone)]
pub struct RemoteBridge {
    client: reqwest::Client,
    base_url: Url,
}

impl RemoteBridge {
    pub fn new(client: reqwest::Client, base_url: &str) -> BackendResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| BackendError::NotConfigured(format!("invalid adapter URL {}: {}", base_url, e)))?;
        // Url::join replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client, base_url })
    }

    pub fn endpoint(&self, target: &str, operation: &str) -> BackendResult<Url> {
        self.base_url
            .join(&format!("{}/{}", target, operation))
            .map_err(|e| BackendError::NotConfigured(e.to_string()))
    }

    async fn call(&self, target: &str, operation: &str, body: Value) -> BackendResult<Value> {
        let url = self.endpoint(target, operation)?;
        tracing::debug!(%url, "calling backend adapter");

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<AdapterErrorResp>(&text)
                .ok()
                .map(|r| if r.message.is_empty() { r.error } else { r.message })
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("{} {}", status, text.trim()));
            return Err(BackendError::Failed(message));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| BackendError::Malformed(e.to_string()))
    }

    async fn call_as<T: DeserializeOwned>(
        &self,
        target: &str,
        operation: &str,
        body: Value,
    ) -> BackendResult<T> {
        let value = self.call(target, operation, body).await?;
        serde_json::from_value(value).map_err(|e| BackendError::Malformed(e.to_string()))
    }
}

/// Job backend reached through the bridge
pub struct RemoteJobApi {
    bridge: Arc<RemoteBridge>,
    selector: BackendSelector,
}

impl RemoteJobApi {
    pub fn new(bridge: Arc<RemoteBridge>, selector: BackendSelector) -> Self {
        Self { bridge, selector }
    }

    fn body(&self, args: Value) -> Value {
        json!({
            "user": self.selector.user,
            "interface": self.selector.interface,
            "cluster": self.selector.cluster,
            "args": args,
        })
    }

    fn target(&self) -> &'static str {
        self.selector.interface.as_str()
    }
}

#[async_trait]
impl JobApi for RemoteJobApi {
    async fn apps(&self, filters: &Map<String, Value>) -> BackendResult<AppList> {
        self.bridge
            .call_as(self.target(), "apps", self.body(json!({ "filters": filters })))
            .await
    }

    async fn app(&self, app_id: &str, offset: Option<i64>) -> BackendResult<Value> {
        self.bridge
            .call(self.target(), "app", self.body(json!({ "app_id": app_id, "offset": offset })))
            .await
    }

    async fn action(
        &self,
        app_ids: &[String],
        operation: &Value,
    ) -> BackendResult<Map<String, Value>> {
        self.bridge
            .call_as(
                self.target(),
                "action",
                self.body(json!({ "app_ids": app_ids, "operation": operation })),
            )
            .await
    }

    async fn logs(
        &self,
        app_id: &str,
        app_type: &str,
        log_name: &str,
        is_embeddable: bool,
    ) -> BackendResult<Value> {
        let args = json!({
            "app_id": app_id,
            "type": app_type,
            "name": log_name,
            "is_embeddable": is_embeddable,
        });
        self.bridge.call(self.target(), "logs", self.body(args)).await
    }

    async fn profile(
        &self,
        app_id: &str,
        app_type: &str,
        app_property: &str,
        app_filters: &Map<String, Value>,
    ) -> BackendResult<ProfileOutput> {
        let args = json!({
            "app_id": app_id,
            "app_type": app_type,
            "app_property": app_property,
            "app_filters": app_filters,
        });
        self.bridge
            .call(self.target(), "profile", self.body(args))
            .await
            .map(ProfileOutput::Json)
    }
}

/// Policy service reached through the bridge
pub struct RemoteSentryApi {
    bridge: Arc<RemoteBridge>,
    user: String,
    component: Component,
}

impl RemoteSentryApi {
    pub fn new(bridge: Arc<RemoteBridge>, user: &str, component: Component) -> Self {
        Self {
            bridge,
            user: user.to_string(),
            component,
        }
    }

    async fn send(&self, operation: &str, args: Value) -> BackendResult<Value> {
        let body = json!({
            "user": self.user,
            "component": self.component,
            "args": args,
        });
        self.bridge.call(self.component.as_str(), operation, body).await
    }

    async fn send_as<T: DeserializeOwned>(&self, operation: &str, args: Value) -> BackendResult<T> {
        let value = self.send(operation, args).await?;
        serde_json::from_value(value).map_err(|e| BackendError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl SentryApi for RemoteSentryApi {
    async fn list_sentry_roles_by_group(&self, group_name: Option<&str>) -> BackendResult<Vec<Value>> {
        self.send_as("list_sentry_roles_by_group", json!({ "groupName": group_name }))
            .await
    }

    async fn list_sentry_privileges_by_role(
        &self,
        service_name: &str,
        role_name: &str,
    ) -> BackendResult<Vec<Value>> {
        self.send_as(
            "list_sentry_privileges_by_role",
            json!({ "serviceName": service_name, "roleName": role_name }),
        )
        .await
    }

    async fn create_sentry_role(&self, role_name: &str) -> BackendResult<()> {
        self.send("create_sentry_role", json!({ "roleName": role_name }))
            .await
            .map(drop)
    }

    async fn drop_sentry_role(&self, role_name: &str) -> BackendResult<()> {
        self.send("drop_sentry_role", json!({ "roleName": role_name }))
            .await
            .map(drop)
    }

    async fn alter_sentry_role_grant_privilege(
        &self,
        role_name: &str,
        privilege: &PrivilegeRecord,
    ) -> BackendResult<()> {
        self.send(
            "alter_sentry_role_grant_privilege",
            json!({ "roleName": role_name, "privilege": privilege }),
        )
        .await
        .map(drop)
    }

    async fn alter_sentry_role_revoke_privilege(
        &self,
        role_name: &str,
        privilege: &PrivilegeRecord,
    ) -> BackendResult<()> {
        self.send(
            "alter_sentry_role_revoke_privilege",
            json!({ "roleName": role_name, "privilege": privilege }),
        )
        .await
        .map(drop)
    }

    async fn alter_sentry_role_add_groups(&self, role_name: &str, groups: &[String]) -> BackendResult<()> {
        self.send(
            "alter_sentry_role_add_groups",
            json!({ "roleName": role_name, "groups": groups }),
        )
        .await
        .map(drop)
    }

    async fn alter_sentry_role_delete_groups(&self, role_name: &str, groups: &[String]) -> BackendResult<()> {
        self.send(
            "alter_sentry_role_delete_groups",
            json!({ "roleName": role_name, "groups": groups }),
        )
        .await
        .map(drop)
    }

    async fn list_sentry_privileges_by_authorizable(
        &self,
        authorizable_set: &[Value],
        groups: Option<&[String]>,
    ) -> BackendResult<Vec<AuthorizablePrivileges>> {
        self.send_as(
            "list_sentry_privileges_by_authorizable",
            json!({ "authorizableSet": authorizable_set, "groups": groups }),
        )
        .await
    }

    async fn drop_sentry_privileges(&self, authorizable_hierarchy: &Map<String, Value>) -> BackendResult<()> {
        self.send(
            "drop_sentry_privileges",
            json!({ "authorizableHierarchy": authorizable_hierarchy }),
        )
        .await
        .map(drop)
    }

    async fn rename_sentry_privilege(
        &self,
        old_authorizable: &Value,
        new_authorizable: &Value,
    ) -> BackendResult<()> {
        self.send(
            "rename_sentry_privilege",
            json!({ "oldAuthorizable": old_authorizable, "newAuthorizable": new_authorizable }),
        )
        .await
        .map(drop)
    }

    async fn list_sentry_privileges_for_provider(
        &self,
        groups: &Value,
        role_set: &Value,
        authorizable_hierarchy: &Value,
    ) -> BackendResult<Value> {
        self.send(
            "list_sentry_privileges_for_provider",
            json!({
                "groups": groups,
                "roleSet": role_set,
                "authorizableHierarchy": authorizable_hierarchy,
            }),
        )
        .await
    }
}

/// Metastore browsing reached through the bridge
pub struct RemoteCatalogApi {
    bridge: Arc<RemoteBridge>,
}

impl RemoteCatalogApi {
    pub fn new(bridge: Arc<RemoteBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl CatalogApi for RemoteCatalogApi {
    async fn autocomplete(
        &self,
        user: &str,
        database: Option<&str>,
        table: Option<&str>,
    ) -> BackendResult<Value> {
        let body = json!({
            "user": user,
            "args": { "database": database, "table": table },
        });
        self.bridge.call("catalog", "autocomplete", body).await
    }
}
