use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::backend::{Backends, SentryApi};
use crate::error::GatewayError;
use crate::middleware::RequestUser;
use crate::types::{
    AuthorizablePath, CheckedPath, Component, GrantedPrivilege, GroupDiff, PrivilegeRecord, RoleForm,
    UiPrivilege,
};

/// Policy services report an unknown group with this phrase; it means "no roles"
const NO_ROLES_MARKER: &str = "couldn't be retrieved.";

/// Role as echoed back after creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleSummary {
    pub name: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedRole {
    pub role: RoleSummary,
    pub privileges: Vec<GrantedPrivilege>,
}

/// Role and privilege management against the policy service of a component
pub struct SentryService<'a> {
    backends: &'a Backends,
    admin_groups: &'a [String],
}

impl<'a> SentryService<'a> {
    pub fn new(backends: &'a Backends, admin_groups: &'a [String]) -> Self {
        Self {
            backends,
            admin_groups,
        }
    }

    fn api(&self, user: &RequestUser, component: Component) -> Result<Arc<dyn SentryApi>, GatewayError> {
        Ok(self.backends.sentry_api(&user.name, component)?)
    }

    /// Roles of `group_name`. Without a group, admins see every role and
    /// everyone else the roles of their own groups.
    pub async fn list_roles_by_group(
        &self,
        user: &RequestUser,
        component: Component,
        group_name: &str,
    ) -> Result<Vec<Value>, GatewayError> {
        let group = if !group_name.is_empty() {
            Some(group_name)
        } else if user.is_member_of_any(self.admin_groups) {
            None
        } else {
            Some("*")
        };

        match self.api(user, component)?.list_sentry_roles_by_group(group).await {
            Ok(mut roles) => {
                roles.sort_by_cached_key(|role| field_text(role, "name"));
                Ok(roles)
            }
            Err(e) if e.to_string().contains(NO_ROLES_MARKER) => {
                tracing::warn!(?group, error = %e, "group has no roles");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_privileges_by_role(
        &self,
        user: &RequestUser,
        component: Component,
        service_name: &str,
        role_name: &str,
    ) -> Result<Vec<Value>, GatewayError> {
        let mut privileges = self
            .api(user, component)?
            .list_sentry_privileges_by_role(service_name, role_name)
            .await?;
        privileges.sort_by_cached_key(privilege_sort_key);
        Ok(privileges)
    }

    /// Create a role, grant its live privileges, then attach its groups.
    /// Nothing is undone if a later step fails.
    pub async fn create_role(
        &self,
        user: &RequestUser,
        component: Component,
        role: RoleForm,
    ) -> Result<CreatedRole, GatewayError> {
        let api = self.api(user, component)?;
        api.create_sentry_role(&role.name).await?;

        let live: Vec<UiPrivilege> = role
            .privileges
            .into_iter()
            .filter(|p| !p.is_deleted())
            .collect();
        let privileges = add_privileges(api.as_ref(), &role.name, &live).await?;
        api.alter_sentry_role_add_groups(&role.name, &role.groups).await?;

        Ok(CreatedRole {
            role: RoleSummary {
                name: role.name,
                groups: role.groups,
            },
            privileges,
        })
    }

    /// Apply the difference between `originalGroups` and `groups`
    pub async fn update_role_groups(
        &self,
        user: &RequestUser,
        component: Component,
        role: &RoleForm,
    ) -> Result<GroupDiff, GatewayError> {
        let diff = GroupDiff::between(&role.original_groups, &role.groups);
        let api = self.api(user, component)?;

        if !diff.added.is_empty() {
            api.alter_sentry_role_add_groups(&role.name, &diff.added).await?;
        }
        if !diff.removed.is_empty() {
            api.alter_sentry_role_delete_groups(&role.name, &diff.removed).await?;
        }
        Ok(diff)
    }

    /// Apply edited privileges: grant new ones, revoke deleted ones, and
    /// replace modified ones (grant the edit, revoke the original with the same id).
    pub async fn save_privileges(
        &self,
        user: &RequestUser,
        component: Component,
        role: &RoleForm,
    ) -> Result<Vec<GrantedPrivilege>, GatewayError> {
        let api = self.api(user, component)?;
        let with_status = |status: &str| -> Vec<UiPrivilege> {
            role.privileges_changed
                .iter()
                .filter(|p| p.status == status)
                .cloned()
                .collect()
        };

        let granted = add_privileges(api.as_ref(), &role.name, &with_status("new")).await?;

        for privilege in with_status("deleted") {
            revoke_privilege(api.as_ref(), &role.name, &privilege).await?;
        }

        let modified = with_status("modified");
        add_privileges(api.as_ref(), &role.name, &modified).await?;
        let replaced: Vec<&Value> = modified.iter().filter_map(|p| p.id.as_ref()).collect();
        for original in &role.original_privileges {
            if original.id.as_ref().is_some_and(|id| replaced.contains(&id)) {
                revoke_privilege(api.as_ref(), &role.name, original).await?;
            }
        }

        Ok(granted)
    }

    pub async fn grant_privilege(
        &self,
        user: &RequestUser,
        component: Component,
        role_name: &str,
        privilege: UiPrivilege,
    ) -> Result<Vec<GrantedPrivilege>, GatewayError> {
        let api = self.api(user, component)?;
        add_privileges(api.as_ref(), role_name, &[privilege]).await
    }

    pub async fn create_sentry_role(
        &self,
        user: &RequestUser,
        component: Component,
        role_name: &str,
    ) -> Result<(), GatewayError> {
        Ok(self.api(user, component)?.create_sentry_role(role_name).await?)
    }

    pub async fn drop_sentry_role(
        &self,
        user: &RequestUser,
        component: Component,
        role_name: &str,
    ) -> Result<(), GatewayError> {
        Ok(self.api(user, component)?.drop_sentry_role(role_name).await?)
    }

    /// Privileges on one authorizable, flattened and tagged with their role
    pub async fn list_privileges_by_authorizable(
        &self,
        user: &RequestUser,
        component: Component,
        group_name: &str,
        authorizable_hierarchy: Value,
    ) -> Result<Vec<Value>, GatewayError> {
        let groups = (!group_name.is_empty()).then(|| vec![group_name.to_string()]);
        let entries = self
            .api(user, component)?
            .list_sentry_privileges_by_authorizable(&[authorizable_hierarchy], groups.as_deref())
            .await?;

        let mut privileges = Vec::new();
        for entry in entries {
            for (role, role_privileges) in entry.roles {
                for mut privilege in role_privileges {
                    privilege.insert("roleName".to_string(), Value::String(role.clone()));
                    privileges.push(Value::Object(privilege));
                }
            }
        }
        privileges.sort_by_cached_key(|p| field_text(p, "roleName"));
        Ok(privileges)
    }

    /// Drop the privileges under every checked path; returns the number of calls made
    pub async fn bulk_delete_privileges(
        &self,
        user: &RequestUser,
        component: Component,
        checked_paths: &[CheckedPath],
        mut authorizable_hierarchy: Map<String, Value>,
    ) -> Result<usize, GatewayError> {
        let api = self.api(user, component)?;
        for checked in checked_paths {
            let path = AuthorizablePath::parse(&checked.path);
            authorizable_hierarchy.insert("db".to_string(), Value::String(path.database));
            authorizable_hierarchy.insert("table".to_string(), Value::String(path.table));
            authorizable_hierarchy.insert("column".to_string(), Value::String(path.column));
            api.drop_sentry_privileges(&authorizable_hierarchy).await?;
        }
        Ok(checked_paths.len())
    }

    /// Grant every untouched privilege (`status == ""`) on every checked
    /// path, each to its own `roleName`; returns the number of grants
    pub async fn bulk_add_privileges(
        &self,
        user: &RequestUser,
        component: Component,
        privileges: Vec<UiPrivilege>,
        checked_paths: &[CheckedPath],
    ) -> Result<usize, GatewayError> {
        let api = self.api(user, component)?;
        let mut privileges: Vec<UiPrivilege> =
            privileges.into_iter().filter(|p| p.status.is_empty()).collect();

        let mut grants = 0;
        for checked in checked_paths {
            let path = AuthorizablePath::parse(&checked.path);
            for privilege in privileges.iter_mut() {
                privilege.retarget(&path);
                let role_name = privilege
                    .role_name
                    .clone()
                    .ok_or_else(|| GatewayError::parameter("Missing parameter: roleName"))?;
                add_privileges(api.as_ref(), &role_name, std::slice::from_ref(privilege)).await?;
                grants += 1;
            }
        }
        Ok(grants)
    }

    pub async fn rename_privilege(
        &self,
        user: &RequestUser,
        component: Component,
        old_authorizable: &Value,
        new_authorizable: &Value,
    ) -> Result<(), GatewayError> {
        Ok(self
            .api(user, component)?
            .rename_sentry_privilege(old_authorizable, new_authorizable)
            .await?)
    }

    pub async fn list_privileges_for_provider(
        &self,
        user: &RequestUser,
        component: Component,
        groups: &Value,
        role_set: &Value,
        authorizable_hierarchy: &Value,
    ) -> Result<Value, GatewayError> {
        Ok(self
            .api(user, component)?
            .list_sentry_privileges_for_provider(groups, role_set, authorizable_hierarchy)
            .await?)
    }
}

/// Grant each non-deleted privilege and summarize what was granted
async fn add_privileges(
    api: &dyn SentryApi,
    role_name: &str,
    privileges: &[UiPrivilege],
) -> Result<Vec<GrantedPrivilege>, GatewayError> {
    let now = Utc::now().timestamp();
    let mut granted = Vec::new();
    for privilege in privileges.iter().filter(|p| p.status != "deleted") {
        api.alter_sentry_role_grant_privilege(role_name, &PrivilegeRecord::from(privilege))
            .await?;
        granted.push(GrantedPrivilege::new(privilege, now));
    }
    Ok(granted)
}

async fn revoke_privilege(
    api: &dyn SentryApi,
    role_name: &str,
    privilege: &UiPrivilege,
) -> Result<(), GatewayError> {
    Ok(api
        .alter_sentry_role_revoke_privilege(role_name, &PrivilegeRecord::from(privilege))
        .await?)
}

/// Field rendered for sorting; absent and null fields sort as empty
fn field_text(value: &Value, key: &str) -> String {
    match value.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// `server.database.table.URI`
pub fn privilege_sort_key(privilege: &Value) -> String {
    format!(
        "{}.{}.{}.{}",
        field_text(privilege, "server"),
        field_text(privilege, "database"),
        field_text(privilege, "table"),
        field_text(privilege, "URI"),
    )
}
