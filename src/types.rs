/// Shared types used across the gateway

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::GatewayError;

/// Job-browser backends selectable through the `interface` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobInterface {
    Jobs,
    Workflows,
    Schedules,
    Bundles,
    Slas,
    QueriesImpala,
    QueriesHive,
    LivySessions,
}

impl JobInterface {
    pub const ALL: [JobInterface; 8] = [
        JobInterface::Jobs,
        JobInterface::Workflows,
        JobInterface::Schedules,
        JobInterface::Bundles,
        JobInterface::Slas,
        JobInterface::QueriesImpala,
        JobInterface::QueriesHive,
        JobInterface::LivySessions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobInterface::Jobs => "jobs",
            JobInterface::Workflows => "workflows",
            JobInterface::Schedules => "schedules",
            JobInterface::Bundles => "bundles",
            JobInterface::Slas => "slas",
            JobInterface::QueriesImpala => "queries-impala",
            JobInterface::QueriesHive => "queries-hive",
            JobInterface::LivySessions => "livy-sessions",
        }
    }
}

impl FromStr for JobInterface {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobInterface::ALL
            .into_iter()
            .find(|interface| interface.as_str() == s)
            .ok_or_else(|| GatewayError::parameter(format!("Unknown interface: {}", s)))
    }
}

impl fmt::Display for JobInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization-policy components selectable through the `component` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Hive,
    Solr,
}

impl Component {
    pub const ALL: [Component; 2] = [Component::Hive, Component::Solr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Hive => "hive",
            Component::Solr => "solr",
        }
    }
}

impl FromStr for Component {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Component::ALL
            .into_iter()
            .find(|component| component.as_str() == s)
            .ok_or_else(|| GatewayError::parameter(format!("Unknown component: {}", s)))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Granularity a privilege applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrivilegeScope {
    Server,
    Database,
    Table,
    Column,
}

impl PrivilegeScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivilegeScope::Server => "SERVER",
            PrivilegeScope::Database => "DATABASE",
            PrivilegeScope::Table => "TABLE",
            PrivilegeScope::Column => "COLUMN",
        }
    }
}

/// A tree path decomposed into database, table and column segments.
///
/// Segments are separated by `.` (as emitted by the privilege tree) or `/`.
/// Missing segments are empty strings; anything past the third is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizablePath {
    pub database: String,
    pub table: String,
    pub column: String,
}

impl AuthorizablePath {
    pub fn parse(path: &str) -> Self {
        let mut parts = path.split(['.', '/']);
        let mut next = || parts.next().unwrap_or_default().to_string();
        let database = next();
        let table = next();
        let column = next();
        Self { database, table, column }
    }

    pub fn scope(&self) -> PrivilegeScope {
        if !self.column.is_empty() {
            PrivilegeScope::Column
        } else if !self.table.is_empty() {
            PrivilegeScope::Table
        } else if !self.database.is_empty() {
            PrivilegeScope::Database
        } else {
            PrivilegeScope::Server
        }
    }
}

/// One entry of a `checkedPaths` list
#[derive(Debug, Clone, Deserialize)]
pub struct CheckedPath {
    pub path: String,
}

/// Authorizable as edited by the privilege UI (`name_` on the wire)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiAuthorizable {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "name_")]
    pub name: String,
}

/// A privilege as submitted by the role editor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPrivilege {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub server_name: String,
    #[serde(default)]
    pub authorizables: Vec<UiAuthorizable>,
    pub action: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub grantor_principal: Option<String>,
    #[serde(default, deserialize_with = "truthy")]
    pub grant_option: bool,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub column_name: Option<String>,
    #[serde(default, rename = "URI")]
    pub uri: Option<String>,
    #[serde(default)]
    pub privilege_scope: Option<String>,
    #[serde(default)]
    pub role_name: Option<String>,
}

impl UiPrivilege {
    pub fn is_deleted(&self) -> bool {
        matches!(self.status.as_str(), "deleted" | "alreadydeleted")
    }

    /// Point the privilege at `path`, as bulk grants do for every checked path
    pub fn retarget(&mut self, path: &AuthorizablePath) {
        self.db_name = Some(path.database.clone());
        self.table_name = Some(path.table.clone());
        self.column_name = Some(path.column.clone());
        self.privilege_scope = Some(path.scope().as_str().to_string());
    }
}

/// Authorizable in the policy service's format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorizable {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

/// Privilege payload forwarded to the policy service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegeRecord {
    pub component: String,
    pub service_name: String,
    pub authorizables: Vec<Authorizable>,
    pub action: String,
    pub create_time: Option<i64>,
    pub grantor_principal: Option<String>,
    pub grant_option: bool,
}

impl From<&UiPrivilege> for PrivilegeRecord {
    fn from(privilege: &UiPrivilege) -> Self {
        Self {
            component: privilege.component.clone(),
            service_name: privilege.server_name.clone(),
            authorizables: privilege
                .authorizables
                .iter()
                .map(|a| Authorizable {
                    kind: a.kind.clone(),
                    name: a.name.clone(),
                })
                .collect(),
            action: privilege.action.clone(),
            create_time: privilege.timestamp,
            grantor_principal: privilege.grantor_principal.clone(),
            grant_option: privilege.grant_option,
        }
    }
}

/// Summary of a granted privilege returned to the role editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedPrivilege {
    pub timestamp: i64,
    pub database: Option<String>,
    pub action: String,
    pub scope: Option<String>,
    pub table: Option<String>,
    pub column: Option<String>,
    #[serde(rename = "URI")]
    pub uri: Option<String>,
    pub server: String,
    pub grant_option: bool,
}

impl GrantedPrivilege {
    pub fn new(privilege: &UiPrivilege, timestamp: i64) -> Self {
        Self {
            timestamp,
            database: privilege.db_name.clone(),
            action: privilege.action.clone(),
            scope: privilege.privilege_scope.clone(),
            table: privilege.table_name.clone(),
            column: privilege.column_name.clone(),
            uri: privilege.uri.clone(),
            server: privilege.server_name.clone(),
            grant_option: privilege.grant_option,
        }
    }
}

/// Role as submitted by the role editor; which lists are present depends on the operation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleForm {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub original_groups: Vec<String>,
    #[serde(default)]
    pub privileges: Vec<UiPrivilege>,
    #[serde(default)]
    pub privileges_changed: Vec<UiPrivilege>,
    #[serde(default)]
    pub original_privileges: Vec<UiPrivilege>,
}

/// Groups to add and remove so that `original` becomes `new`, both sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl GroupDiff {
    pub fn between(original: &[String], new: &[String]) -> Self {
        let original: BTreeSet<&String> = original.iter().collect();
        let new: BTreeSet<&String> = new.iter().collect();
        Self {
            added: new.difference(&original).map(|g| g.to_string()).collect(),
            removed: original.difference(&new).map(|g| g.to_string()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Python-style truthiness: empty strings, zero, empty collections and null are false
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| is_truthy(&v))
}
