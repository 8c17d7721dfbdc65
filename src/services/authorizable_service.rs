use serde_json::{json, Map, Value};

use crate::api::envelope::Envelope;
use crate::backend::{BackendError, Backends};
use crate::error::GatewayError;
use crate::middleware::RequestUser;
use crate::types::{is_truthy, Component};

/// Config sets offered by the indexer next to its collections
const SOLR_CONFIGS: [&str; 2] = ["log_analytics_demo", "schemalessTemplateSecure"];

/// Browses the objects a privilege can be attached to
pub struct AuthorizableService<'a> {
    backends: &'a Backends,
}

impl<'a> AuthorizableService<'a> {
    pub fn new(backends: &'a Backends) -> Self {
        Self { backends }
    }

    /// Children of `path` in the authorizable tree of `component`
    pub async fn fetch(
        &self,
        user: &RequestUser,
        component: Component,
        path: &str,
        doas: Option<&str>,
    ) -> Result<Map<String, Value>, GatewayError> {
        match component {
            Component::Hive => self.fetch_hive_path(user, path, doas).await,
            Component::Solr => self.fetch_collections(user, path).await,
        }
    }

    /// `""`, `db` or `db/table` through the metastore catalog. When a
    /// database is named and `doas` is someone else, the lookup runs as them.
    async fn fetch_hive_path(
        &self,
        user: &RequestUser,
        path: &str,
        doas: Option<&str>,
    ) -> Result<Map<String, Value>, GatewayError> {
        let (database, table) = split_path(path)?;

        let run_as = match (database, doas) {
            (Some(_), Some(doas)) if doas != user.name => doas,
            _ => user.name.as_str(),
        };
        tracing::debug!(?database, ?table, run_as, "fetching hive authorizables");

        let listing = self
            .backends
            .catalog_api()?
            .autocomplete(run_as, database, table)
            .await?;

        Ok(match listing {
            Value::Object(fields) if is_failure(&fields) => {
                let message = match fields.get("message") {
                    Some(Value::String(m)) => m.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                return Err(BackendError::failed(message).into());
            }
            Value::Object(fields) => fields,
            other => {
                let mut fields = Map::new();
                fields.insert("autocomplete".to_string(), other);
                fields
            }
        })
    }

    async fn fetch_collections(&self, user: &RequestUser, path: &str) -> Result<Map<String, Value>, GatewayError> {
        let reply = match split_path(path)? {
            (None, _) => json!({"databases": ["collections", "configs"]}),
            (Some(_), Some(name)) => json!({
                "hdfs_link": format!("/indexer/#edit/{}", name),
                "extended_columns": [],
                "columns": [],
                "partition_keys": [],
            }),
            (Some("collections"), None) => {
                let collections = self.backends.search_api()?.collections(&user.name).await?;
                tables_meta(collections.iter().map(String::as_str))
            }
            (Some("configs"), None) => tables_meta(SOLR_CONFIGS.into_iter()),
            (Some(_), None) => {
                return Err(GatewayError::not_found(format!(
                    "Authorizable {} could not be retrieved",
                    path
                )))
            }
        };

        match reply {
            Value::Object(fields) => Ok(fields),
            _ => Ok(Map::new()),
        }
    }
}

/// The catalog reports its own errors as `{status: -1, message}`
fn is_failure(fields: &Map<String, Value>) -> bool {
    fields.get("status").and_then(Value::as_i64) == Some(Envelope::FAILURE as i64)
        && fields.get("message").map(is_truthy).unwrap_or(false)
}

fn tables_meta<'n>(names: impl Iterator<Item = &'n str>) -> Value {
    let tables: Vec<Value> = names
        .map(|name| json!({"comment": null, "type": "Table", "name": name}))
        .collect();
    json!({ "tables_meta": tables })
}

/// `item[/name]`; empty segments count as absent
fn split_path(path: &str) -> Result<(Option<&str>, Option<&str>), GatewayError> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() > 2 {
        return Err(GatewayError::parameter(format!("Invalid authorizable path: {}", path)));
    }
    let segment = |i: usize| segments.get(i).copied().filter(|s| !s.is_empty());
    Ok((segment(0), segment(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_split_into_item_and_name() {
        assert_eq!(split_path("").unwrap(), (None, None));
        assert_eq!(split_path("sales").unwrap(), (Some("sales"), None));
        assert_eq!(split_path("sales/orders").unwrap(), (Some("sales"), Some("orders")));
        assert!(split_path("a/b/c").is_err());
    }

    #[tokio::test]
    async fn solr_tree_roots_and_configs_need_no_backend() {
        let backends = Backends::new();
        let service = AuthorizableService::new(&backends);
        let user = RequestUser::new("alice", Vec::new());

        let root = service.fetch(&user, Component::Solr, "", None).await.unwrap();
        assert_eq!(root["databases"], json!(["collections", "configs"]));

        let configs = service.fetch(&user, Component::Solr, "configs", None).await.unwrap();
        assert_eq!(configs["tables_meta"][1]["name"], "schemalessTemplateSecure");
        assert_eq!(configs["tables_meta"][0]["comment"], Value::Null);

        let stub = service.fetch(&user, Component::Solr, "collections/logs", None).await.unwrap();
        assert_eq!(stub["hdfs_link"], "/indexer/#edit/logs");
        assert_eq!(stub["partition_keys"], json!([]));
    }

    #[tokio::test]
    async fn unknown_solr_item_is_not_found() {
        let backends = Backends::new();
        let service = AuthorizableService::new(&backends);
        let user = RequestUser::new("alice", Vec::new());
        let err = service.fetch(&user, Component::Solr, "aliases", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Authorizable aliases could not be retrieved");
    }
}
