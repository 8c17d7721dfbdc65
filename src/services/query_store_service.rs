use axum::body::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde_json::{Map, Value};
use url::Url;

use crate::backend::{BackendError, BackendSelector, Backends};
use crate::config::QueryStoreConfig;
use crate::error::GatewayError;
use crate::types::JobInterface;

/// Sub-path answered from the local hive query backend when the proxy is off
pub const LOCAL_SEARCH_PATH: &str = "api/query/search";

const REQUESTED_BY: &str = "das";
const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// A request relayed to the query store
#[derive(Debug, Clone)]
pub struct ProxyRequest<'r> {
    pub method: Method,
    pub path: &'r str,
    pub query: &'r [(String, String)],
    pub body: Bytes,
}

/// Pass-through to the upstream query store, with a local fallback for search
pub struct QueryStoreService<'a> {
    client: &'a reqwest::Client,
    config: &'a QueryStoreConfig,
    backends: &'a Backends,
}

impl<'a> QueryStoreService<'a> {
    pub fn new(client: &'a reqwest::Client, config: &'a QueryStoreConfig, backends: &'a Backends) -> Self {
        Self {
            client,
            config,
            backends,
        }
    }

    pub async fn proxy(&self, user: &str, request: ProxyRequest<'_>) -> Result<Value, GatewayError> {
        if self.config.use_proxy {
            self.forward(request).await
        } else {
            self.serve_locally(user, request).await
        }
    }

    async fn forward(&self, request: ProxyRequest<'_>) -> Result<Value, GatewayError> {
        let url = self.upstream_url(request.path)?;
        tracing::debug!(method = %request.method, %url, "forwarding to query store");

        let builder = self
            .client
            .request(request.method, url)
            .query(request.query)
            .header("X-Requested-By", REQUESTED_BY)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(request.body);

        let response = self.authenticate(builder)?.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(upstream_error(status, text));
        }
        Ok(parse_body(&text))
    }

    async fn serve_locally(&self, user: &str, request: ProxyRequest<'_>) -> Result<Value, GatewayError> {
        let path = request.path.trim_matches('/');
        if path != LOCAL_SEARCH_PATH {
            return Err(GatewayError::parameter(format!(
                "{} is only served through the query store proxy",
                path
            )));
        }

        let body: Value = serde_json::from_slice(&request.body)
            .map_err(|e| GatewayError::parameter(format!("Malformed search request: {}", e)))?;
        let filters = body
            .get("search")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| GatewayError::parameter("Missing parameter: search"))?;

        let selector = BackendSelector {
            user: user.to_string(),
            interface: JobInterface::QueriesHive,
            cluster: Value::Object(Map::new()),
        };
        let apps = self.backends.job_api(&selector)?.apps(&filters).await?;
        Ok(Value::Array(apps.apps))
    }

    /// Fetch a query's data bundle as raw bytes
    pub async fn download_bundle(&self, id: &str) -> Result<Bytes, GatewayError> {
        check_bundle_id(id)?;
        let url = self.upstream_url(&format!("api/data-bundle/{}", id))?;
        let builder = self.client.get(url).header("X-Requested-By", REQUESTED_BY);

        let response = self.authenticate(builder)?.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(upstream_error(status, text));
        }
        Ok(response.bytes().await?)
    }

    pub fn upstream_url(&self, path: &str) -> Result<Url, GatewayError> {
        let mut base = Url::parse(&self.config.server_url).map_err(|e| {
            BackendError::NotConfigured(format!("query store URL {}: {}", self.config.server_url, e))
        })?;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path.trim_start_matches('/'))
            .map_err(|e| GatewayError::parameter(format!("Invalid query store path {}: {}", path, e)))
    }

    fn authenticate(&self, builder: RequestBuilder) -> Result<RequestBuilder, GatewayError> {
        if !self.config.use_sasl {
            return Ok(builder);
        }
        let token = self.config.negotiate_token.as_deref().ok_or_else(|| {
            BackendError::NotConfigured("query store credential negotiation (no negotiate token)".to_string())
        })?;
        Ok(builder.header(AUTHORIZATION, format!("Negotiate {}", token)))
    }
}

/// Bundle ids name a single upstream path segment
fn check_bundle_id(id: &str) -> Result<(), GatewayError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(GatewayError::parameter(format!("Invalid bundle id: {}", id)))
    }
}

fn upstream_error(status: reqwest::StatusCode, content: String) -> GatewayError {
    let reason = status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    GatewayError::Upstream {
        code: status.as_u16(),
        reason,
        content,
    }
}

/// Upstream bodies are JSON; anything else is relayed as a string
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(server_url: &str) -> QueryStoreConfig {
        QueryStoreConfig {
            server_url: server_url.to_string(),
            use_proxy: true,
            use_sasl: false,
            negotiate_token: None,
        }
    }

    #[test]
    fn upstream_url_joins_sub_path() {
        let client = reqwest::Client::new();
        let backends = Backends::new();
        let cfg = config("http://das.internal:8190/das");
        let service = QueryStoreService::new(&client, &cfg, &backends);
        let url = service.upstream_url("/api/query/search").unwrap();
        assert_eq!(url.as_str(), "http://das.internal:8190/das/api/query/search");
    }

    #[test]
    fn sasl_without_token_is_rejected() {
        let client = reqwest::Client::new();
        let backends = Backends::new();
        let mut cfg = config("http://das.internal:8190");
        cfg.use_sasl = true;
        let service = QueryStoreService::new(&client, &cfg, &backends);
        assert!(service.authenticate(client.get("http://das.internal:8190")).is_err());

        cfg.negotiate_token = Some("YIIC".to_string());
        let service = QueryStoreService::new(&client, &cfg, &backends);
        let request = service
            .authenticate(client.get("http://das.internal:8190"))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Negotiate YIIC");
    }

    #[test]
    fn non_json_bodies_are_relayed_as_text() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body(r#"{"queries": []}"#), json!({"queries": []}));
        assert_eq!(parse_body("ok"), json!("ok"));
    }

    #[test]
    fn unknown_status_has_a_reason() {
        let status = reqwest::StatusCode::from_u16(599).unwrap();
        match upstream_error(status, "x".to_string()) {
            GatewayError::Upstream { code, reason, .. } => {
                assert_eq!(code, 599);
                assert_eq!(reason, "HTTP 599");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn bundle_ids_are_single_segments() {
        assert!(check_bundle_id("q42").is_ok());
        assert!(check_bundle_id("hive_query-7").is_ok());
        for id in ["", "../../api/admin/users", "a/b", "a\\b", "..", "q 1", "q%2F1"] {
            assert!(check_bundle_id(id).is_err(), "accepted {id:?}");
        }
    }
}
