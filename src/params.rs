//! Request parameter extraction.
//!
//! Admin UI calls post form fields whose values are themselves JSON
//! (`interface="\"jobs\""`, `filters="[{\"state\":\"running\"}]"`), some send a
//! raw JSON body, and a few read the query string. `RequestParams` keeps all
//! three and hands out typed values, turning missing or malformed fields into
//! parameter errors.

use std::collections::HashMap;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::GatewayError;
use crate::types::is_truthy;

#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    form: HashMap<String, String>,
    query: Vec<(String, String)>,
    body: Bytes,
}

#[async_trait]
impl<S> FromRequest<S> for RequestParams
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = req.uri().query().map(parse_pairs).unwrap_or_default();
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        let body = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::warn!(error = %e, "could not read request body");
            GatewayError::parameter(format!("Could not read request body: {}", e))
        })?;

        let form = if is_form {
            url::form_urlencoded::parse(&body).into_owned().collect()
        } else {
            HashMap::new()
        };

        Ok(Self { form, query, body })
    }
}

fn parse_pairs(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

impl RequestParams {
    pub fn new(form: HashMap<String, String>, query: Vec<(String, String)>, body: Bytes) -> Self {
        Self { form, query, body }
    }

    /// Raw value of a field, looked up in the form first and the query string second
    pub fn text_opt(&self, key: &str) -> Option<&str> {
        self.form
            .get(key)
            .map(String::as_str)
            .or_else(|| self.query(key))
    }

    pub fn text(&self, key: &str) -> Result<&str, GatewayError> {
        self.text_opt(key)
            .ok_or_else(|| GatewayError::parameter(format!("Missing parameter: {}", key)))
    }

    /// Decode a JSON-encoded field
    pub fn json<T: DeserializeOwned>(&self, key: &str) -> Result<T, GatewayError> {
        let raw = self.text(key)?;
        serde_json::from_str(raw)
            .map_err(|e| GatewayError::parameter(format!("Malformed parameter {}: {}", key, e)))
    }

    /// Decode a JSON-encoded field, falling back to `default` when absent
    pub fn json_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, GatewayError> {
        match self.text_opt(key) {
            Some(_) => self.json(key),
            None => Ok(default),
        }
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        if self.body.is_empty() {
            return Err(GatewayError::parameter("Missing JSON body"));
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| GatewayError::parameter(format!("Malformed JSON body: {}", e)))
    }

    /// Decode a filter list field (`[{key: value}, ...]`) into a filter map
    pub fn filters(&self, key: &str) -> Result<Map<String, Value>, GatewayError> {
        let entries: Vec<Map<String, Value>> = self.json_or(key, Vec::new())?;
        Ok(filter_map(entries))
    }
}

/// Merge filter entries into one map, dropping entries with empty values
pub fn filter_map(entries: Vec<Map<String, Value>>) -> Map<String, Value> {
    entries
        .into_iter()
        .flatten()
        .filter(|(_, value)| is_truthy(value))
        .collect()
}
