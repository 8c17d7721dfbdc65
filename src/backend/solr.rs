//! Collection listing through the Solr collections admin API

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{BackendError, BackendResult, SearchApi};

#[derive(Deserialize)]
struct ListCollectionsResp {
    #[serde(default)]
    collections: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SolrClient {
    client: reqwest::Client,
    base_url: Url,
}

impl SolrClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> BackendResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BackendError::NotConfigured(format!("invalid Solr URL {}: {}", base_url, e)))?;
        Ok(Self { client, base_url })
    }

    /// `admin/collections?action=LIST`, impersonating `user`
    pub fn list_url(&self, user: &str) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("{}/admin/collections", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url.query_pairs_mut()
            .append_pair("action", "LIST")
            .append_pair("wt", "json")
            .append_pair("doAs", user);
        url
    }
}

#[async_trait]
impl SearchApi for SolrClient {
    async fn collections(&self, user: &str) -> BackendResult<Vec<String>> {
        let response = self
            .client
            .get(self.list_url(user))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Failed(format!(
                "Solr returned {}: {}",
                status,
                body.trim()
            )));
        }

        let list: ListCollectionsResp = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;
        Ok(list.collections)
    }
}
