//! HTTP Backend
//!
//! reqwest implementation of [`LinkBackend`] against the `/links/api/*`
//! surface. Non-2xx responses are expected to carry `{"error": "..."}`;
//! absence of a parseable body degrades to a generic failure message.

use crate::backend::api::{BulkResult, CreateResult, LinkBackend, ResolvedTypes};
use crate::backend::error::BackendError;
use crate::models::{CreateLinkPayload, Link, LinkPatch, RecordRef, Summary};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

const GENERIC_FAILURE: &str = "request_failed";

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Deserialize)]
struct LinkList {
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Deserialize)]
struct ResolveBody {
    #[serde(default)]
    resolved: HashMap<String, ResolvedTypes>,
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(default)]
    results: Vec<RecordRef>,
}

/// [`LinkBackend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend against a base URL (e.g. `http://localhost:5000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a backend with a caller-configured client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read a JSON body, mapping non-2xx responses to `BackendError::Api`.
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            return Err(BackendError::api(status.as_u16(), message));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl LinkBackend for HttpBackend {
    async fn list_outgoing(&self, src: &RecordRef) -> Result<Vec<Link>, BackendError> {
        let response = self
            .client
            .get(self.url("/links/api/outgoing"))
            .query(&[("src_type", src.record_type.as_str()), ("src_id", src.id.as_str())])
            .send()
            .await?;
        Ok(Self::read_json::<LinkList>(response).await?.links)
    }

    async fn list_incoming(&self, dst: &RecordRef) -> Result<Vec<Link>, BackendError> {
        let response = self
            .client
            .get(self.url("/links/api/incoming"))
            .query(&[("dst_type", dst.record_type.as_str()), ("dst_id", dst.id.as_str())])
            .send()
            .await?;
        Ok(Self::read_json::<LinkList>(response).await?.links)
    }

    async fn get_summary(&self, record: &RecordRef) -> Result<Summary, BackendError> {
        let response = self
            .client
            .get(self.url("/links/api/summary"))
            .query(&[("type", record.record_type.as_str()), ("id", record.id.as_str())])
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn resolve_types(
        &self,
        context_type: &str,
        src_type: &str,
        dst_types: &[String],
    ) -> Result<HashMap<String, ResolvedTypes>, BackendError> {
        let response = self
            .client
            .post(self.url("/links/api/resolve"))
            .json(&json!({
                "context_type": context_type,
                "src_type": src_type,
                "dst_types": dst_types,
            }))
            .send()
            .await?;
        Ok(Self::read_json::<ResolveBody>(response).await?.resolved)
    }

    async fn create_link(&self, payload: &CreateLinkPayload) -> Result<CreateResult, BackendError> {
        let response = self
            .client
            .post(self.url("/links/api/create"))
            .json(payload)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn bulk_create(&self, items: &[CreateLinkPayload]) -> Result<BulkResult, BackendError> {
        let response = self
            .client
            .post(self.url("/links/api/bulk"))
            .json(&json!({ "items": items }))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn update_link(&self, link_id: i64, patch: &LinkPatch) -> Result<(), BackendError> {
        let response = self
            .client
            .patch(self.url(&format!("/links/api/update/{link_id}")))
            .json(patch)
            .send()
            .await?;
        Self::read_json::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn delete_link(&self, link_id: i64) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.url(&format!("/links/api/delete/{link_id}")))
            .send()
            .await?;
        Self::read_json::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn search_records(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RecordRef>, BackendError> {
        let response = self
            .client
            .get(self.url("/links/api/search"))
            .query(&[("q", query), ("limit", &limit.to_string())])
            .send()
            .await?;
        Ok(Self::read_json::<SearchBody>(response).await?.results)
    }
}
