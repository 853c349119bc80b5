//! HTTP implementation of `RecordStore` for the hosted record backend.
//!
//! Endpoints:
//! - `GET    /api/collections/{c}/records?page&perPage&filter&expand&skipTotal`
//! - `GET    /api/collections/{c}/records/{id}?expand`
//! - `POST   /api/collections/{c}/records`
//! - `PATCH  /api/collections/{c}/records/{id}`
//! - `DELETE /api/collections/{c}/records/{id}`
//! - `GET    /api/collections/{c}/records/full-text-search?search`

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{ListOptions, RecordStore};
use crate::types::collection::Collection;
use crate::types::errors::StoreError;
use crate::types::settings::ClientSettings;

const DEFAULT_BATCH: u32 = 500;

/// One page of a list response.
#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    items: Vec<Value>,
}

/// Record store talking to the backend over HTTP with `reqwest`.
pub struct HttpRecordStore {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpRecordStore {
    /// Builds a store from client settings. The request timeout comes from
    /// `server.timeout_secs`.
    pub fn new(settings: &ClientSettings) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.server.timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let raw = settings.server.base_url.trim_end_matches('/');
        let base_url = Url::parse(raw).map_err(|e| StoreError::Network(format!("invalid base url {}: {}", raw, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Network(format!("invalid base url {}", raw)));
        }

        Ok(Self {
            client,
            base_url,
            auth_token: settings.account.auth_token.clone(),
        })
    }

    /// Appends percent-encoded path segments to the base url.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn records_url(&self, collection: Collection) -> Url {
        let name = collection.to_string();
        self.endpoint(["api", "collections", name.as_str(), "records"])
    }

    fn record_url(&self, collection: Collection, id: &str) -> Url {
        let name = collection.to_string();
        self.endpoint(["api", "collections", name.as_str(), "records", id])
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header("Authorization", token),
            None => request,
        }
    }

    /// Sends a request and returns the JSON body, mapping non-success statuses
    /// to `StoreError::Status` with the backend's message.
    async fn execute(&self, request: RequestBuilder) -> Result<Option<Value>, StoreError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or(body);
            warn!("backend returned {}: {}", status, message);
            return Err(StoreError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body).map(Some).map_err(StoreError::from)
    }

    fn not_found_as(err: StoreError, collection: Collection, id: &str) -> StoreError {
        match err {
            StoreError::Status { status: 404, .. } => StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            },
            other => other,
        }
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list(&self, collection: Collection, options: &ListOptions) -> Result<Vec<Value>, StoreError> {
        let per_page = if options.batch == 0 { DEFAULT_BATCH } else { options.batch };
        let expand = options.expand.join(",");
        let mut records = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("page", page.to_string()),
                ("perPage", per_page.to_string()),
                ("skipTotal", "1".to_string()),
            ];
            if !options.filter.is_empty() {
                query.push(("filter", options.filter.clone()));
            }
            if !expand.is_empty() {
                query.push(("expand", expand.clone()));
            }

            let request = self.client.get(self.records_url(collection)).query(&query);
            let body = self.execute(request).await?.unwrap_or(Value::Null);
            let items = serde_json::from_value::<ListPage>(body)?.items;
            let received = items.len();
            records.extend(items);

            debug!("fetched page {} of {} ({} records)", page, collection, received);
            if received < per_page as usize {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    async fn get_one(&self, collection: Collection, id: &str, expand: &[String]) -> Result<Value, StoreError> {
        let mut request = self.client.get(self.record_url(collection, id));
        if !expand.is_empty() {
            request = request.query(&[("expand", expand.join(","))]);
        }
        self.execute(request)
            .await
            .map_err(|e| Self::not_found_as(e, collection, id))?
            .ok_or_else(|| StoreError::Decode(format!("empty response for {}/{}", collection, id)))
    }

    async fn create(&self, collection: Collection, fields: Value) -> Result<Value, StoreError> {
        let request = self.client.post(self.records_url(collection)).json(&fields);
        self.execute(request)
            .await?
            .ok_or_else(|| StoreError::Decode(format!("empty response creating in {}", collection)))
    }

    async fn update(&self, collection: Collection, id: &str, fields: Value) -> Result<Value, StoreError> {
        let request = self.client.patch(self.record_url(collection, id)).json(&fields);
        self.execute(request)
            .await
            .map_err(|e| Self::not_found_as(e, collection, id))?
            .ok_or_else(|| StoreError::Decode(format!("empty response for {}/{}", collection, id)))
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let request = self.client.delete(self.record_url(collection, id));
        self.execute(request)
            .await
            .map_err(|e| Self::not_found_as(e, collection, id))?;
        Ok(())
    }

    async fn search(&self, collection: Collection, text: &str) -> Result<Vec<Value>, StoreError> {
        let name = collection.to_string();
        let url = self.endpoint(["api", "collections", name.as_str(), "records", "full-text-search"]);
        let request = self.client.get(url).query(&[("search", text)]);
        match self.execute(request).await? {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(StoreError::Decode(format!(
                "expected an array of search results, got {}",
                other
            ))),
            None => Ok(Vec::new()),
        }
    }

    async fn send(&self, path: &str, body: Value) -> Result<Value, StoreError> {
        let url = self.endpoint(path.split('/').filter(|segment| !segment.is_empty()));
        let request = self.client.post(url).json(&body);
        Ok(self.execute(request).await?.unwrap_or(Value::Null))
    }
}
