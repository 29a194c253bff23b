use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use todogenius_core::category::Category;
use todogenius_core::context::{ContextEntry, ContextFilter, CreateContext};
use todogenius_core::suggestion::Enhancement;
use todogenius_core::task::{Task, TaskFilter, TaskPayload};
use tracing::{debug, warn};

use crate::{ServiceError, TodoService};

/// Every endpoint wraps its result as `{"success", "message", "data"}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "assume_success")]
    success: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

fn assume_success() -> bool {
    true
}

/// Async HTTP client implementation of TodoService.
pub struct HttpService {
    base_url: String,
    client: Client,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, ServiceError> {
        builder.send().await.map_err(|e| {
            warn!("request failed: {e}");
            ServiceError::Unavailable(e.to_string())
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ServiceError> {
        debug!(path, ?query, "GET");
        let resp = self.send(self.client.get(self.url(path)).query(query)).await?;
        handle_response(resp).await
    }

    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        debug!(path, "POST");
        let resp = self.send(self.client.post(self.url(path)).json(body)).await?;
        handle_response(resp).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        debug!(path, "POST");
        let resp = self.send(self.client.post(self.url(path))).await?;
        handle_response(resp).await
    }

    async fn put_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        debug!(path, "PUT");
        let resp = self.send(self.client.put(self.url(path)).json(body)).await?;
        handle_response(resp).await
    }

    async fn delete_req(&self, path: &str) -> Result<(), ServiceError> {
        debug!(path, "DELETE");
        let resp = self.send(self.client.delete(self.url(path))).await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(parse_error(resp).await)
        }
    }
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ServiceError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(parse_error_with_status(status, resp).await);
    }
    let envelope = resp
        .json::<Envelope<T>>()
        .await
        .map_err(|e| ServiceError::Internal(format!("json decode: {e}")))?;
    if !envelope.success {
        return Err(ServiceError::Internal(envelope.message));
    }
    envelope
        .data
        .ok_or_else(|| ServiceError::Internal("response missing data".into()))
}

async fn parse_error(resp: reqwest::Response) -> ServiceError {
    let status = resp.status();
    parse_error_with_status(status, resp).await
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> ServiceError {
    let body = resp.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            ["message", "error", "detail"]
                .iter()
                .find_map(|k| v[*k].as_str().map(String::from))
        })
        .unwrap_or_default();
    warn!(%status, message = %msg, "api error");

    if status == StatusCode::NOT_FOUND {
        ServiceError::NotFound(msg)
    } else if status == StatusCode::BAD_REQUEST {
        ServiceError::InvalidInput(msg)
    } else {
        ServiceError::Internal(msg)
    }
}

#[async_trait]
impl TodoService for HttpService {
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ServiceError> {
        self.get_json("/tasks/tasks-list/", &filter.query_pairs()).await
    }

    async fn create_task(&self, payload: &TaskPayload) -> Result<Task, ServiceError> {
        self.post_json("/tasks/tasks-list/", payload).await
    }

    async fn update_task(&self, id: &str, payload: &TaskPayload) -> Result<Task, ServiceError> {
        self.put_json(&format!("/tasks/{id}/"), payload).await
    }

    async fn delete_task(&self, id: &str) -> Result<(), ServiceError> {
        self.delete_req(&format!("/tasks/{id}/")).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ServiceError> {
        self.get_json("/tasks/categories/", &[]).await
    }

    async fn list_context(&self, filter: &ContextFilter) -> Result<Vec<ContextEntry>, ServiceError> {
        self.get_json("/context/", &filter.query_pairs()).await
    }

    async fn create_context(&self, input: &CreateContext) -> Result<ContextEntry, ServiceError> {
        self.post_json("/context/", input).await
    }

    async fn delete_context(&self, id: &str) -> Result<(), ServiceError> {
        self.delete_req(&format!("/context/{id}/")).await
    }

    async fn mark_context_processed(&self, id: &str) -> Result<ContextEntry, ServiceError> {
        self.post_empty(&format!("/context/{id}/mark-processed/"))
            .await
    }

    async fn enhance_task(&self, title: &str) -> Result<Enhancement, ServiceError> {
        self.post_json(
            "/ai/enhance-task/",
            &serde_json::json!({ "task_name": title }),
        )
        .await
    }
}
