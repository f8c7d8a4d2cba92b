//! HTTP implementation of [`WorkflowBackend`] against the n8n public API

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;

use super::models::{Execution, HealthStatus, ListEnvelope, Workflow};
use super::retry::RetryPolicy;
use super::{ExecutionQuery, WorkflowBackend};
use crate::config::Config;
use crate::error::{N8nError, N8nResult};

const API_KEY_HEADER: &str = "X-N8N-API-KEY";

/// Async client for the n8n REST API
///
/// Owns one connection pool. Dropping the client releases it; cancelling the
/// client's token abandons any in-flight request or backoff sleep.
#[derive(Debug, Clone)]
pub struct N8nClient {
    http: reqwest::Client,
    base_url: String,
    base: Url,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl N8nClient {
    /// Build a client from configuration
    pub fn new(config: &Config) -> N8nResult<Self> {
        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(&config.n8n_api_key)
            .map_err(|e| N8nError::Configuration(format!("API key is not a valid header value: {}", e)))?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| N8nError::Configuration(e.to_string()))?;

        let base_url = config.api_base_url();
        let base = Url::parse(&base_url)
            .map_err(|e| N8nError::Configuration(format!("Invalid n8n URL '{}': {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(N8nError::Configuration(format!("Invalid n8n URL '{}'", base_url)));
        }
        tracing::info!(base_url = %base_url, "n8n client initialized");

        Ok(Self {
            http,
            base_url,
            base,
            retry: RetryPolicy::with_max_attempts(config.n8n_max_retries),
            cancel: CancellationToken::new(),
        })
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Tie in-flight calls to a shutdown token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Base URL of the API, including `/api/v1`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Abandon in-flight calls and refuse new ones
    pub fn close(&self) {
        self.cancel.cancel();
        tracing::debug!("n8n client closed");
    }

    /// Resolve path segments under the API base
    ///
    /// Each segment is percent-encoded on its own, so an id containing `/`,
    /// `?` or `..` stays inside its segment. Empty and dot segments are
    /// rejected.
    fn url_for(&self, segments: &[&str]) -> N8nResult<Url> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(N8nError::Validation(format!("Invalid resource id '{}'", bad)));
        }

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| N8nError::Configuration(format!("Invalid n8n URL '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, retrying network failures per the policy
    async fn request(
        &self,
        method: Method,
        path: &[&str],
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> N8nResult<Value> {
        let url = self.url_for(path)?;
        let mut attempt = 1;
        loop {
            match self.send_once(method.clone(), &url, query, body).await {
                Ok(value) => return Ok(value),
                Err(err) if self.retry.should_retry(&err, attempt) => {
                    let delay = self.retry.backoff_for(attempt - 1);
                    tracing::warn!(
                        method = %method,
                        path = url.path(),
                        attempt,
                        delay_secs = delay.as_secs_f64(),
                        error = %err,
                        "Retrying n8n request"
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(N8nError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(
        &self,
        method: Method,
        url: &Url,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> N8nResult<Value> {
        if self.cancel.is_cancelled() {
            return Err(N8nError::Cancelled);
        }

        tracing::debug!(method = %method, path = url.path(), "n8n API request");

        let mut builder = self.http.request(method, url.clone());
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = tokio::select! {
            _ = self.cancel.cancelled() => return Err(N8nError::Cancelled),
            result = builder.send() => result.map_err(classify_transport_error)?,
        };

        handle_response(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &[&str]) -> N8nResult<T> {
        let value = self.request(Method::GET, path, &[], None).await?;
        decode(value)
    }
}

/// Map a transport failure onto the connection error
fn classify_transport_error(err: reqwest::Error) -> N8nError {
    if err.is_timeout() {
        N8nError::connection(format!("request timed out: {}", err))
    } else {
        N8nError::connection(err)
    }
}

/// Translate status codes and decode the body
///
/// A 204 or an empty body is an empty object, not a decode failure.
async fn handle_response(response: Response) -> N8nResult<Value> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(classify_transport_error)?;

    if status.is_success() {
        if status == StatusCode::NO_CONTENT || bytes.is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        return serde_json::from_slice(&bytes).map_err(|e| N8nError::InvalidResponse(e.to_string()));
    }

    let message = serde_json::from_slice::<Value>(&bytes)
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| status.to_string());

    Err(match status.as_u16() {
        401 | 403 => {
            tracing::error!(status = status.as_u16(), %message, "n8n authentication error");
            N8nError::Auth(message)
        }
        404 => {
            tracing::warn!(%message, "n8n resource not found");
            N8nError::NotFound(message)
        }
        400 => {
            tracing::warn!(%message, "n8n validation error");
            N8nError::Validation(message)
        }
        code => {
            tracing::error!(status = code, %message, "n8n API error");
            N8nError::Remote { status: code, message }
        }
    })
}

fn decode<T: DeserializeOwned>(value: Value) -> N8nResult<T> {
    serde_json::from_value(value).map_err(|e| N8nError::InvalidResponse(e.to_string()))
}

fn to_body<T: serde::Serialize>(value: &T) -> N8nResult<Value> {
    serde_json::to_value(value).map_err(|e| N8nError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl WorkflowBackend for N8nClient {
    async fn health_check(&self) -> N8nResult<HealthStatus> {
        let probe = [("limit", "1".to_string())];
        match self.request(Method::GET, &["workflows"], &probe, None).await {
            Ok(_) => Ok(HealthStatus {
                status: "healthy".to_string(),
                url: self.base_url.clone(),
                message: "Successfully connected to n8n".to_string(),
            }),
            Err(N8nError::Cancelled) => Err(N8nError::Cancelled),
            Err(err) => {
                tracing::error!(error = %err, "n8n health check failed");
                Err(N8nError::Connection(format!("Health check failed: {}", err)))
            }
        }
    }

    async fn list_workflows(&self, active: Option<bool>, tags: &[String]) -> N8nResult<Vec<Workflow>> {
        let mut query = Vec::new();
        if let Some(active) = active {
            query.push(("active", active.to_string()));
        }
        if !tags.is_empty() {
            query.push(("tags", tags.join(",")));
        }

        let body = self.request(Method::GET, &["workflows"], &query, None).await?;
        let workflows: Vec<Workflow> = ListEnvelope::from_value(body).into_items()?;
        tracing::info!(count = workflows.len(), "Listed workflows");
        Ok(workflows)
    }

    async fn get_workflow(&self, id: &str) -> N8nResult<Workflow> {
        let workflow = self.get_json(&["workflows", id]).await?;
        tracing::info!(workflow_id = %id, "Retrieved workflow");
        Ok(workflow)
    }

    async fn create_workflow(&self, definition: &Workflow) -> N8nResult<Workflow> {
        let body = to_body(definition)?;
        let created: Workflow = decode(self.request(Method::POST, &["workflows"], &[], Some(&body)).await?)?;
        tracing::info!(workflow_id = %created.id_str(), "Created workflow");
        Ok(created)
    }

    async fn update_workflow(&self, id: &str, definition: &Workflow) -> N8nResult<Workflow> {
        let body = to_body(definition)?;
        let updated = decode(
            self.request(Method::PUT, &["workflows", id], &[], Some(&body))
                .await?,
        )?;
        tracing::info!(workflow_id = %id, "Updated workflow");
        Ok(updated)
    }

    async fn delete_workflow(&self, id: &str) -> N8nResult<bool> {
        self.request(Method::DELETE, &["workflows", id], &[], None)
            .await?;
        tracing::info!(workflow_id = %id, "Deleted workflow");
        Ok(true)
    }

    async fn execute_workflow(&self, id: &str, data: Option<&Value>) -> N8nResult<Execution> {
        let body = match data {
            Some(data) if !is_empty_payload(data) => json!({ "data": data }),
            _ => json!({}),
        };
        let path = ["workflows", id, "execute"];
        let execution: Execution = decode(self.request(Method::POST, &path, &[], Some(&body)).await?)?;
        tracing::info!(workflow_id = %id, execution_id = %execution.id_str(), "Executed workflow");
        Ok(execution)
    }

    async fn get_executions(&self, query: &ExecutionQuery) -> N8nResult<Vec<Execution>> {
        let mut params = vec![("limit", query.limit.to_string())];
        if let Some(workflow_id) = query.workflow_id.as_deref().filter(|id| !id.is_empty()) {
            params.push(("workflowId", workflow_id.to_string()));
        }
        if let Some(status) = query.status {
            params.push(("status", status.as_str().to_string()));
        }

        let body = self.request(Method::GET, &["executions"], &params, None).await?;
        let executions: Vec<Execution> = ListEnvelope::from_value(body).into_items()?;
        tracing::info!(count = executions.len(), "Retrieved executions");
        Ok(executions)
    }

    async fn get_execution(&self, id: &str) -> N8nResult<Execution> {
        let execution = self.get_json(&["executions", id]).await?;
        tracing::info!(execution_id = %id, "Retrieved execution");
        Ok(execution)
    }

    async fn delete_execution(&self, id: &str) -> N8nResult<bool> {
        self.request(Method::DELETE, &["executions", id], &[], None)
            .await?;
        tracing::info!(execution_id = %id, "Deleted execution");
        Ok(true)
    }
}

/// `null`, `{}`, `[]` and `""` carry no input data
fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
