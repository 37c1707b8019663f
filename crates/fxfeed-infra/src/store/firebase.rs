//! Firebase Realtime Database backend over its REST and streaming API.
//!
//! - Plain reads and writes map to `GET`/`PUT`/`PATCH`/`POST`/`DELETE` on
//!   `{database_url}/{path}.json`.
//! - Transactions use conditional writes: the value is read with
//!   `X-Firebase-ETag: true` and written back with `if-match`; a
//!   `412 Precondition Failed` carries the fresh value and ETag, and the
//!   transaction body is re-run against it.
//! - Listeners hold an `text/event-stream` connection open and replay the
//!   `put`/`patch` events onto a local copy of the watched subtree.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, ETAG, IF_MATCH};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use fxfeed_core::StoreError;
use fxfeed_core::ports::store::{RemoteStore, StoreWatch, TransactionFn, path_segments};
use fxfeed_core::store::{PushIdGenerator, tree};

use super::sse::{SseDecoder, apply_change};

/// Firebase store configuration.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// e.g. `https://my-app-default-rtdb.firebaseio.com`
    pub database_url: String,
    /// ID token or database secret, sent as the `auth` query parameter.
    pub auth_token: Option<String>,
    pub request_timeout: Duration,
    /// Conditional-write attempts before a transaction gives up.
    pub max_transaction_attempts: u32,
    /// Changes a slow listener may fall behind before it skips ahead.
    pub listener_buffer: usize,
}

impl FirebaseConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
            request_timeout: Duration::from_secs(30),
            max_transaction_attempts: 25,
            listener_buffer: 64,
        }
    }

    /// `None` when no database URL is configured. The mobile app's
    /// `EXPO_PUBLIC_` variables are accepted as a fallback.
    pub fn from_env() -> Option<Self> {
        let database_url = env_with_fallback("FIREBASE_DATABASE_URL")?;
        let mut config = Self::new(database_url);
        config.auth_token = env_with_fallback("FIREBASE_AUTH_TOKEN");
        if let Some(secs) = std::env::var("FIREBASE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.request_timeout = Duration::from_secs(secs);
        }
        Some(config)
    }
}

fn env_with_fallback(name: &str) -> Option<String> {
    std::env::var(name)
        .or_else(|_| std::env::var(format!("EXPO_PUBLIC_{name}")))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// `POST` response body.
#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

fn connection_error(err: reqwest::Error) -> StoreError {
    // The URL carries the auth token.
    StoreError::Connection(err.without_url().to_string())
}

async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);
    Err(StoreError::Request {
        status: status.as_u16(),
        message,
    })
}

async fn read_value(response: Response) -> Result<Option<Value>, StoreError> {
    let value: Value = response.json().await.map_err(connection_error)?;
    let value = tree::normalize(value);
    Ok((!value.is_null()).then_some(value))
}

fn read_etag(response: &Response) -> Result<String, StoreError> {
    response
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| StoreError::Request {
            status: response.status().as_u16(),
            message: "response carried no ETag".to_string(),
        })
}

pub struct FirebaseStore {
    client: Client,
    config: FirebaseConfig,
    push_ids: PushIdGenerator,
}

impl FirebaseStore {
    pub fn new(config: FirebaseConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(connection_error)?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: FirebaseConfig) -> Self {
        tracing::info!(database_url = %config.database_url, "Firebase store configured");
        Self {
            client,
            config,
            push_ids: PushIdGenerator::new(),
        }
    }

    fn url(&self, path: &str) -> Result<String, StoreError> {
        let segments = path_segments(path)?;
        Ok(format!("{}/{}.json", self.config.database_url, segments.join("/")))
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self.authed(request).send().await.map_err(connection_error)?;
        ensure_success(response).await
    }

    /// Current value and its ETag.
    async fn get_versioned(&self, url: &str) -> Result<(String, Option<Value>), StoreError> {
        let response = self
            .send(self.client.get(url).header("X-Firebase-ETag", "true"))
            .await?;
        let etag = read_etag(&response)?;
        Ok((etag, read_value(response).await?))
    }
}

#[async_trait]
impl RemoteStore for FirebaseStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let url = self.url(path)?;
        let response = self.send(self.client.get(&url)).await?;
        tracing::trace!(path, "Firebase get");
        read_value(response).await
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let url = self.url(path)?;
        let value = tree::normalize(value);
        let request = if value.is_null() {
            self.client.delete(&url)
        } else {
            self.client.put(&url).query(&[("print", "silent")]).json(&value)
        };
        self.send(request).await?;
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let url = self.url(path)?;
        let mut body = Map::with_capacity(fields.len());
        for (key, value) in fields {
            let segments = path_segments(&key)?;
            if segments.is_empty() {
                return Err(StoreError::InvalidPath(key));
            }
            body.insert(segments.join("/"), tree::normalize(value));
        }
        if body.is_empty() {
            return Ok(());
        }

        self.send(
            self.client
                .patch(&url)
                .query(&[("print", "silent")])
                .json(&Value::Object(body)),
        )
        .await?;
        Ok(())
    }

    fn generate_key(&self) -> String {
        self.push_ids.next_id()
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let url = self.url(path)?;
        let response = self
            .send(self.client.post(&url).json(&tree::normalize(value)))
            .await?;
        let pushed: PushResponse = response.json().await.map_err(connection_error)?;
        Ok(pushed.name)
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let url = self.url(path)?;
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    async fn transaction(
        &self,
        path: &str,
        apply: TransactionFn<'_>,
    ) -> Result<Option<Value>, StoreError> {
        let url = self.url(path)?;
        let (mut etag, mut current) = self.get_versioned(&url).await?;

        for attempt in 1..=self.config.max_transaction_attempts {
            let Some(next) = apply(current.as_ref()) else {
                return Ok(None);
            };
            let next = tree::normalize(next);

            let response = self
                .authed(self.client.put(&url).header(IF_MATCH, &etag).json(&next))
                .send()
                .await
                .map_err(connection_error)?;

            if response.status() != StatusCode::PRECONDITION_FAILED {
                ensure_success(response).await?;
                return Ok(Some(next));
            }

            tracing::debug!(path, attempt, "Transaction lost a race; retrying");
            etag = read_etag(&response)?;
            current = read_value(response).await?;
        }

        tracing::warn!(path, "Transaction abandoned after repeated conflicts");
        Err(StoreError::Conflict {
            path: path.to_string(),
            attempts: self.config.max_transaction_attempts,
        })
    }

    async fn subscribe(&self, path: &str) -> Result<StoreWatch, StoreError> {
        let url = self.url(path)?;
        // No request timeout: the stream stays open for the life of the watch.
        let request = Client::builder()
            .build()
            .map_err(connection_error)?
            .get(&url)
            .header(ACCEPT, "text/event-stream");
        let response = ensure_success(
            self.authed(request)
                .send()
                .await
                .map_err(connection_error)?,
        )
        .await?;

        let (tx, rx) = broadcast::channel(self.config.listener_buffer.max(1));
        tokio::spawn(listen(path.to_string(), response, tx));
        Ok(StoreWatch::new(rx))
    }
}

/// Drive one event stream until the server cancels it or every receiver is
/// gone. Dropping `tx` ends the watch.
async fn listen(path: String, response: Response, tx: broadcast::Sender<Option<Value>>) {
    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::default();
    let mut snapshot = Value::Null;

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(path = %path, error = %e.without_url(), "Listener stream failed");
                return;
            }
        };

        for event in decoder.feed(&chunk) {
            match event.name.as_str() {
                "put" | "patch" => {
                    if let Err(e) = apply_change(&mut snapshot, &event) {
                        tracing::warn!(path = %path, error = %e, "Skipping malformed change event");
                        continue;
                    }
                    let current = tree::lookup(&snapshot, &[]).cloned();
                    if tx.send(current).is_err() {
                        tracing::debug!(path = %path, "Listener dropped");
                        return;
                    }
                }
                "keep-alive" => {}
                "cancel" | "auth_revoked" => {
                    tracing::warn!(path = %path, reason = %event.name, "Listener closed by server");
                    return;
                }
                other => tracing::debug!(path = %path, event = other, "Ignoring stream event"),
            }
        }

        if tx.receiver_count() == 0 {
            return;
        }
    }
    tracing::debug!(path = %path, "Listener stream ended");
}
