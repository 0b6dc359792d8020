// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! HTTP implementation of the remote authority.
//!
//! ```text
//! GET    {base}/health
//! PUT    {base}/records/{kind}/{id}      -> { "revision": "..." }
//! DELETE {base}/records/{kind}/{id}      (404 counts as deleted)
//! GET    {base}/records?owner={user}     -> [RecordEnvelope]
//! ```

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use stint_core::RecordKind;
use tracing::debug;

use super::remote::{Ack, RecordEnvelope, Remote, RemoteError, RemoteFuture, RemoteResult};

/// Remote authority reached over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRemote {
    /// Create a remote for `base_url`, with `timeout` applied to every request.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(format!("failed to build client: {e}")))?;
        Ok(HttpRemote {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn record_url(&self, kind: RecordKind, id: &str) -> String {
        format!("{}/records/{}/{}", self.base_url, kind.as_str(), id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(transport_error)?;
        Ok(response)
    }
}

fn transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout
    } else if e.is_decode() {
        RemoteError::Decode(e.to_string())
    } else {
        RemoteError::Network(e.to_string())
    }
}

async fn rejected(response: Response) -> RemoteError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    RemoteError::Rejected { status, message }
}

impl Remote for HttpRemote {
    fn probe(&self) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            let url = format!("{}/health", self.base_url);
            let response = self.send(self.client.get(url)).await?;
            if !response.status().is_success() {
                return Err(rejected(response).await);
            }
            Ok(())
        })
    }

    fn upsert(&self, record: RecordEnvelope) -> RemoteFuture<'_, Ack> {
        Box::pin(async move {
            debug!(kind = %record.kind, id = %record.id, "uploading record");
            let url = self.record_url(record.kind, &record.id);
            let response = self.send(self.client.put(url).json(&record)).await?;
            if !response.status().is_success() {
                return Err(rejected(response).await);
            }
            // An empty body is a valid acknowledgement without a revision.
            let body = response.bytes().await.map_err(transport_error)?;
            if body.is_empty() {
                return Ok(Ack::default());
            }
            serde_json::from_slice(&body)
                .map_err(|e| RemoteError::Decode(format!("failed to parse ack: {e}")))
        })
    }

    fn delete(&self, kind: RecordKind, id: &str) -> RemoteFuture<'_, ()> {
        let url = self.record_url(kind, id);
        Box::pin(async move {
            debug!(%url, "deleting record");
            let response = self.send(self.client.delete(url)).await?;
            if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
                return Err(rejected(response).await);
            }
            Ok(())
        })
    }

    fn fetch(&self, owner_user_id: &str) -> RemoteFuture<'_, Vec<RecordEnvelope>> {
        let owner = owner_user_id.to_string();
        Box::pin(async move {
            let url = format!("{}/records", self.base_url);
            let request = self.client.get(url).query(&[("owner", owner.as_str())]);
            let response = self.send(request).await?;
            if !response.status().is_success() {
                return Err(rejected(response).await);
            }
            response
                .json::<Vec<RecordEnvelope>>()
                .await
                .map_err(transport_error)
        })
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
