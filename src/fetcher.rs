use std::sync::Arc;

use anyhow::{Context as _, anyhow};
use bytes::Bytes;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::progress::{DownloadKind, Progress};

/// Sequential HTTP transport shared by the upstream client and the image
/// fetcher. Nothing is retried.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    progress: Option<Arc<Progress>>,
}

impl Fetcher {
    pub fn new(user_agent: &str, progress: Option<Arc<Progress>>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build reqwest client")?;
        Ok(Self { client, progress })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Plain GET that hands back non-success responses instead of failing;
    /// only transport errors are `Err`.
    pub async fn get_with_status(
        &self,
        kind: DownloadKind,
        url: Url,
    ) -> anyhow::Result<(StatusCode, Bytes)> {
        if let Some(p) = &self.progress {
            p.http_start(kind, &url);
        }
        let result = fetch_any(&url, self.client.get(url.clone())).await;
        if let Some(p) = &self.progress {
            match &result {
                Ok((status, bytes)) if status.is_success() => p.http_ok(kind, &url, bytes.len()),
                _ => p.http_err(kind, &url),
            }
        }
        result
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        kind: DownloadKind,
        url: Url,
        bearer: &str,
    ) -> anyhow::Result<T> {
        let request = self.client.get(url.clone()).bearer_auth(bearer);
        let bytes = self.send(kind, &url, request).await?;
        serde_json::from_slice(&bytes).with_context(|| format!("parse json from {url}"))
    }

    /// Sends a prepared request and returns the body of a successful response.
    pub async fn send(
        &self,
        kind: DownloadKind,
        url: &Url,
        request: RequestBuilder,
    ) -> anyhow::Result<Bytes> {
        if let Some(p) = &self.progress {
            p.http_start(kind, url);
        }
        let result = fetch_body(url, request).await;
        if let Some(p) = &self.progress {
            match &result {
                Ok(bytes) => p.http_ok(kind, url, bytes.len()),
                Err(_) => p.http_err(kind, url),
            }
        }
        result
    }
}

async fn fetch_body(url: &Url, request: RequestBuilder) -> anyhow::Result<Bytes> {
    let (status, bytes) = fetch_any(url, request).await?;
    if !status.is_success() {
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(%url, "upstream rate limit hit");
        }
        return Err(anyhow!("request {} failed with status {}", url, status));
    }
    Ok(bytes)
}

async fn fetch_any(url: &Url, request: RequestBuilder) -> anyhow::Result<(StatusCode, Bytes)> {
    let resp = request
        .send()
        .await
        .with_context(|| format!("request {url}"))?;
    let status = resp.status();
    let bytes = resp.bytes().await.context("read response body")?;
    Ok((status, bytes))
}
