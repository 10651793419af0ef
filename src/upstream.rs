//! Minimal client for the account listing and comment endpoints.

use anyhow::Context as _;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{Config, Credentials};
use crate::fetcher::Fetcher;
use crate::post::whole_seconds;
use crate::progress::DownloadKind;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub after: Option<String>,
    pub children: Vec<Thing>,
}

/// A listing child. Children of other kinds (`more` stubs, ...) are kept as
/// raw JSON so one unexpected entry does not fail the whole page.
#[derive(Debug, Deserialize)]
pub struct Thing {
    pub kind: String,
    pub data: serde_json::Value,
}

impl Thing {
    fn parse<T: DeserializeOwned>(self, expected_kind: &str) -> Option<anyhow::Result<T>> {
        if self.kind != expected_kind {
            return None;
        }
        Some(serde_json::from_value(self.data).context("parse listing child"))
    }
}

/// A submission as the listing endpoint reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub id: String,
    pub title: String,
    pub permalink: String,
    pub url: String,
    #[serde(deserialize_with = "whole_seconds")]
    pub created_utc: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
}

pub struct Upstream {
    fetcher: Fetcher,
    api_base: Url,
    token: String,
    page_size: u32,
}

impl Upstream {
    /// Performs the application-only grant once; the token is used for the
    /// rest of the run without refresh.
    pub async fn connect(config: &Config, fetcher: Fetcher) -> anyhow::Result<Self> {
        let credentials = config.credentials()?;
        let token = request_token(&fetcher, &config.auth_url, credentials).await?;
        Ok(Self {
            fetcher,
            api_base: config.api_base.clone(),
            token,
            page_size: config.page_size,
        })
    }

    /// All submissions of `account`, newest first, following every page.
    pub async fn submissions(&self, account: &str) -> anyhow::Result<Vec<Submission>> {
        let mut out = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let url = listing_url(&self.api_base, account, self.page_size, after.as_deref())?;
            let page: Listing = self
                .fetcher
                .get_json(DownloadKind::Listing, url, &self.token)
                .await
                .with_context(|| format!("fetch submissions of {account}"))?;

            for child in page.data.children {
                if let Some(parsed) = child.parse::<Submission>("t3") {
                    out.push(parsed?);
                }
            }
            tracing::debug!(fetched = out.len(), "listing page done");

            match page.data.after {
                Some(next) if !next.is_empty() => after = Some(next),
                _ => break,
            }
        }
        Ok(out)
    }

    /// Top-level comments of one submission in upstream order.
    pub async fn comments(&self, submission_id: &str) -> anyhow::Result<Vec<Comment>> {
        let mut url = self
            .api_base
            .join(&format!("comments/{submission_id}"))
            .context("build comments url")?;
        url.query_pairs_mut().append_pair("raw_json", "1");

        // [submission listing, comment listing]
        let pages: Vec<Listing> = self
            .fetcher
            .get_json(DownloadKind::Comments, url, &self.token)
            .await
            .with_context(|| format!("fetch comments of {submission_id}"))?;

        let mut out = Vec::new();
        if let Some(tree) = pages.into_iter().nth(1) {
            for child in tree.data.children {
                if let Some(parsed) = child.parse::<Comment>("t1") {
                    out.push(parsed?);
                }
            }
        }
        Ok(out)
    }
}

fn listing_url(
    api_base: &Url,
    account: &str,
    page_size: u32,
    after: Option<&str>,
) -> anyhow::Result<Url> {
    let mut url = api_base
        .join(&format!("user/{account}/submitted"))
        .context("build listing url")?;
    {
        let mut q = url.query_pairs_mut();
        q.append_pair("sort", "new");
        q.append_pair("limit", &page_size.to_string());
        q.append_pair("raw_json", "1");
        if let Some(cursor) = after {
            q.append_pair("after", cursor);
        }
    }
    Ok(url)
}

async fn request_token(
    fetcher: &Fetcher,
    auth_url: &Url,
    credentials: &Credentials,
) -> anyhow::Result<String> {
    let request = fetcher
        .client()
        .post(auth_url.clone())
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&[("grant_type", "client_credentials")]);
    let bytes = fetcher
        .send(DownloadKind::Token, auth_url, request)
        .await
        .context("obtain access token")?;
    let token: TokenResponse = serde_json::from_slice(&bytes).context("parse token response")?;
    Ok(token.access_token)
}
