//! Access to the remote schedule API.
//!
//! The API serves one iCalendar document per target and a paginated
//! full-text search over targets. [`RemoteApi`] abstracts both so processing
//! can be tested without the network.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::FetchSettings;
use crate::models::{SearchRequest, Target};

/// Errors talking to the remote API.
///
/// A non-success HTTP status is not an error: the affected call returns
/// `Ok(None)` instead.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A target found by the remote search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTarget {
    pub name: String,
    /// Target kind code; only `1` and `2` are analyzable.
    pub target_type: i32,
    pub remote_id: i64,
}

/// One page of remote search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub targets: Vec<RemoteTarget>,
    pub next_page_token: Option<String>,
}

/// Wire format of the search endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    data: Vec<SearchEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchEntry {
    full_title: String,
    schedule_target: i32,
    id: i64,
}

impl From<SearchResponse> for SearchResult {
    fn from(response: SearchResponse) -> Self {
        Self {
            targets: response
                .data
                .into_iter()
                .map(|entry| RemoteTarget {
                    name: entry.full_title,
                    target_type: entry.schedule_target,
                    remote_id: entry.id,
                })
                .collect(),
            next_page_token: response.next_page_token,
        }
    }
}

#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Calendar document of a target, `None` if the API has none.
    async fn fetch_calendar(&self, target: &Target) -> Result<Option<String>, FetchError>;

    /// One page of targets matching the request, `None` if the search failed remotely.
    async fn fetch_targets(
        &self,
        request: &SearchRequest,
    ) -> Result<Option<SearchResult>, FetchError>;
}

/// Substitute `{0}` with the target kind code and `{1}` with the remote id.
pub fn fill_schedule_url(template: &str, target: &Target) -> String {
    template
        .replace("{0}", &target.kind.code().to_string())
        .replace("{1}", &target.remote_id.to_string())
}

/// Query parameters of a search, only those that are set.
pub fn search_query(request: &SearchRequest) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(limit) = request.limit {
        query.push(("limit", limit.to_string()));
    }
    if let Some(match_text) = &request.match_text {
        query.push(("match", match_text.clone()));
    }
    if let Some(page_token) = &request.page_token {
        query.push(("pageToken", page_token.clone()));
    }
    query
}

/// [`RemoteApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRemoteApi {
    client: reqwest::Client,
    schedule_url: String,
    search_url: String,
}

impl HttpRemoteApi {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            schedule_url: settings.schedule_url.clone(),
            search_url: settings.search_url.clone(),
        })
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteApi {
    async fn fetch_calendar(&self, target: &Target) -> Result<Option<String>, FetchError> {
        let url = fill_schedule_url(&self.schedule_url, target);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "text/calendar")
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Calendar request {} returned {}", url, status);
            return Ok(None);
        }

        let text = response
            .text()
            .await
            .map_err(|source| FetchError::Decode { url, source })?;
        Ok(Some(text))
    }

    async fn fetch_targets(
        &self,
        request: &SearchRequest,
    ) -> Result<Option<SearchResult>, FetchError> {
        let url = self.search_url.clone();

        let response = self
            .client
            .get(&url)
            .query(&search_query(request))
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Search request {} returned {}", url, status);
            return Ok(None);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|source| FetchError::Decode { url, source })?;
        Ok(Some(parsed.into()))
    }
}
