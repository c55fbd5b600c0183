use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::StatusCode;
use std::time::Duration;

use super::{ContentFetcher, FetchError};

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";
const USER_AGENT: &str = "wfcheck/0.1.0";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Classify a GitHub response status into a fetch error, if it is one.
///
/// A 403 only counts as rate limiting when the remaining-request budget is
/// reported as zero; other 403s fall through to the generic API error.
fn classify_response(status: StatusCode, headers: &HeaderMap) -> Option<FetchError> {
    match status.as_u16() {
        401 => Some(FetchError::Unauthorized),
        403 if header_value(headers, "x-ratelimit-remaining") == Some("0".to_string()) => {
            Some(FetchError::RateLimited {
                reset_epoch: rate_limit_reset(headers),
            })
        }
        429 => Some(FetchError::RateLimited {
            reset_epoch: rate_limit_reset(headers),
        }),
        404 => Some(FetchError::NotFound),
        status if status > 299 => Some(FetchError::Api { status }),
        _ => None,
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn rate_limit_reset(headers: &HeaderMap) -> u64 {
    header_value(headers, "x-ratelimit-reset")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
}

/// Repository object fetcher over the GitHub REST contents API.
///
/// Works anonymously, with the tighter unauthenticated rate-limit envelope;
/// a token raises the envelope and grants private-repository access.
pub struct RestContentFetcher {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
}

impl RestContentFetcher {
    pub fn new(token: Option<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client()?,
            token,
            base_url: GITHUB_API_BASE.to_string(),
        })
    }

    /// Override the API base URL, for tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ContentFetcher for RestContentFetcher {
    async fn fetch(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
        path: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let url = format!("{}/repos/{owner}/{repo}/contents/{path}", self.base_url);
        debug!("GET {url}?ref={git_ref}");

        let mut request = self
            .client
            .get(&url)
            .query(&[("ref", git_ref)])
            .header(ACCEPT, "application/vnd.github.v3.raw");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        if let Some(err) = classify_response(response.status(), response.headers()) {
            return Err(err);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

const BLOB_QUERY: &str = "query($owner: String!, $name: String!, $expression: String!) { repository(owner: $owner, name: $name) { object(expression: $expression) { ... on Blob { text } } } }";

/// Repository object fetcher over the GitHub GraphQL API.
///
/// GraphQL has no anonymous access, so a token is mandatory. A repository
/// or blob that resolves to null maps to not-found.
pub struct GraphqlContentFetcher {
    client: reqwest::Client,
    token: String,
    endpoint: String,
}

impl GraphqlContentFetcher {
    pub fn new(token: String) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client()?,
            token,
            endpoint: GITHUB_GRAPHQL_URL.to_string(),
        })
    }

    /// Override the GraphQL endpoint, for tests.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl ContentFetcher for GraphqlContentFetcher {
    async fn fetch(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
        path: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let expression = format!("{git_ref}:{path}");
        debug!("POST {} for {owner}/{repo} {expression}", self.endpoint);

        let body = serde_json::json!({
            "query": BLOB_QUERY,
            "variables": {
                "owner": owner,
                "name": repo,
                "expression": expression,
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        if let Some(err) = classify_response(response.status(), response.headers()) {
            return Err(err);
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        match payload
            .pointer("/data/repository/object/text")
            .and_then(|v| v.as_str())
        {
            Some(text) => Ok(text.as_bytes().to_vec()),
            None => Err(FetchError::NotFound),
        }
    }
}
