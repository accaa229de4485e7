//! HTTP layer: status mapping and rate-limit detection.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes. Requests are issued exactly once; waiting out a
//! rate limit is the caller's job.

use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION, LINK};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::auth::TokenProvider;
use crate::error::{GithubError, GithubResult};

use super::helpers::{classify_rate_limit, error_message, parse_next_page};

const API_VERSION: &str = "2022-11-28";

/// A decoded JSON body plus the pagination cursor from its `Link` header.
#[derive(Debug)]
pub(crate) struct JsonPage<T> {
    pub body: T,
    pub next_page: Option<u32>,
}

/// HTTP backend for making requests (holds reqwest client, auth, base URL).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) token_provider: TokenProvider,
}

impl HttpBackend {
    /// GET a JSON document; returns the body and next-page cursor.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> GithubResult<JsonPage<T>> {
        let response = self.request_once(path, query).await?;

        let next_page = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_page);

        let body = response
            .json()
            .await
            .map_err(|e| GithubError::InvalidResponse {
                message: format!("failed to decode {}: {}", path, e),
            })?;

        Ok(JsonPage { body, next_page })
    }

    /// GET a binary body chunk by chunk into `sink`, following redirects to
    /// blob storage. Returns the number of bytes written.
    pub(crate) async fn download_to(
        &self,
        path: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> GithubResult<u64> {
        let mut response = self.request_once(path, &[]).await?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|e| GithubError::Network {
            message: format!("failed to read body of {}: {}", path, e),
        })? {
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;

        Ok(written)
    }

    async fn request_once(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> GithubResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, query = ?query, "GET");

        let mut request = self
            .client
            .get(&url)
            .query(query)
            .header(ACCEPT, "application/vnd.github+json")
            .header("x-github-api-version", API_VERSION);

        if let Some(token) = self.token_provider.token() {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();

        if let Some((kind, reset_at)) =
            classify_rate_limit(status.as_u16(), &headers, &body, Utc::now())
        {
            return Err(GithubError::RateLimited { kind, reset_at });
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GithubError::Unauthorized {
                message: error_message(&body),
            }),

            StatusCode::NOT_FOUND => Err(GithubError::NotFound {
                resource: path.to_string(),
            }),

            StatusCode::GONE => Err(GithubError::NotFound {
                resource: format!("{} (expired)", path),
            }),

            _ => Err(GithubError::Network {
                message: format!("HTTP {}: {}", status.as_u16(), error_message(&body)),
            }),
        }
    }
}
