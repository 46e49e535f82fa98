//! Twitter API client: bearer-token minting with a durable cache, and v1.1
//! search page fetches.
//!
//! Dependencies are injected at construction: the HTTP client is built from
//! the base URL once, and the bearer cache is whatever [`KeyValueTable`] the
//! caller scopes to its deployment.

use std::sync::Arc;

use anyhow::{Context, Result};
use causeway_cloud::KeyValueTable;
use causeway_http::{Auth, HttpClient, HttpError, RequestOpts};

use crate::twitter::types::{BearerTokenRecord, SearchResponse, TokenResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com";
const TOKEN_PATH: &str = "oauth2/token";
const SEARCH_PATH: &str = "1.1/search/tweets.json";
const LOGGED_BODY_MAX: usize = 512;

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    consumer_key: String,
    consumer_secret: String,
    bearer_table: Arc<dyn KeyValueTable>,
}

impl TwitterApi {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        bearer_table: Arc<dyn KeyValueTable>,
    ) -> Result<Self, HttpError> {
        Self::with_base_url(DEFAULT_BASE_URL, consumer_key, consumer_secret, bearer_table)
    }

    /// Point the client at a different base URL (tests use this).
    pub fn with_base_url(
        base_url: &str,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        bearer_table: Arc<dyn KeyValueTable>,
    ) -> Result<Self, HttpError> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            bearer_table,
        })
    }

    /// Resolve the OAuth2 bearer token, minting and caching it on first use.
    ///
    /// On a cache hit the stored token is returned unconditionally.
    // FIXME: cached tokens are never expired or revalidated, so a revoked
    // token keeps failing searches until its cache row is deleted by hand.
    pub async fn authorization_bearer(&self) -> Result<String> {
        let cache_key = format!("{}:{}", self.consumer_key, self.consumer_secret);

        if let Some(row) = self.bearer_table.get(&cache_key).await? {
            let record: BearerTokenRecord = serde_json::from_value(row)
                .context("bearer cache row has an unexpected shape")?;
            tracing::debug!("twitter.bearer.cache_hit");
            return Ok(record.access_token);
        }

        tracing::info!("twitter.bearer.cache_miss");
        let reply: TokenResponse = self
            .http
            .post_form(
                TOKEN_PATH,
                "grant_type=client_credentials",
                RequestOpts {
                    auth: Some(Auth::Basic {
                        user: &self.consumer_key,
                        pass: &self.consumer_secret,
                    }),
                    retries: Some(0),
                    ..Default::default()
                },
            )
            .await?;

        let record = BearerTokenRecord {
            id: cache_key,
            access_token: reply.access_token.clone(),
        };
        self.bearer_table
            .insert(serde_json::to_value(&record)?)
            .await?;

        Ok(reply.access_token)
    }

    /// Fetch one page of v1.1 search results.
    ///
    /// `query_string` must carry its leading `?`; it is appended to the
    /// search path verbatim, whether it came from the caller's initial query
    /// or from a previous response's `refresh_url`.
    pub async fn search_page(&self, query_string: &str) -> Result<SearchResponse> {
        let bearer = self.authorization_bearer().await?;

        let path = format!("{SEARCH_PATH}{query_string}");
        let page: SearchResponse = self
            .http
            .get_json(
                &path,
                RequestOpts {
                    auth: Some(Auth::Bearer(&bearer)),
                    retries: Some(0),
                    ..Default::default()
                },
            )
            .await?;

        tracing::debug!(
            statuses = page.statuses.len(),
            refresh_url = %page.search_metadata.refresh_url,
            "twitter.search.page"
        );
        tracing::trace!(
            body = %causeway_common::to_short_string(
                &serde_json::to_string(&page).unwrap_or_default(),
                LOGGED_BODY_MAX,
            ),
            "twitter.search.body"
        );

        Ok(page)
    }
}
