use serde::{Deserialize, Serialize};

/// A matched tweet, as returned by the v1.1 search endpoint. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub text: String,
    pub id_str: String,
    pub created_at: String,
    pub user: TweetUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetUser {
    pub screen_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub statuses: Vec<Tweet>,
    pub search_metadata: SearchMetadata,
}

/// Pagination metadata. `refresh_url` is a relative fragment with a leading
/// `?` and is threaded verbatim into the next poll invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchMetadata {
    #[serde(default)]
    pub max_id_str: String,
    #[serde(default)]
    pub since_id_str: String,
    #[serde(default)]
    pub refresh_url: String,
    #[serde(default)]
    pub next_results: String,
}

/// Reply from `oauth2/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token_type: String,
    pub access_token: String,
}

/// Row cached in the bearer table, keyed by `<consumer_key>:<consumer_secret>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearerTokenRecord {
    pub id: String,
    pub access_token: String,
}
