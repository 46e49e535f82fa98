use std::sync::Arc;
use std::time::Duration;

use causeway_cloud::{KeyValueTable, MemoryTable};
use causeway_social::twitter::{search_every, TwitterApi};
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// base64("key:secret"), as reqwest puts it on the wire for Basic auth.
const BASIC_KEY_SECRET: &str = "Basic a2V5OnNlY3JldA==";

fn api_for(server: &MockServer, table: Arc<MemoryTable>) -> TwitterApi {
    TwitterApi::with_base_url(&server.uri(), "key", "secret", table).expect("client builds")
}

fn tweet_json(text: &str, id: &str) -> serde_json::Value {
    json!({
        "text": text,
        "id_str": id,
        "created_at": "Mon Sep 24 03:35:21 +0000 2012",
        "user": { "screen_name": "alice" }
    })
}

fn search_body(tweets: Vec<serde_json::Value>, refresh_url: &str) -> serde_json::Value {
    json!({
        "statuses": tweets,
        "search_metadata": {
            "max_id_str": "0",
            "since_id_str": "0",
            "refresh_url": refresh_url,
            "next_results": ""
        }
    })
}

async fn mount_token_endpoint(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header("authorization", BASIC_KEY_SECRET))
        .and(body_string("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "bearer",
            "access_token": token
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn cache_miss_mints_one_token_and_inserts_one_row() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "tok-1", 1).await;

    let table = Arc::new(MemoryTable::new());
    let api = api_for(&server, table.clone());

    let bearer = api.authorization_bearer().await.unwrap();
    assert_eq!(bearer, "tok-1");

    let row = table.get("key:secret").await.unwrap().unwrap();
    assert_eq!(row, json!({"id": "key:secret", "access_token": "tok-1"}));
    assert_eq!(table.len(), 1);
}

#[tokio::test]
async fn cache_hit_returns_stored_token_without_http() {
    let server = MockServer::start().await;
    // Zero calls allowed: a hit must not touch the token endpoint.
    mount_token_endpoint(&server, "never-used", 0).await;

    let table = Arc::new(MemoryTable::new());
    table
        .insert(json!({"id": "key:secret", "access_token": "tok-cached"}))
        .await
        .unwrap();

    let api = api_for(&server, table);
    let bearer = api.authorization_bearer().await.unwrap();
    assert_eq!(bearer, "tok-cached");
}

#[tokio::test]
async fn search_starts_with_q_then_follows_refresh_url_verbatim() {
    let server = MockServer::start().await;
    // One mint for both pages: the second page hits the cache.
    mount_token_endpoint(&server, "tok-1", 1).await;

    // First page: plain `?q=foo`. Exhausted after one use so the follow-up
    // request (which also carries q=foo) falls through to the next mock.
    Mock::given(method("GET"))
        .and(path("/1.1/search/tweets.json"))
        .and(query_param("q", "foo"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_body(vec![tweet_json("one", "1")], "?since_id=1&q=foo")),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    // Second page: the refresh_url from the first response, verbatim.
    Mock::given(method("GET"))
        .and(path("/1.1/search/tweets.json"))
        .and(query_param("since_id", "1"))
        .and(query_param("q", "foo"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_body(vec![tweet_json("two", "2")], "?since_id=2&q=foo")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server, Arc::new(MemoryTable::new()));
    let stream = search_every("s", "foo", api, Duration::from_millis(20));
    let tweets: Vec<_> = stream.take(2).collect().await;

    assert_eq!(tweets.len(), 2);
    assert_eq!(tweets[0].text, "one");
    assert_eq!(tweets[1].text, "two");
    assert_eq!(tweets[1].user.screen_name, "alice");
}

#[tokio::test]
async fn failed_poll_invocation_retries_the_same_query_next_tick() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "tok-1", 1).await;

    // First attempt fails server-side; retries are disabled at the HTTP
    // layer, so the failure surfaces to the poll loop.
    Mock::given(method("GET"))
        .and(path("/1.1/search/tweets.json"))
        .and(query_param("q", "foo"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "errors": [{"code": 131, "message": "Internal error"}]
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/1.1/search/tweets.json"))
        .and(query_param("q", "foo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_body(vec![tweet_json("one", "1")], "?since_id=1&q=foo")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server, Arc::new(MemoryTable::new()));
    let stream = search_every("s", "foo", api, Duration::from_millis(20));
    let tweets: Vec<_> = stream.take(1).collect().await;

    assert_eq!(tweets[0].text, "one");
}
