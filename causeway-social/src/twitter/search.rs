//! Polling wrapper that turns repeated searches into a continuous stream.

use std::time::Duration;

use causeway_cloud::{poll, PollBatch};
use futures::Stream;

use crate::twitter::client::TwitterApi;
use crate::twitter::types::Tweet;

pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Continuous stream of tweets matching `term`, re-queried once a minute.
///
/// The first invocation queries with a literal `?q=<term>`; every later one
/// resumes from the previous response's `refresh_url` verbatim, so the
/// provider decides what "new since last time" means.
pub fn search(
    name: impl Into<String>,
    term: impl Into<String>,
    api: TwitterApi,
) -> impl Stream<Item = Tweet> {
    search_every(name, term, api, POLL_INTERVAL)
}

/// Same as [`search`] with an explicit cadence.
pub fn search_every(
    name: impl Into<String>,
    term: impl Into<String>,
    api: TwitterApi,
    every: Duration,
) -> impl Stream<Item = Tweet> {
    let term = term.into();
    poll(name, every, move |last_token| {
        let api = api.clone();
        let term = term.clone();
        async move {
            let query_string = match last_token {
                Some(token) => token,
                None => format!("?q={term}"),
            };

            let page = api.search_page(&query_string).await?;
            Ok(PollBatch {
                next_token: Some(page.search_metadata.refresh_url),
                items: page.statuses,
            })
        }
    })
}
