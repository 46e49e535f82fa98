//! Recurring poll primitive.
//!
//! `poll` turns an async callback into a lazy, unbounded stream: each tick
//! invokes the callback with the continuation token returned by the previous
//! invocation and yields the resulting items downstream. Invocations are
//! strictly serial; a tick never starts while the previous callback is still
//! running.

use std::future::Future;
use std::time::Duration;

use futures::Stream;
use tokio::time::MissedTickBehavior;

/// One invocation's worth of output from a poll callback.
#[derive(Clone, Debug)]
pub struct PollBatch<T> {
    /// Opaque continuation handed to the next invocation.
    pub next_token: Option<String>,
    pub items: Vec<T>,
}

/// Run `callback` every `every`, yielding each batch's items as a stream.
///
/// The first invocation receives `None`; afterwards the token from the most
/// recent successful batch is threaded through. A failed invocation is logged
/// and the previous token is retained, so the next tick resumes from the same
/// place. No retry, backoff, or error classification happens here.
///
/// The stream is unbounded; callers drop it (or take a prefix) to stop.
pub fn poll<T, F, Fut>(
    name: impl Into<String>,
    every: Duration,
    mut callback: F,
) -> impl Stream<Item = T>
where
    T: Send + 'static,
    F: FnMut(Option<String>) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<PollBatch<T>>> + Send,
{
    let name = name.into();
    async_stream::stream! {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut token: Option<String> = None;

        loop {
            ticker.tick().await;
            tracing::debug!(poll = %name, has_token = token.is_some(), "poll.tick");

            match callback(token.clone()).await {
                Ok(batch) => {
                    token = batch.next_token;
                    for item in batch.items {
                        yield item;
                    }
                }
                Err(error) => {
                    tracing::warn!(poll = %name, error = ?error, "poll.invocation_failed");
                }
            }
        }
    }
}
