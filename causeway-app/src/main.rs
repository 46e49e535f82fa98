use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use causeway_cloud::{MemoryTable, MemoryTransport, Topic};
use causeway_common::observability::{init_logging, LogConfig};
use causeway_config::CausewayConfigLoader;
use causeway_social::twitter::types::Tweet;
use causeway_social::twitter::{search_every, TwitterApi};
use clap::Parser;
use futures::StreamExt;

/// Poll Twitter search and republish matches on a pub/sub topic.
#[derive(Debug, Parser)]
#[command(name = "causeway", version)]
struct Args {
    /// YAML config file carrying the `twitter` secrets.
    #[arg(long, default_value = "causeway.yaml")]
    config: String,

    /// Search term to poll for.
    #[arg(long)]
    term: String,

    /// Poll cadence in seconds.
    #[arg(long, default_value_t = 60)]
    interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: missing twitter secrets must fail before anything runs.
    let cfg = CausewayConfigLoader::new().with_file(&args.config).load()?;
    let secrets = cfg.twitter()?.clone();

    init_logging(LogConfig {
        emit_stderr: true,
        ..LogConfig::default()
    })?;
    tracing::info!(term = %args.term, interval_secs = args.interval_secs, "causeway.start");

    let transport = Arc::new(MemoryTransport::new());
    let tweets: Topic<Tweet> = Topic::new("tweets", transport.clone()).await?;
    tweets
        .subscribe("log", |tweet| async move {
            tracing::info!(
                id = %tweet.id_str,
                user = %tweet.user.screen_name,
                text = %tweet.text,
                "tweet"
            );
            Ok(())
        })
        .await?;

    let bearer_table = Arc::new(MemoryTable::new());
    let api = TwitterApi::new(secrets.consumer_key, secrets.consumer_secret, bearer_table)?;

    let stream = search_every(
        "tweets-search",
        &args.term,
        api,
        Duration::from_secs(args.interval_secs),
    );
    futures::pin_mut!(stream);

    loop {
        tokio::select! {
            maybe = stream.next() => match maybe {
                Some(tweet) => tweets.publish(&tweet).await?,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("causeway.shutdown");
                break;
            }
        }
    }

    Ok(())
}
