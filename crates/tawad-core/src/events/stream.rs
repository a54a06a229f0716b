//! Server event feed consumer.
//!
//! One connection per signed-in session, joined to the user's channel via
//! the query string. The feed is server-sent events; each `data:` frame
//! carries one JSON-encoded [`ChatEvent`]. The reader reconnects after a
//! fixed delay on any error or EOF, and stops when the handle is closed.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::events::{ChatEvent, EventHub};
use crate::models::UserId;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Handle to the background feed reader.
///
/// Closing (or dropping) it tears the upstream connection down. Hub
/// subscribers are left attached; they simply stop receiving events.
pub struct EventStream {
    handle: JoinHandle<()>,
}

impl EventStream {
    /// Connect the feed for `user` and publish every event to `hub`.
    pub fn connect(config: &ClientConfig, user: UserId, hub: EventHub) -> Result<Self> {
        // No request timeout: the feed is a long-lived response
        let client = reqwest::Client::builder().build()?;
        let url = format!("{}/events", config.events_url);
        let handle = tokio::spawn(run_feed(client, url, user, hub));
        Ok(Self { handle })
    }

    /// Tear down the connection. Idempotent.
    pub fn close(&self) {
        self.handle.abort();
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run_feed(client: reqwest::Client, url: String, user: UserId, hub: EventHub) {
    loop {
        match read_feed_once(&client, &url, user, &hub).await {
            Ok(()) => debug!("event feed closed by server, reconnecting"),
            Err(error) => warn!("event feed error: {error}, reconnecting"),
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

async fn read_feed_once(
    client: &reqwest::Client,
    url: &str,
    user: UserId,
    hub: &EventHub,
) -> Result<()> {
    let response = client
        .get(url)
        .query(&[("user", user.to_string())])
        .header("Accept", "text/event-stream")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(Error::Api(format!(
            "event feed returned HTTP {}",
            response.status().as_u16()
        )));
    }

    info!("event feed connected for user {user}");

    let mut stream = response.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        // Frames are separated by a blank line
        while let Some(end) = buffer.find("\n\n") {
            let frame: String = buffer.drain(..end + 2).collect();
            if let Some(event) = parse_sse_frame(&frame) {
                debug!(event = event.name(), "event received");
                hub.publish(event);
            }
        }
    }

    Ok(())
}

/// Parse one SSE frame into a [`ChatEvent`].
///
/// Comment frames, frames without a `data:` field, and events the client
/// does not recognize all yield `None`; the feed never aborts on a frame
/// it cannot read.
#[must_use]
pub fn parse_sse_frame(frame: &str) -> Option<ChatEvent> {
    let mut data = String::new();
    for line in frame.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.trim_start());
        }
    }

    if data.is_empty() {
        return None;
    }

    match serde_json::from_str::<ChatEvent>(&data) {
        Ok(event) => Some(event),
        Err(error) => {
            debug!("skipping unrecognized event frame: {error}");
            None
        }
    }
}
