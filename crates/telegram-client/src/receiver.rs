//! Update receiver with long polling.

use crate::client::TelegramClient;
use crate::types::*;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::Stream;
use tracing::{debug, error};

/// Receiver that long-polls `getUpdates` and tracks the offset.
pub struct UpdateReceiver {
    client: TelegramClient,
    poll_timeout: Duration,
}

impl UpdateReceiver {
    /// Create a new update receiver.
    pub fn new(client: TelegramClient, poll_timeout: Duration) -> Self {
        Self {
            client,
            poll_timeout,
        }
    }

    /// Start receiving updates as an async stream.
    ///
    /// The offset advances past each yielded update, so an update is
    /// delivered at most once per process lifetime.
    pub fn stream(self) -> impl Stream<Item = Update> {
        async_stream::stream! {
            let mut offset: i64 = 0;
            loop {
                match self.client.get_updates(offset, self.poll_timeout).await {
                    Ok(updates) => {
                        for update in updates {
                            debug!("Update {}", update.update_id);
                            offset = update.update_id + 1;
                            yield update;
                        }
                    }
                    Err(e) => {
                        error!("Poll error: {}", e);
                        // Back off on error
                        sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }
    }
}
