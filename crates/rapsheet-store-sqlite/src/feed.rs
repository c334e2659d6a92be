//! [`BroadcastFeed`]: a change feed over the store's broadcast channel.

use rapsheet_core::store::{ChangeEvent, ChangeFeed, ChangeKind};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

/// Change notifications for one table. Dropping the feed unsubscribes.
pub struct BroadcastFeed {
  rx:    broadcast::Receiver<ChangeEvent>,
  table: String,
}

impl BroadcastFeed {
  pub(crate) fn new(rx: broadcast::Receiver<ChangeEvent>, table: &str) -> Self {
    Self { rx, table: table.to_owned() }
  }
}

impl ChangeFeed for BroadcastFeed {
  async fn next(&mut self) -> Option<ChangeEvent> {
    loop {
      match self.rx.recv().await {
        Ok(event) if event.table == self.table => return Some(event),
        Ok(_) => continue,
        // Missed events collapse into one; consumers refetch everything anyway.
        Err(RecvError::Lagged(skipped)) => {
          warn!(table = %self.table, skipped, "change feed lagged");
          return Some(ChangeEvent::new(self.table.clone(), ChangeKind::Resync));
        }
        Err(RecvError::Closed) => return None,
      }
    }
  }
}
