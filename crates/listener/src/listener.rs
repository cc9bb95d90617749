//! Change listener — turns INSERT events into dispatches.
//!
//! Each accepted event is dispatched on its own Tokio task, in delivery
//! order. Dispatches are neither serialized nor bounded: two inserts for the
//! same user may finish in either order.

use tokio::task::JoinSet;

use pushbridge_common::types::{ChangeEvent, PENDING_TABLE, PendingNotification};
use pushbridge_engine::dispatcher::NotificationDispatcher;

use crate::feed::ChangeFeed;

/// Listens to a change feed and dispatches one notification per inserted row.
pub struct ChangeListener {
    dispatcher: NotificationDispatcher,
}

impl ChangeListener {
    pub fn new(dispatcher: NotificationDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Consume the feed until it ends or fails.
    ///
    /// Returns an error only when the feed itself fails; dispatch failures
    /// are handled inside each task. When the feed ends, in-flight dispatches
    /// are awaited before returning.
    pub async fn run<F: ChangeFeed>(&self, mut feed: F) -> anyhow::Result<()> {
        let mut in_flight = JoinSet::new();

        while let Some(event) = feed.next_event().await? {
            // Reap finished dispatches so the set does not grow without bound.
            while in_flight.try_join_next().is_some() {}

            if let Some(record) = Self::accept(event) {
                let dispatcher = self.dispatcher.clone();
                in_flight.spawn(async move { dispatcher.dispatch(&record).await });
            }
        }

        tracing::info!(in_flight = in_flight.len(), "Change feed ended");
        while in_flight.join_next().await.is_some() {}
        Ok(())
    }

    /// Decode an insert into the pending table; anything else is skipped.
    fn accept(event: ChangeEvent) -> Option<PendingNotification> {
        if !event.is_insert_into(PENDING_TABLE) {
            tracing::debug!(
                event_type = %event.event_type,
                table = %event.table,
                "Ignoring change event"
            );
            return None;
        }

        match serde_json::from_value::<PendingNotification>(event.record) {
            Ok(record) => {
                tracing::info!(user_id = %record.user_id, "New event detected");
                Some(record)
            }
            Err(e) => {
                tracing::warn!(table = %event.table, error = %e, "Skipping undecodable row");
                None
            }
        }
    }
}
