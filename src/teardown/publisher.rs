//! State-queue publisher
//!
//! Appends the delete message to the leader's queue and returns as soon as
//! the queue has accepted it. Applying the message is the leader's job.

use crate::cluster::{StateTransitionMessage, StateUpdateQueue};
use crate::observability::{log_event_with_fields, Event};

use super::errors::{DeleteError, DeleteResult};

/// Enqueue a delete of `collection`.
pub async fn publish_delete(queue: &dyn StateUpdateQueue, collection: &str) -> DeleteResult<()> {
    let message = StateTransitionMessage::delete(collection);
    let outcome = match message.to_bytes() {
        Ok(data) => queue.offer(data).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => {
            log_event_with_fields(Event::StateMessageEnqueued, &[("collection", collection)]);
            Ok(())
        }
        Err(source) => {
            log_event_with_fields(
                Event::StateMessageEnqueueFailed,
                &[("collection", collection), ("error", &source.to_string())],
            );
            Err(DeleteError::Enqueue {
                collection: collection.to_string(),
                source,
            })
        }
    }
}
