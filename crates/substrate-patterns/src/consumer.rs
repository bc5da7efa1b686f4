//! The durable consumer loop that feeds outcome events into the
//! [`PatternStore`] (§4.3, §6).

use std::sync::Arc;
use std::time::Instant;

use crate::config::PatternStoreConfig;
use crate::event_stream::OutcomeEventStream;
use crate::events::PatternStoreEvent;
use crate::model::DecisionOutcome;
use crate::store::PatternStore;

const GROUP: &str = "pattern-learning-store";

/// Runs the consumer loop until `stream.read_group` returns an error other
/// than a transient transport failure, or the future is dropped/aborted by
/// its caller. A malformed payload is acknowledged and logged rather than
/// retried indefinitely (§4.3: "a poison message must not block the
/// group"); a transport failure is not acknowledged and the loop backs off
/// before retrying the same read.
pub async fn run_consumer<S: OutcomeEventStream>(
    stream: Arc<S>,
    store: Arc<PatternStore>,
    config: PatternStoreConfig,
    consumer_id: &str,
) {
    let mut cursor = "$".to_string();
    loop {
        let batch = match stream
            .read_group(GROUP, consumer_id, config.consumer_batch, config.consumer_block, &cursor)
            .await
        {
            Ok(batch) => batch,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_err, "outcome event stream read failed, backing off");
                tokio::time::sleep(config.consumer_backoff).await;
                continue;
            }
        };

        for message in batch {
            match serde_json::from_str::<DecisionOutcome>(&message.payload) {
                Ok(outcome) => {
                    store.learn_from_outcome(&message.id, &outcome);
                }
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        message_id = %message.id,
                        error = %_err,
                        "discarding unparseable outcome event"
                    );
                    store.event_listeners().emit(&PatternStoreEvent::OutcomeParseFailed {
                        message_id: message.id.clone(),
                        timestamp: Instant::now(),
                    });
                }
            }

            if let Err(_err) = stream.ack(GROUP, &message.id).await {
                #[cfg(feature = "tracing")]
                tracing::warn!(message_id = %message.id, error = %_err, "failed to ack outcome event");
            }
            cursor = message.id;
        }
    }
}
