use anyhow::{Context, Error, Result, anyhow};
use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    clients::rbmq::{Acknowledger, InboundMessage},
    handlers::dispatcher::Dispatcher,
    models::dispatch::{AckDecision, DispatchResult},
    utils::process_message,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub acked: u64,
    pub requeued: u64,
    pub dropped: u64,
}

impl WorkerStats {
    fn record(&mut self, decision: AckDecision) {
        match decision {
            AckDecision::Ack => self.acked += 1,
            AckDecision::Reject { requeue: true } => self.requeued += 1,
            AckDecision::Reject { requeue: false } => self.dropped += 1,
        }
    }
}

/// Consumes one queue until `shutdown` fires. Messages are handled strictly
/// one at a time; cancellation is only observed between messages, so an
/// in-flight delivery always runs to its ack or reject. A stream that ends
/// before shutdown is an error: the queue has lost its consumer.
pub async fn run_consumer<S, A>(
    queue_name: &str,
    mut deliveries: S,
    acknowledger: &A,
    dispatcher: &Dispatcher,
    shutdown: CancellationToken,
) -> Result<WorkerStats, Error>
where
    S: Stream<Item = Result<InboundMessage, Error>> + Unpin,
    A: Acknowledger + ?Sized,
{
    let mut stats = WorkerStats::default();

    info!(queue = queue_name, channels = ?dispatcher.scope(), "Consumer loop started");

    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!(queue = queue_name, "Shutdown requested, no longer accepting messages");
                break;
            }
            next = deliveries.next() => next,
        };

        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                error!(queue = queue_name, error = %e, "Consumer stream failed");
                return Err(e.context(format!("consumer for '{}' failed", queue_name)));
            }
            None if shutdown.is_cancelled() => break,
            None => {
                error!(queue = queue_name, "Consumer stream closed by broker");
                return Err(anyhow!("consumer stream for '{}' closed by broker", queue_name));
            }
        };

        info!(
            queue = queue_name,
            delivery_tag = message.delivery_tag,
            routing_key = %message.routing_key,
            redelivered = message.redelivered,
            "Received message"
        );

        let result = process_message(&message.data, dispatcher).await;
        let decision = result.ack_decision();

        settle(acknowledger, message.delivery_tag, decision)
            .await
            .with_context(|| {
                format!(
                    "failed to settle delivery {} on '{}'",
                    message.delivery_tag, queue_name
                )
            })?;

        log_settlement(queue_name, message.delivery_tag, result, decision);
        stats.record(decision);
    }

    info!(
        queue = queue_name,
        acked = stats.acked,
        requeued = stats.requeued,
        dropped = stats.dropped,
        "Consumer loop stopped"
    );

    Ok(stats)
}

pub async fn settle<A>(acknowledger: &A, delivery_tag: u64, decision: AckDecision) -> Result<()>
where
    A: Acknowledger + ?Sized,
{
    match decision {
        AckDecision::Ack => acknowledger.acknowledge(delivery_tag).await,
        AckDecision::Reject { requeue } => acknowledger.reject(delivery_tag, requeue).await,
    }
}

fn log_settlement(queue: &str, delivery_tag: u64, result: DispatchResult, decision: AckDecision) {
    match decision {
        AckDecision::Ack => debug!(queue, delivery_tag, %result, "Message acknowledged"),
        AckDecision::Reject { requeue: true } => {
            warn!(queue, delivery_tag, %result, "Message rejected, requeued for retry")
        }
        AckDecision::Reject { requeue: false } => {
            warn!(queue, delivery_tag, %result, "Message rejected without requeue")
        }
    }
}
