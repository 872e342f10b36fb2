//! Subscription Driver: the Executor's specialisation for operations whose
//! root produces a lazy sequence rather than a single value.
//!
//! The root procedure is invoked once to obtain the producer stream; each
//! item it emits is run back through the executor (skipping straight to the
//! plan's remaining selection, since the event itself already stands in for
//! the root field's resolved value) and the serialised envelope is
//! forwarded over a bounded channel. Cancelling the returned token stops the
//! driver and, cooperatively, the producer.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::ast::InputValue;
use crate::error::GraphyError;
use crate::executor::{execute_subscription_event, ExecutionResult};
use crate::resolve::SubscriptionStream;
use crate::validation::OperationPlan;

/// Spawns the background task that drains the producer. Returns the
/// consumer's receiving half and a token the caller can cancel to stop the
/// subscription early (e.g. because the client disconnected).
pub fn drive_subscription<S>(
    mut source: SubscriptionStream<S>,
    plan: Arc<OperationPlan>,
    scope: Arc<S>,
    variables: Arc<HashMap<String, InputValue>>,
    buffer_size: usize,
) -> (mpsc::Receiver<ExecutionResult>, CancellationToken)
where
    S: Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel(buffer_size.max(1));
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();

    tokio::spawn(async move {
        loop {
            let next = tokio::select! {
                _ = task_cancel.cancelled() => break,
                item = source.next() => item,
            };

            match next {
                None => break,
                Some(Err(err)) => {
                    let _ = tx.send(ExecutionResult::errors_only(vec![err.to_response_error()])).await;
                    break;
                }
                Some(Ok(event)) => {
                    let envelope = execute_subscription_event(&plan, event, &scope, &variables).await;
                    if tx.send(envelope).await.is_err() {
                        // Consumer dropped its receiver; stop pulling from the producer.
                        break;
                    }
                }
            }
        }
    });

    (rx, cancel)
}

/// Invokes the subscription's root resolver to obtain its producer.
/// Separated from [`drive_subscription`] so callers can report a resolver
/// failure (e.g. "no such subscription") before ever spawning the driver
/// task.
pub async fn start_subscription<S>(
    resolver: &crate::resolve::SubscriptionRootResolver<S>,
    scope: Arc<S>,
    args: crate::resolve::ArgumentValues,
) -> Result<SubscriptionStream<S>, GraphyError>
where
    S: Send + Sync + 'static,
{
    resolver(scope, args).await
}
