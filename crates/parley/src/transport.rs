//! Encodes a fragment stream into `data:` records on a bounded channel.
//!
//! Every stream ends with exactly one final record, `done: true` or `error`, and the channel
//! is closed when the pump returns. A closed receiver stops the pump at its next await,
//! which drops the fragment stream and with it the backend request.
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::models::event::StreamEvent;
use crate::providers::base::FragmentStream;

/// Records buffered between the pump and the connection writer
pub const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed { fragments: usize },
    Failed { fragments: usize, error: String },
    Cancelled { fragments: usize },
}

pub fn channel() -> (mpsc::Sender<Bytes>, mpsc::Receiver<Bytes>) {
    mpsc::channel(CHANNEL_CAPACITY)
}

/// Pull `fragments` one at a time and forward each as a record until a final record is sent
/// or the receiver goes away.
pub async fn pump(mut fragments: FragmentStream, tx: mpsc::Sender<Bytes>) -> StreamOutcome {
    let mut sent = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => return StreamOutcome::Cancelled { fragments: sent },
            next = fragments.next() => next,
        };

        let (event, outcome) = match next {
            Some(Ok(text)) => (StreamEvent::fragment(text), None),
            Some(Err(err)) => {
                let error = err.to_string();
                (
                    StreamEvent::error(error.as_str()),
                    Some(StreamOutcome::Failed {
                        fragments: sent,
                        error,
                    }),
                )
            }
            None => (
                StreamEvent::terminal(),
                Some(StreamOutcome::Completed { fragments: sent }),
            ),
        };

        if tx.send(Bytes::from(event.to_record())).await.is_err() {
            return StreamOutcome::Cancelled { fragments: sent };
        }
        match outcome {
            Some(outcome) => return outcome,
            None => sent += 1,
        }
    }
}

/// Run the pump on its own task and hand back the record stream for the response body
pub fn spawn(fragments: FragmentStream) -> ReceiverStream<Bytes> {
    let (tx, rx) = channel();

    tokio::spawn(async move {
        match pump(fragments, tx).await {
            StreamOutcome::Completed { fragments } => {
                tracing::info!(fragments, "chat stream completed")
            }
            StreamOutcome::Failed { fragments, error } => {
                tracing::error!(fragments, %error, "chat stream failed")
            }
            StreamOutcome::Cancelled { fragments } => {
                tracing::warn!(fragments, "client disconnected, chat stream cancelled")
            }
        }
    });

    ReceiverStream::new(rx)
}
