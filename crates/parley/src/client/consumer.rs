use bytes::Bytes;
use futures::{Stream, StreamExt};

use super::assembler::{AssembledMessage, MessageAssembler};
use super::decoder::EventDecoder;
use super::{ClientError, ClientResult};
use crate::models::event::StreamEvent;

/// Read a record stream to its end, calling `on_fragment` with each piece of content.
///
/// Stops at the first final event. An `error` event becomes `ClientError::Remote` carrying the
/// text assembled before it. Input that ends without a final event counts as finished.
pub async fn consume<S, F>(records: S, mut on_fragment: F) -> ClientResult<AssembledMessage>
where
    S: Stream<Item = ClientResult<Bytes>>,
    F: FnMut(&str),
{
    let mut records = Box::pin(records);
    let mut decoder = EventDecoder::new();
    let mut assembler = MessageAssembler::new();

    while let Some(chunk) = records.next().await {
        for event in decoder.push(&chunk?) {
            if apply(event?, &mut assembler, &mut on_fragment)? {
                return Ok(assembler.finish());
            }
        }
    }

    if let Some(event) = decoder.finish() {
        apply(event, &mut assembler, &mut on_fragment)?;
    }
    tracing::debug!("stream closed without a final event");
    Ok(assembler.finish())
}

/// Returns true once the stream is over
fn apply<F: FnMut(&str)>(
    event: StreamEvent,
    assembler: &mut MessageAssembler,
    on_fragment: &mut F,
) -> ClientResult<bool> {
    match event {
        StreamEvent::Error { error } => Err(ClientError::Remote {
            message: error,
            partial: assembler.text().to_string(),
        }),
        StreamEvent::Content { done: true, .. } => Ok(true),
        StreamEvent::Content { content, .. } => {
            if !content.is_empty() {
                assembler.push(&content);
                on_fragment(&content);
            }
            Ok(false)
        }
    }
}
