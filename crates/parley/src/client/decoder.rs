use crate::client::{ClientError, ClientResult};
use crate::models::event::StreamEvent;

/// Splits a record byte stream into events.
///
/// Bytes are held until a newline arrives, so a record (or a multi-byte character) split
/// across reads is only decoded once it is complete. Blank lines and lines without a
/// `data:` prefix are ignored.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read, returning every event completed by it in order
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ClientResult<StreamEvent>> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = decode_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Decode whatever is left once the input has ended.
    ///
    /// A record cut off by the connection closing is dropped, only a complete one is returned.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        match decode_line(&rest)? {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::debug!(error = %err, "dropping incomplete trailing record");
                None
            }
        }
    }
}

fn decode_line(line: &[u8]) -> Option<ClientResult<StreamEvent>> {
    let line = match std::str::from_utf8(line) {
        Ok(line) => line.trim_end_matches(['\r', '\n']),
        Err(e) => return Some(Err(ClientError::Decode(e.to_string()))),
    };
    if !line.starts_with("data:") {
        return None;
    }

    Some(StreamEvent::from_record(line).map_err(|e| ClientError::Decode(format!("{}: {}", e, line))))
}
