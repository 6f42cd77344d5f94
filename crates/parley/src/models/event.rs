use serde::{Deserialize, Serialize};

/// Prefix of every record on the wire
pub const DATA_PREFIX: &str = "data: ";

/// One event of a chat stream.
///
/// A stream is any number of non-final `Content` events followed by exactly one final event:
/// either `Content` with `done: true` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Error {
        error: String,
    },
    Content {
        content: String,
        #[serde(default)]
        done: bool,
    },
}

impl StreamEvent {
    pub fn fragment<S: Into<String>>(text: S) -> Self {
        StreamEvent::Content {
            content: text.into(),
            done: false,
        }
    }

    pub fn terminal() -> Self {
        StreamEvent::Content {
            content: String::new(),
            done: true,
        }
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        StreamEvent::Error {
            error: message.into(),
        }
    }

    pub fn is_final(&self) -> bool {
        match self {
            StreamEvent::Error { .. } => true,
            StreamEvent::Content { done, .. } => *done,
        }
    }

    /// Encode as a complete wire record: `data: <json>\n\n`
    pub fn to_record(&self) -> String {
        let json = serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"error":"unencodable event"}"#.to_string());
        format!("{}{}\n\n", DATA_PREFIX, json)
    }

    /// Decode the payload of a single record line, with or without its `data:` prefix
    pub fn from_record(line: &str) -> Result<Self, serde_json::Error> {
        let payload = line
            .strip_prefix(DATA_PREFIX)
            .or_else(|| line.strip_prefix("data:"))
            .unwrap_or(line);
        serde_json::from_str(payload.trim())
    }
}
