//! Wire format for the buffer service.
//!
//! One request and one response per connection. Each message is a single
//! JSON object terminated by `\n`:
//!
//! ```text
//! -> {"command":"PRODUCE","file_number":1,"xml_data":"..."}
//! <- {"status":"SUCCESS","message":"Added student1","buffer_size":1}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{BufferError, Result};
use crate::SPSC::Structs::SlotToken;

/// Message delimiter.
pub const DELIMITER: u8 = b'\n';

/// A client request, tagged by `command`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Store `xml_data` under `file_number` and admit the token.
    Produce {
        file_number: SlotToken,
        xml_data: String,
    },
    /// Take the oldest token and its payload.
    Consume,
    /// Report size and capacity without mutating anything.
    Status,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Full,
    Empty,
    Error,
}

/// A service response. Which optional fields are present depends on the
/// request and `status`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<usize>,
    #[serde(default, alias = "buffer_max", skip_serializing_if = "Option::is_none")]
    pub buffer_capacity: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_number: Option<SlotToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml_data: Option<String>,
}

impl Response {
    fn with_status(status: Status) -> Self {
        Self {
            status,
            message: None,
            buffer_size: None,
            buffer_capacity: None,
            file_number: None,
            xml_data: None,
        }
    }

    /// `SUCCESS` for an admitted `PRODUCE`.
    pub fn produced(token: SlotToken, buffer_size: usize) -> Self {
        Self {
            message: Some(format!("Added student{token}")),
            buffer_size: Some(buffer_size),
            ..Self::with_status(Status::Success)
        }
    }

    /// `SUCCESS` for a `CONSUME` carrying the token and its payload.
    pub fn consumed(token: SlotToken, payload: String, buffer_size: usize) -> Self {
        Self {
            file_number: Some(token),
            xml_data: Some(payload),
            buffer_size: Some(buffer_size),
            ..Self::with_status(Status::Success)
        }
    }

    /// `SUCCESS` for `STATUS`.
    pub fn status(buffer_size: usize, buffer_capacity: usize) -> Self {
        Self {
            buffer_size: Some(buffer_size),
            buffer_capacity: Some(buffer_capacity),
            ..Self::with_status(Status::Success)
        }
    }

    pub fn full(buffer_size: usize) -> Self {
        Self {
            message: Some("Buffer is full".into()),
            buffer_size: Some(buffer_size),
            ..Self::with_status(Status::Full)
        }
    }

    pub fn empty() -> Self {
        Self {
            message: Some("Buffer is empty".into()),
            buffer_size: Some(0),
            ..Self::with_status(Status::Empty)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::with_status(Status::Error)
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Payload bytes of a successful `CONSUME`.
    pub fn payload(&self) -> Option<&[u8]> {
        self.xml_data.as_deref().map(str::as_bytes)
    }
}

/// Serialize `message` as one delimited line.
pub fn encode_line<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    let mut line = serde_json::to_vec(message)?;
    line.push(DELIMITER);
    Ok(line)
}

/// Parse one line (with or without its trailing delimiter).
pub fn decode_line<'a, T: Deserialize<'a>>(line: &'a [u8]) -> Result<T> {
    let line = line.strip_suffix(&[DELIMITER]).unwrap_or(line);
    if line.iter().all(u8::is_ascii_whitespace) {
        return Err(BufferError::Protocol("empty message".into()));
    }
    Ok(serde_json::from_slice(line)?)
}
