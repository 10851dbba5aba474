//! Reply definitions
//!
//! A reply is one status line, optionally followed by a job body whose
//! length the status line declares. The first byte of the line decides the
//! outcome: `+` is success (`+OK` and a bare `+` are both accepted), any
//! other byte is failure and the rest of the line is the error text.

use bytes::Bytes;

use super::ReplyShape;
use crate::error::{QueueError, Result};

/// Success marker
pub const STATUS_OK: u8 = b'+';

/// Fields carried by a success status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFields {
    /// Nothing beyond the marker
    None,

    /// A job body of `len` bytes follows
    Job { len: usize },

    /// A touched job: its recycle id, and a body of `len` bytes follows
    RecycledJob { recycle_id: u64, len: usize },

    /// A queue size
    Count(u64),
}

impl ReplyFields {
    /// Length of the job body that follows the line, if any
    pub fn payload_len(&self) -> Option<usize> {
        match self {
            ReplyFields::Job { len } | ReplyFields::RecycledJob { len, .. } => Some(*len),
            ReplyFields::None | ReplyFields::Count(_) => None,
        }
    }
}

/// A parsed status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyHeader {
    Ok(ReplyFields),
    Err(String),
}

/// A job retrieved with `touch`/`fetch`, pending recycle on the daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchedJob {
    /// Identifier to pass to `recycle`
    pub recycle_id: u64,

    /// Raw job body
    pub job: Bytes,
}

/// Value of a success reply once any job body has been read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    Empty,
    Job(Bytes),
    Touched(TouchedJob),
    Count(u64),
}

/// A complete reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok(ReplyBody),
    Err(String),
}

/// Parse one status line according to the verb's reply shape
///
/// `line` may still carry its `\r\n` or `\n` terminator. A failure line is
/// never an error here: it becomes `ReplyHeader::Err` with its text. A
/// success line whose fields are missing or unreadable is a protocol error,
/// since the number of bytes that follow it is then unknown.
pub fn parse_reply_line(line: &[u8], shape: ReplyShape, max_job_size: usize) -> Result<ReplyHeader> {
    let line = trim_terminator(line);

    if line.first() != Some(&STATUS_OK) {
        return Ok(ReplyHeader::Err(error_text(line)));
    }

    // Nothing to read past the marker
    if shape == ReplyShape::Status {
        return Ok(ReplyHeader::Ok(ReplyFields::None));
    }

    let text = std::str::from_utf8(line)
        .map_err(|_| QueueError::Protocol("success reply is not ASCII".to_string()))?;
    // First token is the marker itself
    let mut fields = text.split_ascii_whitespace().skip(1);

    let parsed = match shape {
        ReplyShape::Status => ReplyFields::None,
        ReplyShape::Job => {
            let len = next_len(&mut fields, text, max_job_size)?;
            ReplyFields::Job { len }
        }
        ReplyShape::RecycledJob => {
            let recycle_id = next_number(&mut fields, "recycle id", text)?;
            let len = next_len(&mut fields, text, max_job_size)?;
            ReplyFields::RecycledJob { recycle_id, len }
        }
        ReplyShape::Count => ReplyFields::Count(next_number(&mut fields, "queue size", text)?),
    };

    Ok(ReplyHeader::Ok(parsed))
}

fn trim_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Everything after the status token, or the token itself when nothing follows
fn error_text(line: &[u8]) -> String {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return "empty reply".to_string();
    }
    match text.split_once(char::is_whitespace) {
        Some((_, rest)) if !rest.trim().is_empty() => rest.trim().to_string(),
        _ => text.to_string(),
    }
}

fn next_number<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    what: &str,
    line: &str,
) -> Result<u64> {
    let field = fields
        .next()
        .ok_or_else(|| QueueError::Protocol(format!("missing {} in reply {:?}", what, line)))?;
    field
        .parse()
        .map_err(|_| QueueError::Protocol(format!("invalid {} {:?} in reply {:?}", what, field, line)))
}

fn next_len<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    line: &str,
    max_job_size: usize,
) -> Result<usize> {
    let len = next_number(fields, "payload length", line)?;
    let len = usize::try_from(len)
        .map_err(|_| QueueError::Protocol(format!("payload length {} overflows", len)))?;
    if len > max_job_size {
        return Err(QueueError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            len, max_job_size
        )));
    }
    Ok(len)
}
