//! Protocol codec
//!
//! Frame writing and frame reading over a byte stream.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! <verb> <arg1> ... <argN>\r\n
//! <verb> <arg1> ... <argN> <job_len>\r\n<job bytes>\r\n      (submit verbs)
//! ```
//!
//! ### Reply
//! ```text
//! +OK [field ...]\r\n                                        (success)
//! +OK <job_len>\r\n<job bytes>\r\n                            (pop/dequeue/watch)
//! +OK <recycle_id> <job_len>\r\n<job bytes>\r\n               (touch/fetch)
//! -ERR <message>\r\n                                         (failure)
//! ```
//!
//! The body's trailing `\r\n` is consumed but not checked.

use std::io::{BufRead, ErrorKind, Read, Write};

use bytes::{Bytes, BytesMut};

use super::{
    parse_reply_line, Command, Reply, ReplyBody, ReplyFields, ReplyHeader, ReplyShape, TouchedJob,
};
use crate::error::{QueueError, Result};

/// Longest status line accepted from the daemon, terminator included
pub const MAX_LINE_LEN: usize = 1024;

/// Bytes trailing every job body
pub const BODY_TRAILER_LEN: usize = 2;

// =============================================================================
// Frame Writer
// =============================================================================

/// Write a command to a stream as one contiguous write
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = command.encode()?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Frame Reader
// =============================================================================

/// Read one `\n`-terminated line into `line` (cleared first)
///
/// EOF before any byte is `ConnectionClosed`; EOF mid-line is `Truncated`.
pub fn read_reply_line<R: BufRead>(reader: &mut R, line: &mut Vec<u8>) -> Result<()> {
    line.clear();
    let n = reader
        .by_ref()
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', line)?;

    if n == 0 {
        return Err(QueueError::ConnectionClosed);
    }
    if line.last() != Some(&b'\n') {
        if n >= MAX_LINE_LEN {
            return Err(QueueError::Protocol(format!(
                "reply line exceeds {} bytes",
                MAX_LINE_LEN
            )));
        }
        return Err(QueueError::Truncated(format!(
            "reply line ended after {} bytes without terminator",
            n
        )));
    }
    Ok(())
}

/// Read a job body of `len` bytes plus its trailing terminator
///
/// Keeps reading until the full `len + 2` bytes have arrived; a short read
/// is never taken as the end of the body. Returns the body without the
/// terminator.
pub fn read_payload<R: Read>(reader: &mut R, len: usize) -> Result<Bytes> {
    let total = len.checked_add(BODY_TRAILER_LEN).ok_or_else(|| {
        QueueError::Protocol(format!("payload length {} overflows", len))
    })?;
    let mut buf = BytesMut::zeroed(total);
    let mut filled = 0;

    while filled < total {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(QueueError::Truncated(format!(
                    "job body ended after {} of {} bytes",
                    filled, total
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    buf.truncate(len);
    Ok(buf.freeze())
}

/// Read a complete reply: status line, then the job body if one is declared
pub fn read_reply<R: BufRead>(reader: &mut R, shape: ReplyShape, max_job_size: usize) -> Result<Reply> {
    let mut line = Vec::with_capacity(64);
    read_reply_line(reader, &mut line)?;

    let fields = match parse_reply_line(&line, shape, max_job_size)? {
        ReplyHeader::Err(message) => return Ok(Reply::Err(message)),
        ReplyHeader::Ok(fields) => fields,
    };

    let body = match fields {
        ReplyFields::None => ReplyBody::Empty,
        ReplyFields::Count(n) => ReplyBody::Count(n),
        ReplyFields::Job { len } => ReplyBody::Job(read_payload(reader, len)?),
        ReplyFields::RecycledJob { recycle_id, len } => ReplyBody::Touched(TouchedJob {
            recycle_id,
            job: read_payload(reader, len)?,
        }),
    };

    Ok(Reply::Ok(body))
}
