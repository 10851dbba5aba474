//! Protocol Module
//!
//! Defines the line-oriented wire protocol spoken by the queued daemon.
//!
//! ## Exchange
//! ```text
//!  client                                   daemon
//!    │  enqueue jobs 5 0 12\r\n               │
//!    │  hello\r\nworld\r\n  ────────────────▶ │
//!    │                                        │
//!    │ ◀──────────────────────────  +OK\r\n   │
//!    │                                        │
//!    │  dequeue jobs\r\n  ──────────────────▶ │
//!    │ ◀────────  +OK 12\r\nhello\r\nworld\r\n │
//! ```
//!
//! Strictly one request in flight: the reply (and any job body) must be read
//! in full before the next command is written.

mod verb;
mod command;
mod reply;
mod codec;

pub use verb::{ReplyShape, Verb};
pub use command::{Command, CRLF};
pub use reply::{
    parse_reply_line, Reply, ReplyBody, ReplyFields, ReplyHeader, TouchedJob, STATUS_OK,
};
pub use codec::{
    read_payload, read_reply, read_reply_line, write_command, BODY_TRAILER_LEN, MAX_LINE_LEN,
};
