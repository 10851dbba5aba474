//! Verb definitions
//!
//! Every command the daemon understands, together with the shape of the
//! fields its success reply carries.

use std::fmt;

/// Command verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Push,
    Enqueue,
    Timer,
    Pop,
    Dequeue,
    Watch,
    Touch,
    Fetch,
    Recycle,
    Remove,
    Qsize,
    Size,
    Ping,
    Auth,
    Exec,
}

/// Fields that follow the `+` status token of a success reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    /// Status marker only
    Status,

    /// `payload_length`, then `payload_length + 2` bytes of job body
    Job,

    /// `recycle_id payload_length`, then the job body
    RecycledJob,

    /// `queue_size`
    Count,
}

impl Verb {
    /// Every verb, in wire-table order
    pub const ALL: [Verb; 15] = [
        Verb::Push,
        Verb::Enqueue,
        Verb::Timer,
        Verb::Pop,
        Verb::Dequeue,
        Verb::Watch,
        Verb::Touch,
        Verb::Fetch,
        Verb::Recycle,
        Verb::Remove,
        Verb::Qsize,
        Verb::Size,
        Verb::Ping,
        Verb::Auth,
        Verb::Exec,
    ];

    /// The token written on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Push => "push",
            Verb::Enqueue => "enqueue",
            Verb::Timer => "timer",
            Verb::Pop => "pop",
            Verb::Dequeue => "dequeue",
            Verb::Watch => "watch",
            Verb::Touch => "touch",
            Verb::Fetch => "fetch",
            Verb::Recycle => "recycle",
            Verb::Remove => "remove",
            Verb::Qsize => "qsize",
            Verb::Size => "size",
            Verb::Ping => "ping",
            Verb::Auth => "auth",
            Verb::Exec => "exec",
        }
    }

    /// Look up a verb by its wire token
    pub fn from_wire(token: &str) -> Option<Verb> {
        Verb::ALL.iter().copied().find(|v| v.as_str() == token)
    }

    /// Shape of this verb's success reply
    pub fn reply_shape(&self) -> ReplyShape {
        match self {
            Verb::Pop | Verb::Dequeue | Verb::Watch => ReplyShape::Job,
            Verb::Touch | Verb::Fetch => ReplyShape::RecycledJob,
            Verb::Qsize | Verb::Size => ReplyShape::Count,
            Verb::Push
            | Verb::Enqueue
            | Verb::Timer
            | Verb::Recycle
            | Verb::Remove
            | Verb::Ping
            | Verb::Auth
            | Verb::Exec => ReplyShape::Status,
        }
    }

    /// Whether the command line is followed by a job body
    pub fn carries_job(&self) -> bool {
        matches!(self, Verb::Push | Verb::Enqueue | Verb::Timer)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
