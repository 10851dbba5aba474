//! Command definitions
//!
//! An outbound request: a verb, its ordered arguments and, for submit verbs,
//! the job body. The body's byte length is appended as the final argument
//! when the command is encoded.

use bytes::{BufMut, Bytes, BytesMut};

use super::Verb;
use crate::error::{QueueError, Result};

/// Line terminator used by both directions of the protocol
pub const CRLF: &[u8] = b"\r\n";

/// A command ready to be written to the daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: Verb,
    args: Vec<String>,
    job: Option<Bytes>,
}

impl Command {
    fn new(verb: Verb, args: Vec<String>) -> Self {
        Self { verb, args, job: None }
    }

    fn with_job(verb: Verb, args: Vec<String>, job: Bytes) -> Self {
        Self {
            verb,
            args,
            job: Some(job),
        }
    }

    // =========================================================================
    // Submit Commands
    // =========================================================================

    /// `push <queue> <priority> <delay> <len>` followed by the job.
    /// A zero delay makes the job ready immediately.
    pub fn push(queue: &str, priority: u32, delay: u64, job: impl Into<Bytes>) -> Self {
        Self::with_job(
            Verb::Push,
            vec![queue.to_string(), priority.to_string(), delay.to_string()],
            job.into(),
        )
    }

    /// `enqueue <queue> <priority> <delay> <len>` followed by the job
    pub fn enqueue(queue: &str, priority: u32, delay: u64, job: impl Into<Bytes>) -> Self {
        Self::with_job(
            Verb::Enqueue,
            vec![queue.to_string(), priority.to_string(), delay.to_string()],
            job.into(),
        )
    }

    /// `timer <queue> <priority> <time> <len>` followed by the job.
    /// `time` is passed through verbatim, e.g. `2030-01-31/08:00:00`.
    pub fn timer(queue: &str, priority: u32, time: &str, job: impl Into<Bytes>) -> Self {
        Self::with_job(
            Verb::Timer,
            vec![queue.to_string(), priority.to_string(), time.to_string()],
            job.into(),
        )
    }

    // =========================================================================
    // Retrieval Commands
    // =========================================================================

    /// `pop`, `dequeue`, `watch`, `touch` or `fetch` on one queue
    pub fn take(verb: Verb, queue: &str) -> Self {
        Self::new(verb, vec![queue.to_string()])
    }

    /// `recycle <id> <priority> <delay>`
    pub fn recycle(recycle_id: u64, priority: u32, delay: u64) -> Self {
        Self::new(
            Verb::Recycle,
            vec![recycle_id.to_string(), priority.to_string(), delay.to_string()],
        )
    }

    // =========================================================================
    // Queue Management Commands
    // =========================================================================

    /// `remove <queue>`
    pub fn remove(queue: &str) -> Self {
        Self::new(Verb::Remove, vec![queue.to_string()])
    }

    /// `qsize <queue>` or `size <queue>`
    pub fn size(verb: Verb, queue: &str) -> Self {
        Self::new(verb, vec![queue.to_string()])
    }

    // =========================================================================
    // Session Commands
    // =========================================================================

    pub fn ping() -> Self {
        Self::new(Verb::Ping, Vec::new())
    }

    /// `auth <user> <pass>`
    pub fn auth(user: &str, pass: &str) -> Self {
        Self::new(Verb::Auth, vec![user.to_string(), pass.to_string()])
    }

    /// `exec <name> <argcount> <args...>`
    pub fn exec<I, S>(function: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rest: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let mut all = Vec::with_capacity(rest.len() + 2);
        all.push(function.to_string());
        all.push(rest.len().to_string());
        all.extend(rest);
        Self::new(Verb::Exec, all)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn job(&self) -> Option<&Bytes> {
        self.job.as_ref()
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Check that every argument is usable as a single line field
    pub fn validate(&self) -> Result<()> {
        for arg in &self.args {
            validate_token(arg)?;
        }
        Ok(())
    }

    /// Encode to the exact bytes written on the wire
    ///
    /// Format: `<verb> <arg1> ... <argN>[ <job_len>]\r\n[<job>\r\n]`
    pub fn encode(&self) -> Result<BytesMut> {
        self.validate()?;

        let job_len = self.job.as_ref().map(|j| j.len()).unwrap_or(0);
        let line_len: usize = self.args.iter().map(|a| a.len() + 1).sum();
        let mut buf = BytesMut::with_capacity(self.verb.as_str().len() + line_len + job_len + 32);

        buf.put_slice(self.verb.as_str().as_bytes());
        for arg in &self.args {
            buf.put_u8(b' ');
            buf.put_slice(arg.as_bytes());
        }

        match &self.job {
            Some(job) => {
                // Length is the raw byte count, the daemon frames the body by it
                buf.put_u8(b' ');
                buf.put_slice(job.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                buf.put_slice(job);
                buf.put_slice(CRLF);
            }
            None => buf.put_slice(CRLF),
        }

        Ok(buf)
    }
}

/// Reject values that would split or terminate the command line
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(QueueError::InvalidArgument(
            "empty argument".to_string(),
        ));
    }
    if let Some(c) = token
        .chars()
        .find(|c| c.is_whitespace() || c.is_control())
    {
        return Err(QueueError::InvalidArgument(format!(
            "argument {:?} contains separator {:?}",
            token, c
        )));
    }
    Ok(())
}
