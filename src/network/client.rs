//! Protocol Client
//!
//! Owns one duplex stream to the daemon and runs one blocking exchange per
//! command: write the command frame, read the status line, read the job body
//! when the status line declares one.

use std::io::{BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use bytes::Bytes;

use crate::config::{ClientConfig, DEFAULT_MAX_JOB_SIZE};
use crate::error::{QueueError, Result};
use crate::protocol::{read_reply, write_command, Command, Reply, ReplyBody, TouchedJob, Verb};

/// A connection to a queued daemon
///
/// The stream is generic so the same exchange logic runs over TCP and over
/// in-memory transports. Only one request is ever in flight; methods take
/// `&mut self`, so sharing a client across threads needs a lock (see
/// [`SharedClient`](super::SharedClient)).
pub struct Client<S: Read + Write = TcpStream> {
    /// Stream (reads buffered, writes go straight to the inner stream)
    stream: BufReader<S>,

    /// Config used to (re)connect; absent for clients built from a stream
    config: Option<ClientConfig>,

    /// Largest job body a reply may declare
    max_job_size: usize,

    /// Text of the most recent failure
    last_error: Option<String>,

    /// Set once the stream failed; the client refuses further commands
    broken: bool,

    /// Peer address for logging
    peer_addr: String,
}

impl Client<TcpStream> {
    /// Connect to the daemon named by `config`
    ///
    /// Tries every address the host resolves to; the last connect error is
    /// returned when none succeeds.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let stream = open_stream(&config)?;
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| config.addr.clone());

        tracing::debug!("Connected to {}", peer_addr);

        Ok(Self {
            stream: BufReader::new(stream),
            max_job_size: config.max_job_size,
            config: Some(config),
            last_error: None,
            broken: false,
            peer_addr,
        })
    }

    /// Replace the stream with a fresh connection
    ///
    /// Clears the broken state. The last error text is kept.
    pub fn reconnect(&mut self) -> Result<()> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| QueueError::Config("client has no address to reconnect to".to_string()))?;

        let stream = open_stream(config)?;
        if let Ok(addr) = stream.peer_addr() {
            self.peer_addr = addr.to_string();
        }
        self.stream = BufReader::new(stream);
        self.broken = false;

        tracing::debug!("Reconnected to {}", self.peer_addr);
        Ok(())
    }

    /// Config this client was connected with
    pub fn config(&self) -> Option<&ClientConfig> {
        self.config.as_ref()
    }
}

fn open_stream(config: &ClientConfig) -> Result<TcpStream> {
    let mut last_err = None;

    for addr in config.addr.to_socket_addrs()? {
        let attempt = match config.connect_timeout() {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => {
                stream.set_nodelay(config.nodelay)?;
                stream.set_read_timeout(config.read_timeout())?;
                stream.set_write_timeout(config.write_timeout())?;
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!("Connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(match last_err {
        Some(e) => QueueError::Io(e),
        None => QueueError::Config(format!("address {:?} resolved to nothing", config.addr)),
    })
}

impl<S: Read + Write> Client<S> {
    /// Wrap an already-open stream
    pub fn from_stream(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
            config: None,
            max_job_size: DEFAULT_MAX_JOB_SIZE,
            last_error: None,
            broken: false,
            peer_addr: "stream".to_string(),
        }
    }

    /// Override the largest job body a reply may declare
    ///
    /// Zero is rejected with `QueueError::Config`, as in the config builder.
    pub fn with_max_job_size(mut self, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(QueueError::Config("max_job_size must be positive".to_string()));
        }
        self.max_job_size = size;
        Ok(self)
    }

    // =========================================================================
    // Exchange
    // =========================================================================

    /// Run one command and return the success body
    ///
    /// Every failure is recorded as the last error: a daemon rejection by its
    /// text, anything else by the error's display form.
    pub fn execute(&mut self, command: &Command) -> Result<ReplyBody> {
        let result = self.send(command);
        if let Err(ref e) = result {
            let message = match e {
                QueueError::Server(message) => {
                    tracing::debug!("{} rejected by {}: {}", command.verb(), self.peer_addr, message);
                    message.clone()
                }
                other => other.to_string(),
            };
            self.last_error = Some(message);
        }
        result
    }

    /// Exchange without recording failures
    fn send(&mut self, command: &Command) -> Result<ReplyBody> {
        if self.broken {
            return Err(QueueError::Broken);
        }

        let result = self.exchange(command);
        if let Err(ref e) = result {
            if e.is_fatal() {
                tracing::warn!("Connection to {} is broken: {}", self.peer_addr, e);
                self.broken = true;
            }
        }
        result
    }

    fn exchange(&mut self, command: &Command) -> Result<ReplyBody> {
        tracing::trace!("Sending {} to {}", command.verb(), self.peer_addr);
        write_command(self.stream.get_mut(), command)?;

        match read_reply(&mut self.stream, command.verb().reply_shape(), self.max_job_size)? {
            Reply::Ok(body) => Ok(body),
            Reply::Err(message) => Err(QueueError::Server(message)),
        }
    }

    // =========================================================================
    // Submit
    // =========================================================================

    /// Submit a job that is ready immediately
    pub fn push(&mut self, queue: &str, priority: u32, job: &[u8]) -> Result<()> {
        self.delay(queue, priority, 0, job)
    }

    /// Submit a job that becomes ready after `delay` seconds
    pub fn delay(&mut self, queue: &str, priority: u32, delay: u64, job: &[u8]) -> Result<()> {
        let command = Command::push(queue, priority, delay, Bytes::copy_from_slice(job));
        self.execute(&command).and_then(expect_empty)
    }

    /// Submit a job that becomes ready at `time`
    ///
    /// `time` is sent as a single token; the daemon expects the
    /// `YYYY-MM-DD/hh:mm:ss` form and rejects anything else.
    pub fn timer(&mut self, queue: &str, priority: u32, time: &str, job: &[u8]) -> Result<()> {
        let command = Command::timer(queue, priority, time, Bytes::copy_from_slice(job));
        self.execute(&command).and_then(expect_empty)
    }

    /// Submit a job with the `enqueue` verb
    pub fn enqueue(&mut self, queue: &str, priority: u32, delay: u64, job: &[u8]) -> Result<()> {
        let command = Command::enqueue(queue, priority, delay, Bytes::copy_from_slice(job));
        self.execute(&command).and_then(expect_empty)
    }

    // =========================================================================
    // Retrieve
    // =========================================================================

    /// Take the next ready job off `queue`
    pub fn pop(&mut self, queue: &str) -> Result<Bytes> {
        self.take_job(Verb::Pop, queue)
    }

    /// Take the next ready job off `queue` with the `dequeue` verb
    pub fn dequeue(&mut self, queue: &str) -> Result<Bytes> {
        self.take_job(Verb::Dequeue, queue)
    }

    /// Take the next ready job off `queue` with the `watch` verb
    pub fn watch(&mut self, queue: &str) -> Result<Bytes> {
        self.take_job(Verb::Watch, queue)
    }

    /// Take the next job and park it on the daemon until recycled
    pub fn touch(&mut self, queue: &str) -> Result<TouchedJob> {
        self.take_touched(Verb::Touch, queue)
    }

    /// Same as [`touch`](Self::touch), with the `fetch` verb
    pub fn fetch(&mut self, queue: &str) -> Result<TouchedJob> {
        self.take_touched(Verb::Fetch, queue)
    }

    /// Put a touched job back into its queue
    pub fn recycle(&mut self, recycle_id: u64, priority: u32, delay: u64) -> Result<()> {
        self.execute(&Command::recycle(recycle_id, priority, delay))
            .and_then(expect_empty)
    }

    fn take_job(&mut self, verb: Verb, queue: &str) -> Result<Bytes> {
        match self.execute(&Command::take(verb, queue))? {
            ReplyBody::Job(job) => Ok(job),
            other => Err(unexpected(verb, &other)),
        }
    }

    fn take_touched(&mut self, verb: Verb, queue: &str) -> Result<TouchedJob> {
        match self.execute(&Command::take(verb, queue))? {
            ReplyBody::Touched(touched) => Ok(touched),
            other => Err(unexpected(verb, &other)),
        }
    }

    // =========================================================================
    // Queues
    // =========================================================================

    /// Delete a queue and every job in it
    pub fn remove(&mut self, queue: &str) -> Result<()> {
        self.execute(&Command::remove(queue)).and_then(expect_empty)
    }

    /// Number of jobs in `queue`
    pub fn qsize(&mut self, queue: &str) -> Result<u64> {
        self.count(Verb::Qsize, queue)
    }

    /// Number of jobs in `queue`, with the `size` verb
    pub fn size(&mut self, queue: &str) -> Result<u64> {
        self.count(Verb::Size, queue)
    }

    fn count(&mut self, verb: Verb, queue: &str) -> Result<u64> {
        match self.execute(&Command::size(verb, queue))? {
            ReplyBody::Count(n) => Ok(n),
            other => Err(unexpected(verb, &other)),
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Liveness check
    ///
    /// A rejection yields `Ok(false)`; only transport failures are errors.
    /// Neither touches the last error.
    pub fn ping(&mut self) -> Result<bool> {
        match self.send(&Command::ping()) {
            Ok(_) => Ok(true),
            Err(QueueError::Server(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Authenticate this connection
    pub fn auth(&mut self, user: &str, pass: &str) -> Result<()> {
        self.execute(&Command::auth(user, pass)).and_then(expect_empty)
    }

    /// Invoke a function registered on the daemon
    pub fn exec<I, A>(&mut self, function: &str, args: I) -> Result<()>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<str>,
    {
        self.execute(&Command::exec(function, args)).and_then(expect_empty)
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Text of the most recent failure on this client
    pub fn error_message(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether a transport failure has made this client unusable
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Borrow the underlying stream
    pub fn get_ref(&self) -> &S {
        self.stream.get_ref()
    }

    /// Unwrap the underlying stream, dropping any buffered input
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }
}

fn expect_empty(body: ReplyBody) -> Result<()> {
    match body {
        ReplyBody::Empty => Ok(()),
        other => Err(QueueError::Protocol(format!("unexpected reply body {:?}", other))),
    }
}

fn unexpected(verb: Verb, body: &ReplyBody) -> QueueError {
    QueueError::Protocol(format!("unexpected reply body for {}: {:?}", verb, body))
}
