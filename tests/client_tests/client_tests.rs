//! Client Tests
//!
//! These tests drive `Client` over a scripted in-memory stream and verify:
//! - The exact bytes each operation writes
//! - Reply decoding per verb
//! - Last-error bookkeeping
//! - Broken-connection latching after transport failures
//! - Serialized sharing across threads

use std::io::{self, Cursor, Read, Write};
use std::thread;

use queued_client::protocol::{Command, ReplyBody};
use queued_client::{Client, QueueError, SharedClient, TouchedJob};

// =============================================================================
// Helper Functions
// =============================================================================

/// Duplex stream with canned replies and a capture of everything written
struct ScriptedStream {
    replies: Cursor<Vec<u8>>,
    written: Vec<u8>,
    max_read: usize,
}

impl ScriptedStream {
    fn new(replies: &[u8]) -> Self {
        Self::with_max_read(replies, usize::MAX)
    }

    fn with_max_read(replies: &[u8], max_read: usize) -> Self {
        Self {
            replies: Cursor::new(replies.to_vec()),
            written: Vec::new(),
            max_read,
        }
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.max_read);
        self.replies.read(&mut buf[..n])
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn client(replies: &[u8]) -> Client<ScriptedStream> {
    Client::from_stream(ScriptedStream::new(replies))
}

fn written(client: &Client<ScriptedStream>) -> &[u8] {
    &client.get_ref().written
}

// =============================================================================
// Submit Tests
// =============================================================================

#[test]
fn test_push_writes_frame() {
    let mut c = client(b"+OK\r\n");
    c.push("jobs", 5, b"hello\r\nworld").unwrap();
    assert_eq!(written(&c), b"push jobs 5 0 12\r\nhello\r\nworld\r\n");
}

#[test]
fn test_delay_and_timer_frames() {
    let mut c = client(b"+OK\r\n+OK\r\n");
    c.delay("jobs", 1, 60, b"a").unwrap();
    c.timer("jobs", 2, "2030-01-31/08:00:00", b"b").unwrap();
    assert_eq!(
        written(&c),
        &b"push jobs 1 60 1\r\na\r\ntimer jobs 2 2030-01-31/08:00:00 1\r\nb\r\n"[..]
    );
}

#[test]
fn test_timer_rejects_split_time() {
    let mut c = client(b"+OK\r\n");
    let err = c.timer("jobs", 0, "2030-01-31 08:00:00", b"x").unwrap_err();
    assert!(matches!(err, QueueError::InvalidArgument(_)));
    assert!(written(&c).is_empty());
}

#[test]
fn test_enqueue_with_bare_marker() {
    let mut c = client(b"+\r\n");
    c.enqueue("jobs", 0, 0, b"x").unwrap();
    assert_eq!(written(&c), b"enqueue jobs 0 0 1\r\nx\r\n");
}

#[test]
fn test_push_rejected() {
    let mut c = client(b"-ERR Job size invaild\r\n");
    let err = c.push("jobs", 0, b"").unwrap_err();
    assert_eq!(err.server_message(), Some("Job size invaild"));
    assert!(!c.is_broken());
}

// =============================================================================
// Retrieve Tests
// =============================================================================

#[test]
fn test_pop_returns_job() {
    let mut c = client(b"+OK 12\r\nhello\r\nworld\r\n");
    let job = c.pop("jobs").unwrap();
    assert_eq!(&job[..], b"hello\r\nworld");
    assert_eq!(written(&c), b"pop jobs\r\n");
}

#[test]
fn test_dequeue_and_watch_verbs() {
    let mut c = client(b"+OK 1\r\na\r\n+OK 1\r\nb\r\n");
    assert_eq!(&c.dequeue("q").unwrap()[..], b"a");
    assert_eq!(&c.watch("q").unwrap()[..], b"b");
    assert_eq!(written(&c), b"dequeue q\r\nwatch q\r\n");
}

#[test]
fn test_pop_over_one_byte_transport() {
    let body: Vec<u8> = (0..2048u32).map(|i| (i % 251) as u8).collect();
    let mut wire = format!("+OK {}\r\n", body.len()).into_bytes();
    wire.extend_from_slice(&body);
    wire.extend_from_slice(b"\r\n");
    wire.extend_from_slice(b"+OK 3\r\n");

    let mut c = Client::from_stream(ScriptedStream::with_max_read(&wire, 1));
    let job = c.pop("jobs").unwrap();
    assert_eq!(&job[..], &body[..]);
    assert_eq!(c.qsize("jobs").unwrap(), 3);
}

#[test]
fn test_touch_and_fetch_return_recycle_id() {
    let mut c = client(b"+OK 7 3\r\nabc\r\n+OK 8 2\r\nde\r\n");

    let touched = c.touch("jobs").unwrap();
    assert_eq!(
        touched,
        TouchedJob {
            recycle_id: 7,
            job: (&b"abc"[..]).into()
        }
    );

    let fetched = c.fetch("jobs").unwrap();
    assert_eq!(fetched.recycle_id, 8);
    assert_eq!(&fetched.job[..], b"de");

    assert_eq!(written(&c), b"touch jobs\r\nfetch jobs\r\n");
}

#[test]
fn test_recycle() {
    let mut c = client(b"+OK\r\n-ERR not found this recycle job\r\n");
    c.recycle(7, 1, 0).unwrap();
    let err = c.recycle(99, 1, 0).unwrap_err();
    assert!(matches!(err, QueueError::Server(_)));
    assert_eq!(written(&c), b"recycle 7 1 0\r\nrecycle 99 1 0\r\n");
}

// =============================================================================
// Queue and Session Tests
// =============================================================================

#[test]
fn test_size_remove_and_auth() {
    let mut c = client(b"+OK 4\r\n+OK 4\r\n+OK\r\n+OK\r\n");
    assert_eq!(c.size("jobs").unwrap(), 4);
    assert_eq!(c.qsize("jobs").unwrap(), 4);
    c.remove("jobs").unwrap();
    c.auth("admin", "pw").unwrap();
    assert_eq!(
        written(&c),
        &b"size jobs\r\nqsize jobs\r\nremove jobs\r\nauth admin pw\r\n"[..]
    );
}

#[test]
fn test_exec_serialization() {
    let mut c = client(b"+OK\r\n+OK\r\n+OK\r\n");
    c.exec("noop", Vec::<String>::new()).unwrap();
    c.exec("one", ["x"]).unwrap();
    c.exec("many", &["a", "b", "c"]).unwrap();
    assert_eq!(
        written(&c),
        &b"exec noop 0\r\nexec one 1 x\r\nexec many 3 a b c\r\n"[..]
    );
}

#[test]
fn test_execute_generic_command() {
    let mut c = client(b"+OK 2\r\n");
    let body = c.execute(&Command::size(queued_client::protocol::Verb::Size, "q")).unwrap();
    assert_eq!(body, ReplyBody::Count(2));
}

// =============================================================================
// Last Error Tests
// =============================================================================

#[test]
fn test_error_message_empty_before_failure() {
    let mut c = client(b"+OK\r\n");
    assert_eq!(c.error_message(), None);
    c.push("jobs", 0, b"x").unwrap();
    assert_eq!(c.error_message(), None);
}

#[test]
fn test_error_message_tracks_latest_failure() {
    let mut c = client(b"-ERR the queue was empty\r\n+OK 1\r\n-ERR not found the queue\r\n");

    let err = c.pop("jobs").unwrap_err();
    assert!(!err.is_fatal());
    assert_eq!(c.error_message(), Some("the queue was empty"));

    // Success does not clear it, the connection is still usable
    assert_eq!(c.size("jobs").unwrap(), 1);
    assert_eq!(c.error_message(), Some("the queue was empty"));

    c.remove("other").unwrap_err();
    assert_eq!(c.error_message(), Some("not found the queue"));
}

#[test]
fn test_error_message_replaced_by_local_failure() {
    let mut c = client(b"-ERR the queue was empty\r\n");

    c.pop("jobs").unwrap_err();
    assert_eq!(c.error_message(), Some("the queue was empty"));

    let err = c.push("bad queue", 0, b"x").unwrap_err();
    assert!(matches!(err, QueueError::InvalidArgument(_)));
    assert_eq!(c.error_message(), Some(err.to_string().as_str()));
}

#[test]
fn test_error_message_replaced_by_transport_failure() {
    let mut c = client(b"-ERR the queue was empty\r\n+OK 10\r\nhel");

    c.pop("jobs").unwrap_err();
    let err = c.pop("jobs").unwrap_err();
    assert!(matches!(err, QueueError::Truncated(_)));
    assert_eq!(c.error_message(), Some(err.to_string().as_str()));

    let err = c.size("jobs").unwrap_err();
    assert!(matches!(err, QueueError::Broken));
    assert_eq!(c.error_message(), Some(err.to_string().as_str()));
}

#[test]
fn test_ping() {
    let mut c = client(b"+OK\r\n+\r\n-ERR unreliable connection\r\n");
    assert!(c.ping().unwrap());
    assert!(c.ping().unwrap());
    assert!(!c.ping().unwrap());
    assert_eq!(c.error_message(), None);
    assert_eq!(written(&c), b"ping\r\nping\r\nping\r\n");
}

// =============================================================================
// Transport Failure Tests
// =============================================================================

#[test]
fn test_invalid_argument_writes_nothing() {
    let mut c = client(b"+OK\r\n");
    let err = c.push("two words", 0, b"x").unwrap_err();
    assert!(matches!(err, QueueError::InvalidArgument(_)));
    assert!(!c.is_broken());
    assert!(written(&c).is_empty());

    c.push("ok", 0, b"x").unwrap();
}

#[test]
fn test_truncated_payload_breaks_connection() {
    let mut c = client(b"+OK 10\r\nhel");
    let err = c.pop("jobs").unwrap_err();
    assert!(matches!(err, QueueError::Truncated(_)));
    assert!(c.is_broken());

    let before = written(&c).len();
    assert!(matches!(c.ping(), Err(QueueError::Broken)));
    assert!(matches!(c.size("jobs"), Err(QueueError::Broken)));
    assert_eq!(written(&c).len(), before);
}

#[test]
fn test_peer_close_breaks_connection() {
    let mut c = client(b"");
    assert!(matches!(c.ping(), Err(QueueError::ConnectionClosed)));
    assert!(c.is_broken());
    assert_eq!(c.error_message(), None);
}

#[test]
fn test_oversized_job_breaks_connection() {
    let mut c = client(b"+OK 100\r\n").with_max_job_size(10).unwrap();
    let err = c.pop("jobs").unwrap_err();
    assert!(matches!(err, QueueError::Protocol(_)));
    assert!(c.is_broken());
}

#[test]
fn test_unbounded_limit_with_huge_length_is_protocol_error() {
    let mut c = client(format!("+OK {}\r\n", usize::MAX).as_bytes())
        .with_max_job_size(usize::MAX)
        .unwrap();
    let err = c.pop("jobs").unwrap_err();
    assert!(matches!(err, QueueError::Protocol(_)));
    assert!(c.is_broken());
}

#[test]
fn test_zero_max_job_size_rejected() {
    let err = client(b"").with_max_job_size(0).err().unwrap();
    assert!(matches!(err, QueueError::Config(_)));
}

#[test]
fn test_malformed_success_breaks_connection() {
    let mut c = client(b"+OK\r\n");
    assert!(matches!(c.pop("jobs"), Err(QueueError::Protocol(_))));
    assert!(c.is_broken());
}

// =============================================================================
// Shared Client Tests
// =============================================================================

#[test]
fn test_shared_client_serializes_exchanges() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let replies = b"+OK\r\n".repeat(THREADS * PER_THREAD);
    let shared = SharedClient::new(client(&replies));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    assert!(shared.with(|c| c.ping()).unwrap());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let client = shared.lock();
    assert_eq!(written(&client), b"ping\r\n".repeat(THREADS * PER_THREAD));
    assert!(!client.is_broken());
}
