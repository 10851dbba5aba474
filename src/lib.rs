//! # queued-client
//!
//! A blocking client for the queued job-queue daemon:
//! - Line-oriented commands over one persistent TCP connection
//! - Binary-safe job bodies framed by declared length
//! - Daemon rejections kept apart from transport failures
//! - Mutex-serialized sharing across threads
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Client (one method per verb)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Command
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │           Exchange: write frame → read status line           │
//! │                   → read declared job body                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ Frame Writer│          │ Reply Parser│
//!   │  (encode)   │          │ (per verb)  │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use queued_client::{Client, ClientConfig};
//!
//! # fn main() -> queued_client::Result<()> {
//! let config = ClientConfig::builder().addr("127.0.0.1:21012").build()?;
//! let mut client = Client::connect(config)?;
//!
//! client.enqueue("jobs", 5, 0, b"hello\r\nworld")?;
//! assert_eq!(client.size("jobs")?, 1);
//! let job = client.dequeue("jobs")?;
//! assert_eq!(&job[..], b"hello\r\nworld");
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{QueueError, Result};
pub use config::ClientConfig;
pub use network::{Client, SharedClient};
pub use protocol::TouchedJob;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of queued-client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
