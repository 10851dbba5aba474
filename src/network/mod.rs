//! Network Module
//!
//! Client side of the daemon connection.
//!
//! ## Architecture
//! - One stream per client, exclusively owned
//! - One blocking exchange per command, never pipelined
//! - A transport failure latches the client broken until `reconnect`

mod client;
mod shared;

pub use client::Client;
pub use shared::SharedClient;
