//! Shared client
//!
//! The protocol has no request ids, so interleaved exchanges from several
//! threads would corrupt the stream. `SharedClient` serializes every
//! exchange behind one mutex.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::Client;
use crate::config::ClientConfig;
use crate::error::Result;

/// Cloneable handle to one client, usable from many threads
pub struct SharedClient<S: Read + Write = TcpStream> {
    inner: Arc<Mutex<Client<S>>>,
}

impl SharedClient<TcpStream> {
    /// Connect and wrap the client
    pub fn connect(config: ClientConfig) -> Result<Self> {
        Ok(Self::new(Client::connect(config)?))
    }
}

impl<S: Read + Write> SharedClient<S> {
    pub fn new(client: Client<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
        }
    }

    /// Run `f` with exclusive access to the client
    ///
    /// Everything `f` does is one critical section, so a command and any
    /// follow-up (e.g. reading `error_message`) see a consistent state.
    pub fn with<T>(&self, f: impl FnOnce(&mut Client<S>) -> T) -> T {
        let mut client = self.inner.lock();
        f(&mut client)
    }

    /// Lock the client for a sequence of commands
    pub fn lock(&self) -> MutexGuard<'_, Client<S>> {
        self.inner.lock()
    }
}

impl<S: Read + Write> Clone for SharedClient<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
