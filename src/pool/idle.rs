//! The idle-connection LIFO pool.
//!
//! Grounded on `sqlx-core/src/pool/inner.rs`'s idle-connection bookkeeping,
//! reduced from a channel-backed queue to a plain `Vec` used as a stack — no
//! ordering guarantee among idle connections is required, and (as with
//! [`crate::pool::queue::WorkQueue`]) only the owning actor task ever touches
//! this structure.

use crate::backend::Backend;
use crate::client::Client;

#[derive(Default)]
pub(crate) struct IdlePool<B: Backend> {
    clients: Vec<Client<B>>,
}

impl<B: Backend> IdlePool<B> {
    pub(crate) fn new() -> Self {
        Self { clients: Vec::new() }
    }

    pub(crate) fn push(&mut self, client: Client<B>) {
        self.clients.push(client);
    }

    pub(crate) fn pop(&mut self) -> Option<Client<B>> {
        self.clients.pop()
    }

    /// Empties the pool, handing every idle client to the caller for destruction.
    pub(crate) fn drain(&mut self) -> Vec<Client<B>> {
        std::mem::take(&mut self.clients)
    }
}
