//! The FIFO work queue.
//!
//! Grounded on `sqlx-core/src/pool/queue.rs`'s `ConnectionQueue` for the
//! "FIFO of waiters" shape, simplified from a lock-free `SegQueue` to a plain
//! `VecDeque` — this queue is only ever touched from the single actor task
//! that owns the rest of the pool state, so there is no cross-thread
//! contention to design around.

use std::collections::VecDeque;

use tokio::sync::oneshot;

use crate::backend::{Backend, QueryResult, Row};
use crate::client::ClientHandle;
use crate::error::Result;

/// One request waiting for a `Client` to become available. A transaction
/// request carries no SQL of its own, hence the separate `Begin` variant.
pub(crate) enum PendingRequest<B: Backend> {
    Query {
        qs: String,
        reply: oneshot::Sender<Result<QueryResult<Row<B>>>>,
    },
    Begin {
        reply: oneshot::Sender<Result<ClientHandle<B>>>,
    },
}

#[derive(Default)]
pub(crate) struct WorkQueue<B: Backend> {
    items: VecDeque<PendingRequest<B>>,
}

impl<B: Backend> WorkQueue<B> {
    pub(crate) fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn push_back(&mut self, item: PendingRequest<B>) {
        self.items.push_back(item);
    }

    pub(crate) fn pop_front(&mut self) -> Option<PendingRequest<B>> {
        self.items.pop_front()
    }

    /// Drains every still-queued request, in FIFO order, for the terminal
    /// failure-budget and shutdown-with-leftover-queue paths.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = PendingRequest<B>> {
        std::mem::take(&mut self.items).into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let mut queue: WorkQueue<crate::testing::MockBackend> = WorkQueue::new();
        let (tx1, _rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        queue.push_back(PendingRequest::Query {
            qs: "A".into(),
            reply: tx1,
        });
        queue.push_back(PendingRequest::Query {
            qs: "B".into(),
            reply: tx2,
        });

        let first = queue.pop_front().unwrap();
        match first {
            PendingRequest::Query { qs, .. } => assert_eq!(qs, "A"),
            PendingRequest::Begin { .. } => panic!("expected Query"),
        }
    }
}
