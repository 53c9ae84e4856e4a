// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unbounded FIFO of documents waiting for the printer.
//
// Producers push from any thread; the dispatch loop is the only consumer.
// Closing the queue and draining it happen under one lock, so a document is
// either rejected with `Stopped` or returned by the drain, never lost.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::debug;

use spoolwerk_core::error::{DispatchError, Result};
use spoolwerk_core::types::Document;

struct QueueInner<D> {
    items: VecDeque<D>,
    closed: bool,
}

pub struct PrintQueue<D> {
    inner: Mutex<QueueInner<D>>,
    /// Signalled once per push.  `notify_one` keeps a permit when nobody is
    /// waiting, so a push between the emptiness check and the wait is not lost.
    available: Notify,
}

impl<D> Default for PrintQueue<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> PrintQueue<D> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner<D>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a document at the tail.
    ///
    /// # Errors
    ///
    /// `DispatchError::Stopped` once the queue has been closed.
    pub fn push(&self, document: D) -> Result<()> {
        {
            let mut inner = self.lock();
            if inner.closed {
                return Err(DispatchError::Stopped);
            }
            inner.items.push_back(document);
            debug!(queued = inner.items.len(), "document queued");
        }
        self.available.notify_one();
        Ok(())
    }

    /// Wait for the next document.  Cancel-safe: dropping the future never
    /// loses a document.
    pub async fn pop(&self) -> D {
        loop {
            let next = self.lock().items.pop_front();
            if let Some(document) = next {
                return document;
            }
            self.available.notified().await;
        }
    }

    /// Take the head without waiting.
    pub fn try_pop(&self) -> Option<D> {
        self.lock().items.pop_front()
    }

    /// Reject further pushes.
    pub fn close(&self) {
        self.lock().closed = true;
    }

    /// Close the queue and return everything still waiting, in FIFO order.
    pub fn close_and_drain(&self) -> Vec<D> {
        let mut inner = self.lock();
        inner.closed = true;
        inner.items.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<D: Document> PrintQueue<D> {
    /// Whether a document with this type name is still waiting.
    pub fn contains(&self, type_name: &str) -> bool {
        self.lock()
            .items
            .iter()
            .any(|doc| doc.type_name() == type_name)
    }
}
