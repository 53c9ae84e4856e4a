// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted printer for dispatcher tests.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};

use spoolwerk_core::error::{DispatchError, Result};
use spoolwerk_core::types::PrintDocument;

use crate::action::PrintAction;
use crate::dispatcher::PrintDispatcher;
use crate::printer::Printer;

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Reports every started print on a channel and holds each one until the
/// test calls [`skip`](Self::skip).
pub(crate) struct MockPrinter {
    started_tx: mpsc::UnboundedSender<PrintDocument>,
    started_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<PrintDocument>>,
    release: Semaphore,
    release_all: AtomicBool,
    failing: Mutex<HashSet<String>>,
    stops: AtomicUsize,
}

impl MockPrinter {
    pub(crate) fn new() -> Self {
        let (started_tx, started_rx) = mpsc::unbounded_channel();
        Self {
            started_tx,
            started_rx: tokio::sync::Mutex::new(started_rx),
            release: Semaphore::new(0),
            release_all: AtomicBool::new(false),
            failing: Mutex::new(HashSet::new()),
            stops: AtomicUsize::new(0),
        }
    }

    /// Let one held (or future) print finish.
    pub(crate) fn skip(&self) {
        self.release.add_permits(1);
    }

    /// Stop holding prints altogether.
    pub(crate) fn skip_all(&self) {
        self.release_all.store(true, Ordering::SeqCst);
    }

    /// Make prints of this type name fail immediately.
    pub(crate) fn fail_on(&self, type_name: &str) {
        self.failing.lock().unwrap().insert(type_name.to_string());
    }

    /// Next document the printer started on.
    pub(crate) async fn next_started(&self) -> PrintDocument {
        let mut rx = self.started_rx.lock().await;
        tokio::time::timeout(TEST_TIMEOUT, rx.recv())
            .await
            .expect("no print started in time")
            .expect("printer channel closed")
    }

    pub(crate) fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait_for_stops(&self, count: usize) {
        tokio::time::timeout(TEST_TIMEOUT, async {
            while self.stop_count() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("printer was not stopped in time");
    }
}

impl Printer for MockPrinter {
    type Document = PrintDocument;

    async fn print(&self, document: &PrintDocument) -> Result<()> {
        let _ = self.started_tx.send(document.clone());

        let fails = self.failing.lock().unwrap().contains(&document.type_name);
        if fails {
            return Err(DispatchError::Printer(format!(
                "cannot print '{}'",
                document.type_name
            )));
        }
        if self.release_all.load(Ordering::SeqCst) {
            return Ok(());
        }

        let permit = self
            .release
            .acquire()
            .await
            .map_err(|_| DispatchError::Interrupted)?;
        permit.forget();
        Ok(())
    }

    fn stop(&self) -> Option<PrintDocument> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        None
    }
}

/// Poll until the dispatcher has recorded an action for `type_name`.
pub(crate) async fn wait_for_action<P: Printer>(
    dispatcher: &PrintDispatcher<P>,
    type_name: &str,
) -> PrintAction<P::Document> {
    tokio::time::timeout(TEST_TIMEOUT, async {
        loop {
            if let Some(action) = dispatcher.action(type_name) {
                return action;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("action was not recorded in time")
}

/// Poll `future` exactly once.  `None` if it is still pending.
pub(crate) async fn poll_once<F: Future + Unpin>(future: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        output = future => Some(output),
        _ = std::future::ready(()) => None,
    }
}
