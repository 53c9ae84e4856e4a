// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-worker print dispatcher.
//
// Producers enqueue documents from anywhere; one background Tokio task takes
// them in FIFO order, hands each to the print worker, records the resulting
// `PrintAction` under the document's type name, and waits for it before
// taking the next one.  Both waits race the shutdown token, so `stop()` can
// unblock the loop whether it is idle or mid-print.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use spoolwerk_core::config::DispatcherConfig;
use spoolwerk_core::error::{DispatchError, Result};
use spoolwerk_core::types::{
    ActionSnapshot, DispatcherState, Document, JobState, duration_millis,
};

use crate::action::PrintAction;
use crate::printer::Printer;
use crate::queue::PrintQueue;
use crate::registry::ActionRegistry;
use crate::worker::PrintWorker;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Shutdown bookkeeping, owned by whichever `stop()` call holds the lock.
struct Teardown<D> {
    loop_task: Option<JoinHandle<()>>,
    /// Queue remainder, drained once and handed to every `stop()` caller.
    remainder: Option<Vec<D>>,
}

/// State shared between the dispatcher handle and its background loop.
struct Shared<D> {
    queue: PrintQueue<D>,
    actions: ActionRegistry<D>,
    /// Documents taken off the queue so far, superseded ones included.
    dispatched: AtomicUsize,
}

/// Accepts documents, prints them one at a time, and answers queries about
/// what has printed.
///
/// Must be created inside a Tokio runtime.  Dropping the dispatcher without
/// calling [`stop`](Self::stop) signals the loop to exit but does not wait.
pub struct PrintDispatcher<P: Printer> {
    shared: Arc<Shared<P::Document>>,
    shutdown: CancellationToken,
    teardown: AsyncMutex<Teardown<P::Document>>,
    state: Mutex<DispatcherState>,
    shutdown_grace: Duration,
}

impl<P: Printer> PrintDispatcher<P> {
    /// Start a dispatcher with default configuration.
    pub fn new(printer: Arc<P>) -> Self {
        Self::with_config(printer, &DispatcherConfig::default())
    }

    /// Start a dispatcher and its background loop.
    pub fn with_config(printer: Arc<P>, config: &DispatcherConfig) -> Self {
        let shared = Arc::new(Shared {
            queue: PrintQueue::new(),
            actions: ActionRegistry::new(),
            dispatched: AtomicUsize::new(0),
        });
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(dispatch_loop(
            PrintWorker::new(printer),
            Arc::clone(&shared),
            shutdown.clone(),
        ));

        info!(shutdown_grace_ms = config.shutdown_grace_ms, "print dispatcher started");

        Self {
            shared,
            shutdown,
            teardown: AsyncMutex::new(Teardown {
                loop_task: Some(handle),
                remainder: None,
            }),
            state: Mutex::new(DispatcherState::Running),
            shutdown_grace: config.shutdown_grace(),
        }
    }

    /// Queue a document for printing.
    ///
    /// # Errors
    ///
    /// `DispatchError::Stopped` once [`stop`](Self::stop) has begun.
    pub fn print(&self, document: P::Document) -> Result<()> {
        debug!(type_name = document.type_name(), "submit");
        self.shared.queue.push(document)
    }

    /// Abort the latest dispatched job with this type name.
    ///
    /// Returns the job's document, or `None` if nothing with that name has
    /// been dispatched.  Jobs still waiting in the queue are not affected.
    /// Cancelling a finished job changes nothing but still returns it.
    #[instrument(skip(self))]
    pub fn cancel(&self, type_name: &str) -> Option<P::Document> {
        info!("attempt to cancel doc");
        let Some(action) = self.shared.actions.get(type_name) else {
            if self.shared.queue.contains(type_name) {
                debug!("document is still queued; queued jobs cannot be cancelled");
            }
            return None;
        };
        if !action.abort() {
            debug!(%action, "action already finished");
        }
        Some(action.document().clone())
    }

    /// Stop the dispatcher.
    ///
    /// Closes the queue, aborts the active job, waits for the background
    /// loop to exit, and returns every document that will never print:
    /// aborted jobs in dispatch order followed by the queue remainder in
    /// submission order.  Concurrent and repeated calls all wait for the
    /// same teardown and return the same list.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Vec<P::Document> {
        self.begin_stopping();
        self.shared.queue.close();

        let aborted = self.shared.actions.abort_active();
        debug!(aborted, "active actions aborted");
        self.shutdown.cancel();

        let remainder = {
            let mut teardown = self.teardown.lock().await;
            if let Some(handle) = teardown.loop_task.as_mut() {
                self.join_loop(handle).await;
                teardown.loop_task = None;
            }
            let remainder = teardown
                .remainder
                .get_or_insert_with(|| self.shared.queue.close_and_drain())
                .clone();
            self.set_state(DispatcherState::Stopped);
            remainder
        };

        let mut not_printed = self.shared.actions.documents_where(PrintAction::is_aborted);
        not_printed.extend(remainder);
        info!(not_printed = not_printed.len(), "print dispatcher stopped");
        not_printed
    }

    /// Wait for the loop task, aborting it once the grace period runs out.
    async fn join_loop(&self, handle: &mut JoinHandle<()>) {
        match tokio::time::timeout(self.shutdown_grace, &mut *handle).await {
            Ok(Ok(())) => debug!("dispatch loop joined"),
            Ok(Err(e)) => warn!(error = %e, "dispatch loop task failed"),
            Err(_) => {
                warn!(
                    grace_ms = duration_millis(&self.shutdown_grace),
                    "dispatch loop did not stop in time, aborting it"
                );
                handle.abort();
                // The loop may have dispatched one more job before dying.
                self.shared.actions.abort_active();
            }
        }
    }

    /// Printed documents in dispatch order.
    pub fn printed_docs(&self) -> Vec<P::Document> {
        self.shared.actions.documents_where(PrintAction::is_printed)
    }

    /// Printed documents sorted by `compare`.  The sort is stable, so equal
    /// documents keep their dispatch order.
    pub fn printed_docs_by<F>(&self, compare: F) -> Vec<P::Document>
    where
        F: FnMut(&P::Document, &P::Document) -> Ordering,
    {
        let mut printed = self.printed_docs();
        printed.sort_by(compare);
        printed
    }

    /// Printed documents sorted by a key (stable).
    pub fn printed_docs_by_key<K, F>(&self, key: F) -> Vec<P::Document>
    where
        K: Ord,
        F: FnMut(&P::Document) -> K,
    {
        let mut printed = self.printed_docs();
        printed.sort_by_key(key);
        printed
    }

    /// Mean print duration of the printed documents.
    ///
    /// Each duration counts in whole seconds; the mean keeps nanosecond
    /// precision.  Zero when nothing has printed.
    pub fn calc_avg_print_duration(&self) -> Duration {
        let printed = self.printed_docs();
        if printed.is_empty() {
            return Duration::ZERO;
        }

        let total_secs: u128 = printed
            .iter()
            .map(|doc| u128::from(doc.print_duration().as_secs()))
            .sum();
        let avg_nanos = total_secs * NANOS_PER_SEC / printed.len() as u128;
        Duration::from_nanos(u64::try_from(avg_nanos).unwrap_or(u64::MAX))
    }

    /// Latest action dispatched for this type name.
    pub fn action(&self, type_name: &str) -> Option<PrintAction<P::Document>> {
        self.shared.actions.get(type_name)
    }

    /// Where the latest job with this type name is.
    ///
    /// A queued document takes precedence over an older action with the same
    /// name, since it is the newer job.
    pub fn job_state(&self, type_name: &str) -> Option<JobState> {
        if self.shared.queue.contains(type_name) {
            return Some(JobState::Queued);
        }
        self.shared
            .actions
            .get(type_name)
            .map(|action| action.status().into())
    }

    /// Number of documents waiting for the printer.
    pub fn queued_len(&self) -> usize {
        self.shared.queue.len()
    }

    /// How many documents have been handed to the printer, counting
    /// superseded and aborted ones.
    pub fn dispatched_count(&self) -> usize {
        self.shared.dispatched.load(AtomicOrdering::Acquire)
    }

    pub fn state(&self) -> DispatcherState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serializable view of every recorded action, in dispatch order.
    pub fn snapshot(&self) -> Vec<ActionSnapshot> {
        self.shared
            .actions
            .in_dispatch_order()
            .iter()
            .map(PrintAction::snapshot)
            .collect()
    }

    fn begin_stopping(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == DispatcherState::Running {
            *state = DispatcherState::Stopping;
        }
    }

    fn set_state(&self, state: DispatcherState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

impl<P: Printer> Drop for PrintDispatcher<P> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// The background loop.  Exits only through the shutdown token.
async fn dispatch_loop<P: Printer>(
    mut worker: PrintWorker<P>,
    shared: Arc<Shared<P::Document>>,
    shutdown: CancellationToken,
) {
    loop {
        debug!("waiting for new document...");
        let document = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            document = shared.queue.pop() => document,
        };

        let action = worker.submit(document);
        if let Some(previous) = shared.actions.insert(action.clone()) {
            debug!(superseded = %previous.id(), "replaced earlier action for this type name");
        }
        shared.dispatched.fetch_add(1, AtomicOrdering::Release);
        info!(job_id = %action.id(), %action, "put action");

        let finished = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!(job_id = %action.id(), %action, "interrupt");
                action.abort();
                if action.is_aborted() {
                    worker.stop_device();
                }
                break;
            }
            result = action.wait_for_finish() => result,
        };

        match finished {
            Ok(()) => info!(job_id = %action.id(), %action, "finish"),
            Err(e) => {
                if let DispatchError::ExecutionFailed(msg) = &e {
                    warn!(job_id = %action.id(), error = %msg, "print failed");
                } else {
                    info!(job_id = %action.id(), %action, "cancel");
                }
                // The action already reports Aborted; make the device let go
                // of whatever it had started.
                worker.stop_device();
            }
        }
    }

    worker.shutdown();
    info!("dispatch loop interrupted");
}
