// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Completion tracking for one dispatched document.
//
// A `PrintAction` pairs a document with the Tokio task that prints it.  The
// task's outcome lives in a `watch` cell so any number of readers can query
// the state without blocking, and `wait_for_finish` can suspend on it.  Both
// terminal transitions go through the same compare-and-set, which makes
// Printed and Aborted mutually exclusive even when an abort races the print.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use spoolwerk_core::error::{DispatchError, Result};
use spoolwerk_core::types::{ActionSnapshot, ActionStatus, Document, JobId, duration_millis};

/// Internal outcome of a print task.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Active,
    Printed,
    Cancelled,
    Failed(String),
}

impl Outcome {
    fn status(&self) -> ActionStatus {
        match self {
            Self::Active => ActionStatus::Active,
            Self::Printed => ActionStatus::Printed,
            Self::Cancelled | Self::Failed(_) => ActionStatus::Aborted,
        }
    }
}

/// Shared outcome cell.  Only the first terminal transition sticks.
#[derive(Debug, Clone)]
struct OutcomeCell(Arc<watch::Sender<Outcome>>);

impl OutcomeCell {
    fn new() -> Self {
        Self(Arc::new(watch::Sender::new(Outcome::Active)))
    }

    /// Move from Active to `outcome`.  Returns `false` if already terminal.
    fn settle(&self, outcome: Outcome) -> bool {
        self.0.send_if_modified(|current| {
            if *current == Outcome::Active {
                *current = outcome;
                true
            } else {
                false
            }
        })
    }

    fn get(&self) -> Outcome {
        self.0.borrow().clone()
    }

    async fn wait_terminal(&self) -> Outcome {
        let mut rx = self.0.subscribe();
        match rx.wait_for(|outcome| *outcome != Outcome::Active).await {
            Ok(outcome) => outcome.clone(),
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.get(),
        }
    }
}

/// Settles the cell as failed if the print task unwinds without reporting.
struct SettleOnDrop(OutcomeCell);

impl SettleOnDrop {
    fn finish(self, result: Result<()>) {
        let outcome = match result {
            Ok(()) => Outcome::Printed,
            Err(DispatchError::Cancelled | DispatchError::Interrupted) => Outcome::Cancelled,
            Err(e) => Outcome::Failed(e.to_string()),
        };
        self.0.settle(outcome);
    }
}

impl Drop for SettleOnDrop {
    fn drop(&mut self) {
        // No-op after `finish` or `abort`; only a panicking task gets here
        // with the cell still active.
        self.0
            .settle(Outcome::Failed("print task ended without a result".into()));
    }
}

struct ActionInner<D> {
    id: JobId,
    /// Dispatch order, assigned by the worker.
    seq: u64,
    document: D,
    dispatched_at: DateTime<Utc>,
    outcome: OutcomeCell,
    task: AbortHandle,
}

/// The lifecycle record of one document handed to the printer.
///
/// Cheap to clone; all clones observe the same task.
pub struct PrintAction<D> {
    inner: Arc<ActionInner<D>>,
}

impl<D> Clone for PrintAction<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Document> PrintAction<D> {
    /// Spawn `work` on the Tokio runtime and track it as the print of
    /// `document`.
    ///
    /// `Err(Cancelled)` or `Err(Interrupted)` from `work` count as an abort;
    /// any other error as a failed print.
    pub(crate) fn launch<F>(seq: u64, document: D, work: F) -> Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let id = JobId::new();
        let outcome = OutcomeCell::new();
        let guard = SettleOnDrop(outcome.clone());

        let handle = tokio::spawn(async move {
            let result = work.await;
            guard.finish(result);
        });

        debug!(job_id = %id, type_name = document.type_name(), seq, "print task spawned");

        Self {
            inner: Arc::new(ActionInner {
                id,
                seq,
                document,
                dispatched_at: Utc::now(),
                outcome,
                task: handle.abort_handle(),
            }),
        }
    }

    pub fn id(&self) -> JobId {
        self.inner.id
    }

    pub(crate) fn seq(&self) -> u64 {
        self.inner.seq
    }

    pub fn document(&self) -> &D {
        &self.inner.document
    }

    pub fn status(&self) -> ActionStatus {
        self.inner.outcome.get().status()
    }

    pub fn is_printed(&self) -> bool {
        self.status() == ActionStatus::Printed
    }

    pub fn is_aborted(&self) -> bool {
        self.status() == ActionStatus::Aborted
    }

    pub fn is_active(&self) -> bool {
        self.status() == ActionStatus::Active
    }

    /// Printer failure message, if the action aborted because printing failed.
    pub fn failure(&self) -> Option<String> {
        match self.inner.outcome.get() {
            Outcome::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// Request cancellation of the print.
    ///
    /// Idempotent.  Returns `true` only for the call that moved the action
    /// from Active to Aborted.
    pub fn abort(&self) -> bool {
        if self.inner.outcome.settle(Outcome::Cancelled) {
            self.inner.task.abort();
            info!(job_id = %self.inner.id, type_name = self.inner.document.type_name(), "print action aborted");
            true
        } else {
            false
        }
    }

    /// Wait until the action reaches a terminal state.
    ///
    /// # Errors
    ///
    /// `DispatchError::Cancelled` if the action was aborted,
    /// `DispatchError::ExecutionFailed` if the printer reported a failure.
    pub async fn wait_for_finish(&self) -> Result<()> {
        match self.inner.outcome.wait_terminal().await {
            Outcome::Printed => Ok(()),
            Outcome::Failed(msg) => Err(DispatchError::ExecutionFailed(msg)),
            Outcome::Cancelled | Outcome::Active => Err(DispatchError::Cancelled),
        }
    }

    pub fn snapshot(&self) -> ActionSnapshot {
        let doc = &self.inner.document;
        ActionSnapshot {
            id: self.inner.id,
            type_name: doc.type_name().to_string(),
            paper_size: doc.paper_size(),
            print_duration_ms: duration_millis(&doc.print_duration()),
            status: self.status(),
            dispatched_at: self.inner.dispatched_at,
            failure: self.failure(),
        }
    }
}

impl<D: Document> std::fmt::Display for PrintAction<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[status: {}, doc: '{}']",
            self.status(),
            self.inner.document.type_name()
        )
    }
}

impl<D: Document> std::fmt::Debug for PrintAction<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrintAction")
            .field("id", &self.inner.id)
            .field("seq", &self.inner.seq)
            .field("type_name", &self.inner.document.type_name())
            .field("status", &self.status())
            .finish()
    }
}
