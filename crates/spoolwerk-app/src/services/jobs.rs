// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job files and batch runs.
//
// A job file is a JSON array of `PrintDocument`s.  `run_jobs` feeds them to a
// dispatcher, cancels the named ones once they reach the printer, waits for
// the batch to settle (or for the time limit), stops the dispatcher, and
// returns a report.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use spoolwerk_core::error::Result;
use spoolwerk_core::types::{
    ActionSnapshot, ActionStatus, JobState, PrintDocument, duration_millis,
};
use spoolwerk_print::{PrintDispatcher, Printer};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Outcome of one batch run, printed as JSON by the binary.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub printed: Vec<PrintDocument>,
    pub not_printed: Vec<PrintDocument>,
    pub average_print_duration_ms: u64,
    pub actions: Vec<ActionSnapshot>,
}

/// Read a JSON array of documents.
pub fn load_jobs(path: &Path) -> Result<Vec<PrintDocument>> {
    let data = std::fs::read_to_string(path)?;
    let jobs: Vec<PrintDocument> = serde_json::from_str(&data)?;
    info!(count = jobs.len(), path = %path.display(), "loaded job file");
    Ok(jobs)
}

/// Submit `documents`, cancel `cancel` by type name while they print, and
/// stop once every document has been dispatched and settled, or once
/// `stop_after` has elapsed.
pub async fn run_jobs<P>(
    dispatcher: &PrintDispatcher<P>,
    documents: Vec<PrintDocument>,
    cancel: &[String],
    stop_after: Option<Duration>,
) -> Result<RunReport>
where
    P: Printer<Document = PrintDocument>,
{
    let submitted = documents.len();
    for document in documents {
        dispatcher.print(document)?;
    }

    let mut pending_cancels: Vec<&str> = cancel.iter().map(String::as_str).collect();
    let settle = async {
        loop {
            pending_cancels.retain(|name| match dispatcher.job_state(name) {
                Some(JobState::Printing) => {
                    dispatcher.cancel(name);
                    false
                }
                Some(JobState::Printed | JobState::Aborted) => {
                    warn!(type_name = name, "job finished before it could be cancelled");
                    false
                }
                Some(JobState::Queued) | None => true,
            });

            if dispatcher.dispatched_count() >= submitted && !has_active(dispatcher) {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    };

    match stop_after {
        Some(limit) => {
            if tokio::time::timeout(limit, settle).await.is_err() {
                info!(limit_ms = duration_millis(&limit), "time limit reached, stopping");
            }
        }
        None => settle.await,
    }

    for name in &pending_cancels {
        warn!(type_name = name, "cancel requested for a job that never printed");
    }

    let not_printed = dispatcher.stop().await;
    Ok(RunReport {
        printed: dispatcher.printed_docs(),
        not_printed,
        average_print_duration_ms: duration_millis(&dispatcher.calc_avg_print_duration()),
        actions: dispatcher.snapshot(),
    })
}

fn has_active<P: Printer>(dispatcher: &PrintDispatcher<P>) -> bool {
    dispatcher
        .snapshot()
        .iter()
        .any(|action| action.status == ActionStatus::Active)
}
