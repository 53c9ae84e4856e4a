// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-slot execution context for printer calls.
//
// Every print runs in its own Tokio task so it can be aborted without
// touching the dispatch loop.  A one-permit semaphore keeps the device
// exclusive: an aborted task holds the permit until it has actually been
// dropped, so the next print cannot overlap the tail of the previous one.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info};

use spoolwerk_core::error::DispatchError;
use spoolwerk_core::types::Document;

use crate::action::PrintAction;
use crate::printer::Printer;

pub struct PrintWorker<P: Printer> {
    printer: Arc<P>,
    slot: Arc<Semaphore>,
    /// Sequence number handed to the next action (dispatch order).
    next_seq: u64,
}

impl<P: Printer> PrintWorker<P> {
    pub fn new(printer: Arc<P>) -> Self {
        Self {
            printer,
            slot: Arc::new(Semaphore::new(1)),
            next_seq: 0,
        }
    }

    /// Start printing `document` and return the action tracking it.
    pub fn submit(&mut self, document: P::Document) -> PrintAction<P::Document> {
        self.next_seq += 1;
        let seq = self.next_seq;

        let printer = Arc::clone(&self.printer);
        let slot = Arc::clone(&self.slot);
        let doc = document.clone();

        PrintAction::launch(seq, document, async move {
            let _permit = slot
                .acquire_owned()
                .await
                .map_err(|_| DispatchError::Interrupted)?;
            info!(type_name = doc.type_name(), "printing");
            printer.print(&doc).await
        })
    }

    /// Ask the device to drop whatever it is printing.
    pub fn stop_device(&self) -> Option<P::Document> {
        let stopped = self.printer.stop();
        if let Some(ref doc) = stopped {
            debug!(type_name = doc.type_name(), "printer released partial job");
        }
        stopped
    }

    /// Refuse any further prints.  Tasks still waiting for the slot end as
    /// cancelled.
    pub fn shutdown(&self) {
        self.slot.close();
        debug!("print worker shut down");
    }
}
