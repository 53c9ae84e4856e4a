// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer that prints nothing.
//
// `DryPrinter` spends each document's print duration asleep, scaled by a
// speed factor, so the dispatcher can be driven end to end without a device.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, info, warn};

use spoolwerk_core::error::{DispatchError, Result};
use spoolwerk_core::types::{Document, duration_millis};

use crate::printer::Printer;

pub struct DryPrinter<D> {
    printing: Mutex<Option<D>>,
    stop_signal: Notify,
    speed: f64,
}

impl<D: Document> Default for DryPrinter<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Document> DryPrinter<D> {
    pub fn new() -> Self {
        Self {
            printing: Mutex::new(None),
            stop_signal: Notify::new(),
            speed: 1.0,
        }
    }

    /// A printer running `speed` times faster than real time.  Non-positive
    /// or non-finite factors fall back to 1.0.
    pub fn with_speed(speed: f64) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            warn!(speed, "invalid dry-run speed, using 1.0");
            1.0
        };
        Self {
            speed,
            ..Self::new()
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// The document currently being printed.
    pub fn printing(&self) -> Option<D> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<D>> {
        self.printing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn scaled(&self, duration: Duration) -> Duration {
        Duration::try_from_secs_f64(duration.as_secs_f64() / self.speed).unwrap_or(Duration::MAX)
    }
}

/// Clears the current document when a print ends, including when its
/// future is dropped mid-sleep.
struct ClearOnDrop<'a, D>(&'a Mutex<Option<D>>);

impl<D> Drop for ClearOnDrop<'_, D> {
    fn drop(&mut self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

impl<D: Document> Printer for DryPrinter<D> {
    type Document = D;

    async fn print(&self, document: &D) -> Result<()> {
        // Register for the stop signal and publish the document under one
        // lock: stop() interrupts this print iff it returns the document.
        let stopped = self.stop_signal.notified();
        tokio::pin!(stopped);
        {
            let mut printing = self.lock();
            stopped.as_mut().enable();
            *printing = Some(document.clone());
        }
        let _clear = ClearOnDrop(&self.printing);

        let duration = self.scaled(document.print_duration());
        info!(
            type_name = document.type_name(),
            paper_size = %document.paper_size(),
            duration_ms = duration_millis(&duration),
            "dry print started"
        );

        tokio::select! {
            _ = tokio::time::sleep(duration) => {
                debug!(type_name = document.type_name(), "dry print finished");
                Ok(())
            }
            _ = &mut stopped => {
                info!(type_name = document.type_name(), "dry print stopped");
                Err(DispatchError::Interrupted)
            }
        }
    }

    fn stop(&self) -> Option<D> {
        let mut printing = self.lock();
        let current = printing.take();
        if current.is_some() {
            self.stop_signal.notify_waiters();
        }
        current
    }
}
