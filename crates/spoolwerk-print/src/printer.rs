// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer device contract consumed by the dispatcher.

use std::future::Future;

use spoolwerk_core::error::Result;
use spoolwerk_core::types::Document;

/// A physical or simulated printing device.
///
/// The dispatcher never runs two `print` calls at once. It may call `stop`
/// at any time, including while idle.
pub trait Printer: Send + Sync + 'static {
    /// Document type this printer accepts.
    type Document: Document;

    /// Print one document, resolving once the device is done with it.
    ///
    /// The dispatcher interrupts a print by dropping the returned future, so
    /// implementations must not leave the device in a state that only the
    /// future's completion would clean up. An `Err` marks the job as failed.
    fn print(&self, document: &Self::Document) -> impl Future<Output = Result<()>> + Send;

    /// Abort whatever is currently printing.
    ///
    /// Returns the aborted document, or `None` when idle.
    fn stop(&self) -> Option<Self::Document>;
}
