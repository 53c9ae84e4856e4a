// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Spoolwerk.

use thiserror::Error;

/// Top-level error type for all Spoolwerk operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    // -- Job lifecycle --
    #[error("print job was cancelled")]
    Cancelled,

    #[error("print job failed: {0}")]
    ExecutionFailed(String),

    #[error("dispatch loop was interrupted")]
    Interrupted,

    #[error("dispatcher is stopped and no longer accepts documents")]
    Stopped,

    // -- Printer --
    #[error("printer error: {0}")]
    Printer(String),

    // -- Configuration / job files --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DispatchError>;
