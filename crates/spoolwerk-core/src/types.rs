// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Spoolwerk dispatcher.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one dispatched print action.
///
/// Type names are only unique per "latest job"; the id tells two dispatches
/// of the same type name apart in logs and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standard paper sizes.
///
/// Ordering follows declaration order, largest ISO sheet first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum PaperSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A3 => (297, 420),
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
        }
    }
}

impl std::fmt::Display for PaperSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (w, h) = self.dimensions_mm();
        write!(f, "{self:?} ({w}x{h}mm)")
    }
}

/// Anything that can be printed through the dispatcher.
///
/// Implementations must be stable values for the lifetime of a submission:
/// the dispatcher reads these attributes at arbitrary times.
pub trait Document: Clone + Send + Sync + 'static {
    /// Formatted document type name. Used as the dispatch key.
    fn type_name(&self) -> &str;

    /// Size of paper the document must be printed on.
    fn paper_size(&self) -> PaperSize;

    /// Estimated print time.
    fn print_duration(&self) -> Duration;
}

/// Plain document value, loadable from a JSON job file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintDocument {
    pub type_name: String,
    #[serde(default)]
    pub paper_size: PaperSize,
    #[serde(rename = "print_duration_ms", with = "duration_ms", default)]
    pub print_duration: Duration,
}

impl PrintDocument {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            paper_size: PaperSize::default(),
            print_duration: Duration::ZERO,
        }
    }

    pub fn with_paper_size(mut self, paper_size: PaperSize) -> Self {
        self.paper_size = paper_size;
        self
    }

    pub fn with_print_duration(mut self, print_duration: Duration) -> Self {
        self.print_duration = print_duration;
        self
    }
}

impl Document for PrintDocument {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn paper_size(&self) -> PaperSize {
        self.paper_size
    }

    fn print_duration(&self) -> Duration {
        self.print_duration
    }
}

impl std::fmt::Display for PrintDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrintDocument[type_name: '{}']", self.type_name)
    }
}

/// Lifecycle of one dispatched print action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    /// Handed to the printer, not yet finished.
    Active,
    /// Finished normally.
    Printed,
    /// Cancelled before or during printing, or the printer failed.
    Aborted,
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Printed => "done",
            Self::Aborted => "aborted",
        })
    }
}

/// Where the latest job for a type name currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Still waiting in the queue; not cancellable yet.
    Queued,
    /// Dispatched and printing.
    Printing,
    /// Successfully printed.
    Printed,
    /// Aborted or failed.
    Aborted,
}

impl From<ActionStatus> for JobState {
    fn from(status: ActionStatus) -> Self {
        match status {
            ActionStatus::Active => Self::Printing,
            ActionStatus::Printed => Self::Printed,
            ActionStatus::Aborted => Self::Aborted,
        }
    }
}

/// Lifecycle of the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatcherState {
    Running,
    Stopping,
    Stopped,
}

/// Serializable view of one print action, for reports and diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSnapshot {
    pub id: JobId,
    pub type_name: String,
    pub paper_size: PaperSize,
    pub print_duration_ms: u64,
    pub status: ActionStatus,
    pub dispatched_at: DateTime<Utc>,
    /// Printer failure message, if the action aborted because printing failed.
    pub failure: Option<String>,
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn duration_millis(duration: &Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Serde helper: `Duration` as integer milliseconds.
pub mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(super::duration_millis(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
