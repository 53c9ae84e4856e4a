// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk Print: the single-printer dispatcher.  Documents queue up in
// submission order, print one at a time through a `Printer` implementation,
// and can be cancelled by type name while printing.  Domain types live in
// `spoolwerk-core`.

pub mod action;
pub mod dispatcher;
pub mod dry_printer;
pub mod printer;
pub mod queue;
pub mod registry;
pub mod worker;

#[cfg(test)]
mod testing;

pub use action::PrintAction;
pub use dispatcher::PrintDispatcher;
pub use dry_printer::DryPrinter;
pub use printer::Printer;
