// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Latest print action per document type name.
//
// Written only by the dispatch loop (insert-or-replace), read by anyone.
// Iteration follows dispatch order via the worker's sequence numbers, so a
// superseded type name moves to the position of its newest dispatch.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use spoolwerk_core::types::Document;

use crate::action::PrintAction;

pub struct ActionRegistry<D> {
    actions: RwLock<HashMap<String, PrintAction<D>>>,
}

impl<D> Default for ActionRegistry<D> {
    fn default() -> Self {
        Self {
            actions: RwLock::new(HashMap::new()),
        }
    }
}

impl<D: Document> ActionRegistry<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `action` under its document's type name.  Returns the action it
    /// superseded, if any.
    pub fn insert(&self, action: PrintAction<D>) -> Option<PrintAction<D>> {
        let key = action.document().type_name().to_string();
        self.actions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, action)
    }

    pub fn get(&self, type_name: &str) -> Option<PrintAction<D>> {
        self.actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(type_name)
            .cloned()
    }

    /// All current actions, oldest dispatch first.
    pub fn in_dispatch_order(&self) -> Vec<PrintAction<D>> {
        let mut actions: Vec<_> = self
            .actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        actions.sort_by_key(PrintAction::seq);
        actions
    }

    /// Documents of actions matching `filter`, in dispatch order.
    pub fn documents_where(&self, filter: impl Fn(&PrintAction<D>) -> bool) -> Vec<D> {
        self.in_dispatch_order()
            .into_iter()
            .filter(|action| filter(action))
            .map(|action| action.document().clone())
            .collect()
    }

    /// Abort every active action.  Returns how many were aborted by this call.
    pub fn abort_active(&self) -> usize {
        self.in_dispatch_order()
            .iter()
            .filter(|action| action.is_active())
            .filter(|action| action.abort())
            .count()
    }

    pub fn len(&self) -> usize {
        self.actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
