//! Undo/Redo system with transaction support

use crate::document::{Document, DocumentTree, ElementRef, Fragment, NodeRef, PageId, PageNode};
use crate::editing::{Cursor, Mutation, MutationResult, Position};
use crate::error::Result;
use log::warn;

/// Result of an undo/redo operation
#[derive(Debug, Clone)]
pub struct UndoResult {
    pub cursor: Cursor,
}

/// A single transaction that can be undone/redone
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Description of the operation
    pub description: String,
    /// Forward mutations, in application order
    pub forward_ops: Vec<Mutation>,
    /// Reverse mutations, applied back to front on undo
    pub reverse_ops: Vec<Mutation>,
    /// Cursor state before the transaction
    pub cursor_before: Cursor,
    /// Cursor state after the transaction
    pub cursor_after: Cursor,
    /// Timestamp (milliseconds)
    pub timestamp: u64,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(description: impl Into<String>, cursor_before: &Cursor) -> Self {
        Self {
            description: description.into(),
            forward_ops: Vec::new(),
            reverse_ops: Vec::new(),
            cursor_before: cursor_before.clone(),
            cursor_after: cursor_before.clone(),
            timestamp: current_timestamp(),
        }
    }

    /// Check if this transaction is empty
    pub fn is_empty(&self) -> bool {
        self.forward_ops.is_empty()
    }

    /// Record a mutation and the mutations that undo it
    pub fn record(&mut self, forward: Mutation, reverse: Vec<Mutation>) {
        self.forward_ops.push(forward);
        // stored back to front so undo can walk the whole list in reverse
        self.reverse_ops.extend(reverse.into_iter().rev());
    }
}

/// A document that records every applied mutation into a transaction.
///
/// Lets code written against [`DocumentTree`] (the paginator in particular)
/// produce undoable history without knowing about it.
pub struct Recording<'a> {
    document: &'a mut Document,
    transaction: &'a mut Transaction,
}

impl<'a> Recording<'a> {
    pub fn new(document: &'a mut Document, transaction: &'a mut Transaction) -> Self {
        Self {
            document,
            transaction,
        }
    }
}

impl DocumentTree for Recording<'_> {
    fn page_elements(&self) -> Vec<PageId> {
        self.document.page_elements()
    }

    fn resolve_rendered(&self, element: ElementRef, child_offset: usize) -> Option<Position> {
        self.document.resolve_rendered(element, child_offset)
    }

    fn node_at(&self, pos: Position) -> Option<NodeRef<'_>> {
        self.document.node_at(pos)
    }

    fn slice(&self, from: Position, to: Position) -> Result<Fragment> {
        self.document.slice(from, to)
    }

    fn apply(&mut self, mutation: Mutation) -> Result<MutationResult> {
        let reverse = self.document.compute_reverse(&mutation)?;
        let result = self.document.apply_mutation(mutation.clone())?;
        self.transaction.record(mutation, reverse);
        Ok(result)
    }

    fn end_position(&self) -> Position {
        self.document.end_position()
    }

    fn page_node(&self, page: PageId) -> Option<&PageNode> {
        self.document.page(page)
    }
}

/// Undo/Redo manager
pub struct UndoManager {
    /// Stack of undoable transactions
    undo_stack: Vec<Transaction>,
    /// Stack of redoable transactions
    redo_stack: Vec<Transaction>,
    /// Maximum history depth
    max_depth: usize,
    /// Current transaction being built
    pending: Option<Transaction>,
}

impl UndoManager {
    /// Create a new undo manager
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth,
            pending: None,
        }
    }

    /// Begin a new transaction
    pub fn begin_transaction(&mut self, description: &str, cursor: &Cursor) {
        self.pending = Some(Transaction::new(description, cursor));
    }

    /// Record an edit within the current transaction
    pub fn record_edit(&mut self, forward: Mutation, reverse: Vec<Mutation>) {
        if let Some(ref mut txn) = self.pending {
            txn.record(forward, reverse);
        }
    }

    /// Apply `mutation` to `document` and record it in the current
    /// transaction
    pub fn apply(&mut self, document: &mut Document, mutation: Mutation) -> Result<MutationResult> {
        let reverse = document.compute_reverse(&mutation)?;
        let result = document.apply_mutation(mutation.clone())?;
        self.record_edit(mutation, reverse);
        Ok(result)
    }

    /// Commit the current transaction
    pub fn commit(&mut self, cursor_after: &Cursor) {
        if let Some(mut txn) = self.pending.take() {
            if txn.is_empty() {
                return;
            }
            txn.cursor_after = cursor_after.clone();

            // Clear redo stack on new edit
            self.redo_stack.clear();
            self.undo_stack.push(txn);

            // Enforce depth limit
            while self.undo_stack.len() > self.max_depth {
                self.undo_stack.remove(0);
            }
        }
    }

    /// Push an already-recorded transaction
    pub fn push(&mut self, txn: Transaction, cursor_after: &Cursor) {
        self.pending = Some(txn);
        self.commit(cursor_after);
    }

    /// Revert everything the current transaction applied and drop it
    pub fn rollback(&mut self, document: &mut Document) {
        let Some(txn) = self.pending.take() else {
            return;
        };
        for op in txn.reverse_ops.iter().rev() {
            if let Err(err) = document.apply_mutation(op.clone()) {
                warn!("rollback of '{}' stopped: {}", txn.description, err);
                break;
            }
        }
    }

    /// Undo the last transaction
    pub fn undo(&mut self, document: &mut Document) -> Option<UndoResult> {
        let txn = self.undo_stack.pop()?;

        // Apply reverse operations
        for op in txn.reverse_ops.iter().rev() {
            if let Err(err) = document.apply_mutation(op.clone()) {
                warn!("undo of '{}' stopped: {}", txn.description, err);
                self.undo_stack.clear();
                self.redo_stack.clear();
                return None;
            }
        }

        let result = UndoResult {
            cursor: txn.cursor_before.clone(),
        };

        // Move to redo stack
        self.redo_stack.push(txn);

        Some(result)
    }

    /// Redo the last undone transaction
    pub fn redo(&mut self, document: &mut Document) -> Option<UndoResult> {
        let txn = self.redo_stack.pop()?;

        // Apply forward operations
        for op in &txn.forward_ops {
            if let Err(err) = document.apply_mutation(op.clone()) {
                warn!("redo of '{}' stopped: {}", txn.description, err);
                self.undo_stack.clear();
                self.redo_stack.clear();
                return None;
            }
        }

        let result = UndoResult {
            cursor: txn.cursor_after.clone(),
        };

        // Move to undo stack
        self.undo_stack.push(txn);

        Some(result)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pending = None;
    }
}

/// Get current timestamp in milliseconds
fn current_timestamp() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
