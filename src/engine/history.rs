//! Snapshot-based undo/redo over an annotation's document state.
//!
//! The engine keeps a linear arena of immutable snapshots and a cursor
//! into it. New edits observed while recording truncate any redo-able
//! future and append; undo/redo move the cursor and hand back the snapshot
//! to apply. Applying a snapshot emits one change notification like any
//! other mutation, so the engine suppresses exactly one notification after
//! each cursor move — that snapshot must not be re-recorded as an edit.

use super::links::{Normalization, Relation};
use super::node::NodeTree;
use super::region::Region;

/// A full captured state of one annotation's document.
///
/// Editor-ephemeral state (relation mode, highlight, pending anchors) is
/// deliberately not part of a snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub tree: NodeTree,
    pub regions: Vec<Region>,
    pub relations: Vec<Relation>,
    pub normalizations: Vec<Normalization>,
}

/// Whether the engine is accepting edits or replaying one of its own
/// snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Recording,
    /// One-shot: entered right before a snapshot is applied, exited by the
    /// very next change notification consumed.
    Replaying,
}

/// The undo/redo engine of one annotation.
#[derive(Clone, Debug)]
pub struct History {
    snapshots: Vec<Snapshot>,
    index: usize,
    mode: Mode,
    /// Cursor positions at or below this index cannot be undone past.
    floor: usize,
    /// While set, undo is blocked until the cursor moves below this index.
    freeze_point: Option<usize>,
}

impl History {
    /// Creates a history whose first snapshot is the given initial state.
    ///
    /// A history without a target tree is a programming-contract
    /// violation, not a recoverable runtime error.
    pub fn new(initial: Snapshot) -> Self {
        assert!(
            !initial.tree.is_empty(),
            "history engine requires a reachable node tree"
        );
        Self {
            snapshots: vec![initial],
            index: 0,
            mode: Mode::Recording,
            floor: 0,
            freeze_point: None,
        }
    }

    /// Pins the protected floor to the current cursor. Called once the
    /// owning annotation finishes construction, so undo can never restore
    /// a partially-initialized state.
    pub fn mark_floor(&mut self) {
        self.floor = self.index;
    }

    /// Consumes one change notification.
    ///
    /// While replaying, the notification is the echo of a snapshot the
    /// engine itself applied: it is swallowed and recording resumes.
    /// While recording, an unchanged state is ignored and anything else
    /// truncates the redo future and appends.
    pub fn record(&mut self, snapshot: Snapshot) {
        if self.mode == Mode::Replaying {
            self.mode = Mode::Recording;
            return;
        }
        if self.snapshots.get(self.index) == Some(&snapshot) {
            return;
        }
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(snapshot);
        self.index = self.snapshots.len() - 1;
        log::debug!("history: recorded snapshot {}", self.index);
    }

    /// True when the cursor can move back without crossing the protected
    /// floor or an active freeze latch.
    pub fn can_undo(&self) -> bool {
        if self.index <= self.floor {
            return false;
        }
        match self.freeze_point {
            Some(frozen_at) => self.index < frozen_at,
            None => true,
        }
    }

    /// True when a redo-able future exists.
    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    /// Steps the cursor back and returns the snapshot to apply.
    pub fn undo(&mut self) -> Option<Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.mode = Mode::Replaying;
        log::debug!("history: undo to snapshot {}", self.index);
        Some(self.snapshots[self.index].clone())
    }

    /// Steps the cursor forward and returns the snapshot to apply.
    pub fn redo(&mut self) -> Option<Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.mode = Mode::Replaying;
        log::debug!("history: redo to snapshot {}", self.index);
        Some(self.snapshots[self.index].clone())
    }

    /// Jumps the cursor to an arbitrary snapshot index.
    pub fn time_travel(&mut self, index: usize) -> Option<Snapshot> {
        if index >= self.snapshots.len() {
            return None;
        }
        self.index = index;
        self.mode = Mode::Replaying;
        log::debug!("history: jump to snapshot {}", self.index);
        Some(self.snapshots[self.index].clone())
    }

    /// Jumps the cursor back to the protected floor.
    pub fn reset(&mut self) -> Option<Snapshot> {
        self.time_travel(self.floor)
    }

    /// Blocks undo at the current cursor until [`unfreeze`](Self::unfreeze)
    /// — protects an in-progress multi-step gesture from being reverted
    /// midway.
    pub fn freeze(&mut self) {
        self.freeze_point = Some(self.index);
    }

    /// Releases the freeze latch.
    pub fn unfreeze(&mut self) {
        self.freeze_point = None;
    }

    /// Current cursor position.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of snapshots in the arena.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
