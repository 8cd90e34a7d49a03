//! Linear undo/redo over serialized document snapshots.
//!
//! The timeline never branches: capturing while the cursor is behind the tip
//! discards everything ahead of it first.

use crate::schema::{self, PortableForm};
use crate::{EditorResult, SceneDocument};

/// History limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of entries kept; the oldest are dropped first.
    /// `None` keeps everything.
    pub max_entries: Option<usize>,
}

/// One immutable snapshot and its position on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Position in the timeline, 0 is the oldest kept entry.
    pub index: usize,
    /// Serialized document.
    pub snapshot: PortableForm,
}

/// Where the cursor sits, which determines whether undo/redo are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    /// Nothing to undo. Redo is possible unless this is also the tip.
    AtEarliest,
    /// Both undo and redo are possible.
    InMiddle,
    /// Nothing to redo; undo is possible.
    AtLatest,
}

/// Snapshot timeline with a cursor.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<PortableForm>,
    cursor: usize,
    config: HistoryConfig,
}

impl History {
    /// Start a timeline whose entry 0 is `initial`.
    #[must_use]
    pub fn new(initial: &SceneDocument, config: HistoryConfig) -> Self {
        Self {
            entries: vec![schema::serialize(initial)],
            cursor: 0,
            config,
        }
    }

    /// Drop all entries and start over from `document`.
    pub fn reset(&mut self, document: &SceneDocument) {
        self.entries.clear();
        self.entries.push(schema::serialize(document));
        self.cursor = 0;
        tracing::debug!("History reset");
    }

    /// Record the current document.
    ///
    /// Returns `false` without touching the timeline if the snapshot equals
    /// the entry under the cursor.
    pub fn capture(&mut self, document: &SceneDocument) -> bool {
        let snapshot = schema::serialize(document);
        if self.entries.get(self.cursor) == Some(&snapshot) {
            return false;
        }

        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);
        self.cursor = self.entries.len() - 1;

        if let Some(max) = self.config.max_entries {
            let max = max.max(1);
            if self.entries.len() > max {
                let excess = self.entries.len() - max;
                self.entries.drain(..excess);
                self.cursor -= excess;
            }
        }

        tracing::debug!("History captured entry {}", self.cursor);
        true
    }

    /// Step back one entry and return the document to restore.
    ///
    /// Returns `Ok(None)` at the earliest entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored snapshot cannot be deserialized; the
    /// cursor does not move in that case.
    pub fn undo(&mut self) -> EditorResult<Option<SceneDocument>> {
        if self.cursor == 0 {
            return Ok(None);
        }
        let document = schema::deserialize(&self.entries[self.cursor - 1])?;
        self.cursor -= 1;
        tracing::debug!("Undo to entry {}", self.cursor);
        Ok(Some(document))
    }

    /// Step forward one entry and return the document to restore.
    ///
    /// Returns `Ok(None)` at the latest entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored snapshot cannot be deserialized; the
    /// cursor does not move in that case.
    pub fn redo(&mut self) -> EditorResult<Option<SceneDocument>> {
        if self.cursor + 1 >= self.entries.len() {
            return Ok(None);
        }
        let document = schema::deserialize(&self.entries[self.cursor + 1])?;
        self.cursor += 1;
        tracing::debug!("Redo to entry {}", self.cursor);
        Ok(Some(document))
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Current cursor state.
    #[must_use]
    pub fn state(&self) -> HistoryState {
        if self.cursor == 0 {
            HistoryState::AtEarliest
        } else if self.can_redo() {
            HistoryState::InMiddle
        } else {
            HistoryState::AtLatest
        }
    }

    /// Number of entries on the timeline.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: entry 0 exists from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor position.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The entry under the cursor.
    #[must_use]
    pub fn current(&self) -> Option<HistoryEntry> {
        self.entries.get(self.cursor).map(|snapshot| HistoryEntry {
            index: self.cursor,
            snapshot: snapshot.clone(),
        })
    }
}
