use serde::Serialize;

use crate::editor::EditorError;

/// Whether an open editor will append a new entry or overwrite an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "index", rename_all = "snake_case")]
pub enum EditorMode {
    Create,
    Edit(usize),
    /// Single-value editors (the profile) that overwrite existing text.
    Replace,
}

impl EditorMode {
    /// The index handed to `upsert_entry`: `None` appends.
    pub fn target_index(&self) -> Option<usize> {
        match self {
            EditorMode::Create | EditorMode::Replace => None,
            EditorMode::Edit(i) => Some(*i),
        }
    }
}

/// What an open editor must do after the entry at `removed` left its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalEffect {
    /// The editor does not point at or past the removed entry.
    Unaffected,
    /// The edited entry moved down to this index.
    Shifted(usize),
    /// The edited entry itself is gone.
    Orphaned,
}

impl RemovalEffect {
    pub fn of(edited: Option<usize>, removed: usize) -> Self {
        match edited {
            Some(i) if i == removed => RemovalEffect::Orphaned,
            Some(i) if i > removed => RemovalEffect::Shifted(i - 1),
            _ => RemovalEffect::Unaffected,
        }
    }
}

/// Modal lifecycle shared by every section editor:
/// `Closed -> Open(create) -> Closed` or `Closed -> Open(edit, idx) -> Closed`.
///
/// The draft only exists while the modal is open and is never part of the
/// document until saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EditorState<D> {
    Closed,
    Open { mode: EditorMode, draft: D },
}

impl<D> Default for EditorState<D> {
    fn default() -> Self {
        EditorState::Closed
    }
}

impl<D> EditorState<D> {
    /// Opens (or re-opens) the modal. Opening over an open modal discards the
    /// previous draft.
    pub fn open(&mut self, mode: EditorMode, draft: D) {
        *self = EditorState::Open { mode, draft };
    }

    pub fn is_open(&self) -> bool {
        matches!(self, EditorState::Open { .. })
    }

    pub fn mode(&self) -> Option<EditorMode> {
        match self {
            EditorState::Open { mode, .. } => Some(*mode),
            EditorState::Closed => None,
        }
    }

    pub fn draft(&self) -> Result<&D, EditorError> {
        match self {
            EditorState::Open { draft, .. } => Ok(draft),
            EditorState::Closed => Err(EditorError::NotOpen),
        }
    }

    pub fn draft_mut(&mut self) -> Result<&mut D, EditorError> {
        match self {
            EditorState::Open { draft, .. } => Ok(draft),
            EditorState::Closed => Err(EditorError::NotOpen),
        }
    }

    /// Points an open edit at a new index, keeping the draft. No-op when the
    /// modal is closed.
    pub fn retarget(&mut self, index: usize) {
        if let EditorState::Open { mode, .. } = self {
            *mode = EditorMode::Edit(index);
        }
    }

    /// Closes the modal and drops the draft.
    pub fn close(&mut self) {
        *self = EditorState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_editor_has_no_draft() {
        let state: EditorState<String> = EditorState::default();
        assert!(!state.is_open());
        assert!(matches!(state.draft(), Err(EditorError::NotOpen)));
        assert_eq!(state.mode(), None);
    }

    #[test]
    fn test_reopen_replaces_draft() {
        let mut state = EditorState::default();
        state.open(EditorMode::Create, "first".to_string());
        state.open(EditorMode::Edit(2), "second".to_string());
        assert_eq!(state.mode(), Some(EditorMode::Edit(2)));
        assert_eq!(state.draft().unwrap(), "second");
        state.close();
        assert!(!state.is_open());
    }

    #[test]
    fn test_removal_effect() {
        assert_eq!(RemovalEffect::of(None, 0), RemovalEffect::Unaffected);
        assert_eq!(RemovalEffect::of(Some(1), 2), RemovalEffect::Unaffected);
        assert_eq!(RemovalEffect::of(Some(2), 2), RemovalEffect::Orphaned);
        assert_eq!(RemovalEffect::of(Some(3), 1), RemovalEffect::Shifted(2));
    }

    #[test]
    fn test_retarget_keeps_draft() {
        let mut state = EditorState::default();
        state.retarget(4);
        assert!(!state.is_open());

        state.open(EditorMode::Edit(3), "draft".to_string());
        state.retarget(2);
        assert_eq!(state.mode(), Some(EditorMode::Edit(2)));
        assert_eq!(state.draft().unwrap(), "draft");
    }

    #[test]
    fn test_mode_target_index() {
        assert_eq!(EditorMode::Create.target_index(), None);
        assert_eq!(EditorMode::Edit(3).target_index(), Some(3));
        assert_eq!(EditorMode::Replace.target_index(), None);
    }
}
