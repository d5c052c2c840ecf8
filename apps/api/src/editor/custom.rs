//! Editor for user-defined sections (heading + icon + list of entries).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::models::{CustomEntry, CustomSectionMeta};
use crate::document::ResumeDocument;
use crate::editor::state::{EditorMode, EditorState, RemovalEffect};
use crate::editor::EditorError;

/// The custom-section modal edits the section's meta and one entry at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomDraft {
    pub meta: CustomSectionMeta,
    pub entry: CustomEntry,
}

/// Where the saved entry landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSaveResult {
    pub section_index: usize,
    pub entry_index: usize,
    pub created_section: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSectionEditor {
    state: EditorState<CustomDraft>,
    /// Section being extended; `None` means save creates a new section.
    active_custom_idx: Option<usize>,
    /// Entry picked with "Edit". Recorded for the front end but not used by
    /// `save`, which always appends.
    edit_custom_entry_idx: Option<usize>,
}

impl CustomSectionEditor {
    pub fn state(&self) -> &EditorState<CustomDraft> {
        &self.state
    }

    pub fn active_section(&self) -> Option<usize> {
        self.active_custom_idx
    }

    pub fn editing_entry(&self) -> Option<usize> {
        self.edit_custom_entry_idx
    }

    /// Starts a brand-new section.
    pub fn open_new_section(&mut self) {
        self.active_custom_idx = None;
        self.edit_custom_entry_idx = None;
        self.state.open(EditorMode::Create, CustomDraft::default());
    }

    /// Adds another entry to an existing section. The draft starts from the
    /// section's current meta so the heading and icon can be adjusted too.
    pub fn open_add_entry(
        &mut self,
        section_index: usize,
        doc: &ResumeDocument,
    ) -> Result<(), EditorError> {
        let section = doc
            .custom_sections
            .get(section_index)
            .ok_or(EditorError::NoSuchEntry {
                section: "custom",
                index: section_index,
            })?;
        let draft = CustomDraft {
            meta: section.meta.clone(),
            entry: CustomEntry::default(),
        };
        self.active_custom_idx = Some(section_index);
        self.edit_custom_entry_idx = None;
        self.state.open(EditorMode::Create, draft);
        Ok(())
    }

    pub fn open_edit_entry(
        &mut self,
        section_index: usize,
        entry_index: usize,
        doc: &ResumeDocument,
    ) -> Result<(), EditorError> {
        let section = doc
            .custom_sections
            .get(section_index)
            .ok_or(EditorError::NoSuchEntry {
                section: "custom",
                index: section_index,
            })?;
        let entry = section
            .entries
            .get(entry_index)
            .cloned()
            .ok_or(EditorError::NoSuchEntry {
                section: "custom entry",
                index: entry_index,
            })?;
        self.active_custom_idx = Some(section_index);
        self.edit_custom_entry_idx = Some(entry_index);
        self.state.open(
            EditorMode::Edit(entry_index),
            CustomDraft {
                meta: section.meta.clone(),
                entry,
            },
        );
        Ok(())
    }

    pub fn set_draft(&mut self, draft: CustomDraft) -> Result<(), EditorError> {
        *self.state.draft_mut()? = draft;
        Ok(())
    }

    /// Saves the draft: creates a section when none is active, otherwise
    /// updates the active section's meta and appends the entry to it.
    ///
    /// Editing an existing entry appends a new one rather than replacing it;
    /// the recorded entry index is only logged.
    pub fn save(&mut self, doc: &mut ResumeDocument) -> Result<CustomSaveResult, EditorError> {
        let draft = self.state.draft()?.clone();

        let result = match self.active_custom_idx {
            None => {
                let section_index = doc.add_custom_section(draft.meta, Some(draft.entry))?;
                CustomSaveResult {
                    section_index,
                    entry_index: 0,
                    created_section: true,
                }
            }
            Some(section_index) => {
                doc.update_custom_section_meta(section_index, draft.meta)?;
                let entry_index = doc.append_custom_entry(section_index, draft.entry)?;
                if let Some(edited) = self.edit_custom_entry_idx {
                    warn!(
                        section = section_index,
                        edited,
                        appended = entry_index,
                        "custom entry edit saved as a new entry"
                    );
                }
                CustomSaveResult {
                    section_index,
                    entry_index,
                    created_section: false,
                }
            }
        };

        debug!(?result, "custom section saved");
        self.cancel();
        Ok(result)
    }

    pub fn cancel(&mut self) {
        self.state.close();
        self.active_custom_idx = None;
        self.edit_custom_entry_idx = None;
    }

    /// Follows the active section down after the section at `removed` was
    /// deleted. Deleting the active section closes the editor.
    pub fn section_removed(&mut self, removed: usize) {
        if !self.state.is_open() {
            return;
        }
        match RemovalEffect::of(self.active_custom_idx, removed) {
            RemovalEffect::Unaffected => {}
            RemovalEffect::Shifted(index) => self.active_custom_idx = Some(index),
            RemovalEffect::Orphaned => {
                debug!(section = removed, "active custom section removed; editor closed");
                self.cancel();
            }
        }
    }

    /// Same as `section_removed`, for one entry of section `section`.
    pub fn entry_removed(&mut self, section: usize, removed: usize) {
        if !self.state.is_open() || self.active_custom_idx != Some(section) {
            return;
        }
        match RemovalEffect::of(self.edit_custom_entry_idx, removed) {
            RemovalEffect::Unaffected => {}
            RemovalEffect::Shifted(index) => {
                self.edit_custom_entry_idx = Some(index);
                self.state.retarget(index);
            }
            RemovalEffect::Orphaned => {
                debug!(section, entry = removed, "edited custom entry removed; editor closed");
                self.cancel();
            }
        }
    }
}
