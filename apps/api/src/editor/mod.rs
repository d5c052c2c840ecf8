// Section editors: modal forms bound to a transient draft, in create or
// edit-at-index mode. Drafts never touch the document until saved.

pub mod custom;
pub mod entry;
pub mod handlers;
pub mod state;

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::document::{DocumentError, ResumeDocument, SectionKind};
use crate::editor::custom::CustomSectionEditor;
use crate::editor::entry::EntryEditor;
use crate::editor::state::{EditorMode, EditorState};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("editor is not open")]
    NotOpen,

    #[error("{section} entry {index} does not exist")]
    NoSuchEntry { section: &'static str, index: usize },

    #[error("invalid draft: {0}")]
    InvalidDraft(String),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Which editor a request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorTarget {
    Section(SectionKind),
    Custom,
    Profile,
}

impl EditorTarget {
    pub fn parse(s: &str) -> Option<EditorTarget> {
        match s {
            "custom" | "custom-sections" => Some(EditorTarget::Custom),
            "profile" => Some(EditorTarget::Profile),
            other => SectionKind::parse(other).map(EditorTarget::Section),
        }
    }
}

/// Profile summary editor: a single text draft.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileEditor {
    state: EditorState<String>,
}

impl ProfileEditor {
    pub fn state(&self) -> &EditorState<String> {
        &self.state
    }

    pub fn open(&mut self, doc: &ResumeDocument) {
        let draft = doc.profile.clone().unwrap_or_default();
        let mode = if doc.profile.is_some() {
            EditorMode::Replace
        } else {
            EditorMode::Create
        };
        self.state.open(mode, draft);
    }

    pub fn set_draft(&mut self, text: String) -> Result<(), EditorError> {
        *self.state.draft_mut()? = text;
        Ok(())
    }

    pub fn save(&mut self, doc: &mut ResumeDocument) -> Result<(), EditorError> {
        let text = self.state.draft()?.clone();
        doc.set_profile(text);
        self.state.close();
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.state.close();
    }
}

/// All editors belonging to one session. Entry editors are created on first use.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Editors {
    sections: HashMap<SectionKind, EntryEditor>,
    custom: CustomSectionEditor,
    profile: ProfileEditor,
}

impl Editors {
    pub fn section(&mut self, kind: SectionKind) -> &mut EntryEditor {
        self.sections
            .entry(kind)
            .or_insert_with(|| EntryEditor::new(kind))
    }

    pub fn custom(&mut self) -> &mut CustomSectionEditor {
        &mut self.custom
    }

    pub fn profile(&mut self) -> &mut ProfileEditor {
        &mut self.profile
    }

    /// Call after `ResumeDocument::remove_entry` so open edits keep pointing
    /// at the entry they were opened on.
    pub fn entry_removed(&mut self, kind: SectionKind, index: usize) {
        if let Some(editor) = self.sections.get_mut(&kind) {
            editor.entry_removed(index);
        }
    }

    pub fn custom_section_removed(&mut self, index: usize) {
        self.custom.section_removed(index);
    }

    pub fn custom_entry_removed(&mut self, section: usize, entry: usize) {
        self.custom.entry_removed(section, entry);
    }
}
