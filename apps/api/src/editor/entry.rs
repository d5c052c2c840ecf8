//! Editor for the list-held sections (education, experience, skills, ...).

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::document::models::{LanguageLevel, SectionEntry, SectionKind, SkillLevel};
use crate::document::ResumeDocument;
use crate::editor::state::{EditorMode, EditorState, RemovalEffect};
use crate::editor::EditorError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryEditor {
    kind: SectionKind,
    state: EditorState<SectionEntry>,
    /// Skill editor only: when set, picking a level keeps the user's own
    /// label instead of resetting it to the level name.
    customize_level: bool,
}

impl EntryEditor {
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            state: EditorState::Closed,
            customize_level: false,
        }
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn state(&self) -> &EditorState<SectionEntry> {
        &self.state
    }

    pub fn open_add(&mut self) {
        self.customize_level = false;
        self.state
            .open(EditorMode::Create, SectionEntry::empty(self.kind));
    }

    /// Copies the stored entry at `index` into the draft.
    pub fn open_edit(&mut self, index: usize, doc: &ResumeDocument) -> Result<(), EditorError> {
        let entry = doc
            .entry_at(self.kind, index)
            .ok_or(EditorError::NoSuchEntry {
                section: self.kind.as_str(),
                index,
            })?;
        self.customize_level = false;
        self.state.open(EditorMode::Edit(index), entry);
        Ok(())
    }

    /// Replaces the draft wholesale.
    pub fn set_draft(&mut self, draft: SectionEntry) -> Result<(), EditorError> {
        if draft.kind() != self.kind {
            return Err(EditorError::InvalidDraft(format!(
                "draft is a {} entry, editor edits {}",
                draft.kind().as_str(),
                self.kind.as_str()
            )));
        }
        *self.state.draft_mut()? = draft;
        Ok(())
    }

    /// Merges the fields of a JSON object into the draft, the way a form
    /// binding updates one input at a time.
    ///
    /// A `level` change on a skill draft goes through the same rule as
    /// `select_skill_level` unless the patch also sets `customLevelText`.
    pub fn patch_draft(&mut self, patch: &Value) -> Result<(), EditorError> {
        let fields = patch
            .as_object()
            .ok_or_else(|| EditorError::InvalidDraft("draft patch must be a JSON object".to_string()))?;
        let customize = self.customize_level;
        let draft = self.state.draft_mut()?;

        let mut merged = serde_json::to_value(&*draft)
            .map_err(|e| EditorError::InvalidDraft(e.to_string()))?;
        if let Value::Object(map) = &mut merged {
            for (key, value) in fields {
                if key != "kind" {
                    map.insert(key.clone(), value.clone());
                }
            }
        }
        let mut updated: SectionEntry = serde_json::from_value(merged)
            .map_err(|e| EditorError::InvalidDraft(e.to_string()))?;

        if let SectionEntry::Skill(skill) = &mut updated {
            if fields.contains_key("level") && !fields.contains_key("customLevelText") && !customize {
                skill.custom_level_text = skill.level.map(|l| l.label().to_string()).unwrap_or_default();
            }
        }

        *draft = updated;
        Ok(())
    }

    /// Picks a skill level. Unless the customize toggle is on, the display
    /// text follows the level's label.
    pub fn select_skill_level(&mut self, level: SkillLevel) -> Result<(), EditorError> {
        let customize = self.customize_level;
        match self.state.draft_mut()? {
            SectionEntry::Skill(skill) => {
                skill.level = Some(level);
                if !customize {
                    skill.custom_level_text = level.label().to_string();
                }
                Ok(())
            }
            other => Err(EditorError::InvalidDraft(format!(
                "skill levels do not apply to {} entries",
                other.kind().as_str()
            ))),
        }
    }

    pub fn select_language_level(&mut self, level: LanguageLevel) -> Result<(), EditorError> {
        match self.state.draft_mut()? {
            SectionEntry::Language(language) => {
                language.level = Some(level);
                Ok(())
            }
            other => Err(EditorError::InvalidDraft(format!(
                "language levels do not apply to {} entries",
                other.kind().as_str()
            ))),
        }
    }

    pub fn set_customize_level(&mut self, on: bool) -> Result<(), EditorError> {
        if self.kind != SectionKind::Skill {
            return Err(EditorError::InvalidDraft(
                "only skill levels can be customized".to_string(),
            ));
        }
        self.state.draft()?;
        self.customize_level = on;
        Ok(())
    }

    pub fn set_custom_level_text(&mut self, text: impl Into<String>) -> Result<(), EditorError> {
        match self.state.draft_mut()? {
            SectionEntry::Skill(skill) => {
                skill.custom_level_text = text.into();
                Ok(())
            }
            other => Err(EditorError::InvalidDraft(format!(
                "{} entries have no level text",
                other.kind().as_str()
            ))),
        }
    }

    /// Writes the draft into the document at the recorded index, then closes.
    ///
    /// A required-field failure keeps the modal open with the draft intact so
    /// the user can fix the field and retry.
    pub fn save(&mut self, doc: &mut ResumeDocument) -> Result<usize, EditorError> {
        let mode = self.state.mode().ok_or(EditorError::NotOpen)?;
        let draft = self.state.draft()?.clone();
        let at = doc.upsert_entry(self.kind, mode.target_index(), draft)?;
        debug!(section = self.kind.as_str(), index = at, "editor saved");
        self.close();
        Ok(at)
    }

    pub fn cancel(&mut self) {
        self.close();
    }

    /// Keeps an open edit pointing at the same entry after the entry at
    /// `removed` was deleted from this section. Editing the deleted entry
    /// closes the editor.
    pub fn entry_removed(&mut self, removed: usize) {
        let edited = self.state.mode().and_then(|m| m.target_index());
        match RemovalEffect::of(edited, removed) {
            RemovalEffect::Unaffected => {}
            RemovalEffect::Shifted(index) => self.state.retarget(index),
            RemovalEffect::Orphaned => {
                debug!(section = self.kind.as_str(), index = removed, "edited entry removed; editor closed");
                self.close();
            }
        }
    }

    fn close(&mut self) {
        self.state.close();
        self.customize_level = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::models::{AwardEntry, CertificateEntry, EducationEntry, SkillEntry};
    use crate::document::DocumentError;
    use serde_json::json;

    fn doc_with_education() -> ResumeDocument {
        let mut doc = ResumeDocument::new();
        doc.upsert_entry(
            SectionKind::Education,
            None,
            SectionEntry::Education(EducationEntry {
                degree: "B.Tech".to_string(),
                school: "XYZ University".to_string(),
                start_date: "2018".to_string(),
                end_date: "2022".to_string(),
                ..Default::default()
            }),
        )
        .unwrap();
        doc
    }

    #[test]
    fn test_add_flow_appends_and_closes() {
        let mut doc = ResumeDocument::new();
        let mut editor = EntryEditor::new(SectionKind::Education);
        editor.open_add();
        editor
            .patch_draft(&json!({"degree": "MSc", "school": "ETH"}))
            .unwrap();

        // Nothing reaches the document until save.
        assert!(doc.education.is_empty());

        let at = editor.save(&mut doc).unwrap();
        assert_eq!(at, 0);
        assert_eq!(doc.education[0].degree, "MSc");
        assert!(!editor.state().is_open());
    }

    #[test]
    fn test_edit_flow_replaces_at_index() {
        let mut doc = doc_with_education();
        let mut editor = EntryEditor::new(SectionKind::Education);
        editor.open_edit(0, &doc).unwrap();
        editor.patch_draft(&json!({"endDate": "2023"})).unwrap();
        editor.save(&mut doc).unwrap();

        assert_eq!(doc.education.len(), 1);
        assert_eq!(doc.education[0].end_date, "2023");
        assert_eq!(doc.education[0].degree, "B.Tech");
    }

    fn make_certificate(name: &str) -> SectionEntry {
        SectionEntry::Certificate(CertificateEntry {
            certificate: name.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_removing_edited_entry_closes_editor() {
        let mut doc = ResumeDocument::new();
        doc.upsert_entry(SectionKind::Certificate, None, make_certificate("A")).unwrap();
        doc.upsert_entry(SectionKind::Certificate, None, make_certificate("B")).unwrap();

        let mut editor = EntryEditor::new(SectionKind::Certificate);
        editor.open_edit(0, &doc).unwrap();
        editor.patch_draft(&json!({"info": "edited A"})).unwrap();
        doc.remove_entry(SectionKind::Certificate, 0).unwrap();
        editor.entry_removed(0);

        assert!(!editor.state().is_open());
        assert!(editor.save(&mut doc).is_err());
        assert_eq!(doc.certificates.len(), 1);
        assert_eq!(doc.certificates[0].certificate, "B");
        assert_eq!(doc.certificates[0].info, "");
    }

    #[test]
    fn test_removing_earlier_entry_shifts_edit_index() {
        let mut doc = ResumeDocument::new();
        for name in ["A", "B", "C"] {
            doc.upsert_entry(SectionKind::Certificate, None, make_certificate(name)).unwrap();
        }

        let mut editor = EntryEditor::new(SectionKind::Certificate);
        editor.open_edit(2, &doc).unwrap();
        editor.patch_draft(&json!({"info": "edited C"})).unwrap();
        doc.remove_entry(SectionKind::Certificate, 0).unwrap();
        editor.entry_removed(0);
        assert_eq!(editor.state().mode(), Some(EditorMode::Edit(1)));

        editor.save(&mut doc).unwrap();
        let saved: Vec<_> = doc
            .certificates
            .iter()
            .map(|c| (c.certificate.as_str(), c.info.as_str()))
            .collect();
        assert_eq!(saved, vec![("B", ""), ("C", "edited C")]);
    }

    #[test]
    fn test_open_edit_missing_index() {
        let doc = ResumeDocument::new();
        let mut editor = EntryEditor::new(SectionKind::Project);
        let err = editor.open_edit(0, &doc).unwrap_err();
        assert!(matches!(err, EditorError::NoSuchEntry { index: 0, .. }));
        assert!(!editor.state().is_open());
    }

    #[test]
    fn test_cancel_discards_draft() {
        let mut doc = doc_with_education();
        let before = doc.clone();
        let mut editor = EntryEditor::new(SectionKind::Education);
        editor.open_edit(0, &doc).unwrap();
        editor.patch_draft(&json!({"school": "Elsewhere"})).unwrap();
        editor.cancel();
        assert_eq!(doc, before);
        assert!(editor.save(&mut doc).is_err());
    }

    #[test]
    fn test_select_expert_sets_label() {
        let mut doc = ResumeDocument::new();
        let mut editor = EntryEditor::new(SectionKind::Skill);
        editor.open_add();
        editor.patch_draft(&json!({"skill": "Rust"})).unwrap();
        editor.select_skill_level(SkillLevel::Expert).unwrap();
        editor.save(&mut doc).unwrap();

        let skill = &doc.skills[0];
        assert_eq!(skill.level, Some(SkillLevel::Expert));
        assert_eq!(skill.custom_level_text, "Expert");
    }

    #[test]
    fn test_customized_label_survives_level_change() {
        let mut editor = EntryEditor::new(SectionKind::Skill);
        editor.open_add();
        editor.set_customize_level(true).unwrap();
        editor.set_custom_level_text("Daily driver").unwrap();
        editor.select_skill_level(SkillLevel::Competent).unwrap();

        match editor.state().draft().unwrap() {
            SectionEntry::Skill(SkillEntry {
                level,
                custom_level_text,
                ..
            }) => {
                assert_eq!(*level, Some(SkillLevel::Competent));
                assert_eq!(custom_level_text, "Daily driver");
            }
            other => panic!("expected skill draft, got {other:?}"),
        }
    }

    #[test]
    fn test_level_patch_resets_label() {
        let mut editor = EntryEditor::new(SectionKind::Skill);
        editor.open_add();
        editor.patch_draft(&json!({"level": "Amateur"})).unwrap();
        match editor.state().draft().unwrap() {
            SectionEntry::Skill(skill) => assert_eq!(skill.custom_level_text, "Amateur"),
            other => panic!("expected skill draft, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_award_keeps_editor_open() {
        let mut doc = ResumeDocument::new();
        let mut editor = EntryEditor::new(SectionKind::Award);
        editor.open_add();
        editor.patch_draft(&json!({"issuer": "ACM"})).unwrap();

        let err = editor.save(&mut doc).unwrap_err();
        assert!(matches!(err, EditorError::Document(DocumentError::Required(_))));
        assert!(doc.awards.is_empty());
        assert!(editor.state().is_open());

        editor.patch_draft(&json!({"title": "Turing Fellow"})).unwrap();
        editor.save(&mut doc).unwrap();
        assert_eq!(
            doc.awards,
            vec![AwardEntry {
                title: "Turing Fellow".to_string(),
                issuer: "ACM".to_string(),
                ..Default::default()
            }]
        );
    }

    #[test]
    fn test_set_draft_rejects_other_kind() {
        let mut editor = EntryEditor::new(SectionKind::Skill);
        editor.open_add();
        let err = editor
            .set_draft(SectionEntry::Award(AwardEntry::default()))
            .unwrap_err();
        assert!(matches!(err, EditorError::InvalidDraft(_)));
    }

    #[test]
    fn test_language_level_only_on_language_draft() {
        let mut editor = EntryEditor::new(SectionKind::Language);
        editor.open_add();
        editor
            .select_language_level(LanguageLevel::NativeBilingual)
            .unwrap();
        assert!(editor.select_skill_level(SkillLevel::Expert).is_err());
    }
}
