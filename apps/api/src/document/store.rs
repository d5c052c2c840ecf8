use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::models::{
    AwardEntry, CertificateEntry, CustomEntry, CustomSection, CustomSectionMeta, EducationEntry,
    ExperienceEntry, LanguageEntry, PersonalInfo, PersonalPatch, Photo, ProjectEntry,
    SectionEntry, SectionKind, SkillEntry,
};
use crate::document::validation::{validate_custom_meta, validate_entry};
use crate::document::DocumentError;

/// The canonical in-memory résumé. Every section is an ordered list where
/// insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    pub personal: PersonalInfo,
    pub profile: Option<String>,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub skills: Vec<SkillEntry>,
    pub languages: Vec<LanguageEntry>,
    pub certificates: Vec<CertificateEntry>,
    pub projects: Vec<ProjectEntry>,
    pub awards: Vec<AwardEntry>,
    pub custom_sections: Vec<CustomSection>,
}

impl ResumeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_personal(&mut self, patch: PersonalPatch) {
        let p = &mut self.personal;
        if let Some(name) = patch.name {
            p.name = name;
        }
        if let Some(title) = patch.title {
            p.title = title;
        }
        if let Some(email) = patch.email {
            p.email = email;
        }
        if let Some(phone) = patch.phone {
            p.phone = phone;
        }
        if let Some(location) = patch.location {
            p.location = location;
        }
    }

    pub fn set_photo(&mut self, photo: Photo) {
        self.personal.photo = Some(photo);
    }

    pub fn clear_photo(&mut self) {
        self.personal.photo = None;
    }

    pub fn has_photo(&self) -> bool {
        self.personal.photo.is_some()
    }

    /// Sets the profile summary. Blank text clears it so the preview drops
    /// the Profile block.
    pub fn set_profile(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.profile = if text.trim().is_empty() { None } else { Some(text) };
    }

    /// Appends (`index == None`) or replaces in place (`Some(i)`).
    ///
    /// Returns the index the entry now occupies. Required-field checks run
    /// before any mutation, so a rejected save leaves the store unchanged.
    pub fn upsert_entry(
        &mut self,
        kind: SectionKind,
        index: Option<usize>,
        entry: SectionEntry,
    ) -> Result<usize, DocumentError> {
        if entry.kind() != kind {
            return Err(DocumentError::KindMismatch {
                expected: kind.as_str(),
                found: entry.kind().as_str(),
            });
        }
        validate_entry(&entry)?;

        let at = match entry {
            SectionEntry::Education(e) => upsert(&mut self.education, kind, index, e)?,
            SectionEntry::Experience(e) => upsert(&mut self.experience, kind, index, e)?,
            SectionEntry::Skill(e) => upsert(&mut self.skills, kind, index, e)?,
            SectionEntry::Language(e) => upsert(&mut self.languages, kind, index, e)?,
            SectionEntry::Certificate(e) => upsert(&mut self.certificates, kind, index, e)?,
            SectionEntry::Project(e) => upsert(&mut self.projects, kind, index, e)?,
            SectionEntry::Award(e) => upsert(&mut self.awards, kind, index, e)?,
        };
        debug!(section = kind.as_str(), index = at, replaced = index.is_some(), "entry saved");
        Ok(at)
    }

    /// Removes the entry at `index`, shifting later entries up.
    pub fn remove_entry(
        &mut self,
        kind: SectionKind,
        index: usize,
    ) -> Result<SectionEntry, DocumentError> {
        let removed = match kind {
            SectionKind::Education => SectionEntry::Education(remove(&mut self.education, kind, index)?),
            SectionKind::Experience => {
                SectionEntry::Experience(remove(&mut self.experience, kind, index)?)
            }
            SectionKind::Skill => SectionEntry::Skill(remove(&mut self.skills, kind, index)?),
            SectionKind::Language => SectionEntry::Language(remove(&mut self.languages, kind, index)?),
            SectionKind::Certificate => {
                SectionEntry::Certificate(remove(&mut self.certificates, kind, index)?)
            }
            SectionKind::Project => SectionEntry::Project(remove(&mut self.projects, kind, index)?),
            SectionKind::Award => SectionEntry::Award(remove(&mut self.awards, kind, index)?),
        };
        debug!(section = kind.as_str(), index, "entry removed");
        Ok(removed)
    }

    /// Returns a copy of the entry at `index`, as the editor needs it for "Edit".
    pub fn entry_at(&self, kind: SectionKind, index: usize) -> Option<SectionEntry> {
        match kind {
            SectionKind::Education => self.education.get(index).cloned().map(SectionEntry::Education),
            SectionKind::Experience => {
                self.experience.get(index).cloned().map(SectionEntry::Experience)
            }
            SectionKind::Skill => self.skills.get(index).cloned().map(SectionEntry::Skill),
            SectionKind::Language => self.languages.get(index).cloned().map(SectionEntry::Language),
            SectionKind::Certificate => {
                self.certificates.get(index).cloned().map(SectionEntry::Certificate)
            }
            SectionKind::Project => self.projects.get(index).cloned().map(SectionEntry::Project),
            SectionKind::Award => self.awards.get(index).cloned().map(SectionEntry::Award),
        }
    }

    pub fn entry_count(&self, kind: SectionKind) -> usize {
        match kind {
            SectionKind::Education => self.education.len(),
            SectionKind::Experience => self.experience.len(),
            SectionKind::Skill => self.skills.len(),
            SectionKind::Language => self.languages.len(),
            SectionKind::Certificate => self.certificates.len(),
            SectionKind::Project => self.projects.len(),
            SectionKind::Award => self.awards.len(),
        }
    }

    // ── custom sections ─────────────────────────────────────────────────────

    /// Creates a new custom section holding `first_entry`. Returns its index.
    pub fn add_custom_section(
        &mut self,
        meta: CustomSectionMeta,
        first_entry: Option<CustomEntry>,
    ) -> Result<usize, DocumentError> {
        validate_custom_meta(&meta)?;
        self.custom_sections.push(CustomSection {
            meta,
            entries: first_entry.into_iter().collect(),
        });
        Ok(self.custom_sections.len() - 1)
    }

    /// Appends an entry to an existing custom section. Returns the entry's index.
    pub fn append_custom_entry(
        &mut self,
        section_index: usize,
        entry: CustomEntry,
    ) -> Result<usize, DocumentError> {
        let section = self.custom_section_mut(section_index)?;
        section.entries.push(entry);
        Ok(section.entries.len() - 1)
    }

    pub fn update_custom_section_meta(
        &mut self,
        section_index: usize,
        meta: CustomSectionMeta,
    ) -> Result<(), DocumentError> {
        validate_custom_meta(&meta)?;
        self.custom_section_mut(section_index)?.meta = meta;
        Ok(())
    }

    pub fn remove_custom_section(&mut self, section_index: usize) -> Result<CustomSection, DocumentError> {
        if section_index >= self.custom_sections.len() {
            return Err(DocumentError::CustomSectionNotFound(section_index));
        }
        Ok(self.custom_sections.remove(section_index))
    }

    pub fn remove_custom_entry(
        &mut self,
        section_index: usize,
        entry_index: usize,
    ) -> Result<CustomEntry, DocumentError> {
        let section = self.custom_section_mut(section_index)?;
        let len = section.entries.len();
        if entry_index >= len {
            return Err(DocumentError::IndexOutOfRange {
                section: "custom",
                index: entry_index,
                len,
            });
        }
        Ok(section.entries.remove(entry_index))
    }

    pub fn custom_section_count(&self) -> usize {
        self.custom_sections.len()
    }

    fn custom_section_mut(&mut self, index: usize) -> Result<&mut CustomSection, DocumentError> {
        self.custom_sections
            .get_mut(index)
            .ok_or(DocumentError::CustomSectionNotFound(index))
    }
}

fn upsert<T>(
    list: &mut Vec<T>,
    kind: SectionKind,
    index: Option<usize>,
    item: T,
) -> Result<usize, DocumentError> {
    match index {
        None => {
            list.push(item);
            Ok(list.len() - 1)
        }
        Some(i) => {
            let len = list.len();
            let slot = list.get_mut(i).ok_or(DocumentError::IndexOutOfRange {
                section: kind.as_str(),
                index: i,
                len,
            })?;
            *slot = item;
            Ok(i)
        }
    }
}

fn remove<T>(list: &mut Vec<T>, kind: SectionKind, index: usize) -> Result<T, DocumentError> {
    if index >= list.len() {
        return Err(DocumentError::IndexOutOfRange {
            section: kind.as_str(),
            index,
            len: list.len(),
        });
    }
    Ok(list.remove(index))
}
