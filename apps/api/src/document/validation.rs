use crate::document::models::{CustomSectionMeta, SectionEntry};
use crate::document::DocumentError;

pub const AWARD_TITLE_REQUIRED: &str = "Award title is required.";
pub const SECTION_HEADING_REQUIRED: &str = "Section heading is required.";

/// Checks the required fields of an entry before it may enter the store.
///
/// Only awards have a required field; every other kind accepts partially
/// empty entries.
pub fn validate_entry(entry: &SectionEntry) -> Result<(), DocumentError> {
    match entry {
        SectionEntry::Award(award) if is_blank(&award.title) => {
            Err(DocumentError::Required(AWARD_TITLE_REQUIRED))
        }
        _ => Ok(()),
    }
}

pub fn validate_custom_meta(meta: &CustomSectionMeta) -> Result<(), DocumentError> {
    if is_blank(&meta.heading) {
        return Err(DocumentError::Required(SECTION_HEADING_REQUIRED));
    }
    Ok(())
}

pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
