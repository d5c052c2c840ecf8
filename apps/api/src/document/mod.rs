// Résumé document model: personal fields, photo, and the ordered section lists.
// Everything lives in memory for the lifetime of an editor session.

pub mod handlers;
pub mod models;
pub mod photo;
pub mod store;
pub mod validation;

use thiserror::Error;

pub use models::{
    CustomEntry, CustomSection, CustomSectionMeta, PersonalPatch, SectionEntry, SectionKind,
    SkillLevel,
};
pub use store::ResumeDocument;

#[derive(Debug, Error)]
pub enum DocumentError {
    /// Carries the exact message shown to the user.
    #[error("{0}")]
    Required(&'static str),

    #[error("{section} entry {index} does not exist ({len} entries)")]
    IndexOutOfRange {
        section: &'static str,
        index: usize,
        len: usize,
    },

    #[error("expected a {expected} entry, got {found}")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("custom section {0} does not exist")]
    CustomSectionNotFound(usize),

    #[error("invalid photo: {0}")]
    Photo(String),
}
