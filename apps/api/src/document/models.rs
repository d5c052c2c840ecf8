use serde::{Deserialize, Serialize};

/// Photo attached to the header band. `src` is either an inline `data:` URL
/// (uploads) or the http(s) URL it was fetched from; either one works as an
/// `<img>` source and as an export asset reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub src: String,
    pub mime: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub photo: Option<Photo>,
}

/// Partial update for `PersonalInfo`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalPatch {
    pub name: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub degree: String,
    pub school: String,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub job_title: String,
    pub employer: String,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Amateur,
    Competent,
    Proficient,
    Expert,
}

impl SkillLevel {
    pub const ALL: [SkillLevel; 5] = [
        SkillLevel::Beginner,
        SkillLevel::Amateur,
        SkillLevel::Competent,
        SkillLevel::Proficient,
        SkillLevel::Expert,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Amateur => "Amateur",
            SkillLevel::Competent => "Competent",
            SkillLevel::Proficient => "Proficient",
            SkillLevel::Expert => "Expert",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillEntry {
    pub skill: String,
    pub info: String,
    pub level: Option<SkillLevel>,
    /// Text shown next to the bar. Tracks the level label unless the user
    /// customized it in the editor.
    pub custom_level_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageLevel {
    Basic,
    Conversational,
    Proficient,
    Fluent,
    #[serde(rename = "Native/Bilingual")]
    NativeBilingual,
}

impl LanguageLevel {
    pub fn label(&self) -> &'static str {
        match self {
            LanguageLevel::Basic => "Basic",
            LanguageLevel::Conversational => "Conversational",
            LanguageLevel::Proficient => "Proficient",
            LanguageLevel::Fluent => "Fluent",
            LanguageLevel::NativeBilingual => "Native/Bilingual",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LanguageEntry {
    pub language: String,
    pub info: String,
    pub level: Option<LanguageLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificateEntry {
    pub certificate: String,
    pub info: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectEntry {
    pub title: String,
    pub subtitle: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AwardEntry {
    /// Required: a blank title blocks the save.
    pub title: String,
    pub issuer: String,
    pub date: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomEntry {
    pub title: String,
    pub subtitle: String,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
    pub description: String,
}

/// Heading and presentation settings of a custom section, without its entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomSectionMeta {
    pub heading: String,
    /// Symbolic icon name understood by the front end (e.g. "star").
    pub icon: String,
    pub show_icon: bool,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSection {
    #[serde(flatten)]
    pub meta: CustomSectionMeta,
    pub entries: Vec<CustomEntry>,
}

/// The list-held section kinds. Custom sections are two-level and handled
/// separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Education,
    Experience,
    Skill,
    Language,
    Certificate,
    Project,
    Award,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Education => "education",
            SectionKind::Experience => "experience",
            SectionKind::Skill => "skill",
            SectionKind::Language => "language",
            SectionKind::Certificate => "certificate",
            SectionKind::Project => "project",
            SectionKind::Award => "award",
        }
    }

    /// Parses the path segment used by the HTTP routes. Plural forms are
    /// accepted since that is how the sections are labelled in the editor.
    pub fn parse(s: &str) -> Option<SectionKind> {
        match s {
            "education" | "educations" => Some(SectionKind::Education),
            "experience" | "experiences" => Some(SectionKind::Experience),
            "skill" | "skills" => Some(SectionKind::Skill),
            "language" | "languages" => Some(SectionKind::Language),
            "certificate" | "certificates" => Some(SectionKind::Certificate),
            "project" | "projects" => Some(SectionKind::Project),
            "award" | "awards" => Some(SectionKind::Award),
            _ => None,
        }
    }
}

/// A single entry of any list-held section, tagged with its kind on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionEntry {
    Education(EducationEntry),
    Experience(ExperienceEntry),
    Skill(SkillEntry),
    Language(LanguageEntry),
    Certificate(CertificateEntry),
    Project(ProjectEntry),
    Award(AwardEntry),
}

impl SectionEntry {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionEntry::Education(_) => SectionKind::Education,
            SectionEntry::Experience(_) => SectionKind::Experience,
            SectionEntry::Skill(_) => SectionKind::Skill,
            SectionEntry::Language(_) => SectionKind::Language,
            SectionEntry::Certificate(_) => SectionKind::Certificate,
            SectionEntry::Project(_) => SectionKind::Project,
            SectionEntry::Award(_) => SectionKind::Award,
        }
    }

    /// An empty entry of the given kind, used as the starting draft for "Add".
    pub fn empty(kind: SectionKind) -> SectionEntry {
        match kind {
            SectionKind::Education => SectionEntry::Education(EducationEntry::default()),
            SectionKind::Experience => SectionEntry::Experience(ExperienceEntry::default()),
            SectionKind::Skill => SectionEntry::Skill(SkillEntry::default()),
            SectionKind::Language => SectionEntry::Language(LanguageEntry::default()),
            SectionKind::Certificate => SectionEntry::Certificate(CertificateEntry::default()),
            SectionKind::Project => SectionEntry::Project(ProjectEntry::default()),
            SectionKind::Award => SectionEntry::Award(AwardEntry::default()),
        }
    }
}
