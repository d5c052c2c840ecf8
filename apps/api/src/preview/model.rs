use serde::Serialize;

/// The rendered résumé: one header band followed by section blocks in
/// display order. This is what both the on-screen preview and the exporter
/// consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewDocument {
    pub header: HeaderBand,
    pub blocks: Vec<SectionBlock>,
}

impl PreviewDocument {
    pub fn block(&self, key: &str) -> Option<&SectionBlock> {
        self.blocks.iter().find(|b| b.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderBand {
    pub name: String,
    pub title: String,
    /// Non-empty contact parts in order: email, phone, location.
    pub contact: Vec<String>,
    pub photo: Option<PhotoRef>,
}

impl HeaderBand {
    pub fn contact_line(&self) -> String {
        self.contact.join("  |  ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRef {
    pub src: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBlock {
    /// Stable identifier: the section kind, "profile", or "custom-<n>".
    pub key: String,
    pub heading: String,
    /// Icon name, present only for custom sections with `showIcon` set.
    pub icon: Option<String>,
    pub content: BlockContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum BlockContent {
    Text(String),
    Items(Vec<PreviewItem>),
}

impl BlockContent {
    pub fn items(&self) -> &[PreviewItem] {
        match self {
            BlockContent::Items(items) => items,
            BlockContent::Text(_) => &[],
        }
    }
}

/// One rendered entry. Fields that were empty in the document are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewItem {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub date_range: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Right-aligned level text (languages).
    pub level_label: Option<String>,
    pub bar: Option<SkillBar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillBar {
    pub fill_percent: u8,
    pub label: String,
}
