use crate::document::models::{CustomSection, SkillEntry, SkillLevel};
use crate::document::ResumeDocument;
use crate::preview::model::{
    BlockContent, HeaderBand, PhotoRef, PreviewDocument, PreviewItem, SectionBlock, SkillBar,
};

/// Fill width used when a skill has no level.
pub const DEFAULT_SKILL_FILL: u8 = 60;

/// Skill bar width as a step function of the level.
pub fn skill_fill_percent(level: Option<SkillLevel>) -> u8 {
    match level {
        Some(SkillLevel::Beginner) => 20,
        Some(SkillLevel::Amateur) => 40,
        Some(SkillLevel::Competent) => 60,
        Some(SkillLevel::Proficient) => 80,
        Some(SkillLevel::Expert) => 100,
        None => DEFAULT_SKILL_FILL,
    }
}

/// Renders the document into its preview layout.
///
/// Pure: the same document always yields the same preview. A block is
/// emitted only when its backing list is non-empty or its text is present.
pub fn render_preview(doc: &ResumeDocument) -> PreviewDocument {
    let mut blocks = Vec::new();

    if let Some(profile) = doc.profile.as_deref().and_then(non_empty) {
        blocks.push(SectionBlock {
            key: "profile".to_string(),
            heading: "Profile".to_string(),
            icon: None,
            content: BlockContent::Text(profile),
        });
    }

    push_items(&mut blocks, "experience", "Experience", &doc.experience, |e| PreviewItem {
        title: non_empty(&e.job_title),
        subtitle: non_empty(&e.employer),
        date_range: date_range(&e.start_date, &e.end_date),
        location: non_empty(&e.location),
        description: non_empty(&e.description),
        ..Default::default()
    });

    push_items(&mut blocks, "education", "Education", &doc.education, |e| PreviewItem {
        title: non_empty(&e.degree),
        subtitle: non_empty(&e.school),
        date_range: date_range(&e.start_date, &e.end_date),
        location: non_empty(&e.location),
        description: non_empty(&e.description),
        ..Default::default()
    });

    push_items(&mut blocks, "skill", "Skills", &doc.skills, |s| PreviewItem {
        title: non_empty(&s.skill),
        subtitle: non_empty(&s.info),
        bar: Some(skill_bar(s)),
        ..Default::default()
    });

    push_items(&mut blocks, "language", "Languages", &doc.languages, |l| PreviewItem {
        title: non_empty(&l.language),
        subtitle: non_empty(&l.info),
        level_label: l.level.map(|lvl| lvl.label().to_string()),
        ..Default::default()
    });

    push_items(&mut blocks, "certificate", "Certificates", &doc.certificates, |c| PreviewItem {
        title: non_empty(&c.certificate),
        subtitle: non_empty(&c.info),
        ..Default::default()
    });

    push_items(&mut blocks, "project", "Projects", &doc.projects, |p| PreviewItem {
        title: non_empty(&p.title),
        subtitle: non_empty(&p.subtitle),
        date_range: date_range(&p.start_date, &p.end_date),
        description: non_empty(&p.description),
        ..Default::default()
    });

    push_items(&mut blocks, "award", "Awards", &doc.awards, |a| PreviewItem {
        title: non_empty(&a.title),
        subtitle: non_empty(&a.issuer),
        date_range: non_empty(&a.date),
        description: non_empty(&a.description),
        ..Default::default()
    });

    for (i, section) in doc.custom_sections.iter().enumerate() {
        if let Some(block) = custom_block(i, section) {
            blocks.push(block);
        }
    }

    PreviewDocument {
        header: header_band(doc),
        blocks,
    }
}

fn header_band(doc: &ResumeDocument) -> HeaderBand {
    let p = &doc.personal;
    let contact = [&p.email, &p.phone, &p.location]
        .into_iter()
        .filter_map(|s| non_empty(s))
        .collect();

    HeaderBand {
        name: p.name.trim().to_string(),
        title: p.title.trim().to_string(),
        contact,
        photo: p.photo.as_ref().map(|photo| PhotoRef {
            src: photo.src.clone(),
            width: photo.width,
            height: photo.height,
        }),
    }
}

fn push_items<T>(
    blocks: &mut Vec<SectionBlock>,
    key: &str,
    heading: &str,
    entries: &[T],
    to_item: impl Fn(&T) -> PreviewItem,
) {
    if entries.is_empty() {
        return;
    }
    blocks.push(SectionBlock {
        key: key.to_string(),
        heading: heading.to_string(),
        icon: None,
        content: BlockContent::Items(entries.iter().map(to_item).collect()),
    });
}

fn custom_block(index: usize, section: &CustomSection) -> Option<SectionBlock> {
    if section.entries.is_empty() {
        return None;
    }
    let items = section
        .entries
        .iter()
        .map(|e| PreviewItem {
            title: non_empty(&e.title),
            subtitle: non_empty(&e.subtitle),
            date_range: date_range(&e.start_date, &e.end_date),
            location: non_empty(&e.location),
            description: non_empty(&e.description),
            ..Default::default()
        })
        .collect();

    Some(SectionBlock {
        key: format!("custom-{index}"),
        heading: section.meta.heading.trim().to_string(),
        icon: section
            .meta
            .show_icon
            .then(|| non_empty(&section.meta.icon))
            .flatten(),
        content: BlockContent::Items(items),
    })
}

fn skill_bar(skill: &SkillEntry) -> SkillBar {
    let label = non_empty(&skill.custom_level_text)
        .or_else(|| skill.level.map(|l| l.label().to_string()))
        .unwrap_or_default();
    SkillBar {
        fill_percent: skill_fill_percent(skill.level),
        label,
    }
}

/// "start – end", or whichever side is present.
pub fn date_range(start: &str, end: &str) -> Option<String> {
    match (non_empty(start), non_empty(end)) {
        (Some(s), Some(e)) => Some(format!("{s} – {e}")),
        (Some(s), None) => Some(s),
        (None, Some(e)) => Some(e),
        (None, None) => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}
