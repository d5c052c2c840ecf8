//! HTML markup for the on-screen preview.
//!
//! Styling is scoped to the `.cv-preview` root via the embedded stylesheet,
//! so the preview never touches global document styles.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::preview::model::{BlockContent, HeaderBand, PreviewDocument, PreviewItem, SectionBlock};

const PREVIEW_CSS: &str = r#"
.cv-preview { font-family: Helvetica, Arial, sans-serif; color: #1f2933; width: 794px; padding: 32px; box-sizing: border-box; }
.cv-preview .cv-header { display: flex; gap: 20px; align-items: center; border-bottom: 2px solid #2563eb; padding-bottom: 16px; }
.cv-preview .cv-photo { width: 96px; height: 96px; border-radius: 50%; object-fit: cover; }
.cv-preview .cv-name { font-size: 28px; font-weight: 700; margin: 0; }
.cv-preview .cv-title { font-size: 16px; color: #52606d; margin: 4px 0; }
.cv-preview .cv-contact { font-size: 12px; color: #52606d; }
.cv-preview .cv-block h2 { font-size: 15px; text-transform: uppercase; color: #2563eb; margin: 20px 0 8px; }
.cv-preview .cv-item { margin-bottom: 10px; }
.cv-preview .cv-item-head { display: flex; justify-content: space-between; font-weight: 600; }
.cv-preview .cv-sub { color: #52606d; font-size: 13px; }
.cv-preview .cv-bar { background: #e4e7eb; height: 6px; border-radius: 3px; width: 160px; }
.cv-preview .cv-bar-fill { background: #2563eb; height: 6px; border-radius: 3px; }
"#;

/// Renders the preview as a standalone HTML page.
pub fn to_html(preview: &PreviewDocument) -> String {
    let page = html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (page_title(&preview.header)) }
                style { (PreEscaped(PREVIEW_CSS)) }
            }
            body {
                (preview_fragment(preview))
            }
        }
    };
    page.into_string()
}

/// The preview node alone, for embedding into an existing page.
pub fn preview_fragment(preview: &PreviewDocument) -> Markup {
    html! {
        div.cv-preview {
            (header(&preview.header))
            @for block in &preview.blocks {
                (section(block))
            }
        }
    }
}

fn page_title(header: &HeaderBand) -> String {
    if header.name.is_empty() {
        "Resume".to_string()
    } else {
        format!("{} - Resume", header.name)
    }
}

fn header(h: &HeaderBand) -> Markup {
    html! {
        header.cv-header {
            @if let Some(photo) = &h.photo {
                img.cv-photo src=(photo.src) alt="Photo";
            }
            div {
                @if !h.name.is_empty() {
                    h1.cv-name { (h.name) }
                }
                @if !h.title.is_empty() {
                    p.cv-title { (h.title) }
                }
                @if !h.contact.is_empty() {
                    p.cv-contact { (h.contact_line()) }
                }
            }
        }
    }
}

fn section(block: &SectionBlock) -> Markup {
    html! {
        section.cv-block data-key=(block.key) {
            h2 {
                @if let Some(icon) = &block.icon {
                    span.cv-icon data-icon=(icon) {}
                    " "
                }
                (block.heading)
            }
            @match &block.content {
                BlockContent::Text(text) => p { (text) },
                BlockContent::Items(items) => {
                    @for item in items {
                        (entry(item))
                    }
                },
            }
        }
    }
}

fn entry(item: &PreviewItem) -> Markup {
    html! {
        div.cv-item {
            div.cv-item-head {
                span { (item.title.as_deref().unwrap_or_default()) }
                @if let Some(dates) = &item.date_range {
                    span.cv-sub { (dates) }
                }
                @if let Some(level) = &item.level_label {
                    span.cv-sub { (level) }
                }
            }
            @if let Some(sub) = &item.subtitle {
                div.cv-sub {
                    (sub)
                    @if let Some(loc) = &item.location {
                        ", " (loc)
                    }
                }
            } @else if let Some(loc) = &item.location {
                div.cv-sub { (loc) }
            }
            @if let Some(bar) = &item.bar {
                div.cv-bar title=(bar.label) {
                    div.cv-bar-fill style=(format!("width: {}%", bar.fill_percent)) {}
                }
                @if !bar.label.is_empty() {
                    div.cv-sub { (bar.label) }
                }
            }
            @if let Some(desc) = &item.description {
                p { (desc) }
            }
        }
    }
}
