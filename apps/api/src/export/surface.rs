//! Lays the preview out on a fixed-width drawing surface.
//!
//! This stands in for rasterizing the on-screen preview: the same header band
//! and section blocks are positioned on one tall canvas in device pixels
//! (CSS pixels times the configured scale), producing a flat list of draw
//! operations for the PDF writer.

use serde::Serialize;

use crate::layout::{get_metrics, wrap_text, FontFace, PageConfig};
use crate::preview::model::{BlockContent, HeaderBand, PreviewDocument, PreviewItem, SectionBlock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

const INK: Rgb = Rgb(31, 41, 51);
const MUTED: Rgb = Rgb(82, 96, 109);
const ACCENT: Rgb = Rgb(37, 99, 235);
const TRACK: Rgb = Rgb(228, 231, 235);

// CSS px, before scaling.
const PADDING: f32 = 32.0;
const PHOTO_SIZE: f32 = 96.0;
const PHOTO_GAP: f32 = 20.0;
const NAME_SIZE: f32 = 28.0;
const TITLE_SIZE: f32 = 16.0;
const CONTACT_SIZE: f32 = 12.0;
const HEADING_SIZE: f32 = 15.0;
const ITEM_TITLE_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 13.0;
const LINE_HEIGHT: f32 = 1.35;
/// Baseline position within a line box, as a fraction of the font size.
const BASELINE: f32 = 0.89;
const BAR_WIDTH: f32 = 160.0;
const BAR_HEIGHT: f32 = 6.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Text {
        x: f32,
        baseline: f32,
        size: f32,
        face: FontFace,
        color: Rgb,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb,
    },
    /// The header photo. The writer supplies the pixels.
    Image { x: f32, y: f32, w: f32, h: f32 },
}

impl DrawOp {
    /// Vertical extent `(top, bottom)` in device pixels.
    pub fn vertical_extent(&self) -> (f32, f32) {
        match self {
            DrawOp::Text { baseline, size, .. } => (baseline - size, baseline + size * 0.25),
            DrawOp::Rect { y, h, .. } | DrawOp::Image { y, h, .. } => (*y, y + h),
        }
    }
}

/// One tall canvas, in device pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
}

impl Surface {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Positions the preview on a surface. `photo_size` is the decoded photo's
/// pixel size, or `None` when there is no photo to draw.
pub fn layout_surface(
    preview: &PreviewDocument,
    photo_size: Option<(u32, u32)>,
    config: &PageConfig,
) -> Surface {
    let mut b = SurfaceBuilder::new(config);
    b.header(&preview.header, photo_size);
    for block in &preview.blocks {
        b.block(block);
    }
    b.finish()
}

struct SurfaceBuilder {
    scale: f32,
    /// CSS px.
    width: f32,
    /// CSS px from the top of the surface.
    cursor: f32,
    ops: Vec<DrawOp>,
}

impl SurfaceBuilder {
    fn new(config: &PageConfig) -> Self {
        Self {
            scale: config.scale,
            width: config.surface_width_px,
            cursor: PADDING,
            ops: Vec::new(),
        }
    }

    fn content_width(&self) -> f32 {
        self.width - 2.0 * PADDING
    }

    fn finish(mut self) -> Surface {
        self.cursor += PADDING;
        Surface {
            width: self.width * self.scale,
            height: self.cursor * self.scale,
            ops: self.ops,
        }
    }

    fn text(&mut self, x: f32, top: f32, size: f32, face: FontFace, color: Rgb, text: String) {
        let s = self.scale;
        self.ops.push(DrawOp::Text {
            x: x * s,
            baseline: (top + size * BASELINE) * s,
            size: size * s,
            face,
            color,
            text,
        });
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        let s = self.scale;
        self.ops.push(DrawOp::Rect {
            x: x * s,
            y: y * s,
            w: w * s,
            h: h * s,
            color,
        });
    }

    /// Wraps and emits a paragraph starting at the cursor, advancing it.
    fn paragraph(&mut self, x: f32, max_width: f32, size: f32, face: FontFace, color: Rgb, text: &str) {
        let metrics = get_metrics(face);
        for line in wrap_text(text, metrics, size, max_width) {
            if !line.is_empty() {
                let top = self.cursor;
                self.text(x, top, size, face, color, line);
            }
            self.cursor += size * LINE_HEIGHT;
        }
    }

    fn header(&mut self, header: &HeaderBand, photo_size: Option<(u32, u32)>) {
        let top = self.cursor;
        let mut text_x = PADDING;

        if let Some((pw, ph)) = photo_size {
            // Fit inside the square, keeping the aspect ratio.
            let ratio = pw as f32 / ph.max(1) as f32;
            let (w, h) = if ratio >= 1.0 {
                (PHOTO_SIZE, PHOTO_SIZE / ratio)
            } else {
                (PHOTO_SIZE * ratio, PHOTO_SIZE)
            };
            let s = self.scale;
            self.ops.push(DrawOp::Image {
                x: (PADDING + (PHOTO_SIZE - w) / 2.0) * s,
                y: (top + (PHOTO_SIZE - h) / 2.0) * s,
                w: w * s,
                h: h * s,
            });
            text_x += PHOTO_SIZE + PHOTO_GAP;
        }

        let text_width = self.width - PADDING - text_x;
        if !header.name.is_empty() {
            self.paragraph(text_x, text_width, NAME_SIZE, FontFace::Bold, INK, &header.name);
        }
        if !header.title.is_empty() {
            self.paragraph(text_x, text_width, TITLE_SIZE, FontFace::Regular, MUTED, &header.title);
        }
        if !header.contact.is_empty() {
            let line = header.contact_line();
            self.paragraph(text_x, text_width, CONTACT_SIZE, FontFace::Regular, MUTED, &line);
        }

        if photo_size.is_some() {
            self.cursor = self.cursor.max(top + PHOTO_SIZE);
        }
        self.cursor += 16.0;
        let width = self.content_width();
        let y = self.cursor;
        self.rect(PADDING, y, width, 2.0, ACCENT);
        self.cursor += 2.0;
    }

    fn block(&mut self, block: &SectionBlock) {
        self.cursor += 20.0;
        let mut x = PADDING;
        if block.icon.is_some() {
            let y = self.cursor + HEADING_SIZE * 0.25;
            self.rect(x, y, 8.0, 8.0, ACCENT);
            x += 14.0;
        }
        let heading = block.heading.to_uppercase();
        let width = self.content_width();
        self.paragraph(x, width, HEADING_SIZE, FontFace::Bold, ACCENT, &heading);
        self.cursor += 8.0;

        match &block.content {
            BlockContent::Text(text) => {
                self.paragraph(PADDING, width, BODY_SIZE, FontFace::Regular, INK, text);
            }
            BlockContent::Items(items) => {
                for item in items {
                    self.item(item);
                }
            }
        }
    }

    fn item(&mut self, item: &PreviewItem) {
        let width = self.content_width();
        let right = PADDING + width;
        let top = self.cursor;

        // Right-aligned meta (dates or level) shares the title row.
        let meta = item.date_range.as_ref().or(item.level_label.as_ref());
        let mut title_width = width;
        if let Some(meta) = meta {
            let w = get_metrics(FontFace::Regular).measure(meta, BODY_SIZE);
            self.text(right - w, top, BODY_SIZE, FontFace::Regular, MUTED, meta.clone());
            title_width = (width - w - 12.0).max(width / 3.0);
        }
        match &item.title {
            Some(title) => {
                self.paragraph(PADDING, title_width, ITEM_TITLE_SIZE, FontFace::Bold, INK, title)
            }
            None if meta.is_some() => self.cursor += BODY_SIZE * LINE_HEIGHT,
            None => {}
        }

        let sub = match (&item.subtitle, &item.location) {
            (Some(s), Some(l)) => Some(format!("{s}, {l}")),
            (Some(s), None) => Some(s.clone()),
            (None, Some(l)) => Some(l.clone()),
            (None, None) => None,
        };
        if let Some(sub) = sub {
            self.paragraph(PADDING, width, BODY_SIZE, FontFace::Regular, MUTED, &sub);
        }

        if let Some(bar) = &item.bar {
            self.cursor += 4.0;
            let y = self.cursor;
            self.rect(PADDING, y, BAR_WIDTH, BAR_HEIGHT, TRACK);
            let fill = BAR_WIDTH * f32::from(bar.fill_percent.min(100)) / 100.0;
            if fill > 0.0 {
                self.rect(PADDING, y, fill, BAR_HEIGHT, ACCENT);
            }
            self.cursor += BAR_HEIGHT + 4.0;
            if !bar.label.is_empty() {
                self.paragraph(PADDING, width, BODY_SIZE, FontFace::Regular, MUTED, &bar.label);
            }
        }

        if let Some(desc) = &item.description {
            self.paragraph(PADDING, width, BODY_SIZE, FontFace::Regular, INK, desc);
        }
        self.cursor += 10.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::models::{EducationEntry, PersonalPatch, SectionEntry, SectionKind, SkillEntry, SkillLevel};
    use crate::document::ResumeDocument;
    use crate::layout::default_page_config;
    use crate::preview::render_preview;

    fn make_header_doc() -> ResumeDocument {
        let mut doc = ResumeDocument::new();
        doc.set_personal(PersonalPatch {
            name: Some("Asha Rao".to_string()),
            title: Some("Backend Engineer".to_string()),
            email: Some("asha@example.com".to_string()),
            ..Default::default()
        });
        doc
    }

    fn bars(surface: &Surface) -> Vec<f32> {
        surface
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect { w, color, h, .. } if *color == ACCENT && *h < 20.0 && *w < 400.0 => {
                    Some(*w)
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_header_only_surface() {
        let config = default_page_config();
        let surface = layout_surface(&render_preview(&make_header_doc()), None, &config);
        let texts: Vec<_> = surface.texts().collect();
        assert_eq!(texts, vec!["Asha Rao", "Backend Engineer", "asha@example.com"]);
        assert_eq!(surface.width, 1588.0);
        // Header band alone is far shorter than one A4 page.
        assert!(config.scaled_content_height(surface.height) < config.page_height_pt);
    }

    #[test]
    fn test_photo_shifts_header_text() {
        let config = default_page_config();
        let preview = render_preview(&make_header_doc());
        let with_photo = layout_surface(&preview, Some((200, 100)), &config);
        let image = with_photo
            .ops
            .iter()
            .find(|op| matches!(op, DrawOp::Image { .. }))
            .expect("image op");
        if let DrawOp::Image { w, h, .. } = image {
            assert!((w / h - 2.0).abs() < 1e-3, "aspect ratio kept");
        }
        let first_text_x = with_photo
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { x, .. } => Some(*x),
                _ => None,
            })
            .unwrap();
        assert!(first_text_x > (PADDING + PHOTO_SIZE) * config.scale);
    }

    #[test]
    fn test_skill_bar_width_matches_level() {
        let config = default_page_config();
        let mut doc = make_header_doc();
        doc.upsert_entry(
            SectionKind::Skill,
            None,
            SectionEntry::Skill(SkillEntry {
                skill: "Rust".to_string(),
                level: Some(SkillLevel::Expert),
                ..Default::default()
            }),
        )
        .unwrap();
        doc.upsert_entry(
            SectionKind::Skill,
            None,
            SectionEntry::Skill(SkillEntry {
                skill: "Go".to_string(),
                level: Some(SkillLevel::Beginner),
                ..Default::default()
            }),
        )
        .unwrap();
        let surface = layout_surface(&render_preview(&doc), None, &config);
        assert_eq!(bars(&surface), vec![320.0, 64.0]);
    }

    #[test]
    fn test_sections_grow_surface_in_order() {
        let config = default_page_config();
        let mut doc = make_header_doc();
        let base = layout_surface(&render_preview(&doc), None, &config).height;
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
        let surface = layout_surface(&render_preview(&doc), None, &config);
        assert!(surface.height > base);
        let texts: Vec<_> = surface.texts().collect();
        assert!(texts.contains(&"EDUCATION"));
        assert!(texts.contains(&"B.Tech"));
        assert!(texts.contains(&"XYZ University"));
        assert!(texts.contains(&"2018 – 2022"));
    }
}
