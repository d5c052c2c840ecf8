//! Page geometry and slice-based pagination.
//!
//! The export surface is one tall canvas. Pagination does not reflow: the
//! whole canvas is placed on every page at a decreasing vertical offset and
//! each page shows the window that falls inside its box. Elements that
//! straddle a boundary are cut.

use serde::{Deserialize, Serialize};

/// A4 in PDF points (1/72 in).
pub const A4_WIDTH_PT: f32 = 595.28;
pub const A4_HEIGHT_PT: f32 = 841.89;

/// Layout parameters for the export surface and the output pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    /// Width of the preview node in CSS pixels (A4 at 96 dpi).
    pub surface_width_px: f32,
    /// Device scale of the surface. Coordinates on the surface are
    /// `css_px * scale`.
    pub scale: f32,
}

/// A4 portrait, 794 px wide preview, rendered at 2x.
pub fn default_page_config() -> PageConfig {
    PageConfig {
        page_width_pt: A4_WIDTH_PT,
        page_height_pt: A4_HEIGHT_PT,
        surface_width_px: 794.0,
        scale: 2.0,
    }
}

impl PageConfig {
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Surface width in device pixels.
    pub fn device_width(&self) -> f32 {
        self.surface_width_px * self.scale
    }

    /// Points per device pixel when the surface is fitted to the page width.
    pub fn pt_per_device_px(&self) -> f32 {
        self.page_width_pt / self.device_width()
    }

    /// Height of the content once scaled to the page width, from the surface's
    /// aspect ratio.
    pub fn scaled_content_height(&self, surface_height: f32) -> f32 {
        surface_height * self.page_width_pt / self.device_width()
    }
}

/// Where the content sits on each page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagePlan {
    /// Scaled content height in points.
    pub content_height_pt: f32,
    /// Vertical offset of the content's top edge, per page, measured down
    /// from the page's top edge. Always `<= 0` after the first page.
    pub offsets_pt: Vec<f32>,
}

impl PagePlan {
    pub fn page_count(&self) -> usize {
        self.offsets_pt.len()
    }

    /// Fraction of the last page covered by content (0..=1).
    pub fn last_page_fill(&self, page_height_pt: f32) -> f32 {
        let Some(last) = self.offsets_pt.last() else {
            return 0.0;
        };
        let visible = (self.content_height_pt + last).clamp(0.0, page_height_pt);
        visible / page_height_pt
    }
}

/// Plans the pages for content of `content_height_pt`.
///
/// The content goes on page one at offset 0. While unplaced height remains
/// after subtracting a page, another page is added with the content shifted
/// up so the next window shows. Content that exactly fills N pages yields N
/// pages, and empty content still yields one page.
pub fn plan_pages(content_height_pt: f32, page_height_pt: f32) -> PagePlan {
    let mut offsets = vec![0.0_f32];
    let mut height_left = content_height_pt - page_height_pt;

    // Tolerance absorbs float drift so an exact multiple does not spill an
    // empty trailing page.
    while height_left > 0.01 {
        offsets.push(height_left - content_height_pt);
        height_left -= page_height_pt;
    }

    PagePlan {
        content_height_pt,
        offsets_pt: offsets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_sanity() {
        let config = default_page_config();
        assert_eq!(config.scale, 2.0);
        assert_eq!(config.device_width(), 1588.0);
        assert!((config.pt_per_device_px() - 595.28 / 1588.0).abs() < 1e-6);
    }

    #[test]
    fn test_scaled_height_follows_aspect_ratio() {
        let config = default_page_config();
        // A surface twice as tall as it is wide scales to twice the page width.
        let h = config.scaled_content_height(config.device_width() * 2.0);
        assert!((h - 2.0 * A4_WIDTH_PT).abs() < 1e-2);
    }

    #[test]
    fn test_short_content_single_page() {
        let plan = plan_pages(200.0, A4_HEIGHT_PT);
        assert_eq!(plan.page_count(), 1);
        assert_eq!(plan.offsets_pt, vec![0.0]);
        assert!((plan.last_page_fill(A4_HEIGHT_PT) - 200.0 / A4_HEIGHT_PT).abs() < 1e-4);
    }

    #[test]
    fn test_empty_content_still_one_page() {
        let plan = plan_pages(0.0, A4_HEIGHT_PT);
        assert_eq!(plan.page_count(), 1);
        assert_eq!(plan.last_page_fill(A4_HEIGHT_PT), 0.0);
    }

    #[test]
    fn test_two_and_a_half_pages() {
        let page = 100.0;
        let plan = plan_pages(250.0, page);
        assert_eq!(plan.page_count(), 3);
        // Page 2 shows content 100..200, page 3 shows 200..250.
        assert_eq!(plan.offsets_pt, vec![0.0, -100.0, -200.0]);
        assert!((plan.last_page_fill(page) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_exact_multiple_has_no_blank_page() {
        let plan = plan_pages(200.0, 100.0);
        assert_eq!(plan.page_count(), 2);
        assert!((plan.last_page_fill(100.0) - 1.0).abs() < 1e-4);
    }
}
