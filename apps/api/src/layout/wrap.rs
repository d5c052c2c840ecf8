//! Greedy word wrap over the static metric tables.

use crate::layout::font_metrics::FontMetricTable;

/// Breaks `text` into lines no wider than `max_width` at `size`.
///
/// Explicit newlines start a new paragraph; blank paragraphs are kept as
/// empty lines. A single word wider than the line is placed on its own line
/// and allowed to overflow. Whitespace-only input yields no lines.
pub fn wrap_text(text: &str, metrics: &FontMetricTable, size: f32, max_width: f32) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let space_w = metrics.space_width * size;
    let mut lines = Vec::new();

    for paragraph in text.trim().lines() {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in words {
            let word_w = metrics.measure(word, size);
            if current.is_empty() {
                current.push_str(word);
                current_width = word_w;
            } else if current_width + space_w + word_w > max_width {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width += space_w + word_w;
            }
        }
        lines.push(current);
    }

    lines
}
