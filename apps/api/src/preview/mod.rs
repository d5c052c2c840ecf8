// Preview renderer: document -> header band + ordered section blocks.

pub mod handlers;
pub mod html;
pub mod model;
pub mod renderer;

pub use html::to_html;
pub use model::PreviewDocument;
pub use renderer::{render_preview, skill_fill_percent};
