// Layout primitives for the export surface: font metrics, word wrap, page
// geometry and pagination. CPU-bound work here runs inside
// tokio::task::spawn_blocking when called from the async export path.

pub mod font_metrics;
pub mod page;
pub mod wrap;

pub use font_metrics::{get_metrics, FontFace};
pub use page::{default_page_config, plan_pages, PageConfig, PagePlan};
pub use wrap::wrap_text;
