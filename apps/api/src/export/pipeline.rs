//! End-to-end export: document → preview → surface → pages → PDF bytes.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::document::ResumeDocument;
use crate::export::assets::{Asset, AssetLoader, AssetSource, LoadOutcome};
use crate::export::pdf::{decode_photo, write_pdf, EMBEDDED_PHOTO_SIDE};
use crate::export::surface::layout_surface;
use crate::export::ExportError;
use crate::layout::{plan_pages, PageConfig};
use crate::preview::{render_preview, PreviewDocument};

/// A finished export, ready to be sent as a download.
#[derive(Debug, Clone, Serialize)]
pub struct ExportArtifact {
    pub filename: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Builds the PDF for `doc`.
///
/// The photo is loaded first; if that fails or times out the export goes
/// ahead without it. Layout and writing run on the blocking pool. The
/// document is only read.
pub async fn export_pdf(
    doc: &ResumeDocument,
    config: &PageConfig,
    assets: &AssetLoader,
) -> Result<ExportArtifact, ExportError> {
    let preview = render_preview(doc);
    let photo = match &preview.header.photo {
        Some(photo) => load_photo(assets, &photo.src).await,
        None => None,
    };

    let filename = export_filename(&doc.personal.name);
    let title = match doc.personal.name.trim() {
        "" => "Resume".to_string(),
        name => format!("{name} - Resume"),
    };

    let cfg = config.clone();
    let (bytes, page_count) =
        tokio::task::spawn_blocking(move || render_pdf(&preview, photo.as_deref(), &cfg, &title))
            .await
            .map_err(|e| ExportError::Task(format!("spawn_blocking failed in export: {e}")))??;

    info!(
        filename = %filename,
        page_count,
        size_bytes = bytes.len(),
        "PDF export complete"
    );

    Ok(ExportArtifact {
        filename,
        bytes,
        page_count,
    })
}

async fn load_photo(assets: &AssetLoader, reference: &str) -> Option<Arc<Asset>> {
    let source = match AssetSource::parse(reference) {
        Ok(source) => source,
        Err(e) => {
            warn!(error = %e, "Photo reference refused; exporting without it");
            return None;
        }
    };
    match assets.load(&source).await {
        LoadOutcome::Loaded(asset) => Some(asset),
        LoadOutcome::Failed(reason) => {
            warn!(%reason, "Photo could not be loaded; exporting without it");
            None
        }
        LoadOutcome::TimedOut => {
            warn!("Photo load timed out; exporting without it");
            None
        }
    }
}

/// Synchronous part of the export. Returns the PDF bytes and page count.
pub fn render_pdf(
    preview: &PreviewDocument,
    photo: Option<&Asset>,
    config: &PageConfig,
    title: &str,
) -> Result<(Vec<u8>, usize), ExportError> {
    if !(config.scale.is_finite() && config.scale > 0.0) {
        return Err(ExportError::Surface(format!(
            "invalid surface scale {}",
            config.scale
        )));
    }

    let decoded = photo.and_then(|asset| match decode_photo(&asset.bytes, EMBEDDED_PHOTO_SIDE) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(error = %e, mime = %asset.mime, "Photo could not be decoded; exporting without it");
            None
        }
    });

    let surface = layout_surface(preview, decoded.as_ref().map(|p| (p.width, p.height)), config);
    if !surface.height.is_finite() {
        return Err(ExportError::Surface("surface height is not finite".to_string()));
    }

    let content_height = config.scaled_content_height(surface.height);
    let plan = plan_pages(content_height, config.page_height_pt);
    debug!(
        surface_height = surface.height,
        content_height_pt = content_height,
        pages = plan.page_count(),
        last_page_fill = plan.last_page_fill(config.page_height_pt),
        "Pages planned"
    );
    let bytes = write_pdf(&surface, &plan, config, decoded.as_ref(), title)?;
    Ok((bytes, plan.page_count()))
}

/// `<name>_CV.pdf`, falling back to `Resume_CV.pdf` for a blank name.
/// Characters that are not allowed in file names become `_`.
pub fn export_filename(name: &str) -> String {
    let name = name.trim();
    let base = if name.is_empty() { "Resume" } else { name };
    let safe: String = base
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{safe}_CV.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::models::{ExperienceEntry, Photo, SectionEntry, SectionKind};
    use crate::document::photo::{photo_from_bytes, tests::tiny_png};
    use crate::document::PersonalPatch;
    use crate::export::assets::{AssetError, RemoteFetcher};
    use crate::layout::default_page_config;
    use async_trait::async_trait;
    use lopdf::Document;
    use std::time::Duration;

    struct NotFoundFetcher;

    #[async_trait]
    impl RemoteFetcher for NotFoundFetcher {
        async fn fetch(&self, _url: &str) -> Result<Asset, AssetError> {
            Err(AssetError::Status(404))
        }
    }

    fn make_loader() -> AssetLoader {
        AssetLoader::new(Arc::new(NotFoundFetcher), Duration::from_secs(1))
    }

    fn make_named_doc(name: &str) -> ResumeDocument {
        let mut doc = ResumeDocument::new();
        doc.set_personal(PersonalPatch {
            name: Some(name.to_string()),
            title: Some("Backend Engineer".to_string()),
            ..Default::default()
        });
        doc
    }

    fn page_count(bytes: &[u8]) -> usize {
        Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[tokio::test]
    async fn test_empty_document_exports_one_page() {
        let doc = ResumeDocument::new();
        let artifact = export_pdf(&doc, &default_page_config(), &make_loader())
            .await
            .unwrap();
        assert_eq!(artifact.filename, "Resume_CV.pdf");
        assert_eq!(artifact.page_count, 1);
        assert_eq!(page_count(&artifact.bytes), 1);
    }

    #[tokio::test]
    async fn test_export_leaves_document_untouched() {
        let mut doc = make_named_doc("Asha Rao");
        doc.upsert_entry(
            SectionKind::Experience,
            None,
            SectionEntry::Experience(ExperienceEntry {
                job_title: "Engineer".to_string(),
                employer: "Acme".to_string(),
                ..Default::default()
            }),
        )
        .unwrap();
        let before = doc.clone();

        let artifact = export_pdf(&doc, &default_page_config(), &make_loader())
            .await
            .unwrap();
        assert_eq!(artifact.filename, "Asha Rao_CV.pdf");
        assert_eq!(doc, before);
    }

    #[tokio::test]
    async fn test_long_document_spans_multiple_pages() {
        let mut doc = make_named_doc("Asha Rao");
        for i in 0..25 {
            doc.upsert_entry(
                SectionKind::Experience,
                None,
                SectionEntry::Experience(ExperienceEntry {
                    job_title: format!("Engineer {i}"),
                    employer: "Acme".to_string(),
                    start_date: "2019".to_string(),
                    end_date: "2021".to_string(),
                    description: "Owned the billing pipeline end to end. ".repeat(6),
                    ..Default::default()
                }),
            )
            .unwrap();
        }
        let artifact = export_pdf(&doc, &default_page_config(), &make_loader())
            .await
            .unwrap();
        assert!(artifact.page_count >= 2);
        assert_eq!(page_count(&artifact.bytes), artifact.page_count);
    }

    #[tokio::test]
    async fn test_photo_is_embedded() {
        let mut doc = make_named_doc("Asha Rao");
        doc.set_photo(photo_from_bytes(&tiny_png(8, 8), 1 << 20).unwrap());
        let artifact = export_pdf(&doc, &default_page_config(), &make_loader())
            .await
            .unwrap();
        let pdf = Document::load_mem(&artifact.bytes).unwrap();
        let has_image = pdf.objects.values().any(|obj| {
            obj.as_stream()
                .ok()
                .and_then(|s| s.dict.get(b"Subtype").ok())
                .and_then(|v| v.as_name().ok())
                == Some(b"Image".as_slice())
        });
        assert!(has_image);
    }

    #[tokio::test]
    async fn test_unreachable_photo_is_skipped() {
        let mut doc = make_named_doc("Asha Rao");
        doc.set_photo(Photo {
            src: "https://cdn.example.com/gone.png".to_string(),
            mime: "image/png".to_string(),
            width: 8,
            height: 8,
        });
        let artifact = export_pdf(&doc, &default_page_config(), &make_loader())
            .await
            .unwrap();
        assert_eq!(artifact.page_count, 1);
    }

    #[tokio::test]
    async fn test_local_path_photo_is_never_read() {
        let mut doc = make_named_doc("Asha Rao");
        doc.set_photo(Photo {
            src: "file:///etc/passwd".to_string(),
            mime: "image/png".to_string(),
            width: 8,
            height: 8,
        });
        let loader = make_loader();
        let artifact = export_pdf(&doc, &default_page_config(), &loader).await.unwrap();
        assert_eq!(artifact.page_count, 1);
        assert_eq!(loader.cached_count(), 0);
    }

    #[test]
    fn test_invalid_scale_is_a_surface_error() {
        let preview = render_preview(&ResumeDocument::new());
        let config = default_page_config().with_scale(0.0);
        let err = render_pdf(&preview, None, &config, "Resume").unwrap_err();
        assert!(matches!(err, ExportError::Surface(_)));
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename("  Asha Rao "), "Asha Rao_CV.pdf");
        assert_eq!(export_filename(""), "Resume_CV.pdf");
        assert_eq!(export_filename("   "), "Resume_CV.pdf");
        assert_eq!(export_filename("A/B: C?"), "A_B_ C__CV.pdf");
    }
}
