use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::export_pdf;
use crate::state::AppState;

/// POST /api/v1/sessions/:id/export
///
/// Builds the PDF from a snapshot of the document. A second request for the
/// same session while one is running gets 409.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let (document, _guard) = state.sessions.begin_export(id).await?;
    info!(session_id = %id, "Export requested");

    let artifact = export_pdf(&document, &state.page_config, &state.assets).await?;

    let disposition = HeaderValue::from_str(&content_disposition(&artifact.filename))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("bad Content-Disposition: {e}")))?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

/// `attachment` with an ASCII fallback name plus the RFC 5987 UTF-8 form.
fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-' | b'_' => (b as char).to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect();
    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}
