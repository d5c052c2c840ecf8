use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::preview::{render_preview, to_html};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PreviewQuery {
    pub format: Option<String>,
}

/// GET /api/v1/sessions/:id/preview
///
/// JSON by default; `?format=html` returns the rendered markup.
pub async fn handle_get_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PreviewQuery>,
) -> Result<Response, AppError> {
    let preview = state
        .sessions
        .read(id, |s| render_preview(&s.document))
        .await?;

    match query.format.as_deref() {
        None | Some("json") => Ok(Json(preview).into_response()),
        Some("html") => Ok(Html(to_html(&preview)).into_response()),
        Some(other) => Err(AppError::Validation(format!(
            "Unsupported preview format '{other}'"
        ))),
    }
}
