use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::document::models::{CustomEntry, CustomSectionMeta, Photo, SectionEntry, SectionKind};
use crate::document::photo::{photo_from_bytes, photo_from_data_url, photo_from_remote};
use crate::document::PersonalPatch;
use crate::errors::AppError;
use crate::export::{AssetSource, LoadOutcome};
use crate::session::handlers::SessionView;
use crate::state::AppState;

/// JSON form of a photo update: exactly one of the two fields.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoJsonRequest {
    #[serde(default)]
    pub data_url: Option<String>,
    /// An http(s) URL, fetched once to check the image.
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Deserialize)]
pub struct ProfileRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct NewCustomSectionRequest {
    #[serde(flatten)]
    pub meta: CustomSectionMeta,
    #[serde(default)]
    pub entry: Option<CustomEntry>,
}

/// Response for operations that place or remove something at an index.
#[derive(Serialize)]
pub struct IndexedResponse<T: Serialize> {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<T>,
    pub session: SessionView,
}

fn parse_kind(raw: &str) -> Result<SectionKind, AppError> {
    SectionKind::parse(raw).ok_or_else(|| AppError::NotFound(format!("Unknown section '{raw}'")))
}

/// Reads an entry body for `kind`. The `kind` tag may be omitted since the
/// path already names it.
fn entry_from_json(kind: SectionKind, mut body: Value) -> Result<SectionEntry, AppError> {
    let fields = body
        .as_object_mut()
        .ok_or_else(|| AppError::Validation("Entry must be a JSON object".to_string()))?;
    fields
        .entry("kind")
        .or_insert_with(|| Value::String(kind.as_str().to_string()));
    serde_json::from_value(body).map_err(|e| AppError::Validation(format!("Invalid entry: {e}")))
}

/// PATCH /api/v1/sessions/:id/personal
pub async fn handle_patch_personal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<PersonalPatch>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .update(id, |s| {
            s.document.set_personal(patch);
            SessionView::of(s)
        })
        .await?;
    Ok(Json(view))
}

/// PUT /api/v1/sessions/:id/photo
///
/// Accepts either a multipart upload (first file field) or a JSON body with
/// a `dataUrl` or a `photoUrl`.
pub async fn handle_put_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Request,
) -> Result<Json<SessionView>, AppError> {
    let max_bytes = state.config.max_photo_bytes;
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let photo = if is_multipart {
        let mut multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        let mut upload = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?
        {
            if field.file_name().is_some() || matches!(field.name(), Some("photo" | "file")) {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                upload = Some(bytes);
                break;
            }
        }
        let bytes = upload.ok_or_else(|| AppError::Validation("No photo file in upload".to_string()))?;
        photo_from_bytes(&bytes, max_bytes)?
    } else {
        let Json(body) = Json::<PhotoJsonRequest>::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        match (body.data_url, body.photo_url) {
            (Some(data_url), None) => photo_from_data_url(&data_url, max_bytes)?,
            (None, Some(url)) => fetch_remote_photo(&state, &url, max_bytes).await?,
            _ => {
                return Err(AppError::Validation(
                    "Send either dataUrl or photoUrl".to_string(),
                ))
            }
        }
    };

    info!(
        session_id = %id,
        mime = %photo.mime,
        width = photo.width,
        height = photo.height,
        "Photo set"
    );
    let view = state
        .sessions
        .update(id, |s| {
            s.document.set_photo(photo);
            SessionView::of(s)
        })
        .await?;
    Ok(Json(view))
}

/// Loads `url` through the shared asset loader, which also primes the cache
/// the exporter reads from.
async fn fetch_remote_photo(state: &AppState, url: &str, max_bytes: usize) -> Result<Photo, AppError> {
    let source = match AssetSource::parse(url) {
        Ok(source @ AssetSource::Remote(_)) => source,
        _ => {
            return Err(AppError::Validation(
                "photoUrl must be an http or https URL".to_string(),
            ))
        }
    };
    match state.assets.load(&source).await {
        LoadOutcome::Loaded(asset) => Ok(photo_from_remote(url.trim(), &asset.bytes, max_bytes)?),
        LoadOutcome::Failed(reason) => Err(AppError::Validation(format!(
            "Could not load photo: {reason}"
        ))),
        LoadOutcome::TimedOut => Err(AppError::Unavailable(
            "Timed out loading photo".to_string(),
        )),
    }
}

/// DELETE /api/v1/sessions/:id/photo
pub async fn handle_delete_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .update(id, |s| {
            s.document.clear_photo();
            SessionView::of(s)
        })
        .await?;
    Ok(Json(view))
}

/// PUT /api/v1/sessions/:id/profile
pub async fn handle_put_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .update(id, |s| {
            s.document.set_profile(req.text);
            SessionView::of(s)
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/sections/:kind
pub async fn handle_append_entry(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, String)>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<IndexedResponse<SectionEntry>>), AppError> {
    let kind = parse_kind(&kind)?;
    let entry = entry_from_json(kind, body)?;
    let response = state
        .sessions
        .update(id, |s| {
            let index = s.document.upsert_entry(kind, None, entry)?;
            Ok::<_, AppError>(IndexedResponse {
                index,
                removed: None,
                session: SessionView::of(s),
            })
        })
        .await??;
    Ok((StatusCode::CREATED, Json(response)))
}

/// PUT /api/v1/sessions/:id/sections/:kind/:index
pub async fn handle_replace_entry(
    State(state): State<AppState>,
    Path((id, kind, index)): Path<(Uuid, String, usize)>,
    Json(body): Json<Value>,
) -> Result<Json<IndexedResponse<SectionEntry>>, AppError> {
    let kind = parse_kind(&kind)?;
    let entry = entry_from_json(kind, body)?;
    let response = state
        .sessions
        .update(id, |s| {
            let index = s.document.upsert_entry(kind, Some(index), entry)?;
            Ok::<_, AppError>(IndexedResponse {
                index,
                removed: None,
                session: SessionView::of(s),
            })
        })
        .await??;
    Ok(Json(response))
}

/// DELETE /api/v1/sessions/:id/sections/:kind/:index
pub async fn handle_remove_entry(
    State(state): State<AppState>,
    Path((id, kind, index)): Path<(Uuid, String, usize)>,
) -> Result<Json<IndexedResponse<SectionEntry>>, AppError> {
    let kind = parse_kind(&kind)?;
    let response = state
        .sessions
        .update(id, |s| {
            let removed = s.document.remove_entry(kind, index)?;
            s.editors.entry_removed(kind, index);
            Ok::<_, AppError>(IndexedResponse {
                index,
                removed: Some(removed),
                session: SessionView::of(s),
            })
        })
        .await??;
    Ok(Json(response))
}

/// POST /api/v1/sessions/:id/custom-sections
pub async fn handle_add_custom_section(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<NewCustomSectionRequest>,
) -> Result<(StatusCode, Json<IndexedResponse<()>>), AppError> {
    let response = state
        .sessions
        .update(id, |s| {
            let index = s.document.add_custom_section(req.meta, req.entry)?;
            Ok::<_, AppError>(IndexedResponse {
                index,
                removed: None,
                session: SessionView::of(s),
            })
        })
        .await??;
    Ok((StatusCode::CREATED, Json(response)))
}

/// PATCH /api/v1/sessions/:id/custom-sections/:index
pub async fn handle_update_custom_section(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(meta): Json<CustomSectionMeta>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .update(id, |s| {
            s.document.update_custom_section_meta(index, meta)?;
            Ok::<_, AppError>(SessionView::of(s))
        })
        .await??;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/custom-sections/:index/entries
pub async fn handle_append_custom_entry(
    State(state): State<AppState>,
    Path((id, section)): Path<(Uuid, usize)>,
    Json(entry): Json<CustomEntry>,
) -> Result<(StatusCode, Json<IndexedResponse<()>>), AppError> {
    let response = state
        .sessions
        .update(id, |s| {
            let index = s.document.append_custom_entry(section, entry)?;
            Ok::<_, AppError>(IndexedResponse {
                index,
                removed: None,
                session: SessionView::of(s),
            })
        })
        .await??;
    Ok((StatusCode::CREATED, Json(response)))
}

/// DELETE /api/v1/sessions/:id/custom-sections/:index/entries/:entry
pub async fn handle_remove_custom_entry(
    State(state): State<AppState>,
    Path((id, section, entry)): Path<(Uuid, usize, usize)>,
) -> Result<Json<IndexedResponse<CustomEntry>>, AppError> {
    let response = state
        .sessions
        .update(id, |s| {
            let removed = s.document.remove_custom_entry(section, entry)?;
            s.editors.custom_entry_removed(section, entry);
            Ok::<_, AppError>(IndexedResponse {
                index: entry,
                removed: Some(removed),
                session: SessionView::of(s),
            })
        })
        .await??;
    Ok(Json(response))
}

/// DELETE /api/v1/sessions/:id/custom-sections/:index
pub async fn handle_remove_custom_section(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .update(id, |s| {
            s.document.remove_custom_section(index)?;
            s.editors.custom_section_removed(index);
            Ok::<_, AppError>(SessionView::of(s))
        })
        .await??;
    Ok(Json(view))
}
