use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::editor::custom::CustomDraft;
use crate::editor::{EditorError, EditorTarget, Editors};
use crate::errors::AppError;
use crate::session::handlers::SessionView;
use crate::session::EditorSession;
use crate::state::AppState;

/// Body of `open`. For section editors `index` selects "Edit" mode; for the
/// custom editor `section` picks the section to extend and `index` the entry
/// to edit within it.
#[derive(Debug, Default, Deserialize)]
pub struct OpenRequest {
    pub index: Option<usize>,
    pub section: Option<usize>,
}

#[derive(Serialize)]
pub struct EditorResponse {
    pub editor: Value,
    /// What `save` produced: the entry index, or the custom-section placement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<Value>,
    pub session: SessionView,
}

fn parse_target(raw: &str) -> Result<EditorTarget, AppError> {
    EditorTarget::parse(raw).ok_or_else(|| AppError::NotFound(format!("Unknown editor '{raw}'")))
}

fn editor_json(editors: &mut Editors, target: EditorTarget) -> Result<Value, AppError> {
    let value = match target {
        EditorTarget::Section(kind) => serde_json::to_value(&*editors.section(kind)),
        EditorTarget::Custom => serde_json::to_value(&*editors.custom()),
        EditorTarget::Profile => serde_json::to_value(&*editors.profile()),
    };
    value.map_err(|e| AppError::Internal(anyhow::anyhow!("failed to serialize editor: {e}")))
}

fn respond(
    session: &mut EditorSession,
    target: EditorTarget,
    saved: Option<Value>,
) -> Result<EditorResponse, AppError> {
    Ok(EditorResponse {
        editor: editor_json(&mut session.editors, target)?,
        saved,
        session: SessionView::of(session),
    })
}

fn open(session: &mut EditorSession, target: EditorTarget, req: OpenRequest) -> Result<(), EditorError> {
    let doc = &session.document;
    match target {
        EditorTarget::Section(kind) => {
            let editor = session.editors.section(kind);
            match req.index {
                Some(index) => editor.open_edit(index, doc)?,
                None => editor.open_add(),
            }
        }
        EditorTarget::Custom => {
            let editor = session.editors.custom();
            match (req.section, req.index) {
                (None, _) => editor.open_new_section(),
                (Some(section), None) => editor.open_add_entry(section, doc)?,
                (Some(section), Some(entry)) => editor.open_edit_entry(section, entry, doc)?,
            }
        }
        EditorTarget::Profile => session.editors.profile().open(doc),
    }
    Ok(())
}

fn update_draft(session: &mut EditorSession, target: EditorTarget, mut body: Value) -> Result<(), EditorError> {
    match target {
        EditorTarget::Section(kind) => {
            let editor = session.editors.section(kind);
            // Toggle first so a level picked in the same patch respects it.
            if let Some(on) = body
                .as_object_mut()
                .and_then(|fields| fields.remove("customizeLevel"))
            {
                let on = on
                    .as_bool()
                    .ok_or_else(|| EditorError::InvalidDraft("customizeLevel must be a boolean".to_string()))?;
                editor.set_customize_level(on)?;
            }
            editor.patch_draft(&body)
        }
        EditorTarget::Custom => {
            let draft: CustomDraft =
                serde_json::from_value(body).map_err(|e| EditorError::InvalidDraft(e.to_string()))?;
            session.editors.custom().set_draft(draft)
        }
        EditorTarget::Profile => {
            let text = body
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| EditorError::InvalidDraft("profile draft needs a text field".to_string()))?;
            session.editors.profile().set_draft(text.to_string())
        }
    }
}

fn save(session: &mut EditorSession, target: EditorTarget) -> Result<Value, EditorError> {
    let doc = &mut session.document;
    let saved = match target {
        EditorTarget::Section(kind) => Value::from(session.editors.section(kind).save(doc)?),
        EditorTarget::Custom => {
            let result = session.editors.custom().save(doc)?;
            serde_json::to_value(result).map_err(|e| EditorError::InvalidDraft(e.to_string()))?
        }
        EditorTarget::Profile => {
            session.editors.profile().save(doc)?;
            Value::Null
        }
    };
    Ok(saved)
}

/// POST /api/v1/sessions/:id/editors/:kind/open
pub async fn handle_open_editor(
    State(state): State<AppState>,
    Path((id, target)): Path<(Uuid, String)>,
    body: Option<Json<OpenRequest>>,
) -> Result<Json<EditorResponse>, AppError> {
    let target = parse_target(&target)?;
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let response = state
        .sessions
        .update(id, |s| {
            open(s, target, req)?;
            respond(s, target, None)
        })
        .await??;
    Ok(Json(response))
}

/// PATCH /api/v1/sessions/:id/editors/:kind/draft
pub async fn handle_update_draft(
    State(state): State<AppState>,
    Path((id, target)): Path<(Uuid, String)>,
    Json(body): Json<Value>,
) -> Result<Json<EditorResponse>, AppError> {
    let target = parse_target(&target)?;
    let response = state
        .sessions
        .update(id, |s| {
            update_draft(s, target, body)?;
            respond(s, target, None)
        })
        .await??;
    Ok(Json(response))
}

/// POST /api/v1/sessions/:id/editors/:kind/save
///
/// A rejected save keeps the editor open with its draft intact.
pub async fn handle_save_editor(
    State(state): State<AppState>,
    Path((id, target)): Path<(Uuid, String)>,
) -> Result<Json<EditorResponse>, AppError> {
    let target = parse_target(&target)?;
    let response = state
        .sessions
        .update(id, |s| {
            let saved = save(s, target)?;
            respond(s, target, Some(saved))
        })
        .await??;
    Ok(Json(response))
}

/// POST /api/v1/sessions/:id/editors/:kind/cancel
pub async fn handle_cancel_editor(
    State(state): State<AppState>,
    Path((id, target)): Path<(Uuid, String)>,
) -> Result<Json<EditorResponse>, AppError> {
    let target = parse_target(&target)?;
    let response = state
        .sessions
        .update(id, |s| {
            match target {
                EditorTarget::Section(kind) => s.editors.section(kind).cancel(),
                EditorTarget::Custom => s.editors.custom().cancel(),
                EditorTarget::Profile => s.editors.profile().cancel(),
            }
            respond(s, target, None)
        })
        .await??;
    Ok(Json(response))
}
