pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};

use crate::document::handlers as document;
use crate::editor::handlers as editor;
use crate::export::handlers as export;
use crate::preview::handlers as preview;
use crate::session::handlers as session;
use crate::state::AppState;

/// Request body cap. Photos may arrive base64-encoded inside JSON, which
/// grows them by a third.
fn body_limit(max_photo_bytes: usize) -> usize {
    max_photo_bytes / 3 * 4 + 64 * 1024
}

pub fn build_router(state: AppState) -> Router {
    let limit = body_limit(state.config.max_photo_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/v1/sessions", post(session::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(session::handle_get_session).delete(session::handle_delete_session),
        )
        // Document
        .route(
            "/api/v1/sessions/:id/personal",
            patch(document::handle_patch_personal),
        )
        .route(
            "/api/v1/sessions/:id/photo",
            put(document::handle_put_photo).delete(document::handle_delete_photo),
        )
        .route(
            "/api/v1/sessions/:id/profile",
            put(document::handle_put_profile),
        )
        .route(
            "/api/v1/sessions/:id/sections/:kind",
            post(document::handle_append_entry),
        )
        .route(
            "/api/v1/sessions/:id/sections/:kind/:index",
            put(document::handle_replace_entry).delete(document::handle_remove_entry),
        )
        .route(
            "/api/v1/sessions/:id/custom-sections",
            post(document::handle_add_custom_section),
        )
        .route(
            "/api/v1/sessions/:id/custom-sections/:index",
            patch(document::handle_update_custom_section)
                .delete(document::handle_remove_custom_section),
        )
        .route(
            "/api/v1/sessions/:id/custom-sections/:index/entries",
            post(document::handle_append_custom_entry),
        )
        .route(
            "/api/v1/sessions/:id/custom-sections/:index/entries/:entry",
            axum::routing::delete(document::handle_remove_custom_entry),
        )
        // Editors
        .route(
            "/api/v1/sessions/:id/editors/:kind/open",
            post(editor::handle_open_editor),
        )
        .route(
            "/api/v1/sessions/:id/editors/:kind/draft",
            patch(editor::handle_update_draft),
        )
        .route(
            "/api/v1/sessions/:id/editors/:kind/save",
            post(editor::handle_save_editor),
        )
        .route(
            "/api/v1/sessions/:id/editors/:kind/cancel",
            post(editor::handle_cancel_editor),
        )
        // Preview & export
        .route(
            "/api/v1/sessions/:id/preview",
            get(preview::handle_get_preview),
        )
        .route("/api/v1/sessions/:id/export", post(export::handle_export))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::document::photo::{encode_data_url, tests::tiny_png};
    use crate::export::assets::{Asset, AssetError};
    use crate::export::{AssetLoader, HttpFetcher, RemoteFetcher};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::layout::default_page_config;
    use crate::session::SessionStore;

    /// Serves the same PNG for every URL and counts requests.
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteFetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> Result<Asset, AssetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.ends_with("missing.png") {
                return Err(AssetError::Status(404));
            }
            Ok(Asset {
                mime: "image/png".to_string(),
                bytes: tiny_png(6, 4).into(),
            })
        }
    }

    fn make_state() -> AppState {
        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        make_state_with(Arc::new(fetcher))
    }

    fn make_state_with(fetcher: Arc<dyn RemoteFetcher>) -> AppState {
        let config = Config {
            port: 0,
            rust_log: "debug".to_string(),
            asset_timeout_secs: 1,
            max_photo_bytes: 1 << 20,
            max_sessions: 8,
            session_idle_secs: 3600,
            export_scale: 2.0,
        };
        AppState {
            sessions: SessionStore::new(config.max_sessions, Duration::from_secs(config.session_idle_secs)),
            page_config: default_page_config().with_scale(config.export_scale),
            assets: Arc::new(AssetLoader::new(fetcher, Duration::from_secs(1))),
            config,
        }
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn make_session(app: &Router) -> String {
        let (status, body) = send(app, "POST", "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(make_state());
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "cvkit");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = build_router(make_state());
        let uri = format!("/api/v1/sessions/{}", uuid::Uuid::new_v4());
        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_personal_and_education_reach_preview() {
        let app = build_router(make_state());
        let id = make_session(&app).await;

        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/api/v1/sessions/{id}/personal"),
            Some(json!({ "name": "Asha Rao", "email": "asha@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/sections/education"),
            Some(json!({
                "degree": "B.Tech",
                "school": "XYZ University",
                "startDate": "2018",
                "endDate": "2022"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["index"], 0);

        let (status, preview) = send(&app, "GET", &format!("/api/v1/sessions/{id}/preview"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(preview["header"]["name"], "Asha Rao");
        let blocks = preview["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["key"], "education");
        assert_eq!(blocks[0]["content"]["value"][0]["dateRange"], "2018 – 2022");
    }

    #[tokio::test]
    async fn test_blank_award_title_rejected_with_message() {
        let app = build_router(make_state());
        let id = make_session(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/sections/awards"),
            Some(json!({ "title": "   ", "issuer": "IEEE" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Award title is required.");

        let (_, session) = send(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(session["document"]["awards"], json!([]));
    }

    #[tokio::test]
    async fn test_skill_editor_flow() {
        let app = build_router(make_state());
        let id = make_session(&app).await;
        let base = format!("/api/v1/sessions/{id}/editors/skills");

        let (status, body) = send(&app, "POST", &format!("{base}/open"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["editor"]["state"]["state"], "open");

        let (status, _) = send(
            &app,
            "PATCH",
            &format!("{base}/draft"),
            Some(json!({ "skill": "Rust", "level": "Expert" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "POST", &format!("{base}/save"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["saved"], 0);
        assert_eq!(body["session"]["document"]["skills"][0]["customLevelText"], "Expert");

        let (_, preview) = send(&app, "GET", &format!("/api/v1/sessions/{id}/preview"), None).await;
        let bar = &preview["blocks"][0]["content"]["value"][0]["bar"];
        assert_eq!(bar["fillPercent"], 100);
        assert_eq!(bar["label"], "Expert");
    }

    #[tokio::test]
    async fn test_draft_without_open_editor_conflicts() {
        let app = build_router(make_state());
        let id = make_session(&app).await;
        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/api/v1/sessions/{id}/editors/profile/draft"),
            Some(json!({ "text": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_custom_section_routes() {
        let app = build_router(make_state());
        let id = make_session(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/custom-sections"),
            Some(json!({ "heading": "", "entry": { "title": "x" } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Section heading is required.");

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/custom-sections"),
            Some(json!({ "heading": "Volunteering", "icon": "heart", "showIcon": true, "entry": { "title": "Food bank" } })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["index"], 0);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/custom-sections/0/entries"),
            Some(json!({ "title": "Shelter" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["index"], 1);

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/custom-sections/5/entries"),
            Some(json!({ "title": "Nowhere" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, preview) = send(&app, "GET", &format!("/api/v1/sessions/{id}/preview"), None).await;
        assert_eq!(preview["blocks"][0]["heading"], "Volunteering");
        assert_eq!(preview["blocks"][0]["icon"], "heart");
    }

    #[tokio::test]
    async fn test_delete_closes_editor_on_removed_entry() {
        let app = build_router(make_state());
        let id = make_session(&app).await;
        let sections = format!("/api/v1/sessions/{id}/sections/certificates");
        for name in ["A", "B"] {
            let (status, _) = send(&app, "POST", &sections, Some(json!({ "certificate": name }))).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let editor = format!("/api/v1/sessions/{id}/editors/certificates");
        let (status, _) = send(&app, "POST", &format!("{editor}/open"), Some(json!({ "index": 0 }))).await;
        assert_eq!(status, StatusCode::OK);
        send(&app, "PATCH", &format!("{editor}/draft"), Some(json!({ "info": "edited A" }))).await;

        let (status, _) = send(&app, "DELETE", &format!("{sections}/0"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "POST", &format!("{editor}/save"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (_, session) = send(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(
            session["document"]["certificates"],
            json!([{ "certificate": "B", "info": "" }])
        );
    }

    #[tokio::test]
    async fn test_photo_via_data_url_and_clear() {
        let app = build_router(make_state());
        let id = make_session(&app).await;
        let uri = format!("/api/v1/sessions/{id}/photo");

        let data_url = encode_data_url("image/png", &tiny_png(4, 4));
        let (status, body) = send(&app, "PUT", &uri, Some(json!({ "dataUrl": data_url }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hasPhoto"], true);

        let (status, body) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hasPhoto"], false);
    }

    #[tokio::test]
    async fn test_photo_via_url_is_fetched_once() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let app = build_router(make_state_with(fetcher.clone()));
        let id = make_session(&app).await;
        let uri = format!("/api/v1/sessions/{id}/photo");

        let url = "https://cdn.example.com/me.png";
        let (status, body) = send(&app, "PUT", &uri, Some(json!({ "photoUrl": url }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hasPhoto"], true);
        assert_eq!(body["document"]["personal"]["photo"]["src"], url);
        assert_eq!(body["document"]["personal"]["photo"]["width"], 6);

        let (status, _) = send(&app, "POST", &format!("/api/v1/sessions/{id}/export"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_photo_url_must_be_http() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let app = build_router(make_state_with(fetcher.clone()));
        let id = make_session(&app).await;
        let uri = format!("/api/v1/sessions/{id}/photo");

        for bad in ["file:///etc/passwd", "/etc/passwd", "data:image/png;base64,AA=="] {
            let (status, body) = send(&app, "PUT", &uri, Some(json!({ "photoUrl": bad }))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["message"], "photoUrl must be an http or https URL");
        }

        let (status, body) = send(
            &app,
            "PUT",
            &uri,
            Some(json!({ "photoUrl": "https://cdn.example.com/missing.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].as_str().unwrap().contains("404"));

        let (status, _) = send(&app, "PUT", &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, session) = send(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(session["hasPhoto"], false);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_photo_via_multipart() {
        let app = build_router(make_state());
        let id = make_session(&app).await;

        let boundary = "cvkit-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&tiny_png(6, 3));
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/v1/sessions/{id}/photo"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["document"]["personal"]["photo"]["width"], 6);
    }

    #[tokio::test]
    async fn test_non_image_photo_rejected() {
        let app = build_router(make_state());
        let id = make_session(&app).await;
        let data_url = encode_data_url("image/png", b"definitely not a png");
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/v1/sessions/{id}/photo"),
            Some(json!({ "dataUrl": data_url })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_returns_pdf_attachment() {
        let app = build_router(make_state());
        let id = make_session(&app).await;

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/sessions/{id}/export"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"Resume_CV.pdf\""));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        // The flag is cleared once the response is built.
        let (_, session) = send(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(session["downloading"], false);
    }

    #[tokio::test]
    async fn test_export_while_exporting_conflicts() {
        let state = make_state();
        let app = build_router(state.clone());
        let id = make_session(&app).await;

        let uuid = id.parse().unwrap();
        let (_snapshot, _guard) = state.sessions.begin_export(uuid).await.unwrap();
        let (status, _) = send(&app, "POST", &format!("/api/v1/sessions/{id}/export"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_preview_html_format() {
        let app = build_router(make_state());
        let id = make_session(&app).await;
        let request = Request::builder()
            .uri(format!("/api/v1/sessions/{id}/preview?format=html"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }

    #[test]
    fn test_body_limit_covers_base64_photo() {
        assert!(body_limit(3_000_000) > 4_000_000);
    }
}
