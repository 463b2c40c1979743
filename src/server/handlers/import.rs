//! Multipart bulk-import endpoint.
//!
//! `POST /api/v1/import/:mode` takes a multipart form with a `file` field
//! (the ZIP archive), a required `profile_id`, and the mode's context id
//! (`project_id` for quest imports, `quest_id` for asset imports).
//! Terminal failures come back as 400 with an error code; once row
//! processing starts the response is 200 and partial failures live inside
//! the report.

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::error;

use crate::server::app::AppState;
use crate::services::import_service::{ImportContext, ImportMode, ImportService};

type ApiError = (StatusCode, Json<Value>);

pub async fn import_archive(
    State(state): State<AppState>,
    Path(mode): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mode: ImportMode = mode
        .parse()
        .map_err(|message: String| bad_request("INVALID_MODE", message))?;

    let mut file: Option<Vec<u8>> = None;
    let mut profile_id: Option<i32> = None;
    let mut project_id: Option<i32> = None;
    let mut quest_id: Option<i32> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request("INVALID_MULTIPART", e.to_string()))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request("INVALID_MULTIPART", e.to_string()))?;
                file = Some(bytes.to_vec());
            }
            "profile_id" => profile_id = Some(parse_id_field(field, "profile_id").await?),
            "project_id" => project_id = Some(parse_id_field(field, "project_id").await?),
            "quest_id" => quest_id = Some(parse_id_field(field, "quest_id").await?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| bad_request("MISSING_FILE", "multipart field 'file' is required"))?;
    let profile_id = profile_id
        .ok_or_else(|| bad_request("MISSING_CONTEXT", "multipart field 'profile_id' is required"))?;

    let ctx = ImportContext {
        profile_id,
        project_id,
        quest_id,
    };

    let service = ImportService::new(state.db.clone(), state.store.clone());
    match service.import(mode, file, ctx).await {
        Ok(report) => Ok(Json(json!({
            "success": report.success(),
            "report": report
        }))),
        Err(err) if err.is_client_error() => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "code": err.error_code(),
                "message": err.to_string()
            })),
        )),
        Err(err) => {
            error!("Import failed: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "code": err.error_code(),
                    "message": "internal error"
                })),
            ))
        }
    }
}

async fn parse_id_field(field: Field<'_>, name: &'static str) -> Result<i32, ApiError> {
    let text = field
        .text()
        .await
        .map_err(|e| bad_request("INVALID_MULTIPART", e.to_string()))?;
    text.trim()
        .parse::<i32>()
        .map_err(|_| bad_request("INVALID_ID", format!("field '{}' must be an integer", name)))
}

fn bad_request(code: &'static str, message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "code": code,
            "message": message.into()
        })),
    )
}
