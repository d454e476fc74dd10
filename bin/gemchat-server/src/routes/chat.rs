use std::sync::Arc;

use anyhow::Context;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use gemchat_core::{file_to_part, ConversationStore, Exchange};
use tracing::{debug, info, instrument, warn};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::{ChatForm, ChatResponse, ErrorResponse};
use crate::session::Session;
use crate::state::AppState;
use crate::upload::sanitize_filename;

const DEFAULT_THINKING: &str = "low";

#[derive(OpenApi)]
#[openapi(
    paths(chat),
    components(schemas(ChatForm, ChatResponse, ErrorResponse))
)]
pub struct ChatApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat))
}

/// Send one message, optionally attaching files to the session.
///
/// Every uploaded file is added to the session before the model is called,
/// so files survive a failed exchange and are sent with the next one.
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body(content = ChatForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Model reply", body = ChatResponse),
        (status = 400, description = "Empty message or malformed form", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 502, description = "Upstream rejected the request", body = ErrorResponse),
        (status = 503, description = "Upstream temporarily unavailable", body = ErrorResponse),
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    session: Session,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let result = match multipart {
        Ok(multipart) => run_exchange(&state, &session, multipart).await,
        Err(rejection) => Err(ServerError::BadRequest(rejection.body_text())),
    };
    // The cookie goes out even on failure so uploads stay with this session.
    session.attach(result.into_response())
}

#[instrument(skip_all, fields(session = %session.id))]
async fn run_exchange(
    state: &AppState,
    session: &Session,
    mut multipart: Multipart,
) -> Result<Json<ChatResponse>, ServerError> {
    let acquired = state.store.get_or_create(&session.id).await;
    for evicted in &acquired.evicted {
        match state.uploads.purge_session(evicted).await {
            Ok(purged) => debug!(evicted = %evicted, purged, "purged uploads of dropped session"),
            Err(e) => warn!(evicted = %evicted, error = %e, "failed to purge uploads"),
        }
    }
    // Held until the reply is committed; concurrent requests of one session queue here.
    let mut conversation = acquired.conversation.lock().await;

    let mut message = String::new();
    let mut model: Option<String> = None;
    let mut thinking: Option<String> = None;
    let mut uploaded = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(|e| form_error(state, e))? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "message" => message = field.text().await.map_err(|e| form_error(state, e))?,
            "model" => model = Some(field.text().await.map_err(|e| form_error(state, e))?),
            "thinking" => thinking = Some(field.text().await.map_err(|e| form_error(state, e))?),
            "files" | "files[]" => {
                let Some(original) = field.file_name().filter(|n| !n.is_empty()).map(str::to_owned) else {
                    continue;
                };
                let data = field.bytes().await.map_err(|e| form_error(state, e))?;
                let file_name = sanitize_filename(&original);
                let path = state
                    .uploads
                    .save(&session.id, &file_name, &data)
                    .await
                    .with_context(|| format!("failed to save upload {file_name}"))?;
                let part = file_to_part(&path).await?;
                info!(file = %file_name, mime = %part.mime_type(), bytes = part.len(), "file attached");
                conversation.add_attachment(file_name, part);
                uploaded += 1;
            }
            _ => {}
        }
    }

    let model = model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.config.default_model.clone());
    let thinking = thinking
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_THINKING.to_owned());
    info!(%model, %thinking, uploaded, "chat request");

    let outcome = state
        .chat
        .exchange(&mut conversation, Exchange { message: &message, model: &model, thinking: &thinking })
        .await?;

    Ok(Json(ChatResponse { reply: outcome.reply, files: outcome.files }))
}

fn form_error(state: &AppState, err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(format!(
            "Upload exceeds the {} MiB limit.",
            state.config.max_upload_mb
        ))
    } else {
        ServerError::BadRequest(err.body_text())
    }
}
