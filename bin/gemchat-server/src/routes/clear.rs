use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use gemchat_core::ConversationStore;
use tracing::{info, warn};
use utoipa::OpenApi;

use crate::schemas::ClearResponse;
use crate::session::Session;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(clear), components(schemas(ClearResponse)))]
pub struct ClearApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/clear", post(clear))
}

/// Forget the session's conversation and delete its uploaded files.
///
/// Always succeeds; clearing an unknown session is a no-op.
#[utoipa::path(
    post,
    path = "/clear",
    tag = "chat",
    responses(
        (status = 200, description = "Conversation cleared", body = ClearResponse)
    )
)]
pub async fn clear(State(state): State<Arc<AppState>>, session: Session) -> Json<ClearResponse> {
    if !session.is_new {
        let existed = state.store.remove(&session.id).await;
        let purged = match state.uploads.purge_session(&session.id).await {
            Ok(n) => n,
            Err(e) => {
                warn!(session = %session.id, error = %e, "failed to purge uploads");
                0
            }
        };
        info!(session = %session.id, existed, purged, "conversation cleared");
    }
    Json(ClearResponse { ok: true })
}
