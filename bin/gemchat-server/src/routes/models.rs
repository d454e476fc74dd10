//! Model catalogue offered to the chat page.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use gemchat_core::{ThinkingLevel, MODELS};
use strum::IntoEnumIterator;
use utoipa::OpenApi;

use crate::schemas::ModelsResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(list_models), components(schemas(ModelsResponse)))]
pub struct ModelsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/models", get(list_models))
}

#[utoipa::path(
    get,
    path = "/models",
    tag = "chat",
    responses(
        (status = 200, description = "Selectable models and thinking levels", body = ModelsResponse)
    )
)]
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    let mut models: Vec<String> = MODELS.iter().map(|m| (*m).to_owned()).collect();
    // A custom default model is still selectable.
    if !models.contains(&state.config.default_model) {
        models.insert(0, state.config.default_model.clone());
    }
    Json(ModelsResponse {
        models,
        thinking_levels: ThinkingLevel::iter().map(|l| l.to_string()).collect(),
        default_model: state.config.default_model.clone(),
    })
}
