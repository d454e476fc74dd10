use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `multipart/form-data` accepted by `POST /chat`.
///
/// Only used for the OpenAPI document; the handler reads fields one by one.
#[derive(Debug, Deserialize, ToSchema)]
#[allow(dead_code)]
pub struct ChatForm {
    /// User text. May be empty when files are attached.
    pub message: Option<String>,
    /// Model name; defaults to the configured default model.
    pub model: Option<String>,
    /// One of `off`, `low`, `medium`, `high`; defaults to `low`.
    pub thinking: Option<String>,
    /// Files to attach to the conversation.
    #[schema(value_type = Vec<String>, format = Binary)]
    pub files: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub reply: String,
    /// Every file attached in this session, in upload order.
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClearResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Live sessions held in memory.
    pub sessions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub thinking_levels: Vec<String>,
    pub default_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
