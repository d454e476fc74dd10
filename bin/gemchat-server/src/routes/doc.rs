use axum::Json;
use utoipa::OpenApi;

use crate::routes::{chat, clear, health, models};

#[derive(OpenApi)]
#[openapi(info(
    title = "gemchat-server",
    description = "Browser chat front-end for the Gemini API",
    version = "0.1.0",
    contact(name = "gemchat")
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(chat::ChatApi::openapi());
    root.merge(clear::ClearApi::openapi());
    root.merge(health::HealthApi::openapi());
    root.merge(models::ModelsApi::openapi());
    root
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(get_docs())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = get_docs();
        for path in ["/chat", "/clear", "/health", "/models"] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing from OpenAPI document");
        }
    }
}
