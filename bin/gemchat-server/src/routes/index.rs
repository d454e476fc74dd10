//! The chat page.

use std::sync::Arc;

use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::session::Session;
use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(index))
}

/// Serve the embedded page, issuing a session cookie on first visit.
pub async fn index(session: Session) -> Response {
    session.attach(Html(INDEX_HTML).into_response())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::routes::testing::{harness, session_cookie};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn first_visit_sets_cookie() {
        let h = harness();
        let res = h.app.oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert!(session_cookie(&res).unwrap().starts_with("gemchat_sid="));
    }

    #[tokio::test]
    async fn returning_visit_keeps_cookie() {
        let h = harness();
        let first = h.app.clone().oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
        let cookie = session_cookie(&first).unwrap();

        let again = Request::get("/").header(header::COOKIE, &cookie).body(Body::empty()).unwrap();
        let res = h.app.oneshot(again).await.unwrap();
        assert!(session_cookie(&res).is_none());
    }
}
