//! Cookie-based session identification.
//!
//! The browser carries an opaque `gemchat_sid` cookie. Requests without a
//! valid one get a freshly generated id, and the handler attaches the
//! matching `Set-Cookie` header to its response through [`Session::attach`].

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use gemchat_core::SessionId;
use tracing::debug;

pub const SESSION_COOKIE: &str = "gemchat_sid";

/// The caller's session, resolved from the request cookies.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    /// `true` when no usable cookie came with the request.
    pub is_new: bool,
}

impl Session {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let existing = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|raw| extract_cookie(raw, SESSION_COOKIE))
            .and_then(SessionId::parse);

        match existing {
            Some(id) => Self { id, is_new: false },
            None => {
                let id = SessionId::generate();
                debug!(session = %id, "issuing new session");
                Self { id, is_new: true }
            }
        }
    }

    /// `Set-Cookie` value for this session.
    pub fn cookie(&self) -> HeaderValue {
        let value = format!("{SESSION_COOKIE}={}; HttpOnly; SameSite=Lax; Path=/", self.id);
        // Session ids are hex only, so the value is always a valid header.
        HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static(""))
    }

    /// Add the `Set-Cookie` header to `response` if the session is new.
    pub fn attach(&self, mut response: Response) -> Response {
        if self.is_new {
            response.headers_mut().append(SET_COOKIE, self.cookie());
        }
        response
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Extract a cookie value by name from a `Cookie` header value.
fn extract_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|cookie| {
        cookie
            .trim()
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('='))
            .map(str::trim)
    })
}
