use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, Method, Uri},
};

/// Request context handed to form handlers.
///
/// Carries the request line and headers; the body has already been consumed
/// and validated by the time a handler sees it.
#[derive(Debug, Clone)]
pub struct FormRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl FormRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for FormRequest {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
        })
    }
}
