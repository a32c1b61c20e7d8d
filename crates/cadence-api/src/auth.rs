//! # Bearer Authentication
//!
//! One static token guards every `/v1` route. With no token configured the
//! middleware is a pass-through.

use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Token holder placed in request extensions. `Debug` hides the value.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = if self.token.is_some() { "[REDACTED]" } else { "<disabled>" };
        f.debug_struct("AuthConfig").field("token", &shown).finish()
    }
}

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Denial {
    NoHeader,
    NotBearer,
    WrongToken,
}

impl Denial {
    fn message(self) -> &'static str {
        match self {
            Self::NoHeader => "missing authorization header",
            Self::NotBearer => "authorization header must use Bearer scheme",
            Self::WrongToken => "invalid bearer token",
        }
    }
}

/// Compare in constant time. Unequal lengths still run a comparison so the
/// expected length does not leak through timing.
fn tokens_match(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

fn check(header_value: Option<&str>, expected: &str) -> Result<(), Denial> {
    let value = header_value.ok_or(Denial::NoHeader)?;
    let provided = value.strip_prefix("Bearer ").ok_or(Denial::NotBearer)?;
    if tokens_match(provided.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(Denial::WrongToken)
    }
}

/// Reject `/v1` requests that do not carry the configured token.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let Some(expected) = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.token.clone())
    else {
        return next.run(request).await;
    };

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match check(header_value, &expected) {
        Ok(()) => next.run(request).await,
        Err(denial) => {
            tracing::warn!(
                path = %request.uri().path(),
                reason = denial.message(),
                "request rejected"
            );
            AppError::Unauthorized(denial.message().to_string()).into_response()
        }
    }
}
