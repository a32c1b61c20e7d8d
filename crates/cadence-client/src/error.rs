//! Collaborator error types.

/// Errors from collaborator calls.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The collaborator returned a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The response parsed but did not carry what was asked for.
    #[error("unusable reply from {endpoint}: {reason}")]
    MalformedReply { endpoint: String, reason: String },
    /// The collaborator has no credentials or endpoint configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl CollaboratorError {
    /// Adapter for `map_err` on transport failures.
    pub(crate) fn transport(endpoint: &str) -> impl FnOnce(reqwest::Error) -> Self + '_ {
        move |source| Self::Http {
            endpoint: endpoint.to_string(),
            source,
        }
    }

    /// Pass a 2xx response through; anything else becomes
    /// [`CollaboratorError::ApiError`] carrying the reply body.
    pub(crate) async fn require_success(
        endpoint: &str,
        resp: reqwest::Response,
    ) -> Result<reqwest::Response, Self> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(Self::ApiError {
            endpoint: endpoint.to_string(),
            status,
            body,
        })
    }

    pub(crate) fn malformed(endpoint: &str, reason: impl Into<String>) -> Self {
        Self::MalformedReply {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}
