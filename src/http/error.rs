//! Handler errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::tenancy::ResolveError;

/// Errors returned by handlers and extractors.
#[derive(Debug, Error)]
pub enum AppError {
    /// The host named a slug no tenant owns.
    #[error("tenant '{0}' not found")]
    TenantNotFound(String),

    /// A tenant route was requested on a host without a tenant.
    #[error("no tenant for this host")]
    NoTenant,

    /// Strict mode rejected a host outside the root domain.
    #[error("host '{0}' is not served here")]
    MisdirectedHost(String),

    /// The tenant store could not answer.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The edge router did not run for this request.
    #[error("request context missing")]
    MissingContext,

    #[error("{0} not found")]
    NotFound(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::TenantNotFound(_) | AppError::NoTenant | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::MisdirectedHost(_) => StatusCode::MISDIRECTED_REQUEST,
            AppError::Resolve(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::MissingContext => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Store details stay in the logs.
            AppError::Resolve(e) => {
                tracing::error!(error = %e, "Tenant resolution failed");
                "tenant directory unavailable".to_string()
            }
            AppError::MissingContext => {
                tracing::error!("Tenant router did not run before handler");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
