//! Ledger error types with HTTP status code mapping.
//!
//! [`LedgerError`] is the central error type of the crate. Store, service
//! and handler layers all return it, and each variant maps to a specific
//! HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "status": "error",
///   "code": 2101,
///   "message": "insufficient balance: 300 available, 400 required"
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `"error"`.
    pub status: String,
    /// Numeric error code (see [`LedgerError::error_code`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Message returned to clients for server-side failures. The real cause
/// only goes to the log.
const GENERIC_INTERNAL_MESSAGE: &str = "internal server error";

/// Ledger error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category              | HTTP Status                  |
/// |-----------|-----------------------|------------------------------|
/// | 1000–1999 | Validation            | 400 Bad Request              |
/// | 2000–2099 | Not Found             | 404 Not Found                |
/// | 2100–2199 | Business rule / State | 409 Conflict / 403 Forbidden |
/// | 3000–3999 | Server                | 500 Internal Server Error    |
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Malformed or missing request data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Customer with the given ID does not exist in the tenant.
    #[error("customer not found: {0}")]
    CustomerNotFound(i64),

    /// Reward item with the given ID does not exist in the tenant.
    #[error("reward item not found: {0}")]
    RewardItemNotFound(i64),

    /// No redemption code matched the lookup.
    #[error("redemption code not found")]
    CodeNotFound,

    /// Redemption row with the given ID does not exist.
    #[error("redemption not found: {0}")]
    RedemptionNotFound(i64),

    /// Tenant schema has not been provisioned.
    #[error("tenant not provisioned: {0}")]
    TenantNotProvisioned(String),

    /// Customer balance does not cover the requested debit.
    #[error("insufficient balance: {balance} available, {required} required")]
    InsufficientBalance {
        /// Balance at the time of the check.
        balance: i64,
        /// Points the operation needed.
        required: i64,
    },

    /// Redemption code was already consumed.
    #[error("redemption code {0} was already used")]
    AlreadyUsed(String),

    /// Redemption code belongs to a different customer.
    #[error("redemption code {0} does not belong to this customer")]
    Forbidden(String),

    /// No unique redemption code was found within the attempt budget.
    #[error("no unique redemption code found after {attempts} attempts")]
    CodeSpaceExhausted {
        /// Number of candidates tried.
        attempts: u32,
    },

    /// Database failure. The transaction was rolled back.
    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidInput(_) => 1001,
            Self::CustomerNotFound(_) => 2001,
            Self::RewardItemNotFound(_) => 2002,
            Self::CodeNotFound => 2003,
            Self::RedemptionNotFound(_) => 2004,
            Self::TenantNotProvisioned(_) => 2005,
            Self::InsufficientBalance { .. } => 2101,
            Self::AlreadyUsed(_) => 2102,
            Self::Forbidden(_) => 2103,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::CodeSpaceExhausted { .. } => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::CustomerNotFound(_)
            | Self::RewardItemNotFound(_)
            | Self::CodeNotFound
            | Self::RedemptionNotFound(_)
            | Self::TenantNotProvisioned(_) => StatusCode::NOT_FOUND,
            Self::InsufficientBalance { .. } | Self::AlreadyUsed(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::CodeSpaceExhausted { .. } | Self::Persistence(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns `true` for failures caused by the server rather than the
    /// request. Their details are logged, never sent to the client.
    #[must_use]
    pub const fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::CodeSpaceExhausted { .. } | Self::Persistence(_) | Self::Internal(_)
        )
    }

    /// Message safe to expose to API clients.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_server_fault() {
            GENERIC_INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_server_fault() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            status: "error".to_string(),
            code: self.error_code(),
            message: self.public_message(),
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn business_rules_map_to_client_errors() {
        let insufficient = LedgerError::InsufficientBalance {
            balance: 300,
            required: 400,
        };
        assert_eq!(insufficient.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            LedgerError::AlreadyUsed("AB12C".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            LedgerError::Forbidden("AB12C".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(LedgerError::CodeNotFound.status_code(), StatusCode::NOT_FOUND);
        assert!(!insufficient.is_server_fault());
    }

    #[test]
    fn server_faults_hide_details() {
        let err = LedgerError::Internal("connection reset by peer".to_string());
        assert!(err.is_server_fault());
        assert_eq!(err.public_message(), GENERIC_INTERNAL_MESSAGE);

        let exhausted = LedgerError::CodeSpaceExhausted { attempts: 100 };
        assert_eq!(exhausted.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(exhausted.public_message(), GENERIC_INTERNAL_MESSAGE);
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = LedgerError::InvalidInput("origem is required".to_string());
        assert_eq!(err.public_message(), "invalid input: origem is required");
        assert_eq!(err.error_code(), 1001);
    }

    #[tokio::test]
    async fn into_response_sets_status_and_body() {
        let response = LedgerError::CustomerNotFound(7).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await;
        let Ok(bytes) = bytes else {
            panic!("body is in memory");
        };
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or_default();
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], 2001);
        assert_eq!(body["message"], "customer not found: 7");
    }
}
