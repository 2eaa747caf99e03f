//! Web error types and HTML response mapping.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use stockroom_core::Error as CoreError;
use stockroom_inventory::InventoryError;

use crate::views;

/// Handler result type.
pub type WebResult<T> = Result<T, WebError>;

/// HTTP error rendered as an HTML error page.
#[derive(Debug)]
pub struct WebError {
    status: StatusCode,
    message: String,
}

impl WebError {
    /// Returns an error page for invalid input.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Returns an error page for missing resources.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Returns an error page for conflicts.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Returns an error page for rejected form content.
    pub fn unprocessable_entity(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// Returns an error page with an explicit status.
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, message)
    }

    /// Returns an internal error page.
    ///
    /// The detail is logged; the page shows a generic message.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the user-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (
            self.status,
            Html(views::error_page(self.status, &self.message)),
        )
            .into_response()
    }
}

impl From<InventoryError> for WebError {
    fn from(value: InventoryError) -> Self {
        match value {
            InventoryError::Validation(errors) => Self::unprocessable_entity(errors.to_string()),
            InventoryError::NotFound { entity, .. } => {
                Self::not_found(format!("{} not found", capitalize(entity)))
            }
            err @ InventoryError::DeleteBlocked { .. } => Self::conflict(err.to_string()),
            err @ (InventoryError::Storage { .. } | InventoryError::Serialization { .. }) => {
                Self::internal(err)
            }
        }
    }
}

impl From<CoreError> for WebError {
    fn from(value: CoreError) -> Self {
        match value {
            // Malformed ids in paths never match a record.
            CoreError::InvalidId { .. } | CoreError::NotFound(_) => {
                Self::not_found("Page not found")
            }
            CoreError::InvalidInput(message) => Self::bad_request(message),
            other @ (CoreError::Storage { .. }
            | CoreError::Serialization { .. }
            | CoreError::Internal { .. }) => Self::internal(other),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
