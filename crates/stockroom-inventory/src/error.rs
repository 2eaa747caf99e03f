//! Error types for inventory operations.

use thiserror::Error;

use crate::model::{Category, DependentItem};
use crate::validation::ValidationErrors;

/// Result type alias for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;

/// Errors that can occur during inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The submitted form failed one or more rules. Nothing was persisted.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Entity not found by id.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind (`category` or `item`).
        entity: &'static str,
        /// The id that was looked up.
        id: String,
    },

    /// Category deletion refused because items still reference it.
    #[error(
        "category '{}' cannot be deleted while {} item(s) reference it",
        .category.name,
        .dependents.len()
    )]
    DeleteBlocked {
        /// The category that was kept.
        category: Category,
        /// Items that reference the category.
        dependents: Vec<DependentItem>,
    },

    /// Storage operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },
}

impl InventoryError {
    /// Not-found error for a category id.
    #[must_use]
    pub fn category_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "category",
            id: id.to_string(),
        }
    }

    /// Not-found error for an item id.
    #[must_use]
    pub fn item_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "item",
            id: id.to_string(),
        }
    }
}

impl From<stockroom_core::Error> for InventoryError {
    fn from(err: stockroom_core::Error) -> Self {
        match err {
            stockroom_core::Error::Serialization { message } => Self::Serialization { message },
            other => Self::Storage {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<ValidationErrors> for InventoryError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}
