//! # stockroom-inventory
//!
//! Inventory domain for Stockroom: categories, the items that belong to
//! them, and item images.
//!
//! This crate provides:
//!
//! - **Model**: [`Category`] and [`Item`] documents plus the read projections
//!   rendered by the web layer
//! - **Validation**: accumulating per-field form checks
//! - **Store**: JSON documents over a [`stockroom_core::StorageBackend`]
//! - **Services**: [`CategoryService`] (with the delete guard) and
//!   [`ItemService`]
//! - **Uploads**: PNG/JPEG filter and local or bucket image storage
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stockroom_core::MemoryBackend;
//! use stockroom_inventory::{CategoryForm, CategoryService, InventoryStore};
//!
//! let store = InventoryStore::new(Arc::new(MemoryBackend::new()));
//! let categories = CategoryService::new(store);
//! let tools = categories
//!     .create(&CategoryForm { name: "Tools".into(), description: String::new() })
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod categories;
pub mod error;
pub mod items;
pub mod model;
pub mod store;
pub mod uploads;
pub mod validation;

pub use categories::CategoryService;
pub use error::{InventoryError, Result};
pub use items::ItemService;
pub use model::{
    Category, CategoryDetail, CategorySummary, DependentItem, Item, ItemDetail, ItemSummary,
};
pub use store::InventoryStore;
pub use uploads::{
    BucketImageStore, ImageStore, LocalImageStore, StoredImage, UploadedFile, Uploads,
};
pub use validation::{CategoryForm, FieldError, ItemForm, ValidationErrors};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::categories::CategoryService;
    pub use crate::error::{InventoryError, Result};
    pub use crate::items::ItemService;
    pub use crate::model::{Category, Item};
    pub use crate::store::InventoryStore;
    pub use crate::uploads::{UploadedFile, Uploads};
    pub use crate::validation::{CategoryForm, ItemForm};
}
