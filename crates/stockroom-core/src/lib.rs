//! # stockroom-core
//!
//! Core abstractions shared by the Stockroom inventory crates.
//!
//! This crate provides:
//!
//! - **Identifiers**: Strongly-typed ULID identifiers for categories and items
//! - **Storage**: The object storage contract used for documents and uploads
//! - **Error Types**: Shared error definitions and result types
//! - **Observability**: Logging initialisation and span helpers
//!
//! ## Example
//!
//! ```rust
//! use stockroom_core::prelude::*;
//!
//! let category = CategoryId::generate();
//! let parsed: CategoryId = category.to_string().parse().unwrap();
//! assert_eq!(category, parsed);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod error;
pub mod id;
pub mod observability;
pub mod storage;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::id::{CategoryId, ItemId};
    pub use crate::storage::{
        MemoryBackend, ObjectMeta, ObjectStoreBackend, StorageBackend, WritePrecondition,
        WriteResult,
    };
}

pub use error::{Error, Result};
pub use id::{CategoryId, ItemId};
pub use observability::{LogFormat, init_logging};
pub use storage::{
    MemoryBackend, ObjectMeta, ObjectStoreBackend, StorageBackend, WritePrecondition, WriteResult,
};
