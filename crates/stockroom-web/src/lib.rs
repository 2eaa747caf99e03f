//! # stockroom-web
//!
//! Server-rendered HTML front end for the Stockroom inventory.
//!
//! This crate wires the inventory services into an axum router:
//!
//! - **Pages**: category and item lists, detail pages, create/update forms,
//!   and delete confirmations
//! - **Forms**: multipart or URL-encoded submissions with an optional image
//! - **Errors**: HTML error pages with stable status codes
//! - **Observability**: request tracing, health checks, and Prometheus metrics
//!
//! ## Endpoints
//!
//! ```text
//! GET       /                        - Index with counts
//! GET       /categories              - Category list
//! GET       /categories/:id          - Category detail
//! GET|POST  /categories/create       - Create category
//! GET|POST  /categories/:id/update   - Update category
//! GET|POST  /categories/:id/delete   - Delete category
//! GET       /items                   - Item list
//! GET       /items/:id               - Item detail
//! GET|POST  /items/create            - Create item
//! GET|POST  /items/:id/update        - Update item
//! GET|POST  /items/:id/delete        - Delete item
//! GET       /uploads/*               - Locally stored images
//! GET       /health, /ready, /metrics
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use stockroom_web::server::Server;
//!
//! let server = Server::builder()
//!     .http_port(3000)
//!     .local_uploads("public/uploads")
//!     .build();
//!
//! server.serve().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod forms;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod views;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{Config, UploadMode};
    pub use crate::error::{WebError, WebResult};
    pub use crate::server::Server;
}
