//! Category pages.
//!
//! ## Routes
//!
//! - `GET  /categories` - List categories with item counts
//! - `GET  /categories/create` - Empty category form
//! - `POST /categories/create` - Create a category
//! - `GET  /categories/:id` - Category detail with its items
//! - `GET  /categories/:id/update` - Prefilled category form
//! - `POST /categories/:id/update` - Update a category
//! - `GET  /categories/:id/delete` - Delete confirmation or blocking items
//! - `POST /categories/:id/delete` - Delete a category without items

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;

use stockroom_core::CategoryId;
use stockroom_inventory::{CategoryForm, InventoryError};

use super::{redirect, rejected};
use crate::error::WebResult;
use crate::forms::SubmittedForm;
use crate::metrics::{record_delete_blocked, record_mutation, record_validation_rejected};
use crate::server::AppState;
use crate::views::{self, CATEGORIES_URL};

const CREATE_TITLE: &str = "Create category";
const UPDATE_TITLE: &str = "Update category";

/// Creates category routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(CATEGORIES_URL, get(list_categories))
        .route(
            "/categories/create",
            get(create_category_form).post(create_category),
        )
        .route("/categories/:id", get(category_detail))
        .route(
            "/categories/:id/update",
            get(update_category_form).post(update_category),
        )
        .route(
            "/categories/:id/delete",
            get(delete_category_form).post(delete_category),
        )
}

/// GET /categories
pub(crate) async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> WebResult<Html<String>> {
    let categories = state.categories.list().await?;
    Ok(Html(views::category_list(&categories)))
}

/// GET /categories/:id
pub(crate) async fn category_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> WebResult<Html<String>> {
    let id: CategoryId = id.parse()?;
    let detail = state.categories.get(id).await?;
    Ok(Html(views::category_detail(&detail)))
}

/// GET /categories/create
pub(crate) async fn create_category_form() -> Html<String> {
    Html(views::category_form(
        CREATE_TITLE,
        &CategoryForm::default(),
        None,
    ))
}

/// POST /categories/create
pub(crate) async fn create_category(
    State(state): State<Arc<AppState>>,
    submitted: SubmittedForm,
) -> WebResult<Response> {
    let form = submitted.category_form();
    match state.categories.create(&form).await {
        Ok(category) => {
            record_mutation("category", "create");
            Ok(redirect(&category.url()))
        }
        Err(InventoryError::Validation(errors)) => {
            record_validation_rejected("category");
            Ok(rejected(views::category_form(
                CREATE_TITLE,
                &form,
                Some(&errors),
            )))
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /categories/:id/update
pub(crate) async fn update_category_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> WebResult<Html<String>> {
    let id: CategoryId = id.parse()?;
    let category = state.categories.find(id).await?;
    let form = CategoryForm {
        name: category.name,
        description: category.description,
    };
    Ok(Html(views::category_form(UPDATE_TITLE, &form, None)))
}

/// POST /categories/:id/update
pub(crate) async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    submitted: SubmittedForm,
) -> WebResult<Response> {
    let id: CategoryId = id.parse()?;
    let form = submitted.category_form();
    match state.categories.update(id, &form).await {
        Ok(category) => {
            record_mutation("category", "update");
            Ok(redirect(&category.url()))
        }
        Err(InventoryError::Validation(errors)) => {
            record_validation_rejected("category");
            Ok(rejected(views::category_form(
                UPDATE_TITLE,
                &form,
                Some(&errors),
            )))
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /categories/:id/delete
///
/// Missing categories redirect to the list.
pub(crate) async fn delete_category_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> WebResult<Response> {
    let Ok(id) = id.parse::<CategoryId>() else {
        return Ok(redirect(CATEGORIES_URL));
    };
    match state.categories.get(id).await {
        Ok(detail) => {
            Ok(Html(views::category_delete(&detail.category, &detail.items)).into_response())
        }
        Err(InventoryError::NotFound { .. }) => Ok(redirect(CATEGORIES_URL)),
        Err(err) => Err(err.into()),
    }
}

/// POST /categories/:id/delete
///
/// Refused with 409 while any item still references the category.
pub(crate) async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> WebResult<Response> {
    let Ok(id) = id.parse::<CategoryId>() else {
        return Ok(redirect(CATEGORIES_URL));
    };
    match state.categories.delete(id).await {
        Ok(()) => {
            record_mutation("category", "delete");
            Ok(redirect(CATEGORIES_URL))
        }
        Err(InventoryError::NotFound { .. }) => Ok(redirect(CATEGORIES_URL)),
        Err(InventoryError::DeleteBlocked {
            category,
            dependents,
        }) => {
            record_delete_blocked();
            Ok((
                StatusCode::CONFLICT,
                Html(views::category_delete(&category, &dependents)),
            )
                .into_response())
        }
        Err(err) => Err(err.into()),
    }
}
