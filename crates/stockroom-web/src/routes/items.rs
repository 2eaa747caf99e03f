//! Item pages.
//!
//! ## Routes
//!
//! - `GET  /items` - List items
//! - `GET  /items/create` - Empty item form
//! - `POST /items/create` - Create an item, optionally with an image
//! - `GET  /items/:id` - Item detail
//! - `GET  /items/:id/update` - Prefilled item form
//! - `POST /items/:id/update` - Update an item
//! - `GET  /items/:id/delete` - Delete confirmation
//! - `POST /items/:id/delete` - Delete an item

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;

use stockroom_core::ItemId;
use stockroom_inventory::{InventoryError, ItemForm};

use super::{redirect, rejected};
use crate::error::WebResult;
use crate::forms::SubmittedForm;
use crate::metrics::{record_mutation, record_validation_rejected};
use crate::server::AppState;
use crate::views::{self, ITEMS_URL};

const CREATE_TITLE: &str = "Create item";
const UPDATE_TITLE: &str = "Update item";

/// Creates item routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ITEMS_URL, get(list_items))
        .route("/items/create", get(create_item_form).post(create_item))
        .route("/items/:id", get(item_detail))
        .route("/items/:id/update", get(update_item_form).post(update_item))
        .route("/items/:id/delete", get(delete_item_form).post(delete_item))
}

/// GET /items
pub(crate) async fn list_items(State(state): State<Arc<AppState>>) -> WebResult<Html<String>> {
    let items = state.items.list().await?;
    Ok(Html(views::item_list(&items)))
}

/// GET /items/:id
pub(crate) async fn item_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> WebResult<Html<String>> {
    let id: ItemId = id.parse()?;
    let detail = state.items.get(id).await?;
    Ok(Html(views::item_detail(&detail)))
}

/// GET /items/create
pub(crate) async fn create_item_form(
    State(state): State<Arc<AppState>>,
) -> WebResult<Html<String>> {
    let categories = state.categories.options().await?;
    Ok(Html(views::item_form(
        CREATE_TITLE,
        &ItemForm::default(),
        &categories,
        None,
    )))
}

/// POST /items/create
pub(crate) async fn create_item(
    State(state): State<Arc<AppState>>,
    submitted: SubmittedForm,
) -> WebResult<Response> {
    let form = submitted.item_form();
    match state.items.create(&form, submitted.image()).await {
        Ok(item) => {
            record_mutation("item", "create");
            Ok(redirect(&item.url()))
        }
        Err(InventoryError::Validation(errors)) => {
            record_validation_rejected("item");
            let categories = state.categories.options().await?;
            Ok(rejected(views::item_form(
                CREATE_TITLE,
                &form,
                &categories,
                Some(&errors),
            )))
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /items/:id/update
pub(crate) async fn update_item_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> WebResult<Html<String>> {
    let id: ItemId = id.parse()?;
    let (item, categories) =
        tokio::try_join!(state.items.find(id), state.categories.options())?;
    Ok(Html(views::item_form(
        UPDATE_TITLE,
        &views::item_form_values(&item),
        &categories,
        None,
    )))
}

/// POST /items/:id/update
///
/// Without a new image the stored image is kept.
pub(crate) async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    submitted: SubmittedForm,
) -> WebResult<Response> {
    let id: ItemId = id.parse()?;
    let form = submitted.item_form();
    match state.items.update(id, &form, submitted.image()).await {
        Ok(item) => {
            record_mutation("item", "update");
            Ok(redirect(&item.url()))
        }
        Err(InventoryError::Validation(errors)) => {
            record_validation_rejected("item");
            let categories = state.categories.options().await?;
            Ok(rejected(views::item_form(
                UPDATE_TITLE,
                &form,
                &categories,
                Some(&errors),
            )))
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /items/:id/delete
///
/// Missing items redirect to the list.
pub(crate) async fn delete_item_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> WebResult<Response> {
    let Ok(id) = id.parse::<ItemId>() else {
        return Ok(redirect(ITEMS_URL));
    };
    match state.items.find(id).await {
        Ok(item) => Ok(Html(views::item_delete(&item)).into_response()),
        Err(InventoryError::NotFound { .. }) => Ok(redirect(ITEMS_URL)),
        Err(err) => Err(err.into()),
    }
}

/// POST /items/:id/delete
pub(crate) async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> WebResult<Response> {
    let Ok(id) = id.parse::<ItemId>() else {
        return Ok(redirect(ITEMS_URL));
    };
    state.items.delete(id).await?;
    record_mutation("item", "delete");
    Ok(redirect(ITEMS_URL))
}
