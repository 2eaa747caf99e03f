//! HTML route handlers.

pub mod categories;
pub mod items;

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;

use crate::error::WebResult;
use crate::server::AppState;
use crate::views;

/// Index page and every inventory route.
pub fn inventory_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .merge(categories::routes())
        .merge(items::routes())
}

/// Home page with category and item counts.
///
/// GET /
pub(crate) async fn index(State(state): State<Arc<AppState>>) -> WebResult<Html<String>> {
    let (category_count, item_count) =
        tokio::try_join!(state.categories.count(), state.items.count())?;
    Ok(Html(views::index(category_count, item_count)))
}

fn redirect(url: &str) -> Response {
    Redirect::to(url).into_response()
}

/// Re-rendered form after a validation failure.
fn rejected(html: String) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response()
}
