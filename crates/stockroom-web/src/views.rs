//! HTML rendering.
//!
//! Every value taken from the store or from a submitted form passes through
//! [`escape_html`] before it reaches the page.

use std::fmt::Write as _;

use axum::http::StatusCode;

use stockroom_inventory::model::item_url;
use stockroom_inventory::validation::escape_html;
use stockroom_inventory::{
    Category, CategoryDetail, CategoryForm, CategorySummary, DependentItem, Item, ItemDetail,
    ItemForm, ItemSummary, ValidationErrors,
};

/// Form field carrying the item image.
pub const IMAGE_FIELD: &str = "item-img";

/// Canonical URL of the category list.
pub const CATEGORIES_URL: &str = "/categories";

/// Canonical URL of the item list.
pub const ITEMS_URL: &str = "/items";

fn layout(title: &str, body: &str) -> String {
    let title = escape_html(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Stockroom</title>
</head>
<body>
<nav>
<a href="/">Home</a>
<a href="/categories">All categories</a>
<a href="/items">All items</a>
<a href="/categories/create">Create category</a>
<a href="/items/create">Create item</a>
</nav>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
"#
    )
}

fn error_list(errors: Option<&ValidationErrors>) -> String {
    let Some(errors) = errors.filter(|e| !e.is_empty()) else {
        return String::new();
    };
    let mut out = String::from("<ul class=\"errors\">\n");
    for error in errors.iter() {
        let _ = writeln!(
            out,
            "<li data-field=\"{}\">{}</li>",
            error.field,
            escape_html(&error.message)
        );
    }
    out.push_str("</ul>\n");
    out
}

fn price(value: f64) -> String {
    format!("${value:.2}")
}

/// Generic error page.
#[must_use]
pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        "<p class=\"status\">{}</p>\n<p>{}</p>\n",
        status.as_u16(),
        escape_html(message)
    );
    layout(status.canonical_reason().unwrap_or("Error"), &body)
}

/// Home page with entity counts.
#[must_use]
pub fn index(category_count: usize, item_count: usize) -> String {
    let body = format!(
        "<p>The stockroom holds the following records:</p>\n<ul>\n\
         <li><a href=\"/categories\">Categories</a>: {category_count}</li>\n\
         <li><a href=\"/items\">Items</a>: {item_count}</li>\n</ul>\n"
    );
    layout("Stockroom", &body)
}

// ============================================================================
// Categories
// ============================================================================

/// Category list with item counts.
#[must_use]
pub fn category_list(categories: &[CategorySummary]) -> String {
    if categories.is_empty() {
        return layout("All categories", "<p>There are no categories.</p>\n");
    }
    let mut body = String::from("<ul>\n");
    for summary in categories {
        let _ = writeln!(
            body,
            "<li><a href=\"{}\">{}</a> ({} items)</li>",
            summary.category.url(),
            escape_html(&summary.category.name),
            summary.item_count
        );
    }
    body.push_str("</ul>\n");
    layout("All categories", &body)
}

/// Category detail with its items.
#[must_use]
pub fn category_detail(detail: &CategoryDetail) -> String {
    let category = &detail.category;
    let mut body = format!(
        "<p>{}</p>\n<h2>Items</h2>\n",
        escape_html(&category.description)
    );
    body.push_str(&dependent_list(&detail.items, "This category has no items."));
    let _ = write!(
        body,
        "<p><a href=\"{url}/update\">Update category</a> \
         <a href=\"{url}/delete\">Delete category</a></p>\n",
        url = category.url()
    );
    layout(&format!("Category: {}", category.name), &body)
}

fn dependent_list(items: &[DependentItem], empty: &str) -> String {
    if items.is_empty() {
        return format!("<p>{empty}</p>\n");
    }
    let mut out = String::from("<ul class=\"items\">\n");
    for item in items {
        let _ = writeln!(
            out,
            "<li><a href=\"{}\">{}</a></li>",
            item_url(item.id),
            escape_html(&item.name)
        );
    }
    out.push_str("</ul>\n");
    out
}

/// Create/update form for a category.
#[must_use]
pub fn category_form(
    title: &str,
    form: &CategoryForm,
    errors: Option<&ValidationErrors>,
) -> String {
    let body = format!(
        r#"{errors}<form method="post" enctype="multipart/form-data">
<label for="name">Name</label>
<input id="name" name="name" type="text" required minlength="3" maxlength="20" value="{name}">
<label for="description">Description</label>
<textarea id="description" name="description" maxlength="120">{description}</textarea>
<button type="submit">Submit</button>
</form>
"#,
        errors = error_list(errors),
        name = escape_html(&form.name),
        description = escape_html(&form.description),
    );
    layout(title, &body)
}

/// Delete confirmation for a category.
///
/// With dependents, lists them and offers no delete button.
#[must_use]
pub fn category_delete(category: &Category, dependents: &[DependentItem]) -> String {
    let mut body = format!("<p>{}</p>\n", escape_html(&category.description));
    if dependents.is_empty() {
        let _ = write!(
            body,
            "<p>Do you really want to delete this category?</p>\n\
             <form method=\"post\" action=\"{}/delete\">\n\
             <button type=\"submit\">Delete</button>\n</form>\n",
            category.url()
        );
    } else {
        body.push_str(
            "<p class=\"blocked\">Delete the following items before deleting this category:</p>\n",
        );
        body.push_str(&dependent_list(dependents, ""));
    }
    layout(&format!("Delete category: {}", category.name), &body)
}

// ============================================================================
// Items
// ============================================================================

/// Item list.
#[must_use]
pub fn item_list(items: &[ItemSummary]) -> String {
    if items.is_empty() {
        return layout("All items", "<p>There are no items.</p>\n");
    }
    let mut body = String::from("<ul>\n");
    for item in items {
        let _ = writeln!(
            body,
            "<li><a href=\"{}\">{}</a> {} ({} in stock)</li>",
            item_url(item.id),
            escape_html(&item.name),
            price(item.price),
            item.quantity_in_stock
        );
    }
    body.push_str("</ul>\n");
    layout("All items", &body)
}

/// Item detail with its category.
#[must_use]
pub fn item_detail(detail: &ItemDetail) -> String {
    let item = &detail.item;
    let category = detail.category.as_ref().map_or_else(
        || "<span class=\"missing\">Unknown category</span>".to_string(),
        |c| format!("<a href=\"{}\">{}</a>", c.url(), escape_html(&c.name)),
    );
    let image = item.image_path.as_deref().map_or_else(String::new, |path| {
        format!(
            "<img src=\"{}\" alt=\"{}\">\n",
            escape_html(path),
            escape_html(&item.name)
        )
    });
    let body = format!(
        "{image}<p>{description}</p>\n<dl>\n\
         <dt>Category</dt><dd>{category}</dd>\n\
         <dt>Price</dt><dd>{price}</dd>\n\
         <dt>In stock</dt><dd>{stock}</dd>\n</dl>\n\
         <p><a href=\"{url}/update\">Update item</a> \
         <a href=\"{url}/delete\">Delete item</a></p>\n",
        description = escape_html(&item.description),
        price = price(item.price),
        stock = item.quantity_in_stock,
        url = item.url(),
    );
    layout(&format!("Item: {}", item.name), &body)
}

/// Create/update form for an item.
#[must_use]
pub fn item_form(
    title: &str,
    form: &ItemForm,
    categories: &[Category],
    errors: Option<&ValidationErrors>,
) -> String {
    let mut options = String::new();
    for category in categories {
        let id = category.id.to_string();
        let selected = if form.categories.iter().any(|c| c.trim() == id) {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            options,
            "<option value=\"{id}\"{selected}>{}</option>",
            escape_html(&category.name)
        );
    }

    let body = format!(
        r#"{errors}<form method="post" enctype="multipart/form-data">
<label for="name">Name</label>
<input id="name" name="name" type="text" required minlength="3" maxlength="40" value="{name}">
<label for="description">Description</label>
<textarea id="description" name="description" maxlength="50">{description}</textarea>
<label for="price">Price</label>
<input id="price" name="price" type="number" step="0.01" min="0.99" max="999.99" value="{price}">
<label for="stock">In stock</label>
<input id="stock" name="stock" type="number" step="1" min="0" max="99" value="{stock}">
<label for="category">Category</label>
<select id="category" name="category" required>
<option value="">Select a category</option>
{options}</select>
<label for="{image_field}">Image (.png or .jpeg)</label>
<input id="{image_field}" name="{image_field}" type="file" accept="image/png,image/jpeg">
<button type="submit">Submit</button>
</form>
"#,
        errors = error_list(errors),
        name = escape_html(&form.name),
        description = escape_html(&form.description),
        price = escape_html(&form.price),
        stock = escape_html(&form.quantity_in_stock),
        image_field = IMAGE_FIELD,
    );
    layout(title, &body)
}

/// Prefilled form values for an existing item.
#[must_use]
pub fn item_form_values(item: &Item) -> ItemForm {
    ItemForm {
        name: item.name.clone(),
        description: item.description.clone(),
        price: format!("{:.2}", item.price),
        quantity_in_stock: item.quantity_in_stock.to_string(),
        categories: vec![item.category_id.to_string()],
    }
}

/// Delete confirmation for an item.
#[must_use]
pub fn item_delete(item: &Item) -> String {
    let body = format!(
        "<p>{} in stock at {}.</p>\n<p>Do you really want to delete this item?</p>\n\
         <form method=\"post\" action=\"{}/delete\">\n\
         <button type=\"submit\">Delete</button>\n</form>\n",
        item.quantity_in_stock,
        price(item.price),
        item.url()
    );
    layout(&format!("Delete item: {}", item.name), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::{CategoryId, ItemId};

    fn tools() -> Category {
        Category {
            id: CategoryId::generate(),
            name: "Tools & <Things>".to_string(),
            description: "No description".to_string(),
        }
    }

    #[test]
    fn category_names_are_escaped() {
        let summaries = vec![CategorySummary {
            category: tools(),
            item_count: 2,
        }];
        let html = category_list(&summaries);
        assert!(html.contains("Tools &amp; &lt;Things&gt;"));
        assert!(!html.contains("<Things>"));
        assert!(html.contains("(2 items)"));
    }

    #[test]
    fn blocked_delete_lists_dependents_without_button() {
        let category = tools();
        let dependents = vec![DependentItem {
            id: ItemId::generate(),
            name: "Hammer".to_string(),
        }];
        let html = category_delete(&category, &dependents);
        assert!(html.contains("Hammer"));
        assert!(!html.contains("<button"));

        let html = category_delete(&category, &[]);
        assert!(html.contains("<button type=\"submit\">Delete</button>"));
    }

    #[test]
    fn item_form_marks_selected_category() {
        let category = tools();
        let form = ItemForm {
            categories: vec![category.id.to_string()],
            ..ItemForm::default()
        };
        let html = item_form("Create item", &form, &[category.clone()], None);
        assert!(html.contains(&format!("<option value=\"{}\" selected>", category.id)));
    }

    #[test]
    fn form_errors_render_escaped() {
        let mut errors = ValidationErrors::new();
        errors.push("name", "Name <required>");
        let html = category_form("Create category", &CategoryForm::default(), Some(&errors));
        assert!(html.contains("<li data-field=\"name\">Name &lt;required&gt;</li>"));
    }

    #[test]
    fn item_values_prefill_from_record() {
        let item = Item {
            id: ItemId::generate(),
            category_id: CategoryId::generate(),
            name: "Hammer".to_string(),
            description: "Steel".to_string(),
            price: 12.5,
            quantity_in_stock: 5,
            image_path: None,
        };
        let values = item_form_values(&item);
        assert_eq!(values.price, "12.50");
        assert_eq!(values.quantity_in_stock, "5");
        assert_eq!(values.categories, vec![item.category_id.to_string()]);
    }
}
