//! Inventory data model.
//!
//! Two document collections live in the store:
//!
//! ```text
//! categories/{category_id}.json   # Category
//! items/{item_id}.json            # Item, linked by `categoryId`
//! ```
//!
//! The link from an item to its category is checked when the item is
//! written; it is not a live foreign key.

use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, ItemId};

/// Description stored when a category is submitted without one.
pub const DEFAULT_CATEGORY_DESCRIPTION: &str = "No description";

/// Description stored when an item is submitted without one.
pub const DEFAULT_ITEM_DESCRIPTION: &str = "No item description";

/// A named grouping that items belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category identity.
    pub id: CategoryId,
    /// Display name, unique ignoring case.
    pub name: String,
    /// Free-text description.
    pub description: String,
}

impl Category {
    /// Canonical URL of the category detail page.
    #[must_use]
    pub fn url(&self) -> String {
        category_url(self.id)
    }
}

/// A priced, stocked product record belonging to exactly one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Item identity.
    pub id: ItemId,
    /// Owning category.
    pub category_id: CategoryId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Unit price in dollars.
    pub price: f64,
    /// Units currently in stock.
    pub quantity_in_stock: u8,
    /// Where the item image is served from, if one was uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl Item {
    /// Canonical URL of the item detail page.
    #[must_use]
    pub fn url(&self) -> String {
        item_url(self.id)
    }
}

/// Canonical URL for a category id.
#[must_use]
pub fn category_url(id: CategoryId) -> String {
    format!("/categories/{id}")
}

/// Canonical URL for an item id.
#[must_use]
pub fn item_url(id: ItemId) -> String {
    format!("/items/{id}")
}

/// A category annotated with the number of items it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    /// The category.
    pub category: Category,
    /// Number of items referencing the category.
    pub item_count: usize,
}

/// Name-only view of an item that references a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentItem {
    /// Item identity.
    pub id: ItemId,
    /// Item name.
    pub name: String,
}

impl From<&Item> for DependentItem {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
        }
    }
}

/// A category together with the items that reference it.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDetail {
    /// The category.
    pub category: Category,
    /// Items in the category, in insertion order.
    pub items: Vec<DependentItem>,
}

/// List projection of an item (description omitted).
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSummary {
    /// Item identity.
    pub id: ItemId,
    /// Owning category.
    pub category_id: CategoryId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: f64,
    /// Units in stock.
    pub quantity_in_stock: u8,
    /// Image location, if any.
    pub image_path: Option<String>,
}

impl From<Item> for ItemSummary {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            category_id: item.category_id,
            name: item.name,
            price: item.price,
            quantity_in_stock: item.quantity_in_stock,
            image_path: item.image_path,
        }
    }
}

/// An item with its category resolved.
///
/// `category` is `None` only if the category disappeared after the item was
/// written.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDetail {
    /// The item.
    pub item: Item,
    /// The owning category.
    pub category: Option<Category>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_document_uses_camel_case() {
        let item = Item {
            id: ItemId::generate(),
            category_id: CategoryId::generate(),
            name: "Hammer".to_string(),
            description: DEFAULT_ITEM_DESCRIPTION.to_string(),
            price: 12.5,
            quantity_in_stock: 5,
            image_path: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("categoryId").is_some());
        assert!(json.get("quantityInStock").is_some());
        assert!(json.get("imagePath").is_none());

        let back: Item = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn urls_are_canonical() {
        let id = CategoryId::generate();
        assert_eq!(category_url(id), format!("/categories/{id}"));
    }
}
