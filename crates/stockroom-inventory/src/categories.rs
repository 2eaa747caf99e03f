//! Category service: listing, detail, validated writes, guarded delete.

use std::collections::HashMap;

use stockroom_core::CategoryId;
use stockroom_core::observability::inventory_span;
use tracing::Instrument;

use crate::error::{InventoryError, Result};
use crate::model::{Category, CategoryDetail, CategorySummary, DependentItem};
use crate::store::InventoryStore;
use crate::validation::{CategoryDraft, CategoryForm, ValidationErrors, normalize_name};

const DUPLICATE_NAME_MESSAGE: &str = "A category with that name already exists";

/// Orchestrates category reads and writes against the store.
#[derive(Debug, Clone)]
pub struct CategoryService {
    store: InventoryStore,
}

impl CategoryService {
    /// Creates a service over `store`.
    #[must_use]
    pub fn new(store: InventoryStore) -> Self {
        Self { store }
    }

    /// All categories with their item counts, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list(&self) -> Result<Vec<CategorySummary>> {
        let (categories, items) =
            tokio::try_join!(self.store.list_categories(), self.store.list_items())?;

        let mut counts: HashMap<CategoryId, usize> = HashMap::new();
        for item in &items {
            *counts.entry(item.category_id).or_default() += 1;
        }

        Ok(categories
            .into_iter()
            .map(|category| {
                let item_count = counts.get(&category.id).copied().unwrap_or(0);
                CategorySummary {
                    category,
                    item_count,
                }
            })
            .collect())
    }

    /// Categories sorted by name, for selection lists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn options(&self) -> Result<Vec<Category>> {
        let mut categories = self.store.list_categories().await?;
        categories.sort_by_key(|c| normalize_name(&c.name));
        Ok(categories)
    }

    /// Number of stored categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn count(&self) -> Result<usize> {
        Ok(self.store.list_categories().await?.len())
    }

    /// One category plus the items that reference it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category does not exist.
    pub async fn get(&self, id: CategoryId) -> Result<CategoryDetail> {
        let (category, items) = tokio::try_join!(
            self.store.get_category(id),
            self.store.items_in_category(id)
        )?;
        let category = category.ok_or_else(|| InventoryError::category_not_found(id))?;

        Ok(CategoryDetail {
            category,
            items: items.iter().map(DependentItem::from).collect(),
        })
    }

    /// Loads one category without its items.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category does not exist.
    pub async fn find(&self, id: CategoryId) -> Result<Category> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(|| InventoryError::category_not_found(id))
    }

    /// Validates and stores a new category.
    ///
    /// # Errors
    ///
    /// Returns `Validation` with every failed rule, or a store error.
    pub async fn create(&self, form: &CategoryForm) -> Result<Category> {
        let draft = self.validate(form, None).await?;
        let category = Category {
            id: CategoryId::generate(),
            name: draft.name,
            description: draft.description,
        };

        async {
            self.store.insert_category(&category).await?;
            tracing::info!(category_id = %category.id, name = %category.name, "created category");
            Ok::<_, InventoryError>(category)
        }
        .instrument(inventory_span("create_category", "categories"))
        .await
    }

    /// Validates and applies changes to an existing category.
    ///
    /// The uniqueness check ignores the category being edited.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Validation`, or a store error.
    pub async fn update(&self, id: CategoryId, form: &CategoryForm) -> Result<Category> {
        let mut category = self.find(id).await?;
        let draft = self.validate(form, Some(id)).await?;
        category.name = draft.name;
        category.description = draft.description;

        async {
            self.store.replace_category(&category).await?;
            tracing::info!(category_id = %id, name = %category.name, "updated category");
            Ok::<_, InventoryError>(category)
        }
        .instrument(inventory_span("update_category", "categories"))
        .await
    }

    /// Deletes a category that no item references.
    ///
    /// # Errors
    ///
    /// Returns `DeleteBlocked` with the referencing items when any exist,
    /// `NotFound` if the category is absent, or a store error.
    pub async fn delete(&self, id: CategoryId) -> Result<()> {
        async {
            let detail = self.get(id).await?;
            if !detail.items.is_empty() {
                tracing::warn!(
                    category_id = %id,
                    dependents = detail.items.len(),
                    "category delete blocked by items"
                );
                return Err(InventoryError::DeleteBlocked {
                    category: detail.category,
                    dependents: detail.items,
                });
            }

            // Not atomic with item inserts: an item created between the
            // check above and this delete is left pointing at nothing.
            self.store.delete_category(id).await?;
            tracing::info!(category_id = %id, "deleted category");
            Ok::<_, InventoryError>(())
        }
        .instrument(inventory_span("delete_category", "categories"))
        .await
    }

    async fn validate(
        &self,
        form: &CategoryForm,
        editing: Option<CategoryId>,
    ) -> Result<CategoryDraft> {
        let mut errors = ValidationErrors::new();
        let draft = form.check(&mut errors);

        if !draft.name.is_empty() {
            let existing = self.store.find_category_by_name(&draft.name).await?;
            if existing.is_some_and(|c| Some(c.id) != editing) {
                errors.push("name", DUPLICATE_NAME_MESSAGE);
            }
        }

        if errors.is_empty() {
            Ok(draft)
        } else {
            Err(InventoryError::Validation(errors))
        }
    }
}
