//! JSON document store for categories and items.
//!
//! Each record is one JSON object under its collection prefix. Object names
//! are monotonic ULIDs, so listing sorted by path yields insertion order.

use std::sync::Arc;

use bytes::Bytes;
use futures::future::try_join_all;
use serde::Serialize;
use serde::de::DeserializeOwned;

use stockroom_core::{
    CategoryId, Error as CoreError, ItemId, StorageBackend, WritePrecondition, WriteResult,
};

use crate::error::{InventoryError, Result};
use crate::model::{Category, Item};
use crate::validation::normalize_name;

const CATEGORIES_PREFIX: &str = "categories/";
const ITEMS_PREFIX: &str = "items/";

fn category_path(id: CategoryId) -> String {
    format!("{CATEGORIES_PREFIX}{id}.json")
}

fn item_path(id: ItemId) -> String {
    format!("{ITEMS_PREFIX}{id}.json")
}

/// Document persistence for the two inventory collections.
#[derive(Clone)]
pub struct InventoryStore {
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for InventoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryStore").finish_non_exhaustive()
    }
}

impl InventoryStore {
    /// Creates a store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Verifies the backend answers a listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable.
    pub async fn ping(&self) -> Result<()> {
        self.backend.list(CATEGORIES_PREFIX).await?;
        Ok(())
    }

    /// All categories in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if listing or decoding fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.list_documents(CATEGORIES_PREFIX).await
    }

    /// All items in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if listing or decoding fails.
    pub async fn list_items(&self) -> Result<Vec<Item>> {
        self.list_documents(ITEMS_PREFIX).await
    }

    /// Loads one category, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the read or decode fails.
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        self.read_document(&category_path(id)).await
    }

    /// Loads one item, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the read or decode fails.
    pub async fn get_item(&self, id: ItemId) -> Result<Option<Item>> {
        self.read_document(&item_path(id)).await
    }

    /// Finds a category whose normalized name matches `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails.
    pub async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let wanted = normalize_name(name);
        Ok(self
            .list_categories()
            .await?
            .into_iter()
            .find(|c| normalize_name(&c.name) == wanted))
    }

    /// Items whose category link equals `id`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails.
    pub async fn items_in_category(&self, id: CategoryId) -> Result<Vec<Item>> {
        Ok(self
            .list_items()
            .await?
            .into_iter()
            .filter(|item| item.category_id == id)
            .collect())
    }

    /// Writes a new category. Fails if the id is already taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the record exists.
    pub async fn insert_category(&self, category: &Category) -> Result<()> {
        self.write_document(
            &category_path(category.id),
            category,
            WritePrecondition::DoesNotExist,
        )
        .await
    }

    /// Overwrites an existing category.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn replace_category(&self, category: &Category) -> Result<()> {
        self.write_document(&category_path(category.id), category, WritePrecondition::None)
            .await
    }

    /// Removes a category. Absent records are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_category(&self, id: CategoryId) -> Result<()> {
        self.backend.delete(&category_path(id)).await?;
        Ok(())
    }

    /// Writes a new item. Fails if the id is already taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the record exists.
    pub async fn insert_item(&self, item: &Item) -> Result<()> {
        self.write_document(&item_path(item.id), item, WritePrecondition::DoesNotExist)
            .await
    }

    /// Overwrites an existing item.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn replace_item(&self, item: &Item) -> Result<()> {
        self.write_document(&item_path(item.id), item, WritePrecondition::None)
            .await
    }

    /// Removes an item. Absent records are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_item(&self, id: ItemId) -> Result<()> {
        self.backend.delete(&item_path(id)).await?;
        Ok(())
    }

    async fn list_documents<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        let mut metas = self.backend.list(prefix).await?;
        metas.retain(|meta| meta.path.ends_with(".json"));
        metas.sort_by(|left, right| left.path.cmp(&right.path));

        let reads = metas.iter().map(|meta| self.read_document::<T>(&meta.path));
        let documents = try_join_all(reads).await?;

        // Records deleted between list and read are skipped.
        Ok(documents.into_iter().flatten().collect())
    }

    async fn read_document<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let body = match self.backend.get(path).await {
            Ok(body) => body,
            Err(CoreError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|err| InventoryError::Serialization {
                message: format!("failed to parse document at {path}: {err}"),
            })
    }

    async fn write_document<T: Serialize>(
        &self,
        path: &str,
        value: &T,
        precondition: WritePrecondition,
    ) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        match self.backend.put(path, Bytes::from(bytes), precondition).await? {
            WriteResult::Success { .. } => Ok(()),
            WriteResult::PreconditionFailed { .. } => Err(InventoryError::Storage {
                message: format!("document already exists at {path}"),
            }),
        }
    }
}
