//! Item service: listing, detail, validated writes with optional image.

use stockroom_core::observability::inventory_span;
use stockroom_core::{CategoryId, ItemId};
use tracing::Instrument;

use crate::error::{InventoryError, Result};
use crate::model::{Item, ItemDetail, ItemSummary};
use crate::store::InventoryStore;
use crate::uploads::{StoredImage, UploadedFile, Uploads};
use crate::validation::{ItemFields, ItemForm, ValidationErrors};

const MISSING_CATEGORY_MESSAGE: &str = "Selected category does not exist";

/// Orchestrates item reads and writes against the store and upload adapter.
#[derive(Debug, Clone)]
pub struct ItemService {
    store: InventoryStore,
    uploads: Uploads,
}

struct ValidItem {
    fields: ItemFields,
    category_id: CategoryId,
}

impl ItemService {
    /// Creates a service over `store`, saving images through `uploads`.
    #[must_use]
    pub fn new(store: InventoryStore, uploads: Uploads) -> Self {
        Self { store, uploads }
    }

    /// All items in insertion order, without descriptions.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list(&self) -> Result<Vec<ItemSummary>> {
        Ok(self
            .store
            .list_items()
            .await?
            .into_iter()
            .map(ItemSummary::from)
            .collect())
    }

    /// Number of stored items.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn count(&self) -> Result<usize> {
        Ok(self.store.list_items().await?.len())
    }

    /// One item with its category resolved.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the item does not exist.
    pub async fn get(&self, id: ItemId) -> Result<ItemDetail> {
        let item = self.find(id).await?;
        let category = self.store.get_category(item.category_id).await?;
        Ok(ItemDetail { item, category })
    }

    /// Loads one item.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the item does not exist.
    pub async fn find(&self, id: ItemId) -> Result<Item> {
        self.store
            .get_item(id)
            .await?
            .ok_or_else(|| InventoryError::item_not_found(id))
    }

    /// Validates and stores a new item, saving `image` if one was sent.
    ///
    /// # Errors
    ///
    /// Returns `Validation` with every failed rule (including a rejected
    /// image type), or a store error.
    pub async fn create(&self, form: &ItemForm, image: Option<&UploadedFile>) -> Result<Item> {
        let valid = self.validate(form, image).await?;

        async {
            let stored = match image {
                Some(file) => Some(self.uploads.save(file).await?),
                None => None,
            };
            let item = Item {
                id: ItemId::generate(),
                category_id: valid.category_id,
                name: valid.fields.name,
                description: valid.fields.description,
                price: valid.fields.price,
                quantity_in_stock: valid.fields.quantity_in_stock,
                image_path: stored.as_ref().map(|image| image.path.clone()),
            };
            if let Err(err) = self.store.insert_item(&item).await {
                self.discard_unreferenced(stored.as_ref()).await;
                return Err(err);
            }
            tracing::info!(
                item_id = %item.id,
                category_id = %item.category_id,
                name = %item.name,
                "created item"
            );
            Ok::<_, InventoryError>(item)
        }
        .instrument(inventory_span("create_item", "items"))
        .await
    }

    /// Validates and applies changes to an existing item.
    ///
    /// Without a new image the stored image path is kept.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Validation`, or a store error.
    pub async fn update(
        &self,
        id: ItemId,
        form: &ItemForm,
        image: Option<&UploadedFile>,
    ) -> Result<Item> {
        let mut item = self.find(id).await?;
        let valid = self.validate(form, image).await?;

        async {
            let stored = match image {
                Some(file) => Some(self.uploads.save(file).await?),
                None => None,
            };
            if let Some(image) = &stored {
                item.image_path = Some(image.path.clone());
            }
            item.category_id = valid.category_id;
            item.name = valid.fields.name;
            item.description = valid.fields.description;
            item.price = valid.fields.price;
            item.quantity_in_stock = valid.fields.quantity_in_stock;

            if let Err(err) = self.store.replace_item(&item).await {
                self.discard_unreferenced(stored.as_ref()).await;
                return Err(err);
            }
            tracing::info!(item_id = %id, name = %item.name, "updated item");
            Ok::<_, InventoryError>(item)
        }
        .instrument(inventory_span("update_item", "items"))
        .await
    }

    /// Deletes an item. Absent items are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn delete(&self, id: ItemId) -> Result<()> {
        self.store.delete_item(id).await?;
        tracing::info!(item_id = %id, "deleted item");
        Ok(())
    }

    /// Removes an image whose item document was never written.
    async fn discard_unreferenced(&self, stored: Option<&StoredImage>) {
        let Some(image) = stored else {
            return;
        };
        if let Err(err) = self.uploads.discard(image).await {
            tracing::warn!(key = %image.key, error = %err, "failed to discard orphaned upload");
        }
    }

    async fn validate(&self, form: &ItemForm, image: Option<&UploadedFile>) -> Result<ValidItem> {
        let mut errors = ValidationErrors::new();
        let fields = form.check_fields(&mut errors);
        let category_id = form.check_category(&mut errors);

        if let Some(id) = category_id {
            if self.store.get_category(id).await?.is_none() {
                errors.push("category", MISSING_CATEGORY_MESSAGE);
            }
        }

        if let Some(file) = image {
            if let Err(message) = Uploads::screen(file) {
                tracing::warn!(
                    file_name = %file.file_name,
                    content_type = %file.content_type,
                    "rejected upload"
                );
                errors.push("image", message);
            }
        }

        match (fields, category_id) {
            (Some(fields), Some(category_id)) if errors.is_empty() => Ok(ValidItem {
                fields,
                category_id,
            }),
            _ => Err(InventoryError::Validation(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::CategoryService;
    use crate::model::Category;
    use crate::uploads::REJECTED_TYPE_MESSAGE;
    use crate::validation::CategoryForm;
    use bytes::Bytes;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use stockroom_core::{
        MemoryBackend, ObjectMeta, StorageBackend, WritePrecondition, WriteResult,
    };

    struct Fixture {
        items: ItemService,
        categories: CategoryService,
        bucket: Arc<MemoryBackend>,
    }

    fn fixture() -> Fixture {
        let store = InventoryStore::new(Arc::new(MemoryBackend::new()));
        let bucket = Arc::new(MemoryBackend::new());
        let uploads = Uploads::bucket(bucket.clone(), "https://cdn.example.com/");
        Fixture {
            items: ItemService::new(store.clone(), uploads),
            categories: CategoryService::new(store),
            bucket,
        }
    }

    /// Document backend that can be told to refuse item writes.
    #[derive(Default)]
    struct FlakyItemWrites {
        inner: MemoryBackend,
        refuse: AtomicBool,
    }

    #[async_trait::async_trait]
    impl StorageBackend for FlakyItemWrites {
        async fn get(&self, path: &str) -> stockroom_core::Result<Bytes> {
            self.inner.get(path).await
        }

        async fn put(
            &self,
            path: &str,
            data: Bytes,
            precondition: WritePrecondition,
        ) -> stockroom_core::Result<WriteResult> {
            if path.starts_with("items/") && self.refuse.load(Ordering::SeqCst) {
                return Err(stockroom_core::Error::storage("disk full"));
            }
            self.inner.put(path, data, precondition).await
        }

        async fn delete(&self, path: &str) -> stockroom_core::Result<()> {
            self.inner.delete(path).await
        }

        async fn list(&self, prefix: &str) -> stockroom_core::Result<Vec<ObjectMeta>> {
            self.inner.list(prefix).await
        }

        async fn head(&self, path: &str) -> stockroom_core::Result<Option<ObjectMeta>> {
            self.inner.head(path).await
        }
    }

    fn flaky_fixture() -> (Fixture, Arc<FlakyItemWrites>) {
        let documents = Arc::new(FlakyItemWrites::default());
        let store = InventoryStore::new(documents.clone());
        let bucket = Arc::new(MemoryBackend::new());
        let uploads = Uploads::bucket(bucket.clone(), "https://cdn.example.com/");
        let fixture = Fixture {
            items: ItemService::new(store.clone(), uploads),
            categories: CategoryService::new(store),
            bucket,
        };
        (fixture, documents)
    }

    async fn tools(fixture: &Fixture) -> Category {
        fixture
            .categories
            .create(&CategoryForm {
                name: "Tools".to_string(),
                description: String::new(),
            })
            .await
            .unwrap()
    }

    fn hammer(category: &Category) -> ItemForm {
        ItemForm {
            name: "Hammer".to_string(),
            description: String::new(),
            price: "12.50".to_string(),
            quantity_in_stock: "5".to_string(),
            categories: vec![category.id.to_string()],
        }
    }

    async fn stored_objects(bucket: &MemoryBackend) -> usize {
        bucket.list("").await.unwrap().len()
    }

    fn upload(content_type: &str) -> UploadedFile {
        UploadedFile {
            file_name: "hammer.png".to_string(),
            content_type: content_type.to_string(),
            data: Bytes::from_static(b"img"),
        }
    }

    fn messages(err: InventoryError) -> Vec<String> {
        match err {
            InventoryError::Validation(errors) => {
                errors.iter().map(|e| e.message.clone()).collect()
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_and_get_resolves_category() {
        let fixture = fixture();
        let tools = tools(&fixture).await;

        let item = fixture.items.create(&hammer(&tools), None).await.unwrap();
        assert_eq!(item.description, "No item description");
        assert!(item.image_path.is_none());

        let detail = fixture.items.get(item.id).await.unwrap();
        assert_eq!(detail.item, item);
        assert_eq!(detail.category.map(|c| c.name).as_deref(), Some("Tools"));
    }

    #[tokio::test]
    async fn create_with_image_records_public_url() {
        let fixture = fixture();
        let tools = tools(&fixture).await;

        let item = fixture
            .items
            .create(&hammer(&tools), Some(&upload("image/png")))
            .await
            .unwrap();
        let path = item.image_path.unwrap();
        assert!(path.starts_with("https://cdn.example.com/"));
        assert!(path.ends_with("-hammer.png"));
        assert_eq!(stored_objects(&fixture.bucket).await, 1);
    }

    #[tokio::test]
    async fn rejected_upload_is_reported_with_field_errors() {
        let fixture = fixture();
        let tools = tools(&fixture).await;
        let mut form = hammer(&tools);
        form.price = "0.5".to_string();

        let err = fixture
            .items
            .create(&form, Some(&upload("image/gif")))
            .await
            .unwrap_err();
        let messages = messages(err);
        assert!(messages.contains(&REJECTED_TYPE_MESSAGE.to_string()));
        assert!(messages
            .iter()
            .any(|m| m == "Price must fall within the range of $0.99 to $999.99"));
        assert!(fixture.items.list().await.unwrap().is_empty());
        assert_eq!(stored_objects(&fixture.bucket).await, 0);
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let fixture = fixture();
        let mut form = hammer(&tools(&fixture).await);
        form.categories = vec![CategoryId::generate().to_string()];

        let err = fixture.items.create(&form, None).await.unwrap_err();
        assert_eq!(messages(err), vec![MISSING_CATEGORY_MESSAGE]);
    }

    #[tokio::test]
    async fn update_keeps_identity_and_image() {
        let fixture = fixture();
        let tools = tools(&fixture).await;
        let created = fixture
            .items
            .create(&hammer(&tools), Some(&upload("image/jpeg")))
            .await
            .unwrap();

        let mut form = hammer(&tools);
        form.name = "Claw Hammer".to_string();
        form.quantity_in_stock = "0".to_string();
        let updated = fixture.items.update(created.id, &form, None).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Claw Hammer");
        assert_eq!(updated.quantity_in_stock, 0);
        assert_eq!(updated.image_path, created.image_path);
        assert_eq!(fixture.items.find(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn invalid_update_leaves_item_unchanged() {
        let fixture = fixture();
        let tools = tools(&fixture).await;
        let created = fixture.items.create(&hammer(&tools), None).await.unwrap();

        let mut form = hammer(&tools);
        form.quantity_in_stock = "100".to_string();
        assert!(fixture.items.update(created.id, &form, None).await.is_err());
        assert_eq!(fixture.items.find(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn delete_is_unconditional() {
        let fixture = fixture();
        let tools = tools(&fixture).await;
        let item = fixture.items.create(&hammer(&tools), None).await.unwrap();

        fixture.items.delete(item.id).await.unwrap();
        assert!(matches!(
            fixture.items.get(item.id).await,
            Err(InventoryError::NotFound { entity: "item", .. })
        ));
        fixture.categories.delete(tools.id).await.unwrap();
    }

    #[tokio::test]
    async fn failed_create_discards_saved_image() {
        let (fixture, documents) = flaky_fixture();
        let tools = tools(&fixture).await;
        documents.refuse.store(true, Ordering::SeqCst);

        let err = fixture
            .items
            .create(&hammer(&tools), Some(&upload("image/png")))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::Storage { .. }));
        assert_eq!(stored_objects(&fixture.bucket).await, 0);
    }

    #[tokio::test]
    async fn failed_update_discards_new_image_only() {
        let (fixture, documents) = flaky_fixture();
        let tools = tools(&fixture).await;
        let item = fixture
            .items
            .create(&hammer(&tools), Some(&upload("image/png")))
            .await
            .unwrap();
        documents.refuse.store(true, Ordering::SeqCst);

        let err = fixture
            .items
            .update(item.id, &hammer(&tools), Some(&upload("image/jpeg")))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::Storage { .. }));
        assert_eq!(stored_objects(&fixture.bucket).await, 1);
        assert_eq!(fixture.items.find(item.id).await.unwrap(), item);
    }
}
