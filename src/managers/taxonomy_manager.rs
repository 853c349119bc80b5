//! Taxonomy Manager for Linkshelf.
//!
//! Owns the `categories` and `tags` collections: cached full lists plus CRUD.
//! Every successful mutation invalidates its own collection. Renames and
//! deletes also invalidate `bookmarks`, whose lists expand these labels.

use std::sync::Arc;

use log::info;
use serde_json::json;

use super::list_cache::{fetcher, CachedList, Fetcher, ListCache, Observer};
use crate::remote::{decode, decode_all, ListOptions, RecordStore};
use crate::types::collection::Collection;
use crate::types::errors::{FormError, StoreError};
use crate::types::query::QueryKey;
use crate::types::taxonomy::{Category, CategoryDraft, Tag, TagDraft};

/// Trims a user-entered label, rejecting blank input.
pub fn clean_label(text: &str) -> Result<String, FormError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(FormError::BlankLabel);
    }
    Ok(trimmed.to_string())
}

#[derive(Clone)]
pub struct TaxonomyManager {
    store: Arc<dyn RecordStore>,
    cache: ListCache,
    user_id: String,
    batch: u32,
}

impl TaxonomyManager {
    pub fn new(store: Arc<dyn RecordStore>, cache: ListCache, user_id: impl Into<String>, batch: u32) -> Self {
        Self {
            store,
            cache,
            user_id: user_id.into(),
            batch,
        }
    }

    pub fn key(collection: Collection) -> QueryKey {
        QueryKey::new(collection)
    }

    fn list_fetcher(&self, collection: Collection) -> Fetcher {
        let store = self.store.clone();
        let options = ListOptions::default().batch(self.batch);
        fetcher(move || {
            let store = store.clone();
            let options = options.clone();
            async move { store.list(collection, &options).await }
        })
    }

    // === Categories ===

    /// All categories, served from the cache when fresh.
    pub async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let key = Self::key(Collection::Categories);
        let data = self.cache.fetch(&key, self.list_fetcher(Collection::Categories)).await?;
        decode_all(&data)
    }

    pub fn read_categories(&self) -> Result<CachedList<Category>, StoreError> {
        let key = Self::key(Collection::Categories);
        self.cache
            .read(&key, self.list_fetcher(Collection::Categories))
            .decode()
    }

    pub fn observe_categories(&self) -> Observer {
        self.cache.observe(
            &Self::key(Collection::Categories),
            self.list_fetcher(Collection::Categories),
        )
    }

    /// Creates a category. Categories created from user input are `custom`.
    pub async fn create_category(&self, label: &str, custom: bool) -> Result<Category, StoreError> {
        let draft = CategoryDraft {
            category: label.trim().to_string(),
            custom,
            user: self.user_id.clone(),
        };
        let record = self
            .store
            .create(Collection::Categories, serde_json::to_value(&draft)?)
            .await?;
        let category: Category = decode(record)?;
        info!("created category '{}' ({})", category.category, category.id);
        self.cache.invalidate(Collection::Categories);
        Ok(category)
    }

    pub async fn rename_category(&self, id: &str, label: &str) -> Result<Category, StoreError> {
        let record = self
            .store
            .update(Collection::Categories, id, json!({ "category": label.trim() }))
            .await?;
        let category: Category = decode(record)?;
        self.cache.invalidate(Collection::Categories);
        self.cache.invalidate(Collection::Bookmarks);
        Ok(category)
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(Collection::Categories, id).await?;
        info!("deleted category {}", id);
        self.cache.invalidate(Collection::Categories);
        self.cache.invalidate(Collection::Bookmarks);
        Ok(())
    }

    // === Tags ===

    /// All tags, served from the cache when fresh.
    pub async fn tags(&self) -> Result<Vec<Tag>, StoreError> {
        let key = Self::key(Collection::Tags);
        let data = self.cache.fetch(&key, self.list_fetcher(Collection::Tags)).await?;
        decode_all(&data)
    }

    pub fn read_tags(&self) -> Result<CachedList<Tag>, StoreError> {
        let key = Self::key(Collection::Tags);
        self.cache.read(&key, self.list_fetcher(Collection::Tags)).decode()
    }

    pub fn observe_tags(&self) -> Observer {
        self.cache
            .observe(&Self::key(Collection::Tags), self.list_fetcher(Collection::Tags))
    }

    pub async fn create_tag(&self, label: &str) -> Result<Tag, StoreError> {
        let draft = TagDraft {
            tag: label.trim().to_string(),
            user: self.user_id.clone(),
        };
        let record = self
            .store
            .create(Collection::Tags, serde_json::to_value(&draft)?)
            .await?;
        let tag: Tag = decode(record)?;
        info!("created tag '{}' ({})", tag.tag, tag.id);
        self.cache.invalidate(Collection::Tags);
        Ok(tag)
    }

    pub async fn rename_tag(&self, id: &str, label: &str) -> Result<Tag, StoreError> {
        let record = self
            .store
            .update(Collection::Tags, id, json!({ "tag": label.trim() }))
            .await?;
        let tag: Tag = decode(record)?;
        self.cache.invalidate(Collection::Tags);
        self.cache.invalidate(Collection::Bookmarks);
        Ok(tag)
    }

    pub async fn delete_tag(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(Collection::Tags, id).await?;
        info!("deleted tag {}", id);
        self.cache.invalidate(Collection::Tags);
        self.cache.invalidate(Collection::Bookmarks);
        Ok(())
    }
}
