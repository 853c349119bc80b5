//! Group Manager for Linkshelf.
//!
//! Groups hold a set of bookmark ids. Membership writes always go through
//! `union_members` or an explicit removal so a group never lists an id twice.

use std::sync::Arc;

use log::{debug, info};

use super::list_cache::{fetcher, CachedList, Fetcher, ListCache, Observer};
use crate::remote::{decode, decode_all, ListOptions, RecordStore};
use crate::types::collection::Collection;
use crate::types::errors::{FormError, GroupError, StoreError};
use crate::types::group::{union_members, Group, GroupDraft, GroupPatch};
use crate::types::query::QueryKey;

#[derive(Clone)]
pub struct GroupManager {
    store: Arc<dyn RecordStore>,
    cache: ListCache,
    user_id: String,
    batch: u32,
}

impl GroupManager {
    pub fn new(store: Arc<dyn RecordStore>, cache: ListCache, user_id: impl Into<String>, batch: u32) -> Self {
        Self {
            store,
            cache,
            user_id: user_id.into(),
            batch,
        }
    }

    pub fn key() -> QueryKey {
        QueryKey::new(Collection::Groups)
    }

    fn list_fetcher(&self) -> Fetcher {
        let store = self.store.clone();
        let options = ListOptions::default().batch(self.batch);
        fetcher(move || {
            let store = store.clone();
            let options = options.clone();
            async move { store.list(Collection::Groups, &options).await }
        })
    }

    pub async fn list(&self) -> Result<Vec<Group>, StoreError> {
        let data = self.cache.fetch(&Self::key(), self.list_fetcher()).await?;
        decode_all(&data)
    }

    pub fn read(&self) -> Result<CachedList<Group>, StoreError> {
        self.cache.read(&Self::key(), self.list_fetcher()).decode()
    }

    pub fn observe(&self) -> Observer {
        self.cache.observe(&Self::key(), self.list_fetcher())
    }

    /// One group with its bookmarks expanded.
    pub async fn get_group(&self, id: &str) -> Result<Group, StoreError> {
        let expand = vec!["bookmarks".to_string()];
        decode(self.store.get_one(Collection::Groups, id, &expand).await?)
    }

    async fn get_plain(&self, id: &str) -> Result<Group, StoreError> {
        decode(self.store.get_one(Collection::Groups, id, &[]).await?)
    }

    /// Creates a group. Duplicate ids in `bookmark_ids` are collapsed.
    pub async fn create_group(
        &self,
        title: &str,
        pinned: bool,
        bookmark_ids: &[String],
    ) -> Result<Group, GroupError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(FormError::BlankTitle.into());
        }
        let draft = GroupDraft {
            title: title.to_string(),
            pinned,
            bookmarks: union_members(&[], bookmark_ids),
            user: self.user_id.clone(),
        };
        let record = self
            .store
            .create(Collection::Groups, serde_json::to_value(&draft).map_err(StoreError::from)?)
            .await?;
        let group: Group = decode(record)?;
        info!("created group '{}' with {} bookmark(s)", group.title, group.bookmarks.len());
        self.cache.invalidate(Collection::Groups);
        Ok(group)
    }

    /// Creates a new group holding the selected bookmarks.
    pub async fn create_group_with_selection(
        &self,
        title: &str,
        bookmark_ids: &[String],
    ) -> Result<Group, GroupError> {
        if bookmark_ids.is_empty() {
            return Err(FormError::EmptySelection.into());
        }
        self.create_group(title, false, bookmark_ids).await
    }

    /// Applies a partial update. A new membership list is deduplicated.
    pub async fn update_group(&self, id: &str, patch: &GroupPatch) -> Result<Group, GroupError> {
        let mut patch = patch.clone();
        if let Some(title) = &patch.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(FormError::BlankTitle.into());
            }
            patch.title = Some(title.to_string());
        }
        if let Some(members) = &patch.bookmarks {
            patch.bookmarks = Some(union_members(&[], members));
        }
        Ok(self.write(id, &patch).await?)
    }

    pub async fn toggle_pinned(&self, id: &str) -> Result<Group, StoreError> {
        let current = self.get_plain(id).await?;
        let patch = GroupPatch {
            pinned: Some(!current.pinned),
            ..Default::default()
        };
        self.write(id, &patch).await
    }

    /// Adds bookmarks to a group, keeping its membership free of duplicates.
    pub async fn add_bookmarks(&self, group_id: &str, bookmark_ids: &[String]) -> Result<Group, GroupError> {
        if bookmark_ids.is_empty() {
            return Err(FormError::EmptySelection.into());
        }
        let current = self.get_plain(group_id).await?;
        let merged = union_members(&current.bookmarks, bookmark_ids);
        if merged == current.bookmarks {
            debug!("group {} already lists every selected bookmark", group_id);
            return Ok(current);
        }
        let patch = GroupPatch {
            bookmarks: Some(merged),
            ..Default::default()
        };
        Ok(self.write(group_id, &patch).await?)
    }

    pub async fn remove_bookmark(&self, group_id: &str, bookmark_id: &str) -> Result<Group, StoreError> {
        let current = self.get_plain(group_id).await?;
        if !current.contains(bookmark_id) {
            return Ok(current);
        }
        let remaining: Vec<String> = current
            .bookmarks
            .into_iter()
            .filter(|b| b != bookmark_id)
            .collect();
        let patch = GroupPatch {
            bookmarks: Some(remaining),
            ..Default::default()
        };
        self.write(group_id, &patch).await
    }

    pub async fn delete_group(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(Collection::Groups, id).await?;
        info!("deleted group {}", id);
        self.cache.invalidate(Collection::Groups);
        Ok(())
    }

    async fn write(&self, id: &str, patch: &GroupPatch) -> Result<Group, StoreError> {
        let record = self
            .store
            .update(Collection::Groups, id, serde_json::to_value(patch)?)
            .await?;
        let group: Group = decode(record)?;
        self.cache.invalidate(Collection::Groups);
        Ok(group)
    }
}
