//! Bookmark Manager for Linkshelf.
//!
//! Reads bookmark lists through the shared `ListCache`, keyed by the active
//! filters, and performs bookmark mutations against the record store. Each
//! successful mutation ends by invalidating `bookmarks`.
//!
//! Deleting a bookmark also detaches it from every group that lists it. Each
//! detach is independent: a failure is reported and the remaining groups are
//! still updated.

use std::sync::Arc;

use log::{info, warn};
use serde_json::{json, Value};

use super::list_cache::{fetcher, CachedList, Fetcher, ListCache, Observer};
use crate::remote::{decode, decode_all, ListOptions, RecordStore};
use crate::services::notifier::{report_failure, Notifier};
use crate::services::query_builder::{bookmark_key, build_query, BOOKMARK_EXPAND};
use crate::services::url::display_url;
use crate::types::bookmark::{Bookmark, BookmarkDraft, BookmarkPatch};
use crate::types::collection::Collection;
use crate::types::errors::StoreError;
use crate::types::group::Group;
use crate::types::query::{BookmarkFilters, BookmarkQuery, Clause, FilterExpression};

/// Endpoint that drafts a description for a url.
pub const DESCRIPTION_ENDPOINT: &str = "/api/generate-description";

/// Result of a bookmark deletion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOutcome {
    /// Groups the bookmark was removed from.
    pub detached: Vec<String>,
    /// Groups that still list the bookmark because their update failed.
    pub failed: Vec<String>,
}

#[derive(Clone)]
pub struct BookmarkManager {
    store: Arc<dyn RecordStore>,
    cache: ListCache,
    notifier: Arc<dyn Notifier>,
    batch: u32,
}

impl BookmarkManager {
    pub fn new(
        store: Arc<dyn RecordStore>,
        cache: ListCache,
        notifier: Arc<dyn Notifier>,
        batch: u32,
    ) -> Self {
        Self {
            store,
            cache,
            notifier,
            batch,
        }
    }

    /// Builds the fetch for one filter selection. Search text routes to the
    /// store's full-text path and ignores the structured filters.
    fn list_fetcher(&self, filters: &BookmarkFilters) -> Fetcher {
        let store = self.store.clone();
        match build_query(filters) {
            BookmarkQuery::Search(text) => fetcher(move || {
                let store = store.clone();
                let text = text.clone();
                async move { store.search(Collection::Bookmarks, &text).await }
            }),
            BookmarkQuery::Filter(expr) => {
                let options = ListOptions::filtered(expr.to_string())
                    .expand(&BOOKMARK_EXPAND)
                    .batch(self.batch);
                fetcher(move || {
                    let store = store.clone();
                    let options = options.clone();
                    async move { store.list(Collection::Bookmarks, &options).await }
                })
            }
        }
    }

    /// Non-blocking read of the list for `filters`. While a new selection
    /// loads, the previous list is returned as a placeholder.
    pub fn read(&self, filters: &BookmarkFilters) -> Result<CachedList<Bookmark>, StoreError> {
        self.cache
            .read(&bookmark_key(filters), self.list_fetcher(filters))
            .decode()
    }

    /// Keeps the list for `filters` refreshed across invalidations while the
    /// returned guard lives.
    pub fn observe(&self, filters: &BookmarkFilters) -> Observer {
        self.cache
            .observe(&bookmark_key(filters), self.list_fetcher(filters))
    }

    /// Fresh list for `filters`, fetched inline on a cache miss.
    pub async fn list(&self, filters: &BookmarkFilters) -> Result<Vec<Bookmark>, StoreError> {
        let data = self
            .cache
            .fetch(&bookmark_key(filters), self.list_fetcher(filters))
            .await?;
        decode_all(&data)
    }

    /// Full-text search, cached under `bookmarks` like any other list.
    pub async fn search(&self, text: &str) -> Result<Vec<Bookmark>, StoreError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let filters = BookmarkFilters {
            search: text.to_string(),
            ..Default::default()
        };
        self.list(&filters).await
    }

    pub async fn get(&self, id: &str) -> Result<Bookmark, StoreError> {
        let expand: Vec<String> = BOOKMARK_EXPAND.iter().map(|r| r.to_string()).collect();
        decode(self.store.get_one(Collection::Bookmarks, id, &expand).await?)
    }

    pub async fn create(&self, draft: &BookmarkDraft) -> Result<Bookmark, StoreError> {
        let record = self
            .store
            .create(Collection::Bookmarks, serde_json::to_value(draft)?)
            .await?;
        let bookmark: Bookmark = decode(record)?;
        info!("created bookmark {} ({})", bookmark.url, bookmark.id);
        self.cache.invalidate(Collection::Bookmarks);
        Ok(bookmark)
    }

    pub async fn update(&self, id: &str, patch: &BookmarkPatch) -> Result<Bookmark, StoreError> {
        let record = self
            .store
            .update(Collection::Bookmarks, id, serde_json::to_value(patch)?)
            .await?;
        let bookmark: Bookmark = decode(record)?;
        self.cache.invalidate(Collection::Bookmarks);
        Ok(bookmark)
    }

    /// Flips `starred` based on the stored value.
    pub async fn toggle_starred(&self, id: &str) -> Result<Bookmark, StoreError> {
        let current: Bookmark = decode(self.store.get_one(Collection::Bookmarks, id, &[]).await?)?;
        let patch = BookmarkPatch {
            starred: Some(!current.starred),
            ..Default::default()
        };
        self.update(id, &patch).await
    }

    /// Deletes the bookmark, then removes its id from every group listing it.
    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome, StoreError> {
        self.store.delete(Collection::Bookmarks, id).await?;
        info!("deleted bookmark {}", id);
        self.cache.invalidate(Collection::Bookmarks);

        let outcome = self.detach_from_groups(id).await;
        if !outcome.detached.is_empty() {
            self.cache.invalidate(Collection::Groups);
        }
        Ok(outcome)
    }

    async fn detach_from_groups(&self, id: &str) -> DeleteOutcome {
        let mut outcome = DeleteOutcome::default();
        let filter = FilterExpression::new().and(Clause::AnyOf {
            relation: "bookmarks".to_string(),
            ids: vec![id.to_string()],
        });
        let options = ListOptions::filtered(filter.to_string()).batch(self.batch);

        let listed = self.store.list(Collection::Groups, &options).await;
        let groups: Vec<Group> = match listed.and_then(|records| decode_all(&records)) {
            Ok(groups) => groups,
            Err(e) => {
                report_failure(self.notifier.as_ref(), "Failed to update groups", &e);
                return outcome;
            }
        };

        for group in groups.into_iter().filter(|g| g.contains(id)) {
            let remaining: Vec<&String> = group.bookmarks.iter().filter(|b| *b != id).collect();
            match self
                .store
                .update(Collection::Groups, &group.id, json!({ "bookmarks": remaining }))
                .await
            {
                Ok(_) => outcome.detached.push(group.id.clone()),
                Err(e) => {
                    warn!("group {} still lists deleted bookmark {}", group.id, id);
                    report_failure(
                        self.notifier.as_ref(),
                        &format!("Failed to remove bookmark from \"{}\"", group.title),
                        &e,
                    );
                    outcome.failed.push(group.id.clone());
                }
            }
        }
        outcome
    }

    /// Asks the backend to draft a short description of the site at `url`.
    pub async fn generate_description(&self, url: &str) -> Result<String, StoreError> {
        let response = self
            .store
            .send(DESCRIPTION_ENDPOINT, json!({ "url": display_url(url.trim()) }))
            .await?;
        match response {
            Value::String(text) => Ok(text.trim().to_string()),
            Value::Object(obj) => obj
                .get("description")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .ok_or_else(|| StoreError::Decode("description missing from response".to_string())),
            other => Err(StoreError::Decode(format!("unexpected description response: {}", other))),
        }
    }
}
