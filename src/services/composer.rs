//! Bookmark composition: turns a submitted form into stored records.
//!
//! `submit` runs its steps strictly in order: normalize the url, resolve the
//! category, resolve the tags, create the bookmark, then add it to each
//! selected group. Only the bookmark create can abort the flow. Labels created
//! before a failed create are kept, so the user can retry without losing them.
//! Group attaches fail individually and are reported without undoing anything.

use std::sync::Arc;

use log::{debug, info};

use crate::managers::bookmark_manager::BookmarkManager;
use crate::managers::group_manager::GroupManager;
use crate::managers::list_cache::ListCache;
use crate::managers::taxonomy_manager::TaxonomyManager;
use crate::services::notifier::{report_failure, report_success, Notifier};
use crate::services::reconciler::{LabelKind, Reconciler};
use crate::services::url::normalize_url;
use crate::types::bookmark::{Bookmark, BookmarkDraft, BookmarkPatch};
use crate::types::collection::Collection;
use crate::types::errors::{ComposeError, FormError};
use crate::types::form::BookmarkForm;
use crate::types::group::union_members;
use crate::types::label::LabelEntry;

/// Label ids resolved for one form.
#[derive(Debug, Clone, Default, PartialEq)]
struct ResolvedLabels {
    category: Option<String>,
    tags: Vec<String>,
}

pub struct BookmarkComposer {
    bookmarks: BookmarkManager,
    groups: GroupManager,
    taxonomy: TaxonomyManager,
    cache: ListCache,
    reconciler: Reconciler,
    notifier: Arc<dyn Notifier>,
    user_id: String,
}

impl BookmarkComposer {
    pub fn new(
        bookmarks: BookmarkManager,
        groups: GroupManager,
        taxonomy: TaxonomyManager,
        cache: ListCache,
        notifier: Arc<dyn Notifier>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            bookmarks,
            groups,
            taxonomy,
            cache,
            reconciler: Reconciler::new(notifier.clone()),
            notifier,
            user_id: user_id.into(),
        }
    }

    /// Creates a bookmark from `form` and resets the form on success.
    pub async fn submit(&self, form: &mut BookmarkForm) -> Result<Bookmark, ComposeError> {
        let url = self.validate(form)?;
        let labels = self.resolve_labels(form).await?;

        let draft = BookmarkDraft {
            url,
            description: form.description.trim().to_string(),
            category: labels.category,
            tags: labels.tags,
            starred: form.starred,
            open_source: form.open_source,
            user: self.user_id.clone(),
        };
        let bookmark = match self.bookmarks.create(&draft).await {
            Ok(bookmark) => bookmark,
            Err(e) => {
                report_failure(self.notifier.as_ref(), "Failed to create bookmark", &e);
                return Err(e.into());
            }
        };

        let new_id = [bookmark.id.clone()];
        for group_id in union_members(&[], &form.groups) {
            match self.groups.add_bookmarks(&group_id, &new_id).await {
                Ok(_) => debug!("added bookmark {} to group {}", bookmark.id, group_id),
                Err(e) => report_failure(
                    self.notifier.as_ref(),
                    &format!("Failed to add bookmark to group {}", group_id),
                    &e,
                ),
            }
        }

        self.cache.invalidate(Collection::Bookmarks);
        self.cache.invalidate(Collection::Groups);
        report_success(self.notifier.as_ref(), "Bookmark added");
        form.reset();
        Ok(bookmark)
    }

    /// Saves an edited bookmark. Url and labels go through the same policy
    /// as `submit`; group selections are not part of an edit.
    pub async fn save_edit(&self, id: &str, form: &BookmarkForm) -> Result<Bookmark, ComposeError> {
        let url = self.validate(form)?;
        let labels = self.resolve_labels(form).await?;

        let patch = BookmarkPatch {
            url: Some(url),
            description: Some(form.description.trim().to_string()),
            category: Some(labels.category),
            tags: Some(labels.tags),
            starred: Some(form.starred),
            open_source: Some(form.open_source),
        };
        match self.bookmarks.update(id, &patch).await {
            Ok(bookmark) => {
                info!("saved edit of bookmark {}", id);
                report_success(self.notifier.as_ref(), "Bookmark updated");
                Ok(bookmark)
            }
            Err(e) => {
                report_failure(self.notifier.as_ref(), "Failed to update bookmark", &e);
                Err(e.into())
            }
        }
    }

    /// Prefills the edit form for a stored bookmark.
    pub async fn edit_form(&self, id: &str) -> Result<BookmarkForm, ComposeError> {
        let bookmark = self.bookmarks.get(id).await?;
        let tags = self.taxonomy.tags().await?;
        let categories = self.taxonomy.categories().await?;
        Ok(BookmarkForm::from_bookmark(&bookmark, &tags, &categories))
    }

    fn validate(&self, form: &BookmarkForm) -> Result<String, ComposeError> {
        if self.user_id.is_empty() {
            return Err(ComposeError::MissingOwner);
        }
        normalize_url(&form.url).map_err(|e: FormError| {
            report_failure(self.notifier.as_ref(), "Invalid bookmark", &e);
            ComposeError::from(e)
        })
    }

    /// Resolves the category, then the tags. Existing labels are only fetched
    /// when the form holds a pending label.
    async fn resolve_labels(&self, form: &BookmarkForm) -> Result<ResolvedLabels, ComposeError> {
        let category_pending = form.category.as_ref().map(LabelEntry::is_pending).unwrap_or(false);
        let categories = if category_pending {
            self.taxonomy.categories().await?
        } else {
            Vec::new()
        };
        let taxonomy = self.taxonomy.clone();
        let category = self
            .reconciler
            .reconcile_one(LabelKind::Category, form.category.clone(), &categories, move |text| {
                let taxonomy = taxonomy.clone();
                async move { taxonomy.create_category(&text, true).await }
            })
            .await
            .first_id();

        let tags = if form.tags.iter().any(LabelEntry::is_pending) {
            self.taxonomy.tags().await?
        } else {
            Vec::new()
        };
        let taxonomy = self.taxonomy.clone();
        let tags = self
            .reconciler
            .reconcile(LabelKind::Tag, form.tags.clone(), &tags, move |text| {
                let taxonomy = taxonomy.clone();
                async move { taxonomy.create_tag(&text).await }
            })
            .await
            .ids();

        Ok(ResolvedLabels { category, tags })
    }
}
