//! App Core for Linkshelf.
//!
//! Owns the record store, the list cache, the notifier and every manager, and
//! hands them to each other explicitly. The cache lives exactly as long as the
//! `App`: `startup` begins with an empty cache and `shutdown` drops it.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};

use crate::managers::bookmark_manager::BookmarkManager;
use crate::managers::group_manager::GroupManager;
use crate::managers::list_cache::ListCache;
use crate::managers::taxonomy_manager::TaxonomyManager;
use crate::remote::RecordStore;
use crate::services::composer::BookmarkComposer;
use crate::services::notifier::{CollectingNotifier, Notifier};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::notice::Notice;
use crate::types::settings::ClientSettings;

pub struct App {
    pub store: Arc<dyn RecordStore>,
    pub cache: ListCache,
    pub notices: Arc<CollectingNotifier>,
    pub bookmarks: BookmarkManager,
    pub groups: GroupManager,
    pub taxonomy: TaxonomyManager,
    pub composer: BookmarkComposer,
    settings_engine: Mutex<SettingsEngine>,
}

impl App {
    /// Wires the managers around `store` using the engine's current settings.
    pub fn new(store: Arc<dyn RecordStore>, settings_engine: SettingsEngine) -> Self {
        let settings = settings_engine.get_settings().clone();
        let user_id = settings.account.user_id.clone();
        let batch = settings.fetch.batch_size;

        let cache = ListCache::new();
        let notices = Arc::new(CollectingNotifier::new());
        let notifier: Arc<dyn Notifier> = notices.clone();

        let bookmarks = BookmarkManager::new(store.clone(), cache.clone(), notifier.clone(), batch);
        let groups = GroupManager::new(store.clone(), cache.clone(), user_id.clone(), batch);
        let taxonomy = TaxonomyManager::new(store.clone(), cache.clone(), user_id.clone(), batch);
        let composer = BookmarkComposer::new(
            bookmarks.clone(),
            groups.clone(),
            taxonomy.clone(),
            cache.clone(),
            notifier,
            user_id,
        );

        Self {
            store,
            cache,
            notices,
            bookmarks,
            groups,
            taxonomy,
            composer,
            settings_engine: Mutex::new(settings_engine),
        }
    }

    /// Loads settings and connects to the configured backend over HTTP.
    #[cfg(feature = "network")]
    pub fn connect(mut settings_engine: SettingsEngine) -> Result<Self, crate::types::errors::AppError> {
        let settings = settings_engine.load()?;
        let store = crate::remote::http::HttpRecordStore::new(&settings)?;
        info!("using record backend at {}", settings.server.base_url);
        Ok(Self::new(Arc::new(store), settings_engine))
    }

    /// Locked access to the settings engine. Never held across an await.
    pub fn settings_engine(&self) -> MutexGuard<'_, SettingsEngine> {
        self.settings_engine.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn settings(&self) -> ClientSettings {
        self.settings_engine().get_settings().clone()
    }

    /// Startup sequence: start from an empty cache and check the account.
    pub fn startup(&self) {
        self.cache.clear();
        let settings = self.settings();
        if settings.account.user_id.is_empty() {
            warn!("no account configured; records cannot be created");
        } else {
            info!("linkshelf ready for user {}", settings.account.user_id);
        }
    }

    /// Shutdown sequence: drop every cached list and pending notice.
    pub fn shutdown(&self) {
        self.cache.clear();
        self.notices.drain();
        info!("linkshelf shut down");
    }

    /// Notices raised since the last call, oldest first.
    pub fn drain_notices(&self) -> Vec<Notice> {
        self.notices.drain()
    }
}
