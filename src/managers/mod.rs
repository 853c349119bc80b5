// Linkshelf state managers
// The list cache plus one manager per record collection family.

pub mod bookmark_manager;
pub mod group_manager;
pub mod list_cache;
pub mod taxonomy_manager;
