// Linkshelf services
// Stateless logic the managers and the RPC surface build on: label
// reconciliation, query building, bookmark composition, notifications,
// settings and the url policy.

pub mod composer;
pub mod notifier;
pub mod query_builder;
pub mod reconciler;
pub mod settings_engine;
pub mod url;
