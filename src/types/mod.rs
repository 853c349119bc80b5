// Linkshelf shared type definitions
// Each submodule defines records, drafts and value types used across the crate.

pub mod bookmark;
pub mod collection;
pub mod errors;
pub mod form;
pub mod group;
pub mod label;
pub mod notice;
pub mod query;
pub mod settings;
pub mod taxonomy;
