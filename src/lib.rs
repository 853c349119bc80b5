//! Linkshelf: client core of a bookmark manager backed by a hosted record store.
//!
//! The crate resolves typed tag and category labels to records, keeps cached
//! lists coherent across mutations and composes bookmark submissions. The
//! `linkshelf-rpc` binary exposes it to a view layer over JSON-RPC.

pub mod app;
pub mod managers;
pub mod platform;
pub mod remote;
pub mod rpc_handler;
pub mod services;
pub mod types;
