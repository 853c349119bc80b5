//! RPC method handler for the Linkshelf JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be tested without stdin/stdout.
//! `handle_method` dispatches one call to the managers owned by `App`.
//! Failed mutations are also reported as notices; the view fetches them with
//! `notices.drain`.

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::app::App;
use crate::services::notifier::report_failure;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::errors::RpcError;
use crate::types::form::{BookmarkForm, WireBookmarkForm};
use crate::types::group::GroupPatch;
use crate::types::query::BookmarkFilters;

fn str_param<'a>(params: &'a Value, name: &'static str) -> Result<&'a str, RpcError> {
    params
        .get(name)
        .and_then(Value::as_str)
        .ok_or(RpcError::MissingParam(name))
}

fn param<T: DeserializeOwned>(params: &Value, name: &'static str) -> Result<T, RpcError> {
    let value = params.get(name).cloned().ok_or(RpcError::MissingParam(name))?;
    serde_json::from_value(value).map_err(|e| RpcError::InvalidParams(format!("{}: {}", name, e)))
}

fn opt_param<T: DeserializeOwned>(params: &Value, name: &'static str) -> Result<Option<T>, RpcError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => param(params, name).map(Some),
    }
}

/// Accepts the typed form and the `{id, text}` shape with sentinel ids.
fn form_param(params: &Value) -> Result<BookmarkForm, RpcError> {
    let value = params.get("form").cloned().ok_or(RpcError::MissingParam("form"))?;
    if let Ok(form) = serde_json::from_value::<BookmarkForm>(value.clone()) {
        return Ok(form);
    }
    serde_json::from_value::<WireBookmarkForm>(value)
        .map(BookmarkForm::from)
        .map_err(|e| RpcError::InvalidParams(format!("form: {}", e)))
}

fn filters_param(params: &Value) -> Result<BookmarkFilters, RpcError> {
    Ok(opt_param(params, "filters")?.unwrap_or_default())
}

fn to_json<T: Serialize>(value: T) -> Result<Value, RpcError> {
    Ok(serde_json::to_value(value)?)
}

/// Surfaces a failed direct mutation to the user before returning it.
fn reported<T, E: Display>(app: &App, title: &str, result: Result<T, E>) -> Result<T, E> {
    if let Err(e) = &result {
        report_failure(app.notices.as_ref(), title, e);
    }
    result
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
pub async fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, RpcError> {
    match method {
        "ping" => Ok(json!({"pong": true})),
        "notices.drain" => to_json(app.drain_notices()),

        // ─── Bookmarks ───
        "bookmark.list" => to_json(app.bookmarks.list(&filters_param(params)?).await?),
        "bookmark.read" => to_json(app.bookmarks.read(&filters_param(params)?)?),
        "bookmark.search" => to_json(app.bookmarks.search(str_param(params, "text")?).await?),
        "bookmark.get" => to_json(app.bookmarks.get(str_param(params, "id")?).await?),
        "bookmark.create" => {
            let mut form = form_param(params)?;
            let bookmark = app.composer.submit(&mut form).await?;
            Ok(json!({"bookmark": to_json(bookmark)?, "form": to_json(form)?}))
        }
        "bookmark.edit_form" => to_json(app.composer.edit_form(str_param(params, "id")?).await?),
        "bookmark.update" => {
            let id = str_param(params, "id")?;
            let form = form_param(params)?;
            to_json(app.composer.save_edit(id, &form).await?)
        }
        "bookmark.toggle_starred" => {
            let result = app.bookmarks.toggle_starred(str_param(params, "id")?).await;
            to_json(reported(app, "Failed to update bookmark", result)?)
        }
        "bookmark.delete" => {
            let result = app.bookmarks.delete(str_param(params, "id")?).await;
            let outcome = reported(app, "Failed to delete bookmark", result)?;
            Ok(json!({"ok": true, "detached": outcome.detached, "failed": outcome.failed}))
        }
        "bookmark.generate_description" => {
            let result = app.bookmarks.generate_description(str_param(params, "url")?).await;
            let text = reported(app, "Failed to generate description", result)?;
            Ok(json!({"description": text}))
        }

        // ─── Groups ───
        "group.list" => to_json(app.groups.list().await?),
        "group.read" => to_json(app.groups.read()?),
        "group.get" => to_json(app.groups.get_group(str_param(params, "id")?).await?),
        "group.create" => {
            let title = str_param(params, "title")?;
            let pinned = opt_param(params, "pinned")?.unwrap_or(false);
            let members: Vec<String> = opt_param(params, "bookmarks")?.unwrap_or_default();
            let result = app.groups.create_group(title, pinned, &members).await;
            to_json(reported(app, "Failed to create group", result)?)
        }
        "group.create_with_selection" => {
            let title = str_param(params, "title")?;
            let members: Vec<String> = param(params, "bookmarks")?;
            let result = app.groups.create_group_with_selection(title, &members).await;
            to_json(reported(app, "Failed to create group", result)?)
        }
        "group.update" => {
            let id = str_param(params, "id")?;
            let patch = GroupPatch {
                title: opt_param(params, "title")?,
                pinned: opt_param(params, "pinned")?,
                bookmarks: opt_param(params, "bookmarks")?,
            };
            let result = app.groups.update_group(id, &patch).await;
            to_json(reported(app, "Failed to update group", result)?)
        }
        "group.add_bookmarks" => {
            let id = str_param(params, "id")?;
            let members: Vec<String> = param(params, "bookmarks")?;
            let result = app.groups.add_bookmarks(id, &members).await;
            to_json(reported(app, "Failed to add bookmarks to group", result)?)
        }
        "group.remove_bookmark" => {
            let id = str_param(params, "id")?;
            let bookmark = str_param(params, "bookmark")?;
            let result = app.groups.remove_bookmark(id, bookmark).await;
            to_json(reported(app, "Failed to update group", result)?)
        }
        "group.toggle_pinned" => {
            let result = app.groups.toggle_pinned(str_param(params, "id")?).await;
            to_json(reported(app, "Failed to update group", result)?)
        }
        "group.delete" => {
            let result = app.groups.delete_group(str_param(params, "id")?).await;
            reported(app, "Failed to delete group", result)?;
            Ok(json!({"ok": true}))
        }

        // ─── Tags ───
        "tag.list" => to_json(app.taxonomy.tags().await?),
        "tag.create" => {
            let label = crate::managers::taxonomy_manager::clean_label(str_param(params, "label")?)?;
            let result = app.taxonomy.create_tag(&label).await;
            to_json(reported(app, "Failed to create tag", result)?)
        }
        "tag.rename" => {
            let id = str_param(params, "id")?;
            let label = crate::managers::taxonomy_manager::clean_label(str_param(params, "label")?)?;
            let result = app.taxonomy.rename_tag(id, &label).await;
            to_json(reported(app, "Failed to rename tag", result)?)
        }
        "tag.delete" => {
            let result = app.taxonomy.delete_tag(str_param(params, "id")?).await;
            reported(app, "Failed to delete tag", result)?;
            Ok(json!({"ok": true}))
        }

        // ─── Categories ───
        "category.list" => to_json(app.taxonomy.categories().await?),
        "category.create" => {
            let label = crate::managers::taxonomy_manager::clean_label(str_param(params, "label")?)?;
            let result = app.taxonomy.create_category(&label, true).await;
            to_json(reported(app, "Failed to create category", result)?)
        }
        "category.rename" => {
            let id = str_param(params, "id")?;
            let label = crate::managers::taxonomy_manager::clean_label(str_param(params, "label")?)?;
            let result = app.taxonomy.rename_category(id, &label).await;
            to_json(reported(app, "Failed to rename category", result)?)
        }
        "category.delete" => {
            let result = app.taxonomy.delete_category(str_param(params, "id")?).await;
            reported(app, "Failed to delete category", result)?;
            Ok(json!({"ok": true}))
        }

        // ─── Settings ───
        "settings.get" => to_json(app.settings()),
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or(RpcError::MissingParam("value"))?;
            app.settings_engine().set_value(key, value)?;
            Ok(json!({"ok": true}))
        }

        _ => Err(RpcError::UnknownMethod(method.to_string())),
    }
}
