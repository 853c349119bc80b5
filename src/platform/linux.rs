// Linkshelf config path for Linux: $XDG_CONFIG_HOME/linkshelf or ~/.config/linkshelf

use std::env;
use std::path::PathBuf;

pub fn get_config_dir() -> PathBuf {
    config_dir_from(env::var("XDG_CONFIG_HOME").ok(), env::var("HOME").ok())
}

/// An empty `XDG_CONFIG_HOME` counts as unset.
fn config_dir_from(xdg: Option<String>, home: Option<String>) -> PathBuf {
    match xdg.filter(|x| !x.is_empty()) {
        Some(xdg) => PathBuf::from(xdg).join("linkshelf"),
        None => {
            let home = home.unwrap_or_else(|| String::from("/tmp"));
            PathBuf::from(home).join(".config").join("linkshelf")
        }
    }
}
