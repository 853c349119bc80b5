//! Transient user notifications ("toasts").
//!
//! Failures are always logged before they are shown; `report_failure` does both.

use std::fmt::Display;
use std::sync::Mutex;

use log::{debug, error, info};

use crate::types::notice::Notice;

/// Delivers notices to whatever surface shows them to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Logs a failure for diagnostics and shows it to the user.
pub fn report_failure(notifier: &dyn Notifier, title: &str, err: &dyn Display) {
    error!("{}: {}", title, err);
    notifier.notify(Notice::error(title, err.to_string()));
}

/// Shows a success message.
pub fn report_success(notifier: &dyn Notifier, title: impl Into<String>) {
    let title = title.into();
    info!("{}", title);
    notifier.notify(Notice::success(title));
}

/// Notifier with no view attached; notices only reach the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        debug!("notice: {:?}", notice);
    }
}

/// Buffers notices until the view layer drains them, e.g. into an RPC response.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every buffered notice, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.notices.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn errors(&self) -> Vec<Notice> {
        self.snapshot().into_iter().filter(Notice::is_error).collect()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notice);
    }
}
