//! Notifier that routes user-visible notices into the log.

use crate::infrastructure::ports::{Notice, NoticeLevel, NotifierPort};

/// Used by the terminal binary, where the log is the only surface.
pub struct TracingNotifier;

impl NotifierPort for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Warning => tracing::warn!(message = %notice.message, "notice"),
            NoticeLevel::Error => tracing::error!(message = %notice.message, "notice"),
        }
    }
}
