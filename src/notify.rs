//! Report delivery — fire-and-forget push of the rendered document.

use crate::config::NotifyConfig;
use crate::session::Session;

/// Deliver the rendered report to the configured notify chat.
///
/// Delivery failures are logged and swallowed: the report itself never
/// reflects whether its own delivery worked.
pub async fn deliver(session: &dyn Session, config: &NotifyConfig, document: &str) {
    if !config.enabled {
        eprintln!("[notify] delivery disabled, skipping");
        return;
    }

    if config.chat.is_empty() {
        eprintln!("[notify] no notify.chat configured, skipping delivery");
        return;
    }

    match session
        .send_formatted(&config.chat, document, &config.parse_mode)
        .await
    {
        Ok(()) => eprintln!("[notify] report delivered to {}", config.chat),
        Err(e) => eprintln!("[notify] report delivery failed: {e}"),
    }
}
