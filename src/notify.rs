//! Notification surface for the charging-in-progress notice
//!
//! One persistent notification is shown while a session is active, using a
//! fixed channel and notification identifier, and dismissed when the session
//! stops or is cancelled. The platform display itself sits behind a trait so
//! the session manager stays testable.

use crate::error::Result;
use crate::logging::get_logger;
use uuid::Uuid;

/// Notification channel the charging notice is posted on
pub const CHANNEL_ID: &str = "chargelog.charging";

/// Identifier of the single persistent charging notification
pub const NOTIFICATION_ID: u32 = 1001;

/// Sink for the charging-in-progress notification
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Show the persistent notification for a started session
    async fn show_charging(&self, vehicle_label: &str, session_id: Uuid) -> Result<()>;

    /// Dismiss the notification when the session ends
    async fn dismiss(&self) -> Result<()>;
}

/// Default sink that records the notification through the structured logger
pub struct LogNotifier {
    logger: crate::logging::StructuredLogger,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self {
            logger: get_logger("notify"),
        }
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NotificationSink for LogNotifier {
    async fn show_charging(&self, vehicle_label: &str, session_id: Uuid) -> Result<()> {
        self.logger.info(&format!(
            "Charging in progress for {} (session {}, channel {}, id {})",
            vehicle_label, session_id, CHANNEL_ID, NOTIFICATION_ID
        ));
        Ok(())
    }

    async fn dismiss(&self) -> Result<()> {
        self.logger.info(&format!(
            "Charging notification dismissed (channel {}, id {})",
            CHANNEL_ID, NOTIFICATION_ID
        ));
        Ok(())
    }
}

/// Sink used when notifications are disabled in configuration
pub struct NullNotifier;

#[async_trait::async_trait]
impl NotificationSink for NullNotifier {
    async fn show_charging(&self, _vehicle_label: &str, _session_id: Uuid) -> Result<()> {
        Ok(())
    }

    async fn dismiss(&self) -> Result<()> {
        Ok(())
    }
}
