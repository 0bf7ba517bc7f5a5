//! Failure notifications.
//!
//! When a harvest run fails, the users of the owning organization get
//! one message naming the source, throttled per recipient so a job
//! that fails on every scheduled run does not flood inboxes.

pub mod ckan;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::NotifyConfig;
use crate::error::Result;
use crate::models::HarvestJob;
use crate::storage::CatalogStore;

pub use ckan::CkanClient;

/// Outbound notification transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()>;
}

/// Notifier that writes to the log instead of a mail transport.
pub struct LogNotifier {
    sender: String,
}

impl LogNotifier {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }

    pub fn from_config(config: &NotifyConfig) -> Self {
        Self::new(config.sender.clone())
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()> {
        log::info!(
            "Notification from {} to {}: {} / {}",
            self.sender,
            recipients.join(", "),
            subject,
            body.lines().next().unwrap_or("")
        );
        Ok(())
    }
}

/// Per-recipient rate limiter with a TTL window.
pub struct NotificationThrottle {
    window: Duration,
    sent: Mutex<HashMap<String, Instant>>,
}

impl NotificationThrottle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            sent: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &NotifyConfig) -> Self {
        Self::new(Duration::from_secs(config.throttle_secs))
    }

    /// True if this recipient may be mailed now; a `true` result
    /// starts (or restarts) the recipient's quiet window.
    pub fn allow(&self, recipient: &str) -> bool {
        let mut sent = self.sent.lock().unwrap();
        let now = Instant::now();
        if let Some(last) = sent.get(recipient) {
            if now.duration_since(*last) < self.window {
                return false;
            }
        }
        sent.insert(recipient.to_string(), now);
        true
    }
}

/// Mail every user of the job's organization about a failed run,
/// subject to the per-recipient throttle. No recipients, no message.
pub async fn send_failure_notifications(
    store: &dyn CatalogStore,
    notifier: &dyn Notifier,
    throttle: &NotificationThrottle,
    job: &HarvestJob,
) -> Result<()> {
    let users = store.users_in_organization(&job.organization).await?;
    let recipients: Vec<String> = users
        .iter()
        .filter_map(|u| u.primary_email())
        .map(String::from)
        .filter(|email| throttle.allow(email))
        .collect();
    if recipients.is_empty() {
        return Ok(());
    }

    for recipient in &recipients {
        log::info!("Sending a notification to {}", recipient);
    }
    let body = format!(
        "We were unable to harvest from the harvest source {}. \
         Please verify that the source URL is correct and contains \
         valid XML documents.\n\nThanks!\nThe Catalog Harvester",
        job.url
    );
    notifier
        .send(&recipients, "Failed to correctly harvest", &body)
        .await
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;
    use crate::models::{HarvestType, User};
    use crate::storage::MemoryStore;

    #[test]
    fn test_throttle_blocks_within_window() {
        let throttle = NotificationThrottle::new(Duration::from_secs(3600));
        assert!(throttle.allow("ops@example.com"));
        assert!(!throttle.allow("ops@example.com"));
        assert!(throttle.allow("other@example.com"));
    }

    #[test]
    fn test_throttle_reopens_after_window() {
        let throttle = NotificationThrottle::new(Duration::from_millis(10));
        assert!(throttle.allow("ops@example.com"));
        std::thread::sleep(Duration::from_millis(20));
        assert!(throttle.allow("ops@example.com"));
    }

    #[tokio::test]
    async fn test_failure_notification_goes_to_organization_users() {
        let store = MemoryStore::new();
        store.add_user(User {
            organization: "neracoos".into(),
            emails: vec!["ops@example.com".into()],
        });
        store.add_user(User {
            organization: "someone-else".into(),
            emails: vec!["other@example.com".into()],
        });

        let notifier = RecordingNotifier::new();
        let throttle = NotificationThrottle::new(Duration::from_secs(3600));
        let job = HarvestJob::new(
            "h1",
            "neracoos waf",
            "http://waf.example.com/",
            HarvestType::Waf,
            "neracoos",
        );

        send_failure_notifications(&store, &notifier, &throttle, &job)
            .await
            .unwrap();

        let messages = notifier.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        let (recipients, subject, body) = &messages[0];
        assert_eq!(recipients, &vec!["ops@example.com".to_string()]);
        assert_eq!(subject, "Failed to correctly harvest");
        assert!(body.contains("http://waf.example.com/"));
    }

    #[tokio::test]
    async fn test_failure_notification_is_throttled() {
        let store = MemoryStore::new();
        store.add_user(User {
            organization: "neracoos".into(),
            emails: vec!["ops@example.com".into()],
        });

        let notifier = RecordingNotifier::new();
        let throttle = NotificationThrottle::new(Duration::from_secs(3600));
        let job = HarvestJob::new(
            "h1",
            "neracoos waf",
            "http://waf.example.com/",
            HarvestType::Waf,
            "neracoos",
        );

        send_failure_notifications(&store, &notifier, &throttle, &job)
            .await
            .unwrap();
        send_failure_notifications(&store, &notifier, &throttle, &job)
            .await
            .unwrap();
        assert_eq!(notifier.message_count(), 1);
    }

    #[tokio::test]
    async fn test_no_users_sends_nothing() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let throttle = NotificationThrottle::new(Duration::from_secs(3600));
        let job = HarvestJob::new(
            "h1",
            "lonely",
            "http://waf.example.com/",
            HarvestType::Waf,
            "empty-org",
        );

        send_failure_notifications(&store, &notifier, &throttle, &job)
            .await
            .unwrap();
        assert_eq!(notifier.message_count(), 0);
    }
}
