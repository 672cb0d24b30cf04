pub mod webhook;

pub use webhook::WebhookNotifier;

use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use audiohook_common::{FlatRecord, JobToken};
use std::sync::Arc;

/// A destination for processed records.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, token: JobToken, record: &FlatRecord) -> Result<()>;
}

/// Writes a one-line summary of each record to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, token: JobToken, record: &FlatRecord) -> Result<()> {
        let field = |key: &str| {
            record
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or("-")
                .to_string()
        };
        tracing::info!(
            token = %token,
            title = %field("title"),
            authors = %field("authors"),
            source = %field("source"),
            asin = %field("asin"),
            "Record ready"
        );
        Ok(())
    }
}

/// Manages all notification targets
pub struct NotificationManager {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotificationManager {
    pub fn new(config: &Config) -> Self {
        let mut notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(LogNotifier)];
        notifiers.extend(
            config
                .notifiers
                .iter()
                .filter(|n| n.enabled)
                .map(|n| Arc::new(WebhookNotifier::new(n)) as Arc<dyn Notifier>),
        );
        Self { notifiers }
    }

    pub fn with_notifiers(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    /// Hand `record` to every target.
    /// This method is fire-and-forget - errors are logged but not propagated.
    pub async fn notify_all(&self, token: JobToken, record: &FlatRecord) {
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(token, record).await {
                tracing::warn!(
                    token = %token,
                    notifier = notifier.name(),
                    "Failed to notify '{}': {}",
                    notifier.name(),
                    e
                );
            }
        }
    }

    /// Check if there are any notification targets
    pub fn has_targets(&self) -> bool {
        !self.notifiers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotifierConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Failing(Arc<AtomicUsize>);

    #[async_trait]
    impl Notifier for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        async fn notify(&self, _token: JobToken, _record: &FlatRecord) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("unreachable host")
        }
    }

    #[tokio::test]
    async fn failures_do_not_stop_other_targets() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = NotificationManager::with_notifiers(vec![
            Arc::new(Failing(Arc::clone(&calls))),
            Arc::new(Failing(Arc::clone(&calls))),
        ]);
        manager.notify_all(JobToken::new(), &FlatRecord::new()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn disabled_notifiers_are_skipped() {
        let mut config = Config::default();
        config.notifiers.push(NotifierConfig {
            name: "on".into(),
            url: "http://localhost/on".into(),
            enabled: true,
        });
        config.notifiers.push(NotifierConfig {
            name: "off".into(),
            url: "http://localhost/off".into(),
            enabled: false,
        });
        let manager = NotificationManager::new(&config);
        assert_eq!(manager.notifiers.len(), 2);
        assert!(manager.has_targets());
    }
}
