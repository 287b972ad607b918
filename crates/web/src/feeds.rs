//! Live dashboard feeds.
//!
//! Each feed is a background task that refreshes one API read on a fixed
//! interval and publishes the latest successful result through a
//! `tokio::sync::watch` channel. Handlers read the current snapshot instead
//! of hitting the API on every page poll.
//!
//! A failed refresh is logged and leaves the previous snapshot in place, so
//! a flaky API never blanks the dashboard. Dropping a feed aborts its task.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use sellapp_core::models::{Alert, AuditLogEntry, QuickStats};

use crate::api::{ApiClient, ApiError};
use crate::config::PollIntervals;

/// A feed value and when it was fetched.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<T> {
    pub data: T,
    pub refreshed_at: DateTime<Utc>,
}

type Slot<T> = Option<Arc<Snapshot<T>>>;

/// One periodically refreshed value.
pub struct LiveFeed<T> {
    name: &'static str,
    receiver: watch::Receiver<Slot<T>>,
    task: JoinHandle<()>,
}

impl<T> std::fmt::Debug for LiveFeed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveFeed")
            .field("name", &self.name)
            .field("running", &!self.task.is_finished())
            .finish_non_exhaustive()
    }
}

impl<T> LiveFeed<T>
where
    T: Send + Sync + 'static,
{
    /// Start refreshing with `fetch` every `period`. The first fetch runs
    /// immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut fetch: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send,
    {
        let (sender, receiver) = watch::channel::<Slot<T>>(None);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match fetch().await {
                    Ok(data) => {
                        debug!(feed = name, "Feed refreshed");
                        sender.send_replace(Some(Arc::new(Snapshot {
                            data,
                            refreshed_at: Utc::now(),
                        })));
                    }
                    Err(e) => {
                        warn!(feed = name, error = %e, "Feed refresh failed, keeping previous value");
                    }
                }
                if sender.is_closed() {
                    break;
                }
            }
        });

        Self {
            name,
            receiver,
            task,
        }
    }

    /// The most recent successful snapshot, if any refresh has succeeded.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<Snapshot<T>>> {
        self.receiver.borrow().clone()
    }

    /// A receiver notified on every successful refresh.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Slot<T>> {
        self.receiver.clone()
    }

    /// Stop refreshing. The last snapshot stays readable.
    pub fn stop(&self) {
        self.task.abort();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl<T> Drop for LiveFeed<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The dashboard feeds, refreshed with the service credentials.
#[derive(Debug)]
pub struct LiveFeeds {
    pub charts: LiveFeed<Value>,
    pub quick_stats: LiveFeed<QuickStats>,
    pub alerts: LiveFeed<Vec<Alert>>,
    pub audit_logs: LiveFeed<Vec<AuditLogEntry>>,
}

impl LiveFeeds {
    /// Start every feed. Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(api: &ApiClient, intervals: PollIntervals) -> Self {
        let charts = {
            let api = api.clone();
            let credentials = api.service_credentials();
            LiveFeed::spawn("charts", intervals.charts, move || {
                let api = api.clone();
                let credentials = credentials.clone();
                async move { api.analytics_charts(&[], &credentials).await }
            })
        };
        let quick_stats = {
            let api = api.clone();
            let credentials = api.service_credentials();
            LiveFeed::spawn("quick_stats", intervals.quick_stats, move || {
                let api = api.clone();
                let credentials = credentials.clone();
                async move { api.quick_stats(&credentials).await }
            })
        };
        let alerts = {
            let api = api.clone();
            let credentials = api.service_credentials();
            LiveFeed::spawn("alerts", intervals.alerts, move || {
                let api = api.clone();
                let credentials = credentials.clone();
                async move { api.analytics_alerts(&credentials).await }
            })
        };
        let audit_logs = {
            let api = api.clone();
            let credentials = api.service_credentials();
            LiveFeed::spawn("audit_logs", intervals.audit_logs, move || {
                let api = api.clone();
                let credentials = credentials.clone();
                async move {
                    api.analytics_audit_logs(&[], &credentials)
                        .await
                }
            })
        };

        Self {
            charts,
            quick_stats,
            alerts,
            audit_logs,
        }
    }

    /// Stop every feed.
    pub fn shutdown(&self) {
        self.charts.stop();
        self.quick_stats.stop();
        self.alerts.stop();
        self.audit_logs.stop();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_feed_publishes_and_keeps_last_good_value() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let feed = LiveFeed::spawn("test", Duration::from_secs(10), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 1 {
                    Err(ApiError::network("down"))
                } else {
                    Ok(n)
                }
            }
        });

        let mut updates = feed.subscribe();
        updates.changed().await.unwrap();
        assert_eq!(feed.latest().unwrap().data, 0);

        // Second tick fails; the first value stays.
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(feed.latest().unwrap().data, 0);

        // Third tick succeeds again.
        updates.changed().await.unwrap();
        assert_eq!(feed.latest().unwrap().data, 2);
        assert!(calls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn test_stop_aborts_task() {
        let feed = LiveFeed::spawn("stopped", Duration::from_secs(60), || async {
            Ok::<_, ApiError>(1_u8)
        });
        feed.stop();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!feed.is_running());
    }
}
