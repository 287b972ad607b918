//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tower_sessions::Session;
use tracing::debug;
use uuid::Uuid;

use sellapp_core::models::Product;
use sellapp_core::sequence::RequestSequence;

use crate::api::{ApiClient, ApiError, Credentials};
use crate::config::WebConfig;
use crate::feeds::LiveFeeds;
use crate::models::session_keys;

/// How long an idle search sequence is remembered.
const SEARCH_SEQUENCE_IDLE: Duration = Duration::from_secs(12 * 60 * 60);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// API client, the POS catalog cache and the live dashboard feeds.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    api: ApiClient,
    catalog: Cache<(), Arc<Vec<Product>>>,
    searches: Cache<String, Arc<RequestSequence>>,
    feeds: LiveFeeds,
}

impl AppState {
    /// Create the application state and start the live feeds.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built.
    pub fn new(config: WebConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        let catalog = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.catalog_cache_ttl)
            .build();
        let searches = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(SEARCH_SEQUENCE_IDLE)
            .build();
        let feeds = LiveFeeds::start(&api, config.poll);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                catalog,
                searches,
                feeds,
            }),
        })
    }

    /// Get a reference to the web configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get a reference to the POS API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the live dashboard feeds.
    #[must_use]
    pub fn feeds(&self) -> &LiveFeeds {
        &self.inner.feeds
    }

    /// POS products, served from the catalog cache when fresh.
    ///
    /// Anonymous callers bypass the cache so they only ever see what the API
    /// returns for a tokenless request.
    ///
    /// # Errors
    ///
    /// Returns the API failure when the cache is cold and the fetch fails.
    pub async fn products(&self, credentials: &Credentials) -> Result<Arc<Vec<Product>>, ApiError> {
        if credentials.is_anonymous() {
            return self.inner.api.list_products(credentials).await.map(Arc::new);
        }
        self.inner
            .catalog
            .try_get_with((), async {
                debug!("Catalog cache miss");
                self.inner.api.list_products(credentials).await.map(Arc::new)
            })
            .await
            .map_err(|e| (*e).clone())
    }

    /// Drop the cached catalog so the next read sees current stock.
    pub async fn invalidate_catalog(&self) {
        self.inner.catalog.invalidate(&()).await;
    }

    /// The request sequence for one search box on one page load.
    ///
    /// `page` is the id the page script generates when it loads, so a
    /// reloaded page starts a fresh sequence instead of inheriting the old
    /// page's numbers. Requests without a usable id share one sequence per
    /// session and scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn search_sequence(
        &self,
        session: &Session,
        scope: &str,
        page: Option<&str>,
    ) -> Result<Arc<RequestSequence>, tower_sessions::session::Error> {
        let key = match session.get::<String>(session_keys::SEARCH_KEY).await? {
            Some(key) => key,
            None => {
                let key = Uuid::new_v4().to_string();
                session.insert(session_keys::SEARCH_KEY, &key).await?;
                key
            }
        };
        let page = page.filter(|p| is_page_id(p)).unwrap_or("-");

        Ok(self
            .inner
            .searches
            .get_with(format!("{key}:{scope}:{page}"), async {
                Arc::new(RequestSequence::new())
            })
            .await)
    }
}

/// Page ids are short tokens of ASCII letters, digits and dashes.
fn is_page_id(page: &str) -> bool {
    (1..=64).contains(&page.len())
        && page.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_ids_are_short_safe_tokens() {
        assert!(is_page_id("3f2c9a1e-7b4d-4c1a-9e55-0d2f6a8b1c34"));
        assert!(is_page_id("lq8z3k-4f9a2b1c"));
        assert!(!is_page_id(""));
        assert!(!is_page_id("a:b"));
        assert!(!is_page_id(&"x".repeat(65)));
    }
}
