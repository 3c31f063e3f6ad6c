//! Application state shared across handlers.

use std::sync::Arc;

use crate::services::RetailerService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    retailer: RetailerService,
}

impl AppState {
    #[must_use]
    pub fn new(retailer: RetailerService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { retailer }),
        }
    }

    /// Retailer operations backed by the shared token cache.
    #[must_use]
    pub fn retailer(&self) -> &RetailerService {
        &self.inner.retailer
    }
}
