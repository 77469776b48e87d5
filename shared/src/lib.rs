pub mod types;
pub mod error;
pub mod config;
pub mod webhook;
pub mod store;
pub mod sync;
pub mod clerk_webhook;
pub mod session;

use session::SessionProvider;
use store::UserStore;
use std::sync::Arc;
use webhook::Webhook;

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub webhook: Webhook,
    pub sessions: SessionProvider,
}

impl AppState {
    pub fn new(
        store: Arc<dyn UserStore>,
        webhook: Webhook,
        sessions: SessionProvider,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            webhook,
            sessions,
        })
    }
}
