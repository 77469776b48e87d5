use aws_sdk_dynamodb::Client as DynamoClient;
use idsync_shared::config::{Config, StoreBackend};
use idsync_shared::session::{DataClient, SessionProvider};
use idsync_shared::store::{DynamoUserStore, MemoryUserStore, UserStore};
use idsync_shared::webhook::Webhook;
use idsync_shared::AppState;
use lambda_http::{run, service_fn, Error, Request};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env()?;

    // Initialize clients once at startup
    let store: Arc<dyn UserStore> = match config.store_backend {
        StoreBackend::Dynamo => {
            let aws_config = aws_config::load_from_env().await;
            Arc::new(DynamoUserStore::new(DynamoClient::new(&aws_config), config.table_name.clone()))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory user store, records are lost on restart");
            Arc::new(MemoryUserStore::new())
        }
    };

    let webhook = Webhook::new(&config.webhook_secret).with_tolerance(config.webhook_tolerance_secs);
    let data_client = Arc::new(DataClient::new(config.data_api_url.clone()));

    let state = AppState::new(store, webhook, SessionProvider::new(data_client));

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
