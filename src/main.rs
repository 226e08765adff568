use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use transitdesk::config::{AppConfig, FilePricingSource};
use transitdesk::db::{self, SqliteStore};
use transitdesk::services::clock::SystemClock;
use transitdesk::services::locks::KeyedLocks;
use transitdesk::services::messaging::log_only::LogOnlyGateway;
use transitdesk::services::messaging::twilio::TwilioWhatsAppGateway;
use transitdesk::services::messaging::NotificationGateway;
use transitdesk::services::pricing::PricingHandle;
use transitdesk::state::AppState;

const PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let store = Arc::new(SqliteStore::new(conn, config.conversation_ttl_hours));

    let source = FilePricingSource::new(&config.pricing_config_path);
    tracing::info!(
        path = %source.path().display(),
        "loading pricing config"
    );
    let pricing = PricingHandle::load(Box::new(source))?;
    tracing::info!(corridors = pricing.engine().catalog().len(), "pricing config loaded");

    let messaging: Box<dyn NotificationGateway> = if config.has_twilio_credentials() {
        tracing::info!("using Twilio WhatsApp gateway (from: {})", config.twilio_whatsapp_number);
        Box::new(TwilioWhatsAppGateway::new(
            config.twilio_account_sid.clone(),
            config.twilio_auth_token.clone(),
            config.twilio_whatsapp_number.clone(),
        ))
    } else {
        tracing::warn!("Twilio credentials not set, outbound messages will only be logged");
        Box::new(LogOnlyGateway)
    };

    if config.admin_token.is_empty() {
        tracing::warn!("ADMIN_TOKEN is empty, admin API is disabled");
    } else if config.uses_default_admin_token() {
        tracing::warn!("ADMIN_TOKEN is not set, admin API accepts the default token");
    }

    let state = Arc::new(AppState {
        config: config.clone(),
        conversations: store.clone(),
        bookings: store.clone(),
        messaging,
        pricing,
        clock: Box::new(SystemClock::with_offset_hours(config.utc_offset_hours)),
        locks: KeyedLocks::new(),
    });

    tokio::spawn(purge_stale_conversations(store));

    let app = transitdesk::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn purge_stale_conversations(store: Arc<SqliteStore>) {
    let mut interval = tokio::time::interval(PURGE_INTERVAL);
    loop {
        interval.tick().await;
        match store.purge_expired() {
            Ok(0) => {}
            Ok(count) => tracing::info!(count, "purged stale conversations"),
            Err(e) => tracing::error!(error = %e, "failed to purge stale conversations"),
        }
    }
}
