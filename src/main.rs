use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lumina::{
    api,
    config::Settings,
    notify::{ChangeBus, LogNotifier, Notifier, SmtpNotifier},
    rails::{spawn_market_drift, CryptoRateFeed},
    repository::PaymentMethodRepository,
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lumina=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting Lumina server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    // Outbound email, or log-only when SMTP is not configured
    let notifier: Arc<dyn Notifier> = match SmtpNotifier::from_config(&settings.smtp) {
        Some(smtp) => {
            tracing::info!("SMTP notifications enabled");
            Arc::new(smtp)
        }
        None => {
            tracing::info!("SMTP not configured, emails will be logged only");
            Arc::new(LogNotifier)
        }
    };

    // Simulated exchange-rate feed, optionally drifting in demo mode
    let rates = Arc::new(CryptoRateFeed::new());
    if settings.demo.simulate_market {
        tracing::info!("Demo market simulation enabled");
        spawn_market_drift(rates.clone(), Duration::from_secs(5));
    }

    let bus = ChangeBus::default();

    // Create service context
    let service_context = Arc::new(ServiceContext::new(
        db_pool.clone(),
        &settings,
        notifier,
        rates,
        bus.clone(),
    ));

    // Seed default payment methods on first boot
    service_context.method_repo.ensure_defaults().await?;

    // Start the bank reconciliation loop
    service_context.reconciler.spawn();
    tracing::info!(
        "Reconciliation loop running every {}s",
        settings.reconciler.interval_secs
    );

    // Log change events at debug for observability
    let mut changes = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = changes.recv().await {
            tracing::debug!("Change event: {:?}", event);
        }
    });

    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port),
    )
    .await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
