use std::net::SocketAddr;
use std::sync::Arc;

use aerobook_api::{
    app,
    state::{AppState, AuthConfig},
};
use aerobook_gateway::{RazorpayGateway, WebhookVerifier};
use aerobook_settlement::{BookingService, PaymentLedger, RefundService};
use aerobook_store::DbClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aerobook_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = aerobook_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Aerobook API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");
    let db = Arc::new(db);

    let gateway = Arc::new(RazorpayGateway::new(
        config.payment.key_id.clone(),
        config.payment.key_secret.clone(),
    ));

    let app_state = AppState {
        db: db.clone(),
        bookings: Arc::new(BookingService::new(db.pool.clone())),
        ledger: Arc::new(PaymentLedger::new(
            db.pool.clone(),
            gateway.clone(),
            config.payment.key_id.clone(),
            config.payment.currency.clone(),
        )),
        refunds: Arc::new(RefundService::new(db.pool.clone(), gateway)),
        verifier: WebhookVerifier::new(config.payment.webhook_secret.clone()),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server exited");
}
