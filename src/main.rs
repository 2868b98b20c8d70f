use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use doctorbook::config::AppConfig;
use doctorbook::handlers;
use doctorbook::services::ai::huggingface::HuggingFaceProvider;
use doctorbook::services::booking::BookingOrchestrator;
use doctorbook::services::calendar::google::GoogleCalendar;
use doctorbook::services::calendar::CalendarService;
use doctorbook::services::confirmation::{
    ConfirmationDispatcher, HttpConfirmationTransport, RetryPolicy,
};
use doctorbook::services::conversation::ConversationTracker;
use doctorbook::services::duplicates::DuplicateChecker;
use doctorbook::services::event_writer::CalendarEventWriter;
use doctorbook::services::routing::KeywordRouter;
use doctorbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;
    let offset = config.calendar_offset()?;

    let calendar: Arc<dyn CalendarService> =
        Arc::new(GoogleCalendar::from_credentials(&config.calendar_creds)?);

    if config.confirmation_enabled() {
        tracing::info!("reservations require confirmation via webhook");
    } else {
        tracing::warn!("confirmation webhook not configured, reservations are final on creation");
    }

    let orchestrator = BookingOrchestrator::new(
        DuplicateChecker::new(Arc::clone(&calendar), config.calendar_id.clone()),
        Box::new(KeywordRouter::default()),
        CalendarEventWriter::new(
            calendar,
            config.calendar_id.clone(),
            offset,
            config.calendar_timezone.clone(),
        ),
        ConfirmationDispatcher::new(
            config.confirmation_webhook_url.clone(),
            Box::new(HttpConfirmationTransport::new()?),
            RetryPolicy::default(),
        ),
        config.confirmation_enabled(),
        offset,
    );

    let llm = HuggingFaceProvider::new(config.hf_token.clone(), config.hf_model_url.clone());
    tracing::info!("using Hugging Face text generation (url: {})", config.hf_model_url);

    let tracker = ConversationTracker::new(
        orchestrator,
        Box::new(llm),
        config.booking_triggers.clone(),
        config.system_prompt.clone(),
        config.session_ttl()?,
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        tracker,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/chat", post(handlers::chat::chat))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
