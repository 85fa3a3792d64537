//! Live Quiz Back binary entrypoint wiring WebSocket, SSE, REST and the question source.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use live_quiz_back::{
    config::AppConfig,
    dao::question_store::{QuestionSource, SessionSink, memory::MemoryQuestionStore},
    routes,
    state::{AppState, SharedState},
};

const DEFAULT_PORT: u16 = 3001;

type Collaborators = (Arc<dyn QuestionSource>, Option<Arc<dyn SessionSink>>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    // Without a question source the session engine cannot run at all.
    let (questions, sink) = init_question_source(&config).await?;

    let app_state = AppState::new(config, questions, sink);
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick CouchDB when it is configured, the JSON question bank otherwise.
async fn init_question_source(config: &AppConfig) -> anyhow::Result<Collaborators> {
    #[cfg(feature = "couch-store")]
    {
        use live_quiz_back::dao::question_store::couchdb::{CouchConfig, CouchQuestionStore};

        if CouchConfig::requested() {
            let couch_config = CouchConfig::from_env().context("reading CouchDB configuration")?;
            let store = Arc::new(
                CouchQuestionStore::connect(couch_config)
                    .await
                    .context("connecting to CouchDB")?,
            );
            info!("using CouchDB question source");
            let questions: Arc<dyn QuestionSource> = store.clone();
            let sink: Arc<dyn SessionSink> = store;
            return Ok((questions, Some(sink)));
        }
    }

    let store = Arc::new(
        MemoryQuestionStore::from_file(config.question_bank_path())
            .context("loading question bank")?,
    );
    info!(path = %config.question_bank_path().display(), "using in-memory question source");
    let questions: Arc<dyn QuestionSource> = store.clone();
    let sink: Arc<dyn SessionSink> = store;
    Ok((questions, Some(sink)))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
