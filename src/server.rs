use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Router,
};
use axum::extract::State;
use minijinja::{context, path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use crate::anthropic::AnthropicClient;
use crate::relay;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub anthropic: AnthropicClient,
    pub templates: Arc<AutoReloader>,
}

// Minijinja Environment setup
pub fn create_template_env() -> Result<AutoReloader> {
    // AutoReloader picks up template edits without a restart
    let reloader = AutoReloader::new(|notifier| {
        let loader = path_loader("templates");
        let mut env = Environment::new();
        env.set_loader(loader);
        notifier.watch_path("templates", true);
        Ok(env)
    });
    Ok(reloader)
}

async fn index_handler(
    State(state): State<AppState>,
) -> Result<Html<String>, (StatusCode, &'static str)> {
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                tmpl.render(context! {
                    title => "Garden Style Questionnaire",
                })
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        })
}

async fn health_handler() -> &'static str {
    "OK"
}

/// Assemble the router. Separate from `serve` so tests can drive the full
/// HTTP surface in process.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/chat", post(relay::chat))
        // Static files live under /static so they cannot shadow the routes
        // above.
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_web_server(port: u16, anthropic: AnthropicClient) -> Result<()> {
    let templates = create_template_env().context("Failed to initialize template engine")?;

    let state = AppState {
        anthropic,
        templates: Arc::new(templates),
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {:?}", e);
        return;
    }
    info!("Ctrl-C received, shutting down");
}
