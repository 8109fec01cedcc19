use std::time::Duration;

mod app;
mod config;
mod error;
mod sessions;
mod state;
mod users;

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "tech_blog=debug,axum=info,tower_http=info";

/// `RUST_LOG` picks the filter, `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.with_target(false).json().init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let app_state = state::AppState::init().await?;
    let config = app_state.config.clone();
    sessions::spawn_purge_task(app_state.sessions.clone(), Duration::from_secs(15 * 60));

    app::serve(app::build_app(app_state), &config).await
}
