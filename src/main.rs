mod app;
mod auth;
mod config;
mod db;
mod email;
mod error;
mod galleries;
mod hash;
mod oauth;
mod resets;
mod state;
#[cfg(test)]
mod testing;
mod tokens;
mod users;
mod views;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "lenslocked=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = state::AppState::init().await?;
    let port = state.config.port;
    let app = app::build_app(state);
    app::serve(app, port).await
}
