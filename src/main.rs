mod protocol;
mod routes;
mod services;
mod state;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "4000".into())
        .parse()
        .expect("invalid PORT");
    let max_players: usize = std::env::var("MAX_PLAYERS_PER_ROOM")
        .unwrap_or_else(|_| state::DEFAULT_MAX_PLAYERS.to_string())
        .parse()
        .expect("invalid MAX_PLAYERS_PER_ROOM");

    let state = state::AppState::new(max_players);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, max_players, "cursorcast listening");
    axum::serve(listener, app).await.expect("server failed");
}
