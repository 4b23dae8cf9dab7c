use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::handlers;
use crate::state::AppState;
use crate::store::{FallbackRepository, LocalCacheRepository, SqliteRepository};

/// Build the application state and Axum router from a [`Config`].
///
/// Creates the database pool, runs migrations and puts the SQLite store in
/// front of the local JSON cache.
pub fn build_app(config: Config) -> Result<(AppState, Router), Box<dyn std::error::Error>> {
    let db = create_pool(&config.database_path)?;

    {
        let mut conn = db.get()?;
        run_migrations(&mut conn, &config.migrations_path)?;
    }

    let repo = FallbackRepository::new(
        SqliteRepository::new(db),
        LocalCacheRepository::new(config.cache_path.clone()),
    );
    tracing::info!(cache = %config.cache_path.display(), "Transaction store ready");

    let state = AppState::new(Arc::new(repo), config);
    Ok((state.clone(), router(state)))
}

/// Routes plus the middleware stack, bound to `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::routes())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the router to `host:port` and spawn the server as a tokio task.
///
/// Returns the actual port the server bound to (useful when `port` is 0 for
/// OS-assigned ports) and a [`JoinHandle`] for the server task.
pub async fn serve(
    app: Router,
    host: &str,
    port: u16,
) -> Result<(u16, JoinHandle<()>), Box<dyn std::error::Error>> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    let actual_port = listener.local_addr()?.port();

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_port, handle))
}
