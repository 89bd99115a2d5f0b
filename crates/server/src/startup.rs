use axum::Router;
use migration::MigratorTrait;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use configs::AppConfig;
use service::runtime::{self, Storage};
use service::Services;

use crate::auth::ServerState;
use crate::errors::StartupError;
use crate::routes;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Bind `host:port`; `host` may be an IP literal or a resolvable name such as `localhost`.
async fn bind(cfg: &AppConfig) -> Result<TcpListener, StartupError> {
    let host = cfg.server.host.trim();
    TcpListener::bind((host, cfg.server.port))
        .await
        .map_err(|e| StartupError::InvalidConfig(format!("cannot bind {}:{}: {e}", host, cfg.server.port)))
}

/// Wire storage, services and router for `cfg`.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let (repos, storage) = runtime::open_repositories(&cfg.database).await?;
    if let Storage::Postgres(db) = &storage {
        if cfg.database.run_migrations {
            migration::Migrator::up(db, None).await.map_err(|e| StartupError::Migration(e.to_string()))?;
            info!(event = "migrations_applied", "database schema up to date");
        }
    }

    let services = Services::new(repos, cfg.auth.clone(), cfg.business.clone());
    match services.auth.bootstrap_admin().await {
        Ok(Some(admin)) => info!(email = %admin.email, "bootstrap admin created"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "bootstrap admin failed"),
    }

    Ok(routes::build_router(ServerState { services }, build_cors()))
}

/// Public entry: build the app and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;
    let listener = bind(&cfg).await?;
    let addr = listener.local_addr()?;
    info!(%addr, backend = ?cfg.database.backend, "starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
            }
        })
        .await?;
    Ok(())
}
