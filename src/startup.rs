//! Application Startup
//!
//! Wires settings into a session manager and the optional status server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;

use crate::application::dto::SharedStatus;
use crate::application::services::{SessionDeps, SessionManager};
use crate::config::Settings;
use crate::domain::services::RewardEstimator;
use crate::infrastructure::auth::FileTokenSource;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::persistence::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
use crate::infrastructure::proxy::{tunnel, ProxyRotator};
use crate::infrastructure::transport::WebSocketConnector;
use crate::presentation::http::{create_router, handlers::health};

/// Application instance
pub struct Application {
    session: SessionManager,
    status_server: Option<(TcpListener, Router)>,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        tunnel::install_crypto_provider();
        health::init_server_start();

        let store: Arc<dyn SnapshotStore> = if settings.persistence.enabled {
            let store = FileSnapshotStore::open(&settings.persistence.data_dir).await?;
            tracing::info!(dir = %store.dir().display(), "Snapshot persistence enabled");
            Arc::new(store)
        } else {
            tracing::info!("Snapshot persistence disabled, keeping snapshots in memory");
            Arc::new(MemorySnapshotStore::new())
        };

        let rotator = ProxyRotator::load(&settings.proxy.list_file).await?;

        let deps = SessionDeps {
            connector: Arc::new(WebSocketConnector::new()),
            tokens: Arc::new(FileTokenSource::new(&settings.auth.token_file)),
            store,
            clock: Arc::new(SystemClock),
            rotator,
            estimator: RewardEstimator::from_entropy(),
        };
        let session = SessionManager::new(settings.session.clone(), deps);

        let status_server = if settings.status.enabled {
            let addr: SocketAddr = settings.status_addr().parse()?;
            let listener = TcpListener::bind(addr).await?;
            tracing::info!("Status server listening on {}", listener.local_addr()?);
            Some((listener, create_router(session.status())))
        } else {
            None
        };

        Ok(Self {
            session,
            status_server,
        })
    }

    /// Status snapshot handle shared with the HTTP surface
    pub fn status(&self) -> SharedStatus {
        self.session.status()
    }

    /// Get the bound status address, if the status server is enabled
    pub fn local_addr(&self) -> Option<std::io::Result<SocketAddr>> {
        self.status_server
            .as_ref()
            .map(|(listener, _)| listener.local_addr())
    }

    /// Run the session until Ctrl-C or SIGTERM
    pub async fn run_until_stopped(self) -> Result<()> {
        let server = self.status_server.map(|(listener, router)| {
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, router).await {
                    tracing::error!(error = %e, "Status server stopped");
                }
            })
        });

        let result = self.session.run(shutdown_signal()).await;

        if let Some(server) = server {
            server.abort();
        }
        result.map_err(Into::into)
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
