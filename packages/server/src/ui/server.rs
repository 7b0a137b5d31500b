//! Server execution logic.

use std::{future::Future, sync::Arc};

use tokio::{net::TcpListener, sync::watch};

use crate::config::ServerConfig;

use super::{
    error::ServerError,
    handler::{http::router, session::handle_connection},
    signal::shutdown_signal,
    state::AppState,
};

/// TCP chat server
///
/// # Example
///
/// ```ignore
/// let config = ServerConfig::default();
/// let state = Arc::new(AppState::from_config(&config).await?);
/// Server::new(state).run(&config).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

/// Resolve once the shutdown flag is raised or its sender is gone
async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    loop {
        let stop = *rx.borrow_and_update();
        if stop || rx.changed().await.is_err() {
            return;
        }
    }
}

async fn bind(addr: String) -> Result<TcpListener, ServerError> {
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

impl Server {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Bind the chat listener (and the admin API when configured) and serve
    /// until Ctrl+C / SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if a listener fails to bind.
    pub async fn run(self, config: &ServerConfig) -> Result<(), ServerError> {
        let listener = bind(format!("{}:{}", config.host, config.port)).await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        });

        if let Some(http_port) = config.http_port {
            let http_listener = bind(format!("{}:{}", config.host, http_port)).await?;
            tracing::info!("Admin API listening on http://{}", http_listener.local_addr()?);

            let app = router(self.state.clone());
            let http_shutdown = shutdown_rx.clone();
            tokio::spawn(async move {
                let served = axum::serve(http_listener, app)
                    .with_graceful_shutdown(wait_for_shutdown(http_shutdown))
                    .await;
                if let Err(e) = served {
                    tracing::error!("Admin API error: {}", e);
                }
            });
        }

        tracing::info!("Press Ctrl+C to shutdown gracefully");
        self.serve(listener, wait_for_shutdown(shutdown_rx)).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Accept connections on `listener` until `shutdown` resolves, spawning
    /// one session task per connection.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), ServerError> {
        tracing::info!("Chat server listening on {}", listener.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Acceptor stopped");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let state = self.state.clone();
                        tokio::spawn(handle_connection(state, stream, peer));
                    }
                    Err(e) => {
                        // per-connection failures such as EMFILE; keep accepting
                        tracing::warn!("Failed to accept connection: {}", e);
                    }
                },
            }
        }
    }
}
