use anyhow::{Context, Result};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket, lookup_host};
use tracing::{error, info};

use crate::config::Config;
use crate::http::connection::{Connection, Dispatch};
use crate::http::reader::ReadLimits;
use crate::router::Router;
use crate::static_files::StaticResolver;

/// Pause after a failed `accept`. Errors such as EMFILE tend to repeat
/// until some connection finishes.
pub const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Accepts connections and runs each one on its own task.
pub struct Server {
    config: Config,
    dispatch: Arc<Dispatch>,
    connections: Arc<AtomicU64>,
}

impl Server {
    /// Prepares a server; the static root must exist.
    pub fn new(config: Config, router: Router) -> Result<Self> {
        let statics = StaticResolver::new(&config.static_files.root)?;
        Ok(Self::with_statics(config, router, Some(statics)))
    }

    /// Like `new`, with explicit (or no) static file serving.
    pub fn with_statics(config: Config, router: Router, statics: Option<StaticResolver>) -> Self {
        let limits = ReadLimits::from_config(&config.server);
        Self {
            config,
            dispatch: Arc::new(Dispatch::new(router, statics, limits)),
            connections: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of connections accepted so far.
    pub fn connection_count(&self) -> u64 {
        self.connections.load(Ordering::Relaxed)
    }

    /// Binds the listening socket with address reuse enabled.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr_str = self.config.server.listen_addr();
        let addr: SocketAddr = lookup_host(&addr_str)
            .await
            .with_context(|| format!("Failed to resolve {}", addr_str))?
            .next()
            .with_context(|| format!("No address found for {}", addr_str))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .context("Failed to create socket")?;

        socket.set_reuseaddr(true).context("Failed to enable SO_REUSEADDR")?;
        socket
            .bind(addr)
            .with_context(|| format!("Failed to bind {}", addr))?;
        let listener = socket
            .listen(self.config.server.backlog)
            .with_context(|| format!("Failed to listen on {}", addr))?;

        Ok(listener)
    }

    /// Accepts connections until `shutdown` completes. In-flight
    /// connections keep running on their own tasks.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let local = listener.local_addr().context("Listener has no local address")?;
        info!("Listening on {}", local);
        if let Some(statics) = &self.dispatch.statics {
            info!("Serving static files from {}", statics.root().display());
        }
        for pattern in self.dispatch.router.patterns() {
            info!(route = pattern, "Registered route");
        }

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            back_off(&e).await;
                            continue;
                        }
                    };

                    let conn_id = self.connections.fetch_add(1, Ordering::Relaxed) + 1;
                    info!(conn_id, %peer, "Accepted connection");

                    let dispatch = Arc::clone(&self.dispatch);
                    tokio::spawn(async move {
                        let conn = Connection::new(socket, conn_id, dispatch);
                        if let Err(e) = conn.run().await {
                            error!(conn_id, %peer, "Connection error: {}", e);
                        }
                    });
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        drop(listener);
        info!("Listener closed");
        Ok(())
    }

    /// Binds and serves until Ctrl-C.
    pub async fn run(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}

async fn back_off(err: &io::Error) {
    error!(
        error = %err,
        retry_in_ms = ACCEPT_RETRY_DELAY.as_millis() as u64,
        "Failed to accept connection"
    );
    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
}
