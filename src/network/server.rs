//! HTTP server hosting the adapter

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::adapter::{error_response, Adapter};
use crate::replay::ReplayEngine;
use crate::Result;

use super::limit::ConnectionLimit;
use super::SHUTDOWN_TIMEOUT_MS;

/// Handle that stops a running [`Server`]
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: broadcast::Sender<()>,
}

impl ShutdownHandle {
    /// Ask the server to stop accepting and drain connections
    pub fn shutdown(&self) {
        self.tx.send(()).ok();
    }
}

/// TCP server dispatching every request to one [`Adapter`]
pub struct Server<E: ?Sized> {
    listener: TcpListener,
    adapter: Adapter<E>,
    connection_limit: ConnectionLimit,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl<E> Server<E>
where
    E: ReplayEngine + ?Sized + 'static,
{
    /// Bind a listener on `addr`
    ///
    /// # Errors
    ///
    /// Returns error if `max_connections` is 0 or the address cannot be bound
    pub async fn bind(addr: SocketAddr, adapter: Adapter<E>, max_connections: usize) -> Result<Self> {
        let connection_limit = ConnectionLimit::new(max_connections)?;
        let listener = TcpListener::bind(addr).await?;
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Ok(Self {
            listener,
            adapter,
            connection_limit,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Address the listener is bound to
    ///
    /// # Errors
    ///
    /// Returns error if the socket address cannot be read
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server from another task
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Accept connections until Ctrl-C or a shutdown request
    ///
    /// # Errors
    ///
    /// Returns error if the listener address cannot be read
    pub async fn run(self) -> Result<()> {
        let Self {
            listener,
            adapter,
            connection_limit,
            // Held so `recv` only fires on an explicit shutdown
            shutdown_tx: _shutdown_tx,
            mut shutdown_rx,
        } = self;

        info!("Listening on http://{}", listener.local_addr()?);

        let shutdown_signal = async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Received SIGINT, shutting down");
                }
                _ = shutdown_rx.recv() => {
                    info!("Received shutdown signal");
                }
            }
        };
        tokio::pin!(shutdown_signal);

        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                () = &mut shutdown_signal => break,
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let Some(permit) = connection_limit.try_admit() else {
                                warn!(
                                    "Connection limit of {} reached, rejecting {}",
                                    connection_limit.capacity(),
                                    peer_addr
                                );
                                drop(stream);
                                continue;
                            };
                            debug!(
                                "Accepted {} ({}/{} connections)",
                                peer_addr,
                                connection_limit.in_use(),
                                connection_limit.capacity()
                            );

                            let adapter = adapter.clone();
                            tasks.spawn(async move {
                                let _permit = permit;
                                serve_connection(TokioIo::new(stream), adapter, peer_addr).await;
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = result {
                        warn!("Connection task failed: {}", e);
                    }
                }
            }
        }

        drop(listener);

        let shutdown_timeout = Duration::from_millis(SHUTDOWN_TIMEOUT_MS);
        let drained = tokio::time::timeout(shutdown_timeout, async {
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    warn!("Task cleanup error: {}", e);
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                "Aborting {} connection(s) after shutdown timeout",
                tasks.len()
            );
            tasks.shutdown().await;
        }

        info!("Shutdown complete");
        Ok(())
    }
}

async fn serve_connection<E>(io: TokioIo<tokio::net::TcpStream>, adapter: Adapter<E>, peer_addr: SocketAddr)
where
    E: ReplayEngine + ?Sized + 'static,
{
    let service = service_fn(move |request| {
        let adapter = adapter.clone();
        async move {
            let response = match adapter.handle(request).await {
                Ok(response) => response,
                Err(e) => {
                    error!("Request from {} failed: {}", peer_addr, e);
                    error_response(&e)
                }
            };
            Ok::<_, Infallible>(response)
        }
    });

    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
        debug!("Connection error from {}: {}", peer_addr, e);
    }
}
