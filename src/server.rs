//! HTTP server and graceful shutdown.
//!
//! The server is the transport a composed chain gets installed on. It reads
//! each request body in full, then calls the [`HttpHandler`] synchronously
//! with a fresh [`ResponseWriter`] and sends whatever was written.
//!
//! # Graceful shutdown
//!
//! When the shutdown signal fires the server:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Asks every open connection to shut down gracefully: a request being
//!    served is finished, idle keep-alive connections are closed.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.
//!
//! [`Server::serve`] listens for SIGTERM and Ctrl-C. Tests and embedders pass
//! their own signal to [`Server::serve_with_shutdown`] or [`serve`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::handler::{BoxHttpHandler, HttpHandler};
use crate::request::Request;
use crate::response::ResponseWriter;

/// Pause after a failed `accept` (e.g. out of file descriptors) before retrying.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// The HTTP server.
#[derive(Debug)]
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust
    /// use apollo::Server;
    /// let server = Server::bind("0.0.0.0:3000").unwrap();
    /// assert!(Server::bind("not an address").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        Ok(Self { addr: addr.parse()? })
    }

    /// Serves `handler` until SIGTERM or Ctrl-C, then drains in-flight
    /// connections.
    pub async fn serve(self, handler: impl HttpHandler) -> Result<(), Error> {
        self.serve_with_shutdown(handler, shutdown_signal()).await
    }

    /// Serves `handler` until `signal` resolves, then drains in-flight
    /// connections.
    pub async fn serve_with_shutdown(
        self,
        handler: impl HttpHandler,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        serve(listener, handler, signal).await
    }
}

/// Serves `handler` on an already-bound `listener` until `signal` resolves.
pub async fn serve(
    listener: TcpListener,
    handler: impl HttpHandler,
    signal: impl Future<Output = ()>,
) -> Result<(), Error> {
    let addr = listener.local_addr()?;
    let handler = handler.into_boxed();

    info!(%addr, "apollo listening");

    // Every connection task is tracked so shutdown can wait for them.
    let mut tasks = tokio::task::JoinSet::new();

    // Flipped once on shutdown; every connection task watches it.
    let (drain_tx, drain_rx) = watch::channel(false);

    tokio::pin!(signal);

    loop {
        tokio::select! {
            // Shutdown is checked first so a signal stops accepting at once,
            // even with connections queued.
            biased;

            () = &mut signal => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                let _ = drain_tx.send(true);
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };

                let handler = Arc::clone(&handler);
                let io = TokioIo::new(stream);
                let mut drain = drain_rx.clone();

                tasks.spawn(async move {
                    // Called once per request on the connection.
                    let svc = service_fn(move |req| dispatch(Arc::clone(&handler), req));

                    let builder = ConnBuilder::new(TokioExecutor::new());
                    let conn = builder.serve_connection(io, svc);
                    tokio::pin!(conn);

                    let result = tokio::select! {
                        res = conn.as_mut() => res,
                        _ = drain.changed() => {
                            conn.as_mut().graceful_shutdown();
                            conn.await
                        }
                    };
                    if let Err(e) = result {
                        error!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            // Reap finished tasks so the set does not grow without bound.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}

    info!("apollo stopped");
    Ok(())
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Reads one request, runs the handler, produces one response.
///
/// Infallible towards hyper: a body that cannot be read is answered with
/// `400 Bad Request`. A panicking handler takes down only its connection task.
async fn dispatch(
    handler: BoxHttpHandler,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let mut res = ResponseWriter::new();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("failed to read request body: {e}");
            res.write_header(StatusCode::BAD_REQUEST);
            return Ok(res.into_response());
        }
    };

    let mut req = Request::from_parts(parts, body);
    handler.call(&mut res, &mut req);

    debug!(method = %req.method(), path = req.path(), status = res.status().as_u16(), "request served");
    Ok(res.into_response())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
