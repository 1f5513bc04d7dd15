//! HTTP server and graceful shutdown.
//!
//! The transport adapter is the only asynchronous part of the crate: it
//! owns the sockets, reads each request body to completion, builds the
//! per-request [`Context`], and runs the router's synchronous dispatch.
//! Routes are registered before [`Server::serve`] and never mutated again,
//! so the router is shared across connection tasks without locking.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** (what an orchestrator sends before a kill) or **Ctrl-C**
//! the server:
//! 1. Immediately stops `listener.accept()` — no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::context::Context;
use crate::error::Error;
use crate::handler::Outcome;
use crate::method::Method;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // Shared across connection tasks without copying the route table.
        let router = Arc::new(router);

        info!(addr = %self.addr, "sable listening");

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` makes select! check arms top-to-bottom instead of
                // randomly. Shutdown is checked first so a SIGTERM stops
                // accepting even if more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // The closure runs once per request on the
                        // connection, not once per connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { handle(router, req, remote_addr).await }
                        });

                        // `auto::Builder` handles both HTTP/1.1 and HTTP/2,
                        // whatever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain: wait for every in-flight connection to finish.
        while tasks.join_next().await.is_some() {}

        info!("sable stopped");
        Ok(())
    }
}

// ── Request handling ──────────────────────────────────────────────────────────

/// Reads one request to completion, dispatches it, and emits the outcome.
///
/// The error type is [`Infallible`](std::convert::Infallible) — every
/// condition is handled here (404, 405, 500), so hyper never sees an error.
async fn handle(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<http_body_util::Full<bytes::Bytes>>, std::convert::Infallible> {
    let (parts, incoming) = req.into_parts();

    // Unknown method strings never reach a handler.
    let Ok(method) = Method::from_str(parts.method.as_str()) else {
        return Ok(Response::status(Status::MethodNotAllowed).into_http());
    };

    // One-shot body read, bounded by the declared length (hyper enforces
    // the transfer framing). A broken body is the client's fault.
    let body = match incoming.collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(e) => {
            error!(peer = %remote_addr, "body read failed: {e}");
            return Ok(Response::status(Status::BadRequest).into_http());
        }
    };

    let mut ctx = Context::new(method, parts.uri.path())
        .query(parts.uri.query().unwrap_or(""))
        .body(body)
        .var("REMOTE_ADDR", remote_addr.ip().to_string());
    for (name, value) in &parts.headers {
        ctx = ctx.header(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
    }

    let response = match router.dispatch(&mut ctx) {
        Outcome::Done(response) => response,
        // The dispatcher already folds the empty sentinel into 404; an
        // empty outcome here means a bare context was never routed at all.
        Outcome::Empty => ctx.error_response(Status::NotFound),
        Outcome::Failed(e) => {
            error!(peer = %remote_addr, "handler failed: {e}");
            Response::status(Status::InternalServerError)
        }
    };
    Ok(response.into_http())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C, for
/// local dev). On Windows only Ctrl-C is available.
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

    // `pending()` never resolves — on non-Unix platforms the SIGTERM arm is
    // effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
