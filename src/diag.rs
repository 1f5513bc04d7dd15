//! Built-in diagnostic handlers.
//!
//! Register them like any other handler:
//!
//! ```rust
//! use sable::{diag, Router};
//!
//! let app = Router::new()
//!     .get("^/healthz$", diag::liveness)
//!     .get("^/readyz$", diag::readiness)
//!     .get("^/debug/request$", diag::dump);
//! ```

use crate::context::Context;
use crate::response::Response;

/// Echoes the request's dispatch state as plain text — method, the
/// consumed/remaining path split, query string, host vars, and headers.
/// Handy while laying out mounts; not meant to stay exposed in production.
pub fn dump(ctx: &mut Context) -> Response {
    let mut out = String::new();
    out.push_str(&format!("method={}\n", ctx.method()));
    out.push_str(&format!("consumed={}\n", ctx.consumed_path()));
    out.push_str(&format!("remaining={}\n", ctx.remaining_path()));
    out.push_str(&format!("query={}\n", ctx.query_string()));
    if let Some(addr) = ctx.client_addr() {
        out.push_str(&format!("client={addr}\n"));
    }
    for (name, value) in &ctx.headers {
        out.push_str(&format!("header {name}={value}\n"));
    }
    Response::text(out)
}

/// Liveness probe handler.
///
/// Always returns `200 OK` with body `"ok"`. If the process can respond to
/// HTTP at all, it is alive — this handler intentionally has no dependencies.
pub fn liveness(_ctx: &mut Context) -> Response {
    Response::text("ok")
}

/// Readiness probe handler (default implementation).
///
/// Returns `200 OK` with body `"ready"`. Replace it with your own handler if
/// the application must verify dependency health before accepting traffic.
pub fn readiness(_ctx: &mut Context) -> Response {
    Response::text("ready")
}
