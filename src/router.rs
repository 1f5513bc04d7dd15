//! Composable request router.
//!
//! All registered patterns compile into a single anchored alternation, so
//! one regex pass selects the route.
//! A router only ever matches the *unconsumed remainder* of the request
//! path: when a match is found, the matched prefix moves to the context's
//! consumed side and the remainder shrinks, which is what lets a router be
//! registered inside another router as a mount point without knowing its
//! absolute prefix.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::context::Context;
use crate::handler::{Endpoint, Handler, Outcome};
use crate::method::Method;
use crate::pattern::CompiledPattern;
use crate::route::RouteTable;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup; registration is not meant to race with
/// dispatch. Each registration method returns `self` so routes chain
/// naturally:
///
/// ```rust
/// use sable::{Context, Method, Response, Router};
///
/// fn show(ctx: &mut Context) -> Response {
///     let id = ctx.param("id").unwrap_or("unknown");
///     Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
/// }
///
/// let app = Router::new()
///     .get(r"^/users/(?P<id>[0-9]+)$", show)
///     .on(r"^/users$", &[Method::Post], |_: &mut Context| "created");
/// ```
pub struct Router {
    table: RouteTable,
    compiled: Option<CompiledPattern>,
}

impl Router {
    pub fn new() -> Self {
        Self { table: RouteTable::default(), compiled: None }
    }

    /// Registers a handler for `pattern` under each method in `methods`.
    ///
    /// `pattern` is a regular expression, matched anchored at the start of
    /// the unconsumed path; named capture groups become URL parameters.
    /// Registering the same (pattern, method) pair again replaces the
    /// handler and logs a warning.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is rejected by the regex engine (including a
    /// capture-group name that another registered route already uses).
    /// An unroutable table is a startup defect, not a request-time
    /// condition.
    pub fn on(self, pattern: &str, methods: &[Method], handler: impl Handler) -> Self {
        self.add(pattern, methods, handler.into_endpoint())
    }

    /// Registers for `GET` — the default method set.
    pub fn get(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(pattern, &[Method::Get], handler)
    }

    pub fn post(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(pattern, &[Method::Post], handler)
    }

    pub fn put(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(pattern, &[Method::Put], handler)
    }

    pub fn delete(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(pattern, &[Method::Delete], handler)
    }

    pub fn patch(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(pattern, &[Method::Patch], handler)
    }

    /// Mounts a nested router at `pattern`, across every method — method
    /// resolution is deferred to the mounted router. The mount pattern
    /// should match only the prefix it owns; the nested router sees the
    /// rest of the path, with its leading separator preserved.
    ///
    /// ```rust
    /// use sable::{Context, Router};
    ///
    /// let api = Router::new().get(r"^/users$", |_: &mut Context| "[]");
    /// let app = Router::new().mount(r"^/api", api);
    /// // GET /api/users → the nested router matches "/users"
    /// ```
    pub fn mount(self, pattern: &str, router: Router) -> Self {
        self.add(pattern, &Method::ALL, Endpoint::Mount(Arc::new(router)))
    }

    fn add(mut self, pattern: &str, methods: &[Method], endpoint: Endpoint) -> Self {
        self.table.register(pattern, methods, endpoint);
        let compiled = CompiledPattern::compile(self.table.patterns())
            .unwrap_or_else(|e| panic!("invalid route `{pattern}`: {e}"));
        self.compiled = Some(compiled);
        self
    }

    /// Dispatches one request against this router's table.
    ///
    /// Matches the combined pattern against the unconsumed remainder, moves
    /// the matched prefix onto the consumed side, merges named captures
    /// into the URL parameters, and invokes the method's endpoint — a leaf
    /// handler or a nested router, called the same way. Routing conditions
    /// (no match, no handler for the method, empty handler result) come
    /// back as complete responses from the contextual error handler.
    pub fn dispatch(&self, ctx: &mut Context) -> Outcome {
        let Some(compiled) = &self.compiled else {
            return Outcome::Done(ctx.error_response(Status::NotFound));
        };

        // Everything read out of the captures is owned before the path is
        // rewritten; the captures borrow the remainder they matched.
        let (mut end, route_index, captured) = {
            let Some(caps) = compiled.matches(&ctx.remaining) else {
                debug!(path = %ctx.remaining, "no route matched");
                return Outcome::Done(ctx.error_response(Status::NotFound));
            };
            let end = caps.get(0).map_or(0, |m| m.end());
            let Some(route_index) = compiled.route_index(&caps) else {
                return Outcome::Done(ctx.error_response(Status::NotFound));
            };
            (end, route_index, compiled.named_captures(&caps))
        };

        if end == 0 {
            // A zero-length match is a bare mount root: normalize the
            // remainder to its canonical form with a leading separator.
            ctx.remaining.push('/');
        } else if ctx.remaining.as_bytes()[end - 1] == b'/' {
            // Leave a trailing separator unconsumed so a nested router
            // still sees a leading one on its own remainder.
            end -= 1;
        }
        let rest = ctx.remaining.split_off(end);
        ctx.consumed.push_str(&ctx.remaining);
        ctx.remaining = rest;

        for (name, value) in captured {
            ctx.url_params.insert(name, value);
        }

        let route = &self.table.routes[route_index];
        debug!(
            pattern = %route.pattern,
            consumed = %ctx.consumed,
            remaining = %ctx.remaining,
            "route matched"
        );

        let Some(endpoint) = route.handlers.get(&ctx.method()) else {
            return Outcome::Done(ctx.error_response(Status::MethodNotAllowed));
        };
        match endpoint.call(ctx) {
            Outcome::Empty => Outcome::Done(ctx.error_response(Status::NotFound)),
            outcome => outcome,
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Lists the registered routes, one `pattern METHOD` line per handler, with
/// mounted routers expanded under their mount pattern. Useful at startup:
/// `info!("routes:\n{app}")`.
impl fmt::Display for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines: Vec<String> = Vec::new();
        for route in &self.table.routes {
            let mut methods: Vec<_> = route.handlers.iter().collect();
            methods.sort_by_key(|(m, _)| m.as_str());
            for (method, endpoint) in methods {
                match endpoint {
                    // A mount appears once per registered method; expanding
                    // it once covers them all.
                    Endpoint::Mount(inner) => {
                        for line in inner.to_string().lines() {
                            let line = format!("{}{}", route.pattern, line);
                            if !lines.contains(&line) {
                                lines.push(line);
                            }
                        }
                    }
                    Endpoint::Leaf(_) => {
                        lines.push(format!("{} {}", route.pattern, method));
                    }
                }
            }
        }
        f.write_str(&lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;

    fn named(name: &'static str) -> impl Handler {
        move |_: &mut Context| Response::text(name)
    }

    fn body_of(outcome: Outcome) -> String {
        match outcome {
            Outcome::Done(res) => String::from_utf8(res.body).unwrap(),
            Outcome::Empty => panic!("empty outcome"),
            Outcome::Failed(e) => panic!("failed outcome: {e}"),
        }
    }

    #[test]
    fn override_replaces_the_handler_in_place() {
        let app = Router::new()
            .get("^/a$", named("first"))
            .get("^/a$", named("second"));
        let mut ctx = Context::new(Method::Get, "/a");
        assert_eq!(body_of(app.dispatch(&mut ctx)), "second");
        assert_eq!(app.to_string(), "^/a$ GET");
    }

    #[test]
    fn empty_router_rejects_everything() {
        let app = Router::new();
        let mut ctx = Context::new(Method::Get, "/");
        match app.dispatch(&mut ctx) {
            Outcome::Done(res) => assert_eq!(res.status_line(), "404 Not Found"),
            _ => panic!("expected a response"),
        }
    }

    #[test]
    fn zero_length_match_normalizes_the_remainder() {
        // An empty pattern matches a consumed-out path with length zero;
        // the remainder gains its canonical leading separator.
        let app = Router::new().get("", |ctx: &mut Context| {
            Response::text(ctx.remaining_path().to_owned())
        });
        let mut ctx = Context::new(Method::Get, "");
        assert_eq!(body_of(app.dispatch(&mut ctx)), "/");

        // Idempotence: a path already normalized to "/" stays "/" because
        // the separator before the match end is never counted as consumed.
        let app = Router::new().get("/", |ctx: &mut Context| {
            Response::text(ctx.remaining_path().to_owned())
        });
        let mut ctx = Context::new(Method::Get, "/");
        assert_eq!(body_of(app.dispatch(&mut ctx)), "/");
    }

    #[test]
    fn display_expands_mounted_routes() {
        let inner = Router::new()
            .get("^/users$", named("list"))
            .post("^/users$", named("create"));
        let app = Router::new().mount("^/api", inner);
        assert_eq!(app.to_string(), "^/api^/users$ GET\n^/api^/users$ POST");
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn malformed_pattern_aborts_registration() {
        let _ = Router::new().get("^/broken(", named("x"));
    }
}
