//! Per-request context.
//!
//! One [`Context`] is created per incoming request by the transport adapter
//! (or by hand in tests), threaded `&mut` through the router chain, and
//! discarded once the response is written. Routers mutate the
//! consumed/remaining path split and merge captured URL parameters into it
//! as dispatch descends through mounts.

use std::collections::HashMap;
use std::sync::Arc;

use url::form_urlencoded;

use crate::method::Method;
use crate::response::Response;
use crate::status::Status;

/// A per-request error handler: turns a routing condition (404, 405) into a
/// complete response. Injectable via [`Context::on_error`].
pub type ErrorHandler = Arc<dyn Fn(&Context, Status) -> Response + Send + Sync>;

/// An incoming request and its dispatch state.
pub struct Context {
    pub(crate) method: Method,
    /// Path prefix already matched by outer routers.
    pub(crate) consumed: String,
    /// Path remainder still to be matched.
    pub(crate) remaining: String,
    pub(crate) query_string: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    /// Opaque host-injected values (`REMOTE_ADDR`, auth principals, …).
    vars: HashMap<String, String>,
    /// URL parameters captured by route patterns, merged as routers descend.
    pub(crate) url_params: HashMap<String, String>,
    /// Parsed body form, filled at most once on first use.
    form: Option<HashMap<String, Vec<String>>>,
    error_handler: Option<ErrorHandler>,
}

impl Context {
    /// A fresh context for `method` and `path`, with every other field empty.
    /// Chain the builder-style setters to fill in what the request carries.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            consumed: String::new(),
            remaining: path.into(),
            query_string: String::new(),
            headers: Vec::new(),
            body: Vec::new(),
            vars: HashMap::new(),
            url_params: HashMap::new(),
            form: None,
            error_handler: None,
        }
    }

    // ── Construction (transport adapter / tests) ──────────────────────────────

    pub fn query(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = query_string.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Injects an opaque host value, readable via [`var`](Context::var) and
    /// by context-flagged binder parameters.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Seeds a URL parameter, as an outer dispatcher that already matched
    /// part of the path would have.
    pub fn url_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.url_params.insert(name.into(), value.into());
        self
    }

    /// Replaces the default error handler for this request.
    pub fn on_error(
        mut self,
        handler: impl Fn(&Context, Status) -> Response + Send + Sync + 'static,
    ) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn method(&self) -> Method {
        self.method
    }

    /// The path prefix consumed by outer routers so far.
    pub fn consumed_path(&self) -> &str {
        &self.consumed
    }

    /// The path remainder not yet matched.
    pub fn remaining_path(&self) -> &str {
        &self.remaining
    }

    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// A URL parameter captured by route matching.
    ///
    /// For a pattern `^/users/(?P<id>[0-9]+)$`, `ctx.param("id")` on
    /// `/users/42` returns `Some("42")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.url_params.get(name).map(String::as_str)
    }

    /// A host-injected context value.
    pub fn var_value(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// The originating client address: the last `x-forwarded-for` entry when
    /// present, otherwise the host-supplied `REMOTE_ADDR`.
    pub fn client_addr(&self) -> Option<&str> {
        self.header_value("x-forwarded-for")
            .and_then(|v| v.rsplit(',').next())
            .map(str::trim)
            .or_else(|| self.var_value("REMOTE_ADDR"))
    }

    // ── Dispatch support ──────────────────────────────────────────────────────

    /// The submitted body as decoded form pairs. Parsed on first use and
    /// cached for the rest of the request.
    pub(crate) fn form(&mut self) -> &HashMap<String, Vec<String>> {
        let body = &self.body;
        self.form.get_or_insert_with(|| parse_pairs(body))
    }

    /// The query string as decoded pairs. Not cached — callers that resolve
    /// several parameters parse once and hold the map.
    pub(crate) fn query_pairs(&self) -> HashMap<String, Vec<String>> {
        parse_pairs(self.query_string.as_bytes())
    }

    /// Synthesizes the error response for `status` through the injected
    /// handler, or the default one.
    pub(crate) fn error_response(&self, status: Status) -> Response {
        match &self.error_handler {
            Some(handler) => handler(self, status),
            None => default_error_response(status),
        }
    }
}

/// The default error handler: a complete, fixed-body diagnostic response.
/// The body is opaque on purpose — it is not meant for end users.
fn default_error_response(status: Status) -> Response {
    Response::builder().status(status).text("dispatch error")
}

/// Decodes `application/x-www-form-urlencoded` pairs, keeping every value of
/// a repeated name in submission order.
fn parse_pairs(input: &[u8]) -> HashMap<String, Vec<String>> {
    let mut pairs: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in form_urlencoded::parse(input) {
        pairs.entry(name.into_owned()).or_default().push(value.into_owned());
    }
    pairs
}
