//! Argument binding.
//!
//! [`Binder`] wraps a plain function whose inputs are declared by name, and
//! turns it into a route [`Handler`]: at registration time the declared
//! parameter list is parsed once into a spec; at request time each parameter
//! is resolved from the request's candidate sources and the function is
//! invoked with the resolved values. The function body stays pure business
//! logic — it never touches the request context.
//!
//! # Declaring parameters
//!
//! | Spec        | Meaning                                                       |
//! |-------------|---------------------------------------------------------------|
//! | `"id"`      | required — binding fails with 404 when no source supplies it  |
//! | `"page=1"`  | optional — keeps `"1"` when no source supplies it             |
//! | `"@user"`   | context-flagged — read from the host-injected vars only       |
//!
//! # Source priority
//!
//! A parameter resolves from the first source that contains its name:
//! host-injected context vars (context-flagged parameters only), URL
//! captures, the submitted body form (body-bearing methods only; parsed at
//! most once per request), then the query string. Multi-valued sources
//! resolve to their first value.
//!
//! ```rust
//! use sable::{Args, Binder, ContentType, Router};
//!
//! fn show(args: &Args) -> String {
//!     format!(r#"{{"id":"{}","detail":"{}"}}"#, &args["id"], &args["detail"])
//! }
//!
//! let app = Router::new().get(
//!     r"^/users/(?P<id>[0-9]+)$",
//!     Binder::new(&["id", "detail=summary"])
//!         .content_type(ContentType::Json)
//!         .wrap(show),
//! );
//! ```

use std::ops::Index;

use crate::context::Context;
use crate::error::Error;
use crate::handler::{Handler, Outcome};
use crate::response::{ContentType, Response};
use crate::status::Status;

struct Param {
    name: String,
    from_context: bool,
    default: Option<String>,
}

/// Builds argument-bound handlers. See the [module docs](self).
pub struct Binder {
    params: Vec<Param>,
    content_type: &'static str,
}

impl Binder {
    /// Parses the declared parameter list into a spec, computed once here
    /// and reused for every request the wrapped handler serves.
    ///
    /// # Panics
    ///
    /// Panics on an empty parameter name (`""`, `"@"`, `"=x"`). A bad
    /// declaration is a startup defect, like an invalid route pattern.
    pub fn new(params: &[&str]) -> Self {
        let params = params
            .iter()
            .map(|raw| {
                let (spec, from_context) = match raw.strip_prefix('@') {
                    Some(rest) => (rest, true),
                    None => (*raw, false),
                };
                let (name, default) = match spec.split_once('=') {
                    Some((name, default)) => (name, Some(default.to_owned())),
                    None => (spec, None),
                };
                if name.is_empty() {
                    panic!("invalid parameter spec `{raw}`");
                }
                Param { name: name.to_owned(), from_context, default }
            })
            .collect();
        Self { params, content_type: ContentType::Html.as_str() }
    }

    /// Sets the content type applied to plain text/byte return values.
    /// Defaults to `text/html`. A handler that returns a full
    /// [`Response`] always wins over this.
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type.as_str();
        self
    }

    /// Wraps `f` into a route handler that resolves the declared parameters
    /// before every call. A required parameter that no source supplies
    /// short-circuits to `404 Not Found` without invoking `f`.
    pub fn wrap<F, R>(self, f: F) -> impl Handler
    where
        F: Fn(&Args) -> R + Send + Sync + 'static,
        R: BoundOutput,
    {
        let Binder { params, content_type } = self;
        move |ctx: &mut Context| -> Outcome {
            let query = ctx.query_pairs();
            let mut values = Vec::with_capacity(params.len());
            for param in &params {
                let mut value = if param.from_context {
                    ctx.var_value(&param.name).map(ToOwned::to_owned)
                } else {
                    ctx.param(&param.name).map(ToOwned::to_owned)
                };
                if !param.from_context {
                    if value.is_none() && ctx.method().accepts_body() {
                        value = ctx.form().get(&param.name).and_then(|v| v.first()).cloned();
                    }
                    if value.is_none() {
                        value = query.get(&param.name).and_then(|v| v.first()).cloned();
                    }
                }
                match value.or_else(|| param.default.clone()) {
                    Some(value) => values.push((param.name.clone(), value)),
                    None => return Outcome::Done(ctx.error_response(Status::NotFound)),
                }
            }
            f(&Args { values }).emit(content_type)
        }
    }
}

// ── Resolved arguments ────────────────────────────────────────────────────────

/// The resolved parameter values handed to a bound function.
///
/// Every declared parameter is present — binding fails before the function
/// runs otherwise — so indexing by the declared name is safe:
/// `&args["id"]`.
pub struct Args {
    values: Vec<(String, String)>,
}

impl Args {
    /// The resolved value of a declared parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl Index<&str> for Args {
    type Output = str;

    /// # Panics
    ///
    /// Panics when `name` was not declared to the [`Binder`].
    fn index(&self, name: &str) -> &str {
        match self.get(name) {
            Some(value) => value,
            None => panic!("parameter `{name}` was not declared"),
        }
    }
}

// ── Return interpretation ─────────────────────────────────────────────────────

/// What a bound function may return.
///
/// A structured [`Response`] emits itself unchanged; plain text or bytes are
/// wrapped with `200 OK` and the binder's content type; `None` is the
/// no-content sentinel (404); an error becomes a propagated failure.
pub trait BoundOutput {
    fn emit(self, content_type: &'static str) -> Outcome;
}

impl BoundOutput for Response {
    fn emit(self, _content_type: &'static str) -> Outcome {
        Outcome::Done(self)
    }
}

impl BoundOutput for String {
    fn emit(self, content_type: &'static str) -> Outcome {
        Outcome::Done(Response::raw(content_type, self.into_bytes()))
    }
}

impl BoundOutput for &'static str {
    fn emit(self, content_type: &'static str) -> Outcome {
        Outcome::Done(Response::raw(content_type, self.as_bytes().to_vec()))
    }
}

impl BoundOutput for Vec<u8> {
    fn emit(self, content_type: &'static str) -> Outcome {
        Outcome::Done(Response::raw(content_type, self))
    }
}

impl<T: BoundOutput> BoundOutput for Option<T> {
    fn emit(self, content_type: &'static str) -> Outcome {
        match self {
            Some(value) => value.emit(content_type),
            None => Outcome::Empty,
        }
    }
}

impl<T: BoundOutput, E: Into<Error>> BoundOutput for Result<T, E> {
    fn emit(self, content_type: &'static str) -> Outcome {
        match self {
            Ok(value) => value.emit(content_type),
            Err(e) => Outcome::Failed(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ErasedHandler;
    use crate::method::Method;

    fn call(handler: impl Handler, ctx: &mut Context) -> Outcome {
        match handler.into_endpoint() {
            crate::handler::Endpoint::Leaf(h) => h.call(ctx),
            crate::handler::Endpoint::Mount(_) => unreachable!(),
        }
    }

    #[test]
    fn url_capture_outranks_query_string() {
        let handler = Binder::new(&["id"]).wrap(|args: &Args| args["id"].to_owned());
        let mut ctx = Context::new(Method::Get, "/users/7")
            .query("id=99")
            .url_param("id", "7");
        match call(handler, &mut ctx) {
            Outcome::Done(res) => assert_eq!(res.body(), b"7"),
            _ => panic!("expected a response"),
        }
    }

    #[test]
    fn body_form_outranks_query_for_body_bearing_methods() {
        let handler = Binder::new(&["name"]).wrap(|args: &Args| args["name"].to_owned());
        let mut ctx = Context::new(Method::Post, "/submit")
            .query("name=from_query")
            .body(b"name=from_body".to_vec());
        match call(handler, &mut ctx) {
            Outcome::Done(res) => assert_eq!(res.body(), b"from_body"),
            _ => panic!("expected a response"),
        }

        // The same body is invisible to a GET.
        let handler = Binder::new(&["name"]).wrap(|args: &Args| args["name"].to_owned());
        let mut ctx = Context::new(Method::Get, "/submit")
            .query("name=from_query")
            .body(b"name=from_body".to_vec());
        match call(handler, &mut ctx) {
            Outcome::Done(res) => assert_eq!(res.body(), b"from_query"),
            _ => panic!("expected a response"),
        }
    }

    #[test]
    fn context_flagged_parameters_resolve_from_vars_only() {
        let handler = Binder::new(&["@addr"]).wrap(|args: &Args| args["addr"].to_owned());
        let mut ctx = Context::new(Method::Get, "/")
            .query("addr=spoofed")
            .var("addr", "10.0.0.1");
        match call(handler, &mut ctx) {
            Outcome::Done(res) => assert_eq!(res.body(), b"10.0.0.1"),
            _ => panic!("expected a response"),
        }

        // Absent from the vars: the query value must not leak in.
        let handler = Binder::new(&["@addr"]).wrap(|args: &Args| args["addr"].to_owned());
        let mut ctx = Context::new(Method::Get, "/").query("addr=spoofed");
        match call(handler, &mut ctx) {
            Outcome::Done(res) => assert_eq!(res.status_line(), "404 Not Found"),
            _ => panic!("expected a response"),
        }
    }

    #[test]
    fn missing_required_parameter_is_not_found() {
        let ran = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let saw = ran.clone();
        let handler = Binder::new(&["id"]).wrap(move |_: &Args| {
            saw.store(true, std::sync::atomic::Ordering::SeqCst);
            "unreachable"
        });
        let mut ctx = Context::new(Method::Get, "/users");
        match call(handler, &mut ctx) {
            Outcome::Done(res) => assert_eq!(res.status_line(), "404 Not Found"),
            _ => panic!("expected a response"),
        }
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn unresolved_parameter_keeps_its_default() {
        let handler =
            Binder::new(&["page=1"]).wrap(|args: &Args| args["page"].to_owned());
        let mut ctx = Context::new(Method::Get, "/list");
        match call(handler, &mut ctx) {
            Outcome::Done(res) => assert_eq!(res.body(), b"1"),
            _ => panic!("expected a response"),
        }
    }

    #[test]
    fn multi_valued_sources_resolve_to_the_first_value() {
        let handler = Binder::new(&["tag"]).wrap(|args: &Args| args["tag"].to_owned());
        let mut ctx = Context::new(Method::Get, "/").query("tag=a&tag=b");
        match call(handler, &mut ctx) {
            Outcome::Done(res) => assert_eq!(res.body(), b"a"),
            _ => panic!("expected a response"),
        }
    }

    #[test]
    fn plain_text_return_takes_the_declared_content_type() {
        let handler = Binder::new(&[])
            .content_type(ContentType::Json)
            .wrap(|_: &Args| r#"{"ok":true}"#.to_owned());
        let mut ctx = Context::new(Method::Get, "/");
        match call(handler, &mut ctx) {
            Outcome::Done(res) => {
                assert_eq!(res.header("content-type"), Some("application/json"));
                assert_eq!(res.status_line(), "200 OK");
            }
            _ => panic!("expected a response"),
        }
    }

    #[test]
    fn structured_response_wins_over_the_declared_content_type() {
        let handler = Binder::new(&[])
            .content_type(ContentType::Json)
            .wrap(|_: &Args| Response::text("plain"));
        let mut ctx = Context::new(Method::Get, "/");
        match call(handler, &mut ctx) {
            Outcome::Done(res) => {
                assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
            }
            _ => panic!("expected a response"),
        }
    }

    #[test]
    #[should_panic(expected = "invalid parameter spec")]
    fn empty_parameter_name_is_rejected() {
        let _ = Binder::new(&["@"]);
    }
}
