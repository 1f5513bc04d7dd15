//! # sable
//!
//! A minimal, composable HTTP dispatch layer. Nothing more. Nothing less.
//!
//! ## The shape
//!
//! Routes are regular expressions. Every registered pattern folds into one
//! combined alternation, so a single regex pass selects the route — and the
//! match only ever consumes the *front* of the path, which is what makes
//! routers compose: mount a router inside another and the inner one sees
//! just the remainder, never its absolute prefix.
//!
//! On top of that sits the argument binder: declare a handler's inputs by
//! name and the binder resolves them per request — host context, URL
//! captures, submitted body, query string, in that order — before your
//! function runs. The function body stays pure business logic.
//!
//! What sable intentionally leaves to others: TLS, rate limiting, body-size
//! limits and slow-client protection (the reverse proxy already ships
//! them), plus sessions-as-storage, ORMs, and auth policy.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use sable::{Args, Binder, Context, ContentType, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .get(r"^/users/(?P<id>[0-9]+)$", Binder::new(&["id"])
//!             .content_type(ContentType::Json)
//!             .wrap(get_user))
//!         .post(r"^/users$", create_user);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! fn get_user(args: &Args) -> String {
//!     format!(r#"{{"id":"{}"}}"#, &args["id"])
//! }
//!
//! fn create_user(ctx: &mut Context) -> Response {
//!     if ctx.body_bytes().is_empty() {
//!         return Response::status(sable::Status::BadRequest);
//!     }
//!     Response::builder()
//!         .status(sable::Status::Created)
//!         .header("location", "/users/99")
//!         .json(br#"{"id":"99"}"#.to_vec())
//! }
//! ```

mod binder;
mod context;
mod error;
mod handler;
mod method;
mod paging;
mod pattern;
mod response;
mod route;
mod router;
mod server;
mod session;
mod status;
mod template;

pub mod diag;
pub mod static_files;

pub use binder::{Args, Binder, BoundOutput};
pub use context::{Context, ErrorHandler};
pub use error::Error;
pub use handler::{Handler, IntoOutcome, Outcome};
pub use method::Method;
pub use paging::{Link, Paging};
pub use response::{redirect_to, ContentType, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use session::{transactional, Session};
pub use status::Status;
pub use template::Templates;
