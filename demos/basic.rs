//! Minimal sable example — bound JSON endpoints, a mounted API router,
//! and the built-in diagnostics.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/api/users/42
//!   curl 'http://localhost:3000/api/users/42?detail=full'
//!   curl -X POST http://localhost:3000/api/users -d 'name=alice'
//!   curl http://localhost:3000/old-home
//!   curl http://localhost:3000/healthz

use sable::{diag, redirect_to, Args, Binder, Context, ContentType, Response, Router, Server, Status};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let api = Router::new()
        .get(
            r"^/users/(?P<id>[0-9]+)$",
            Binder::new(&["id", "detail=summary"])
                .content_type(ContentType::Json)
                .wrap(get_user),
        )
        .post(r"^/users$", create_user);

    let app = Router::new()
        .mount("^/api", api)
        .get("^/old-home$", redirect_to("/"))
        .get("^/healthz$", diag::liveness)
        .get("^/readyz$", diag::readiness)
        .get("^/debug/request$", diag::dump)
        .get("^/$", |_: &mut Context| "welcome");

    tracing::info!("routes:\n{app}");

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// GET /api/users/:id — `id` comes from the URL capture, `detail` from the
// query string or its declared default. The binder applies the JSON content
// type to the plain string we return.
fn get_user(args: &Args) -> String {
    format!(r#"{{"id":"{}","detail":"{}"}}"#, &args["id"], &args["detail"])
}

// POST /api/users — a plain handler that inspects the context itself.
fn create_user(ctx: &mut Context) -> Response {
    if ctx.body_bytes().is_empty() {
        return Response::status(Status::BadRequest);
    }
    Response::builder()
        .status(Status::Created)
        .header("location", "/api/users/99")
        .json(br#"{"id":"99"}"#.to_vec())
}
