//! End-to-end dispatch behavior through the public API.

use std::sync::{Arc, Mutex};

use sable::{Context, Method, Outcome, Response, Router, Status};

fn response_of(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Done(response) => response,
        Outcome::Empty => panic!("dispatch returned the empty sentinel"),
        Outcome::Failed(e) => panic!("dispatch failed: {e}"),
    }
}

fn marker(text: &'static str) -> impl Fn(&mut Context) -> Response + Send + Sync + 'static {
    move |_: &mut Context| Response::text(text)
}

#[test]
fn unmatched_path_is_not_found() {
    let app = Router::new().get("^/users$", marker("users"));
    let mut ctx = Context::new(Method::Get, "/nonexistent");
    assert_eq!(response_of(app.dispatch(&mut ctx)).status_line(), "404 Not Found");
}

#[test]
fn unregistered_method_on_a_matched_path_is_not_allowed() {
    let app = Router::new().get(r"^/users/(?P<id>[0-9]+)$", marker("user"));
    let mut ctx = Context::new(Method::Delete, "/users/7");
    assert_eq!(
        response_of(app.dispatch(&mut ctx)).status_line(),
        "405 Method Not Allowed"
    );
}

#[test]
fn handler_returning_nothing_is_not_found() {
    let app = Router::new().get("^/ghost$", |_: &mut Context| Option::<Response>::None);
    let mut ctx = Context::new(Method::Get, "/ghost");
    assert_eq!(response_of(app.dispatch(&mut ctx)).status_line(), "404 Not Found");
}

#[test]
fn injected_error_handler_replaces_the_default() {
    let app = Router::new().get("^/users$", marker("users"));
    let mut ctx = Context::new(Method::Get, "/missing").on_error(|_, status| {
        Response::builder().status(status).text("custom page")
    });
    let response = response_of(app.dispatch(&mut ctx));
    assert_eq!(response.status_line(), "404 Not Found");
    assert_eq!(response.body(), b"custom page");
}

/// Selecting through the combined alternation must agree with testing each
/// pattern sequentially in registration order and taking the first match.
#[test]
fn combined_match_equals_sequential_first_match() {
    let patterns: [&str; 3] = [r"/users/new", r"/users/(?P<id>[a-z0-9]+)", r"/users"];
    let paths = ["/users/new", "/users/abc", "/users", "/users/", "/other"];

    for path in paths {
        // Sequential reference: one single-route router per pattern.
        let mut sequential: Option<usize> = None;
        for (index, pattern) in patterns.iter().enumerate() {
            let single = Router::new().get(pattern, marker("hit"));
            let mut ctx = Context::new(Method::Get, path);
            if response_of(single.dispatch(&mut ctx)).code() == 200 {
                sequential = Some(index);
                break;
            }
        }

        // Combined: all patterns in one router, marker bodies identify the
        // winning route.
        let mut combined = Router::new();
        for (index, pattern) in patterns.iter().enumerate() {
            combined = combined.get(pattern, move |_: &mut Context| {
                Response::text(index.to_string())
            });
        }
        let mut ctx = Context::new(Method::Get, path);
        let response = response_of(combined.dispatch(&mut ctx));
        let winner = if response.code() == 200 {
            Some(String::from_utf8(response.body().to_vec()).unwrap().parse().unwrap())
        } else {
            None
        };

        assert_eq!(winner, sequential, "route selection diverged for {path}");
    }
}

/// Mounting `/b` inside a router mounted at `/a` must split the path exactly
/// like one router registered at `/a/b` directly.
#[test]
fn mount_composition_is_associative() {
    type Split = Arc<Mutex<Option<(String, String)>>>;

    fn recording(seen: Split) -> impl Fn(&mut Context) -> Response + Send + Sync + 'static {
        move |ctx: &mut Context| {
            *seen.lock().unwrap() = Some((
                ctx.consumed_path().to_owned(),
                ctx.remaining_path().to_owned(),
            ));
            Response::text("ok")
        }
    }

    let nested_split: Split = Arc::default();
    let inner = Router::new().get("^/b$", recording(nested_split.clone()));
    let outer = Router::new().mount("^/a", inner);
    let mut ctx = Context::new(Method::Get, "/a/b");
    assert_eq!(response_of(outer.dispatch(&mut ctx)).code(), 200);

    let flat_split: Split = Arc::default();
    let flat = Router::new().get("^/a/b$", recording(flat_split.clone()));
    let mut ctx = Context::new(Method::Get, "/a/b");
    assert_eq!(response_of(flat.dispatch(&mut ctx)).code(), 200);

    let nested = nested_split.lock().unwrap().clone().unwrap();
    let flat = flat_split.lock().unwrap().clone().unwrap();
    assert_eq!(nested, ("/a/b".to_owned(), String::new()));
    assert_eq!(nested, flat);
}

#[test]
fn nested_routers_see_a_leading_separator() {
    let seen: Arc<Mutex<Option<String>>> = Arc::default();
    let record = seen.clone();
    let inner = Router::new().get(r"^/users/(?P<id>[0-9]+)$", move |ctx: &mut Context| {
        *record.lock().unwrap() = Some(ctx.remaining_path().to_owned());
        Response::text(ctx.param("id").unwrap_or("").to_owned())
    });
    let app = Router::new().mount("^/api/v1", inner);

    let mut ctx = Context::new(Method::Get, "/api/v1/users/42");
    let response = response_of(app.dispatch(&mut ctx));
    assert_eq!(response.body(), b"42");
    // The inner router consumed its whole pattern.
    assert_eq!(seen.lock().unwrap().as_deref(), Some(""));
    assert_eq!(ctx.consumed_path(), "/api/v1/users/42");
}

#[test]
fn outer_captures_survive_unless_recaptured() {
    let inner = Router::new().get(r"^/posts/(?P<post>[0-9]+)$", |ctx: &mut Context| {
        Response::text(format!(
            "{}:{}",
            ctx.param("user").unwrap_or("-"),
            ctx.param("post").unwrap_or("-"),
        ))
    });
    let app = Router::new().mount(r"^/users/(?P<user>[0-9]+)", inner);

    let mut ctx = Context::new(Method::Get, "/users/7/posts/3");
    assert_eq!(response_of(app.dispatch(&mut ctx)).body(), b"7:3");
}

#[test]
fn redirect_handler_carries_the_query_string() {
    let app = Router::new().get("^/old$", sable::redirect_to("/new"));

    let mut ctx = Context::new(Method::Get, "/old").query("q=1");
    let response = response_of(app.dispatch(&mut ctx));
    assert_eq!(response.status_line(), "301 Moved Permanently");
    assert_eq!(response.header("location"), Some("/new?q=1"));

    let app = Router::new().get("^/old$", sable::redirect_to("/new"));
    let mut ctx = Context::new(Method::Get, "/old");
    let response = response_of(app.dispatch(&mut ctx));
    assert_eq!(response.header("location"), Some("/new"));
}

#[test]
fn handler_failure_propagates_through_mounts() {
    let inner = Router::new().get("^/boom$", |_: &mut Context| {
        Err::<Response, _>(sable::Error::handler("exploded"))
    });
    let app = Router::new().mount("^/api", inner);

    let mut ctx = Context::new(Method::Get, "/api/boom");
    match app.dispatch(&mut ctx) {
        Outcome::Failed(e) => assert!(e.to_string().contains("exploded")),
        _ => panic!("expected the failure to propagate unchanged"),
    }
}

#[test]
fn status_handlers_and_text_handlers_convert() {
    let app = Router::new()
        .delete("^/users$", |_: &mut Context| Status::NoContent)
        .get("^/ping$", |_: &mut Context| "pong");

    let mut ctx = Context::new(Method::Delete, "/users");
    assert_eq!(response_of(app.dispatch(&mut ctx)).status_line(), "204 No Content");

    let mut ctx = Context::new(Method::Get, "/ping");
    assert_eq!(response_of(app.dispatch(&mut ctx)).body(), b"pong");
}
