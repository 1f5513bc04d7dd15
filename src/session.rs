//! Scoped transactional sessions.
//!
//! A [`transactional`] handler opens a fresh session per request, runs the
//! wrapped function, commits on success and rolls back on failure, and
//! closes the session on every exit path — the close lives in a drop guard,
//! so it also runs if the handler unwinds. Failures re-surface unchanged as
//! [`Outcome::Failed`] and reach the transport's own failure path; they are
//! never converted into routing conditions.

use crate::context::Context;
use crate::error::Error;
use crate::handler::{Handler, IntoOutcome, Outcome};

/// A transactional unit of work, typically a database session.
///
/// The dispatch layer never interprets the session; it only drives the
/// commit / rollback / close protocol around the wrapped handler.
pub trait Session {
    /// Makes the request's work durable. A commit failure is treated like a
    /// handler failure: the session is rolled back and the error propagates.
    fn commit(&mut self) -> Result<(), Error>;

    /// Discards the request's work. Best-effort; must not fail.
    fn rollback(&mut self);

    /// Releases the session's resources. Called exactly once, on every exit
    /// path.
    fn close(&mut self);
}

/// Wraps a fallible handler in a per-request session scope.
///
/// ```rust
/// use sable::{transactional, Context, Error, Response, Router, Session};
///
/// struct Tx;
/// impl Session for Tx {
///     fn commit(&mut self) -> Result<(), Error> { Ok(()) }
///     fn rollback(&mut self) {}
///     fn close(&mut self) {}
/// }
///
/// let app = Router::new().post(
///     r"^/orders$",
///     transactional(
///         || Tx,
///         |_tx: &mut Tx, _ctx: &mut Context| -> Result<Response, Error> {
///             Ok(Response::text("ordered"))
///         },
///     ),
/// );
/// ```
pub fn transactional<S, Make, F, R, E>(make_session: Make, handler: F) -> impl Handler
where
    S: Session,
    Make: Fn() -> S + Send + Sync + 'static,
    F: Fn(&mut S, &mut Context) -> Result<R, E> + Send + Sync + 'static,
    R: IntoOutcome,
    E: Into<Error>,
{
    move |ctx: &mut Context| -> Outcome {
        let mut guard = Guard(Some(make_session()));
        match handler(guard.session(), ctx) {
            Ok(value) => match guard.session().commit() {
                Ok(()) => value.into_outcome(),
                Err(e) => {
                    guard.session().rollback();
                    Outcome::Failed(e)
                }
            },
            Err(e) => {
                guard.session().rollback();
                Outcome::Failed(e.into())
            }
        }
        // Guard drops here: close() runs whatever the outcome.
    }
}

/// Owns the session for the duration of one handler call and closes it on
/// drop, unwinds included.
struct Guard<S: Session>(Option<S>);

impl<S: Session> Guard<S> {
    fn session(&mut self) -> &mut S {
        // The option is only emptied in drop.
        self.0.as_mut().expect("session taken")
    }
}

impl<S: Session> Drop for Guard<S> {
    fn drop(&mut self) {
        if let Some(mut session) = self.0.take() {
            session.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Endpoint, ErasedHandler};
    use crate::method::Method;
    use crate::response::Response;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counts {
        commits: AtomicUsize,
        rollbacks: AtomicUsize,
        closes: AtomicUsize,
    }

    struct Probe(Arc<Counts>);

    impl Session for Probe {
        fn commit(&mut self) -> Result<(), Error> {
            self.0.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn rollback(&mut self) {
            self.0.rollbacks.fetch_add(1, Ordering::SeqCst);
        }
        fn close(&mut self) {
            self.0.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn call(handler: impl Handler, ctx: &mut Context) -> Outcome {
        match handler.into_endpoint() {
            Endpoint::Leaf(h) => h.call(ctx),
            Endpoint::Mount(_) => unreachable!(),
        }
    }

    #[test]
    fn success_commits_then_closes() {
        let counts = Arc::new(Counts::default());
        let probe = counts.clone();
        let handler = transactional(
            move || Probe(probe.clone()),
            |_: &mut Probe, _: &mut Context| -> Result<Response, Error> {
                Ok(Response::text("ok"))
            },
        );
        let mut ctx = Context::new(Method::Post, "/orders");
        match call(handler, &mut ctx) {
            Outcome::Done(res) => assert_eq!(res.body(), b"ok"),
            _ => panic!("expected a response"),
        }
        assert_eq!(counts.commits.load(Ordering::SeqCst), 1);
        assert_eq!(counts.rollbacks.load(Ordering::SeqCst), 0);
        assert_eq!(counts.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_rolls_back_closes_once_and_propagates() {
        let counts = Arc::new(Counts::default());
        let probe = counts.clone();
        let handler = transactional(
            move || Probe(probe.clone()),
            |_: &mut Probe, _: &mut Context| -> Result<Response, Error> {
                Err(Error::handler("constraint violated"))
            },
        );
        let mut ctx = Context::new(Method::Post, "/orders");
        match call(handler, &mut ctx) {
            Outcome::Failed(e) => {
                assert!(e.to_string().contains("constraint violated"));
            }
            _ => panic!("expected the failure to propagate"),
        }
        assert_eq!(counts.commits.load(Ordering::SeqCst), 0);
        assert_eq!(counts.rollbacks.load(Ordering::SeqCst), 1);
        assert_eq!(counts.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn commit_failure_rolls_back_too() {
        struct FailingCommit(Arc<Counts>);
        impl Session for FailingCommit {
            fn commit(&mut self) -> Result<(), Error> {
                Err(Error::handler("commit refused"))
            }
            fn rollback(&mut self) {
                self.0.rollbacks.fetch_add(1, Ordering::SeqCst);
            }
            fn close(&mut self) {
                self.0.closes.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counts = Arc::new(Counts::default());
        let probe = counts.clone();
        let handler = transactional(
            move || FailingCommit(probe.clone()),
            |_: &mut FailingCommit, _: &mut Context| -> Result<Response, Error> {
                Ok(Response::text("ok"))
            },
        );
        let mut ctx = Context::new(Method::Post, "/orders");
        assert!(matches!(call(handler, &mut ctx), Outcome::Failed(_)));
        assert_eq!(counts.rollbacks.load(Ordering::SeqCst), 1);
        assert_eq!(counts.closes.load(Ordering::SeqCst), 1);
    }
}
