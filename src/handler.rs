//! Handler trait, dispatch outcome, and type erasure.
//!
//! # How handlers are stored
//!
//! The route table needs to hold handlers of *different* types in a single
//! method map. Rust collections can only hold one concrete type, so we use
//! **trait objects** (`dyn ErasedHandler`) to hide the concrete handler type
//! behind a common interface and store everything uniformly.
//!
//! The chain from user code to vtable call is:
//!
//! ```text
//! fn hello(ctx: &mut Context) -> Response { … }    ← user writes this
//!        ↓ router.get("^/$", hello)
//! hello.into_endpoint()                            ← Handler blanket impl
//!        ↓
//! Endpoint::Leaf(Arc::new(FnHandler(hello)))      ← heap-allocated wrapper
//!        ↓  stored in the route's method map
//! endpoint.call(ctx)  at request time              ← one vtable dispatch
//! ```
//!
//! A nested router is stored in the same map as `Endpoint::Mount`, so the
//! dispatcher invokes either variant with the same calling convention and
//! only the enum tag distinguishes them.

use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

// ── Outcome ──────────────────────────────────────────────────────────────────

/// The result of invoking a handler or a nested router.
pub enum Outcome {
    /// A produced response, propagated unchanged to the transport.
    Done(Response),
    /// No content produced — the dispatcher turns this into `404 Not Found`
    /// through the contextual error handler.
    Empty,
    /// An unexpected application failure. Propagates through nested routers
    /// untouched; the transport surfaces it as a generic server error.
    Failed(Error),
}

/// Conversion into a dispatch [`Outcome`].
///
/// Implemented for the types a handler naturally returns: a [`Response`],
/// plain text, a bare [`Status`], an `Option` of any of those (where `None`
/// is the no-content sentinel), and a `Result` whose error becomes
/// [`Outcome::Failed`].
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome {
        self
    }
}

impl IntoOutcome for Response {
    fn into_outcome(self) -> Outcome {
        Outcome::Done(self)
    }
}

impl IntoOutcome for &'static str {
    fn into_outcome(self) -> Outcome {
        Outcome::Done(Response::text(self))
    }
}

impl IntoOutcome for String {
    fn into_outcome(self) -> Outcome {
        Outcome::Done(Response::text(self))
    }
}

/// Return a [`Status`] directly from a handler: `return Status::NoContent`.
impl IntoOutcome for Status {
    fn into_outcome(self) -> Outcome {
        Outcome::Done(Response::status(self))
    }
}

impl<T: IntoOutcome> IntoOutcome for Option<T> {
    fn into_outcome(self) -> Outcome {
        match self {
            Some(value) => value.into_outcome(),
            None => Outcome::Empty,
        }
    }
}

impl<T: IntoOutcome, E: Into<Error>> IntoOutcome for Result<T, E> {
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(value) => value.into_outcome(),
            Err(e) => Outcome::Failed(e.into()),
        }
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_endpoint` method.
/// External crates cannot usefully interact with this trait.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, ctx: &mut Context) -> Outcome;

    /// Diagnostic name, reported when a registration is overridden.
    fn name(&self) -> &'static str;
}

/// A heap-allocated, type-erased handler shared across concurrent requests.
///
/// `Arc` gives cheap, thread-safe shared ownership (one atomic reference
/// count increment per request) without copying the handler.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// What a route's method map actually stores: a terminal handler or a whole
/// nested router to recurse into. Both are invoked uniformly via
/// [`Endpoint::call`].
#[doc(hidden)]
#[derive(Clone)]
pub enum Endpoint {
    Leaf(BoxedHandler),
    Mount(Arc<Router>),
}

impl Endpoint {
    pub(crate) fn call(&self, ctx: &mut Context) -> Outcome {
        match self {
            Self::Leaf(handler) => handler.call(ctx),
            Self::Mount(router) => router.dispatch(ctx),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Leaf(handler) => handler.name(),
            Self::Mount(_) => "<nested router>",
        }
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// function or closure with the signature:
///
/// ```text
/// fn name(ctx: &mut Context) -> impl IntoOutcome
/// ```
///
/// The trait is **sealed** (via the private `Sealed` supertrait): only the
/// blanket impl below can satisfy it. This prevents accidental misuse and
/// keeps the API surface stable across versions.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_endpoint(self) -> Endpoint;
}

/// The sealing module. Because `Sealed` is private, external crates cannot
/// name it and therefore cannot implement `Handler` on their own types.
mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, R> private::Sealed for F
where
    F: Fn(&mut Context) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
}

/// Implement `Handler` for any function with the right signature.
///
/// `Fn(&mut Context) -> R` covers named `fn` items, closures (the binder,
/// redirect, and static-file factories all return closures), and any struct
/// that implements `Fn`.
impl<F, R> Handler for F
where
    F: Fn(&mut Context) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    fn into_endpoint(self) -> Endpoint {
        Endpoint::Leaf(Arc::new(FnHandler(self)))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype wrapper that holds a concrete handler `F` and implements
/// [`ErasedHandler`], bridging the typed world to the trait-object world.
struct FnHandler<F>(F);

impl<F, R> ErasedHandler for FnHandler<F>
where
    F: Fn(&mut Context) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    fn call(&self, ctx: &mut Context) -> Outcome {
        (self.0)(ctx).into_outcome()
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<F>()
    }
}
