//! The two handler capabilities and their function adapters.
//!
//! # Two traits, one request
//!
//! A request can be handled with or without the chain's [`Context`]:
//!
//! | Trait | Signature | Typical use |
//! |---|---|---|
//! | [`Handler`] | `call(&cx, &mut res, &mut req)` | context-aware middleware and handlers |
//! | [`HttpHandler`] | `call(&mut res, &mut req)` | the transport, routers, plain middleware |
//!
//! The two are converted into each other by the shims in
//! [`adapter`](crate::adapter). Nothing converts implicitly.
//!
//! # Storage
//!
//! A composed pipeline is a tree of handlers of many concrete types, so
//! every link is type-erased behind an `Arc`:
//!
//! ```text
//! |cx, res, req| { … }          ← user writes this
//!        ↓ handler_fn(…)
//! HandlerFn(closure)            ← implements Handler
//!        ↓ .into_boxed()
//! Arc<dyn Handler>              ← BoxHandler, shared by every request
//! ```
//!
//! One virtual call per layer per request; no allocation on the hot path.

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::request::Request;
use crate::response::ResponseWriter;

/// A type-erased, shared, context-aware handler.
pub type BoxHandler = Arc<dyn Handler>;

/// A type-erased, shared, context-unaware handler.
pub type BoxHttpHandler = Arc<dyn HttpHandler>;

// ── Handler ───────────────────────────────────────────────────────────────────

/// Processes one request given the request-scoped [`Context`].
///
/// Called synchronously, possibly from many threads at once. Any state an
/// implementation keeps is its own business to synchronise.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, cx: &Context, res: &mut ResponseWriter, req: &mut Request);

    /// Erases the concrete type. Already-boxed handlers are returned as-is.
    fn into_boxed(self) -> BoxHandler
    where
        Self: Sized,
    {
        Arc::new(self)
    }
}

impl Handler for BoxHandler {
    fn call(&self, cx: &Context, res: &mut ResponseWriter, req: &mut Request) {
        (**self).call(cx, res, req)
    }

    fn into_boxed(self) -> BoxHandler {
        self
    }
}

// ── HttpHandler ───────────────────────────────────────────────────────────────

/// Processes one request without a [`Context`].
///
/// This is the interface a transport installs: [`Chain::then`] returns one,
/// [`Server`] serves one.
///
/// [`Chain::then`]: crate::Chain::then
/// [`Server`]: crate::Server
pub trait HttpHandler: Send + Sync + 'static {
    fn call(&self, res: &mut ResponseWriter, req: &mut Request);

    /// Erases the concrete type. Already-boxed handlers are returned as-is.
    fn into_boxed(self) -> BoxHttpHandler
    where
        Self: Sized,
    {
        Arc::new(self)
    }
}

impl HttpHandler for BoxHttpHandler {
    fn call(&self, res: &mut ResponseWriter, req: &mut Request) {
        (**self).call(res, req)
    }

    fn into_boxed(self) -> BoxHttpHandler {
        self
    }
}

// ── Function adapters ─────────────────────────────────────────────────────────

/// Adapts a closure or `fn` into a [`Handler`].
///
/// ```rust
/// use std::fmt::Write;
/// use apollo::{handler_fn, Handler};
///
/// let hello = handler_fn(|_cx, res, _req| {
///     let _ = write!(res, "hello\n");
/// });
/// let boxed = hello.into_boxed();
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&Context, &mut ResponseWriter, &mut Request) + Send + Sync + 'static,
{
    HandlerFn(f)
}

/// Adapts a closure or `fn` into an [`HttpHandler`].
pub fn http_handler_fn<F>(f: F) -> HttpHandlerFn<F>
where
    F: Fn(&mut ResponseWriter, &mut Request) + Send + Sync + 'static,
{
    HttpHandlerFn(f)
}

/// A [`Handler`] backed by a function. See [`handler_fn`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F>(F);

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&Context, &mut ResponseWriter, &mut Request) + Send + Sync + 'static,
{
    fn call(&self, cx: &Context, res: &mut ResponseWriter, req: &mut Request) {
        (self.0)(cx, res, req)
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandlerFn")
            .field(&format_args!("<{}>", std::any::type_name::<F>()))
            .finish()
    }
}

/// An [`HttpHandler`] backed by a function. See [`http_handler_fn`].
#[derive(Clone, Copy)]
pub struct HttpHandlerFn<F>(F);

impl<F> HttpHandler for HttpHandlerFn<F>
where
    F: Fn(&mut ResponseWriter, &mut Request) + Send + Sync + 'static,
{
    fn call(&self, res: &mut ResponseWriter, req: &mut Request) {
        (self.0)(res, req)
    }
}

impl<F> fmt::Debug for HttpHandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HttpHandlerFn")
            .field(&format_args!("<{}>", std::any::type_name::<F>()))
            .finish()
    }
}
