//! Middleware constructors and chaining.
//!
//! Middleware is the right place for cross-cutting concerns: tracing,
//! request ids, authentication-header inspection, early rejection. Here a
//! middleware is a [`Constructor`]: a function that takes the next handler
//! and returns a handler wrapping it.
//!
//! ```rust
//! use apollo::{handler_fn, BoxHandler, Constructor, Handler};
//!
//! fn request_id(next: BoxHandler) -> BoxHandler {
//!     handler_fn(move |cx, res, req| {
//!         res.header("x-request-id", "42");
//!         next.call(cx, res, req);
//!     })
//!     .into_boxed()
//! }
//!
//! let constructor = Constructor::new(request_id);
//! ```
//!
//! A constructor decides for itself whether to call `next`. Not calling it
//! halts the pipeline, which is how a middleware rejects a request.
//!
//! Plain middleware written against [`HttpHandler`] joins a chain through
//! [`wrap`].

mod chain;

pub use chain::Chain;

use std::fmt;
use std::sync::Arc;

use crate::adapter::BindContext;
use crate::handler::{handler_fn, BoxHandler, BoxHttpHandler, Handler, HttpHandler};

/// Builds a handler around the next one.
///
/// Cheap to clone; clones share the same function. A [`Chain`] copies its
/// list of constructors on `append`, never the functions themselves.
#[derive(Clone)]
pub struct Constructor(Arc<dyn Fn(BoxHandler) -> BoxHandler + Send + Sync>);

impl Constructor {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(BoxHandler) -> BoxHandler + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wraps `next`, returning the new outer handler.
    pub fn construct(&self, next: BoxHandler) -> BoxHandler {
        (self.0)(next)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Constructor")
    }
}

/// Lifts plain [`HttpHandler`] middleware into a [`Constructor`].
///
/// On each request the lifted middleware is applied to a [`BindContext`]
/// holding `next` and the context the request arrived with, then called.
/// The middleware never sees the context, and `next` receives it unchanged.
///
/// ```rust
/// use apollo::{http_handler_fn, wrap, BoxHttpHandler, Chain, HttpHandler};
///
/// fn powered_by(next: BoxHttpHandler) -> BoxHttpHandler {
///     http_handler_fn(move |res, req| {
///         res.header("x-powered-by", "apollo");
///         next.call(res, req);
///     })
///     .into_boxed()
/// }
///
/// let chain = Chain::new([wrap(powered_by)]);
/// ```
pub fn wrap<M>(middleware: M) -> Constructor
where
    M: Fn(BoxHttpHandler) -> BoxHttpHandler + Send + Sync + 'static,
{
    let middleware = Arc::new(middleware);
    Constructor::new(move |next: BoxHandler| {
        let middleware = Arc::clone(&middleware);
        handler_fn(move |cx, res, req| {
            let stub = BindContext::new(cx.clone(), Arc::clone(&next));
            middleware(stub.into_boxed()).call(res, req);
        })
        .into_boxed()
    })
}
