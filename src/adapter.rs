//! Shims between [`Handler`] and [`HttpHandler`].
//!
//! Most code never names these: [`Chain::then`](crate::Chain::then) returns a
//! [`BindContext`] and [`wrap`](crate::wrap) builds them internally. They are
//! public for the cases the chain does not cover, such as ending a
//! context-aware pipeline in an existing plain handler.

use std::fmt;

use crate::context::Context;
use crate::handler::{BoxHandler, BoxHttpHandler, Handler, HttpHandler};
use crate::request::Request;
use crate::response::ResponseWriter;

/// Presents a [`Handler`] as an [`HttpHandler`] by supplying a fixed
/// [`Context`] captured at construction.
///
/// This is the on-ramp of every composed chain, and the stub `wrap` hands to
/// plain middleware so the context survives the trip through it.
#[derive(Clone)]
pub struct BindContext {
    cx: Context,
    handler: BoxHandler,
}

impl BindContext {
    pub fn new(cx: Context, handler: impl Handler) -> Self {
        Self { cx, handler: handler.into_boxed() }
    }

    /// The context every call is made with.
    pub fn context(&self) -> &Context {
        &self.cx
    }
}

impl HttpHandler for BindContext {
    fn call(&self, res: &mut ResponseWriter, req: &mut Request) {
        self.handler.call(&self.cx, res, req)
    }
}

impl fmt::Debug for BindContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindContext").field("cx", &self.cx).finish_non_exhaustive()
    }
}

/// Presents an [`HttpHandler`] as a [`Handler`] by dropping the [`Context`]
/// on every call.
///
/// Lets plain handlers sit inside a context-aware chain, most often as its
/// terminal handler.
#[derive(Clone)]
pub struct StripContext {
    handler: BoxHttpHandler,
}

impl StripContext {
    pub fn new(handler: impl HttpHandler) -> Self {
        Self { handler: handler.into_boxed() }
    }
}

impl Handler for StripContext {
    fn call(&self, _cx: &Context, res: &mut ResponseWriter, req: &mut Request) {
        self.handler.call(res, req)
    }
}

impl fmt::Debug for StripContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripContext").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{from_context, handler_context, handler_one, handler_zero, new_test_context};
    use crate::handler::{handler_fn, http_handler_fn};
    use http::StatusCode;

    #[test]
    fn bind_context_serves() {
        let adapter = BindContext::new(Context::background(), handler_fn(handler_one));
        let mut res = ResponseWriter::new();
        adapter.call(&mut res, &mut Request::default());
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body(), b"h1\n");
    }

    #[test]
    fn bind_context_supplies_captured_context() {
        let cx = new_test_context(&Context::background(), 10);
        let adapter = BindContext::new(cx.clone(), handler_fn(handler_context));
        assert_eq!(adapter.context(), &cx);

        let mut res = ResponseWriter::new();
        adapter.call(&mut res, &mut Request::default());
        assert_eq!(res.body(), b"10\n");
    }

    #[test]
    fn strip_context_serves() {
        let adapter = StripContext::new(http_handler_fn(handler_zero));
        let mut res = ResponseWriter::new();
        let cx = new_test_context(&Context::background(), 3);
        adapter.call(&cx, &mut res, &mut Request::default());
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body(), b"h0\n");
    }

    #[test]
    fn round_trip_loses_outer_context() {
        // Strip then bind: the inner handler sees the bound context, not the
        // one the stripped layer was called with.
        let inner = BindContext::new(
            new_test_context(&Context::background(), 1),
            handler_fn(|cx, res, _req| {
                res.write(format!("{:?}\n", from_context(cx)));
            }),
        );
        let outer = StripContext::new(inner);

        let mut res = ResponseWriter::new();
        outer.call(&new_test_context(&Context::background(), 2), &mut res, &mut Request::default());
        assert_eq!(res.body(), b"Some(1)\n");
    }
}
