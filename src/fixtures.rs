//! Handlers, middleware and a context key shared by the unit tests.

use std::fmt::Write as _;

use crate::context::Context;
use crate::handler::{handler_fn, http_handler_fn, BoxHandler, BoxHttpHandler, Handler, HttpHandler};
use crate::request::Request;
use crate::response::ResponseWriter;

pub(crate) fn handler_zero(res: &mut ResponseWriter, _req: &mut Request) {
    res.write("h0\n");
}

pub(crate) fn handler_one(_cx: &Context, res: &mut ResponseWriter, _req: &mut Request) {
    res.write("h1\n");
}

/// Writes the test value carried by `cx`, if any.
pub(crate) fn handler_context(cx: &Context, res: &mut ResponseWriter, _req: &mut Request) {
    if let Some(value) = from_context(cx) {
        let _ = write!(res, "{value}\n");
    }
}

pub(crate) fn middle_zero(next: BoxHttpHandler) -> BoxHttpHandler {
    http_handler_fn(move |res, req| {
        res.write("m0\n");
        next.call(res, req);
    })
    .into_boxed()
}

pub(crate) fn middle_one(next: BoxHandler) -> BoxHandler {
    handler_fn(move |cx, res, req| {
        res.write("m1\n");
        next.call(cx, res, req);
    })
    .into_boxed()
}

pub(crate) fn middle_two(next: BoxHandler) -> BoxHandler {
    handler_fn(move |cx, res, req| {
        res.write("m2\n");
        next.call(cx, res, req);
    })
    .into_boxed()
}

#[derive(PartialEq)]
struct TestKey;

pub(crate) fn new_test_context(cx: &Context, value: i32) -> Context {
    cx.with_value(TestKey, value)
}

pub(crate) fn from_context(cx: &Context) -> Option<i32> {
    cx.value::<_, i32>(&TestKey).copied()
}
