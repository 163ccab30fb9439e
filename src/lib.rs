//! # apollo
//!
//! Context-aware middleware chaining for synchronous HTTP handlers.
//!
//! ## The idea
//!
//! A middleware is a [`Constructor`]: it takes the next handler and returns
//! a handler that wraps it. A [`Chain`] is an ordered, immutable list of
//! constructors plus a [`Context`] (an immutable, request-scoped key/value
//! carrier). Given a terminal handler, the chain folds its constructors
//! around it and hands back one handler to install on a transport:
//!
//! ```text
//! Chain::new([m1, m2, m3]).with(cx).then(h)
//!
//!     request ──▶ m1 ──▶ m2 ──▶ m3 ──▶ h        (each sees cx, or what the
//!                                                 layer before passed on)
//! ```
//!
//! Two handler traits exist side by side: [`Handler`] receives the context,
//! [`HttpHandler`] does not. Plain `HttpHandler` middleware joins a chain
//! through [`wrap`], which carries the context around it untouched. The
//! shims in [`adapter`] convert between the two.
//!
//! apollo does not route, authenticate or log requests for you. It orders
//! and composes functions. A small [`Router`] and a hyper-based [`Server`]
//! are included so a chain can be served end to end.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::fmt::Write;
//! use apollo::{handler_fn, http_handler_fn, wrap, BoxHandler, BoxHttpHandler, Chain,
//!              Constructor, Context, Handler, HttpHandler, Server};
//!
//! #[derive(PartialEq)]
//! struct Greeting;
//!
//! fn log_path(next: BoxHttpHandler) -> BoxHttpHandler {
//!     http_handler_fn(move |res, req| {
//!         println!("{}", req.path());
//!         next.call(res, req);
//!     })
//!     .into_boxed()
//! }
//!
//! fn banner(next: BoxHandler) -> BoxHandler {
//!     handler_fn(move |cx, res, req| {
//!         res.write("== ");
//!         next.call(cx, res, req);
//!     })
//!     .into_boxed()
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let cx = Context::background().with_value(Greeting, "hello");
//!     let app = Chain::new([wrap(log_path), Constructor::new(banner)])
//!         .with(cx)
//!         .then_func(|cx, res, _req| {
//!             let greeting = cx.value::<_, &str>(&Greeting).unwrap_or(&"hi");
//!             let _ = write!(res, "{greeting}\n");
//!         });
//!
//!     Server::bind("0.0.0.0:3000").unwrap().serve(app).await.unwrap();
//! }
//! ```

pub mod adapter;
mod context;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

#[cfg(test)]
mod fixtures;

pub use context::Context;
pub use error::Error;
pub use handler::{
    handler_fn, http_handler_fn, BoxHandler, BoxHttpHandler, Handler, HandlerFn, HttpHandler,
    HttpHandlerFn,
};
pub use middleware::{wrap, Chain, Constructor};
pub use request::Request;
pub use response::ResponseWriter;
pub use router::Router;
pub use server::{serve, Server};

pub use http;
