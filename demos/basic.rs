//! Minimal apollo example: a context-aware chain in front of a router.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/users/42
//!   curl -i http://localhost:3000/whoami
//!   curl -i -H 'authorization: Bearer demo' http://localhost:3000/whoami

use std::fmt::Write;
use std::time::Instant;

use apollo::http::{Method, StatusCode};
use apollo::adapter::StripContext;
use apollo::{
    handler_fn, http_handler_fn, wrap, BoxHandler, BoxHttpHandler, Chain, Constructor, Context,
    Handler, HttpHandler, Router, Server,
};

#[derive(PartialEq)]
enum Key {
    Service,
    User,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // One chain, two pipelines: `authed` extends `public` without changing it.
    let public = Chain::new([wrap(timing)]);
    let authed = public
        .append([Constructor::new(require_auth)])
        .with(Context::background().with_value(Key::Service, "users"));

    let router = Router::new()
        .on(Method::GET, "/users/{id}", public.then(StripContext::new(http_handler_fn(get_user))))
        .on(Method::GET, "/whoami", authed.then_func(whoami));

    Server::bind("0.0.0.0:3000")
        .expect("valid address")
        .serve(router)
        .await
        .expect("server error");
}

// Plain middleware: knows nothing about the context.
fn timing(next: BoxHttpHandler) -> BoxHttpHandler {
    http_handler_fn(move |res, req| {
        let started = Instant::now();
        next.call(res, req);
        tracing::info!(path = req.path(), elapsed = ?started.elapsed(), "handled");
    })
    .into_boxed()
}

// Context-aware middleware: rejects anonymous requests, otherwise passes the
// caller's identity down in a derived context.
fn require_auth(next: BoxHandler) -> BoxHandler {
    handler_fn(move |cx, res, req| {
        let Some(user) = req.header("authorization").and_then(|v| v.strip_prefix("Bearer ")) else {
            res.write_header(StatusCode::UNAUTHORIZED);
            res.write("missing bearer token\n");
            return;
        };
        let cx = cx.with_value(Key::User, user.to_owned());
        next.call(&cx, res, req);
    })
    .into_boxed()
}

fn get_user(res: &mut apollo::ResponseWriter, req: &mut apollo::Request) {
    let id = req.param("id").unwrap_or("unknown");
    res.header("content-type", "application/json");
    let _ = write!(res, r#"{{"id":"{id}","name":"alice"}}"#);
}

fn whoami(cx: &Context, res: &mut apollo::ResponseWriter, _req: &mut apollo::Request) {
    let service = cx.value::<_, &str>(&Key::Service).copied().unwrap_or("?");
    let user = cx.value::<_, String>(&Key::User).map(String::as_str).unwrap_or("?");
    let _ = write!(res, "{user}@{service}\n");
}
