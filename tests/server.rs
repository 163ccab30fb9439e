//! End-to-end: chains installed on a real server, driven over TCP.

use std::fmt::Write as _;
use std::time::Duration;

use apollo::{
    handler_fn, http_handler_fn, wrap, BoxHandler, BoxHttpHandler, Chain, Constructor, Context,
    Handler, HttpHandler, Request, ResponseWriter, Router,
};
use apollo::http::Method;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

#[derive(PartialEq)]
struct ValueKey;

fn with_value(value: i32) -> Context {
    Context::background().with_value(ValueKey, value)
}

fn handler_context(cx: &Context, res: &mut ResponseWriter, _req: &mut Request) {
    if let Some(value) = cx.value::<_, i32>(&ValueKey) {
        let _ = write!(res, "{value}\n");
    }
}

fn middle_zero(next: BoxHttpHandler) -> BoxHttpHandler {
    http_handler_fn(move |res, req| {
        res.write("m0\n");
        next.call(res, req);
    })
    .into_boxed()
}

fn writes(tag: &'static str) -> Constructor {
    Constructor::new(move |next: BoxHandler| {
        handler_fn(move |cx, res, req| {
            let _ = write!(res, "{tag}\n");
            next.call(cx, res, req);
        })
        .into_boxed()
    })
}

/// Serves `handler` on an ephemeral port, sends one raw HTTP/1.1 request and
/// returns the raw response text.
async fn roundtrip(handler: impl HttpHandler, request: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(apollo::serve(listener, handler, async move {
        let _ = stopped.await;
    }));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
    raw
}

fn get(path: &str) -> String {
    format!("GET {path} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n")
}

fn body(raw: &str) -> &str {
    raw.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or("")
}

#[tokio::test]
async fn chains() {
    let handler = Chain::new([writes("m1"), writes("m2")])
        .with(with_value(10))
        .then_func(handler_context);

    let raw = roundtrip(handler, &get("/")).await;
    assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
    assert_eq!(body(&raw), "m1\nm2\n10\n");
}

#[tokio::test]
async fn wrap_chains() {
    let handler = Chain::new([writes("m1"), wrap(middle_zero), writes("m2")])
        .with(with_value(10))
        .then_func(handler_context);

    let raw = roundtrip(handler, &get("/")).await;
    assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
    assert_eq!(body(&raw), "m1\nm0\nm2\n10\n");
}

#[tokio::test]
async fn fallback_router_serves_unmatched_terminal() {
    let router = Router::new().on(Method::GET, "/users/{id}", http_handler_fn(|res, req| {
        let _ = write!(res, "user {}\n", req.param("id").unwrap_or("?"));
    }));
    let tagged = Constructor::new(|next: BoxHandler| {
        handler_fn(move |cx, res, req| {
            res.header("x-chain", "tagged");
            next.call(cx, res, req);
        })
        .into_boxed()
    });
    let chain = Chain::new([tagged]).with_fallback(router);

    let raw = roundtrip(chain.then_fallback(), &get("/users/42")).await;
    assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
    assert!(raw.contains("x-chain: tagged"), "{raw}");
    assert_eq!(body(&raw), "user 42\n");

    let raw = roundtrip(chain.then_fallback(), &get("/missing")).await;
    assert!(raw.starts_with("HTTP/1.1 404 Not Found"), "{raw}");
    assert!(raw.contains("x-chain: tagged"), "{raw}");
    assert_eq!(body(&raw), "404 page not found\n");
}

#[tokio::test]
async fn request_body_reaches_handler() {
    let handler = Chain::new([]).then_func(|_cx, res, req| {
        res.header("content-type", "application/octet-stream");
        res.write(req.body());
    });
    let request = "POST /echo HTTP/1.1\r\nhost: localhost\r\ncontent-length: 5\r\nconnection: close\r\n\r\nhello";

    let raw = roundtrip(handler, request).await;
    assert!(raw.to_ascii_lowercase().contains("content-type: application/octet-stream"), "{raw}");
    assert_eq!(body(&raw), "hello");
}

#[tokio::test]
async fn shutdown_closes_idle_keep_alive_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let handler = http_handler_fn(|res, _req| res.write("ok"));
    let server = tokio::spawn(apollo::serve(listener, handler, async move {
        let _ = stopped.await;
    }));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET / HTTP/1.1\r\nhost: localhost\r\n\r\n").await.unwrap();
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    while !raw.ends_with(b"ok") {
        let n = stream.read(&mut buf).await.unwrap();
        assert_ne!(n, 0, "connection closed before the response");
        raw.extend_from_slice(&buf[..n]);
    }

    stop.send(()).unwrap();
    let served = tokio::time::timeout(Duration::from_secs(3), server).await;
    served.expect("server drains idle connections").unwrap().unwrap();
    assert_eq!(stream.read(&mut buf).await.unwrap(), 0);
}
