//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. A router is an
//! [`HttpHandler`] itself, so it can be installed directly, used as a
//! chain's terminal handler through [`StripContext`](crate::adapter::StripContext),
//! or injected as a chain's fallback with [`Chain::with_fallback`](crate::Chain::with_fallback).

use std::collections::HashMap;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::handler::{BoxHttpHandler, HttpHandler};
use crate::request::Request;
use crate::response::ResponseWriter;

/// The application router.
///
/// Build it once at startup. Each [`Router::on`] call returns `self` so
/// registrations chain naturally. Requests that match no route get
/// `404 Not Found`.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxHttpHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust
    /// # use apollo::{http_handler_fn, Chain, Router};
    /// # use http::Method;
    /// let api = Chain::new([]);
    /// let router = Router::new()
    ///     .on(Method::GET, "/users/{id}", http_handler_fn(|res, req| {
    ///         res.write(req.param("id").unwrap_or("unknown"));
    ///     }))
    ///     .on(Method::POST, "/users", api.then_func(|_cx, res, _req| res.write("created")));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or conflicts with a registered route.
    pub fn on(mut self, method: Method, path: &str, handler: impl HttpHandler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(&BoxHttpHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((matched.value, params))
    }
}

impl HttpHandler for Router {
    fn call(&self, res: &mut ResponseWriter, req: &mut Request) {
        match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => {
                req.set_params(params);
                handler.call(res, req);
            }
            None => {
                debug!(method = %req.method(), path = req.path(), "no route");
                res.write_header(StatusCode::NOT_FOUND);
                res.write("404 page not found\n");
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
