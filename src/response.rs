//! The response sink handlers write into.
//!
//! Handlers do not return a response; they write to a [`ResponseWriter`].
//! That is what lets a middleware emit bytes before and after calling the
//! next handler. The server turns the finished writer into an
//! `http::Response` once the outermost handler returns.

use std::fmt;

use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;
use tracing::warn;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Accumulates status, headers and body for one response.
///
/// The status is committed by the first [`write_header`](Self::write_header)
/// or [`write`](Self::write), whichever comes first. A bare `write` commits
/// `200 OK`. Later `write_header` calls are ignored.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits the response status. Only the first call has an effect.
    pub fn write_header(&mut self, status: StatusCode) {
        match self.status {
            None => self.status = Some(status),
            Some(committed) => {
                warn!(%committed, ignored = %status, "superfluous write_header call");
            }
        }
    }

    /// Appends `data` to the body, committing `200 OK` if no status was set.
    pub fn write(&mut self, data: impl AsRef<[u8]>) {
        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(data.as_ref());
    }

    /// Sets a header, replacing any previous value for `name`.
    ///
    /// A name or value that is not a valid header token is logged and
    /// skipped, like a superfluous [`write_header`](Self::write_header).
    pub fn header(&mut self, name: &str, value: &str) {
        let name = match HeaderName::try_from(name) {
            Ok(name) => name,
            Err(e) => {
                warn!(name, "invalid header name, skipped: {e}");
                return;
            }
        };
        let value = match HeaderValue::try_from(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(%name, "invalid header value, skipped: {e}");
                return;
            }
        };
        self.headers.insert(name, value);
    }

    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// The committed status, or `200 OK` if nothing has been committed yet.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Whether a status has been committed.
    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    /// Finishes the response. A non-empty body with no `content-type`
    /// is labelled `text/plain`.
    pub fn into_response(self) -> http::Response<Full<Bytes>> {
        let status = self.status();
        let mut headers = self.headers;
        if !self.body.is_empty() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
        }
        headers.insert(CONTENT_LENGTH, HeaderValue::from(self.body.len()));

        let mut res = http::Response::new(Full::new(self.body.freeze()));
        *res.status_mut() = status;
        *res.headers_mut() = headers;
        res
    }
}

/// `write!(res, "{value}\n")` appends formatted text to the body.
impl fmt::Write for ResponseWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s);
        Ok(())
    }
}
