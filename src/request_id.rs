use std::{
    fmt,
    net::SocketAddr,
    task::{Context, Poll},
};

use axum::extract::ConnectInfo;
use http::{HeaderValue, Request};
use tracing::{Level, Span};
use uuid::Uuid;

/// An identifier for a request, echoed back in `x-request-id`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RequestId(Uuid);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl RequestId {
    fn new() -> Self {
        RequestId(Uuid::new_v4())
    }
}

/// `Layer` for adding an identifier for a request.
#[derive(Clone, Copy, Debug)]
pub struct AddRequestIdLayer;

impl<S> tower::Layer<S> for AddRequestIdLayer {
    type Service = AddRequestId<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AddRequestId { inner }
    }
}

/// Middleware for adding an identifier for a request.
#[derive(Clone, Copy, Debug)]
pub struct AddRequestId<S> {
    inner: S,
}

impl<B, S> tower::Service<Request<B>> for AddRequestId<S>
where
    S: tower::Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        req.extensions_mut().insert(RequestId::new());
        self.inner.call(req)
    }
}

/// Set the 'x-request-id' header value using the identifier for a request.
#[derive(Debug, Clone, Copy)]
pub struct UseRequestId;

impl tower_http::request_id::MakeRequestId for UseRequestId {
    fn make_request_id<B>(
        &mut self,
        req: &Request<B>,
    ) -> Option<tower_http::request_id::RequestId> {
        req.extensions()
            .get::<RequestId>()
            .and_then(|request_id| HeaderValue::from_str(&request_id.to_string()).ok())
            .map(Into::into)
    }
}

/// Make span from a request, recording its identifier and client address.
#[derive(Debug, Clone)]
pub struct MakeSpanWithRequestId {
    level: Level,
}

impl MakeSpanWithRequestId {
    pub fn new() -> Self {
        MakeSpanWithRequestId {
            level: Level::DEBUG,
        }
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

impl Default for MakeSpanWithRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, req: &Request<B>) -> Span {
        macro_rules! make_span {
            ($level:expr) => {
                tracing::span!(
                    $level,
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    version = ?req.version(),
                    request_id = tracing::field::Empty,
                    client_ip = tracing::field::Empty,
                )
            };
        }

        let span = match self.level {
            Level::ERROR => make_span!(Level::ERROR),
            Level::WARN => make_span!(Level::WARN),
            Level::INFO => make_span!(Level::INFO),
            Level::DEBUG => make_span!(Level::DEBUG),
            Level::TRACE => make_span!(Level::TRACE),
        };

        if let Some(request_id) = req.extensions().get::<RequestId>() {
            span.record("request_id", &tracing::field::display(request_id));
        }
        if let Some(ConnectInfo(address)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
            span.record("client_ip", &tracing::field::display(address.ip()));
        }

        span
    }
}
