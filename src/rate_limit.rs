use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Extension, FromRequest, RequestParts},
    response::{IntoResponse, Response},
    Json,
};
use http::{header, header::HeaderName, HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;

/// Fixed-window request counter keyed by client address.
///
/// A client's window opens with its first request and lasts `window`; at
/// most `max_requests` requests are allowed inside it. Cloning yields a
/// handle to the same counters.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    state: Arc<Mutex<State>>,
}

#[derive(Debug)]
struct State {
    windows: HashMap<IpAddr, Window>,
    last_sweep: Option<Instant>,
}

#[derive(Clone, Copy, Debug)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Outcome of counting one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32, reset_after: Duration },
    Limited { retry_after: Duration },
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        RateLimiter {
            max_requests,
            window,
            state: Arc::new(Mutex::new(State {
                windows: HashMap::new(),
                last_sweep: None,
            })),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Counts a request from `client` made now.
    pub fn check(&self, client: IpAddr) -> Decision {
        self.check_at(client, Instant::now())
    }

    /// Counts a request from `client` made at `now`.
    pub fn check_at(&self, client: IpAddr, now: Instant) -> Decision {
        // Counters stay consistent even if a holder panicked.
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        self.sweep_expired(&mut state, now);

        let window = state.windows.entry(client).or_insert(Window {
            started_at: now,
            count: 0,
        });
        if now.saturating_duration_since(window.started_at) >= self.window {
            *window = Window {
                started_at: now,
                count: 0,
            };
        }
        window.count = window.count.saturating_add(1);

        let reset_after = (window.started_at + self.window).saturating_duration_since(now);
        if window.count > self.max_requests {
            Decision::Limited {
                retry_after: reset_after,
            }
        } else {
            Decision::Allowed {
                remaining: self.max_requests - window.count,
                reset_after,
            }
        }
    }

    /// Number of clients with a live window.
    pub fn tracked_clients(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .windows
            .len()
    }

    fn sweep_expired(&self, state: &mut State, now: Instant) {
        let due = match state.last_sweep {
            Some(last_sweep) => now.saturating_duration_since(last_sweep) >= self.window,
            None => true,
        };
        if !due {
            return;
        }

        let window = self.window;
        state
            .windows
            .retain(|_, w| now.saturating_duration_since(w.started_at) < window);
        state.last_sweep = Some(now);
    }
}

/// Extractor that counts the request against the client's window and
/// rejects it once the limit is exceeded.
///
/// Needs a `RateLimiter` extension and the server to be started with
/// `into_make_service_with_connect_info::<SocketAddr, _>()`.
#[derive(Clone, Copy, Debug)]
pub struct RateLimited {
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

impl RateLimited {
    /// `X-RateLimit-*` headers describing the client's current window.
    pub fn headers(&self) -> HeaderMap {
        limit_headers(self.limit, self.remaining, self.reset_after)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitRejection {
    #[error("too many requests, retry in {retry_after:?}")]
    TooManyRequests {
        client: IpAddr,
        limit: u32,
        retry_after: Duration,
    },
    #[error("rate limiter is not configured for this route")]
    MissingLimiter,
    #[error("client address is not available")]
    MissingClientAddress,
}

#[async_trait]
impl<B> FromRequest<B> for RateLimited
where
    B: Send,
{
    type Rejection = RateLimitRejection;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Extension(limiter) = Extension::<RateLimiter>::from_request(req)
            .await
            .map_err(|_| RateLimitRejection::MissingLimiter)?;
        let ConnectInfo(address) = ConnectInfo::<SocketAddr>::from_request(req)
            .await
            .map_err(|_| RateLimitRejection::MissingClientAddress)?;

        let client = address.ip();
        let limit = limiter.max_requests();
        match limiter.check(client) {
            Decision::Allowed {
                remaining,
                reset_after,
            } => Ok(RateLimited {
                limit,
                remaining,
                reset_after,
            }),
            Decision::Limited { retry_after } => Err(RateLimitRejection::TooManyRequests {
                client,
                limit,
                retry_after,
            }),
        }
    }
}

impl IntoResponse for RateLimitRejection {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct Body {
            success: bool,
            message: &'static str,
        }

        match self {
            RateLimitRejection::TooManyRequests {
                client,
                limit,
                retry_after,
            } => {
                tracing::warn!(%client, ?retry_after, "rate limit exceeded");

                let mut headers = limit_headers(limit, 0, retry_after);
                headers.insert(
                    header::RETRY_AFTER,
                    HeaderValue::from(whole_seconds(retry_after)),
                );
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    headers,
                    Json(Body {
                        success: false,
                        message: "Too many requests from this IP, please try again later.",
                    }),
                )
                    .into_response()
            }
            other => {
                tracing::error!(error = %other, "rate limiting failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// `X-RateLimit-Reset` is the end of the window in Unix seconds.
fn limit_headers(limit: u32, remaining: u32, reset_after: Duration) -> HeaderMap {
    let reset_at = (SystemTime::now() + reset_after)
        .duration_since(UNIX_EPOCH)
        .map(whole_seconds)
        .unwrap_or_default();

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(limit),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderValue::from(remaining),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-reset"),
        HeaderValue::from(reset_at),
    );
    headers
}

/// Rounds up to whole seconds.
fn whole_seconds(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}
