use crate::rate_limit::{FixedWindowLimiter, Verdict};
use http::{Request, Response, StatusCode};
use pin_project::pin_project;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

/// A layer that enforces per-identity limits using a [`FixedWindowLimiter`].
///
/// All services produced by one layer share the same limiter.
pub struct RateLimitLayer<Req> {
    limiter: Arc<FixedWindowLimiter<Req>>,
}

impl<Req> RateLimitLayer<Req> {
    /// Create a new rate limit layer.
    pub fn new(limiter: FixedWindowLimiter<Req>) -> Self {
        Self { limiter: Arc::new(limiter) }
    }

    /// Create a layer around a limiter that is also used elsewhere (e.g. by a sweeper).
    pub fn shared(limiter: Arc<FixedWindowLimiter<Req>>) -> Self {
        Self { limiter }
    }

    pub fn limiter(&self) -> &Arc<FixedWindowLimiter<Req>> {
        &self.limiter
    }
}

impl<Req> Clone for RateLimitLayer<Req> {
    fn clone(&self) -> Self {
        Self { limiter: self.limiter.clone() }
    }
}

impl<Req> fmt::Debug for RateLimitLayer<Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitLayer").field("limiter", &self.limiter).finish()
    }
}

impl<S, Req> Layer<S> for RateLimitLayer<Req> {
    type Service = RateLimitService<S, Req>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimitService { inner: service, limiter: self.limiter.clone() }
    }
}

/// Middleware service that enforces rate limits.
///
/// Admitted requests go to the inner service and its response is returned
/// untouched. Rejected requests are answered here with `429 Too Many Requests`
/// and an empty body; the inner service never sees them.
pub struct RateLimitService<S, Req> {
    inner: S,
    limiter: Arc<FixedWindowLimiter<Req>>,
}

impl<S: Clone, Req> Clone for RateLimitService<S, Req> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), limiter: self.limiter.clone() }
    }
}

impl<S: fmt::Debug, Req> fmt::Debug for RateLimitService<S, Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitService")
            .field("inner", &self.inner)
            .field("limiter", &self.limiter)
            .finish()
    }
}

impl<S, Req> RateLimitService<S, Req> {
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RateLimitService<S, Request<ReqBody>>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Default,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future, ResBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // The limiter lock is released by the time `decide` returns, so the
        // inner service never runs under it.
        match self.limiter.decide(&req) {
            Verdict::Admit => ResponseFuture::admitted(self.inner.call(req)),
            Verdict::Reject => ResponseFuture::rejected(too_many_requests()),
        }
    }
}

fn too_many_requests<B: Default>() -> Response<B> {
    let mut response = Response::new(B::default());
    *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
    response
}

/// Response future of [`RateLimitService`].
#[pin_project]
pub struct ResponseFuture<F, B> {
    #[pin]
    kind: Kind<F, B>,
}

#[pin_project(project = KindProj)]
enum Kind<F, B> {
    Admitted {
        #[pin]
        future: F,
    },
    Rejected {
        response: Option<Response<B>>,
    },
}

impl<F, B> ResponseFuture<F, B> {
    fn admitted(future: F) -> Self {
        Self { kind: Kind::Admitted { future } }
    }

    fn rejected(response: Response<B>) -> Self {
        Self { kind: Kind::Rejected { response: Some(response) } }
    }

    /// True if this future resolves to the limiter's own 429 response.
    pub fn is_rejected(&self) -> bool {
        matches!(self.kind, Kind::Rejected { .. })
    }
}

impl<F, B, E> Future for ResponseFuture<F, B>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = Result<Response<B>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project().kind.project() {
            KindProj::Admitted { future } => future.poll(cx),
            KindProj::Rejected { response } => {
                Poll::Ready(Ok(response.take().expect("ResponseFuture polled after completion")))
            }
        }
    }
}
