use http::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::{service_fn, Layer, Service, ServiceBuilder, ServiceExt};
use windowgate::telemetry::MemorySink;
use windowgate::{extract, FixedWindowLimiter, LimiterConfig, ManualClock, RateLimitLayer};

fn peer_request(addr: &str, uri: &str) -> Request<String> {
    let mut req = Request::builder().uri(uri).body(String::new()).unwrap();
    req.extensions_mut().insert(addr.parse::<SocketAddr>().unwrap());
    req
}

fn echo(req: Request<String>) -> std::future::Ready<Result<Response<String>, Infallible>> {
    std::future::ready(Ok(Response::new(req.uri().to_string())))
}

#[tokio::test]
async fn limits_by_peer_ip_across_service_clones() {
    let sink = MemorySink::new();
    let clock = ManualClock::new();
    let config = LimiterConfig::builder()
        .window(Duration::from_secs(60))
        .max_requests(2)
        .shared_extractor(extract::peer_addr::<String>())
        .build()
        .unwrap();
    let layer =
        RateLimitLayer::new(FixedWindowLimiter::new(config, sink.clone()).with_clock(clock.clone()));
    let svc = ServiceBuilder::new().layer(layer).service(service_fn(echo));

    // Same IP, different ports: one identity.
    for port in [1000, 1001] {
        let response =
            svc.clone().oneshot(peer_request(&format!("10.0.0.1:{port}"), "/a")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), "/a");
    }
    let rejected = svc.clone().oneshot(peer_request("10.0.0.1:1002", "/b")).await.unwrap();
    assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);

    let other = svc.clone().oneshot(peer_request("10.0.0.2:1000", "/c")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);

    clock.advance(Duration::from_secs(61));
    let after_reset = svc.clone().oneshot(peer_request("10.0.0.1:1003", "/d")).await.unwrap();
    assert_eq!(after_reset.status(), StatusCode::OK);

    let rejections = sink.rejections();
    assert_eq!(rejections.len(), 1);
    assert_eq!(rejections[0].identity, "10.0.0.1");
    assert_eq!(rejections[0].target, "/b");
}

#[tokio::test]
async fn limiter_lock_is_free_while_inner_service_runs() {
    let config = LimiterConfig::builder()
        .window(Duration::from_secs(60))
        .max_requests(5)
        .extractor(|_: &Request<String>| String::from("caller"))
        .build()
        .unwrap();
    let limiter = Arc::new(FixedWindowLimiter::new(config, MemorySink::new()));
    let observer = limiter.clone();

    let mut svc = RateLimitLayer::shared(limiter).layer(service_fn(move |_req: Request<String>| {
        // Would deadlock if the decision lock were still held.
        let count = observer.window_state("caller").map(|s| s.count()).unwrap_or_default();
        async move { Ok::<_, Infallible>(Response::new(count.to_string())) }
    }));

    for expected in 1..=3 {
        let response = svc.ready().await.unwrap().call(Request::new(String::new())).await.unwrap();
        assert_eq!(response.body(), &expected.to_string());
    }
}

#[tokio::test]
async fn layer_reports_rejections_through_closure_sink() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::<(String, String)>::new()));
    let seen_clone = seen.clone();
    let config = LimiterConfig::builder()
        .window(Duration::from_secs(1))
        .max_requests(1)
        .shared_extractor(extract::header::<String>(http::header::HeaderName::from_static(
            "x-api-key",
        )))
        .build()
        .unwrap();
    let limiter = FixedWindowLimiter::new(config, move |identity: &str, target: &str| {
        seen_clone.lock().unwrap().push((identity.to_string(), target.to_string()));
    });
    let svc = ServiceBuilder::new().layer(RateLimitLayer::new(limiter)).service(service_fn(echo));

    let keyed = || {
        Request::builder().uri("/keyed").header("x-api-key", "k1").body(String::new()).unwrap()
    };
    assert_eq!(svc.clone().oneshot(keyed()).await.unwrap().status(), StatusCode::OK);
    assert_eq!(
        svc.clone().oneshot(keyed()).await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    let recorded = seen.lock().unwrap().clone();
    assert_eq!(recorded, vec![("k1".to_string(), "/keyed".to_string())]);
}
