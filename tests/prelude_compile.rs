use windowgate::prelude::*;

#[test]
fn prelude_exports_compile() {
    let config = LimiterConfig::<String>::builder()
        .extractor(|caller: &String| caller.clone())
        .build()
        .unwrap();
    let limiter: FixedWindowLimiter<String> =
        FixedWindowLimiter::new(config, NullSink).with_clock(ManualClock::new());
    let _layer: RateLimitLayer<String> = RateLimitLayer::new(limiter);
    let _sinks = (LogSink, MemorySink::new());
    let _verdict: Verdict = Verdict::Admit;
    let _err: Option<ConfigError> = None;
    let _clock = MonotonicClock::default();
    let _extract: Extractor<String> = extract::global("all");
}
