//! Rejection sinks.
//!
//! A sink is told about every rejected request as `(identity, target)`. It is
//! observability only: its return value is ignored, and [`notify_isolated`]
//! makes sure a misbehaving sink cannot take the request path down with it.
//!
//! Any `Fn(&str, &str) + Send + Sync` closure is a sink:
//!
//! ```rust
//! use windowgate::telemetry::notify_isolated;
//!
//! let sink = |identity: &str, target: &str| println!("{identity} throttled on {target}");
//! notify_isolated(&sink, "10.0.0.1", "/api/items");
//! ```

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Consumer of rejection notifications.
pub trait RejectionSink: Send + Sync {
    /// Called once for each rejected request.
    fn on_reject(&self, identity: &str, target: &str);
}

impl<F> RejectionSink for F
where
    F: Fn(&str, &str) + Send + Sync,
{
    fn on_reject(&self, identity: &str, target: &str) {
        self(identity, target)
    }
}

/// Best-effort notify helper that swallows sink panics.
///
/// Returns `false` if the sink panicked. The panic is logged and otherwise
/// dropped.
pub fn notify_isolated<S>(sink: &S, identity: &str, target: &str) -> bool
where
    S: RejectionSink + ?Sized,
{
    match catch_unwind(AssertUnwindSafe(|| sink.on_reject(identity, target))) {
        Ok(()) => true,
        Err(_) => {
            tracing::error!(identity, target, "rejection sink panicked; notification dropped");
            false
        }
    }
}

/// A no-op sink that discards all notifications.
#[derive(Clone, Debug, Default)]
pub struct NullSink;

impl RejectionSink for NullSink {
    fn on_reject(&self, _identity: &str, _target: &str) {}
}

/// A sink that logs rejections using the `tracing` crate.
#[derive(Clone, Debug, Default)]
pub struct LogSink;

impl RejectionSink for LogSink {
    fn on_reject(&self, identity: &str, target: &str) {
        tracing::warn!(identity, target, "rate limit exceeded");
    }
}

/// One recorded rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub identity: String,
    pub target: String,
}

/// A sink that stores rejections in memory, oldest evicted first once full.
#[derive(Clone, Debug)]
pub struct MemorySink {
    rejections: Arc<Mutex<VecDeque<Rejection>>>,
    capacity: usize,
    evicted: Arc<AtomicU64>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rejections: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
            evicted: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn rejections(&self) -> Vec<Rejection> {
        self.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of rejections dropped to stay within capacity.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Rejection>> {
        self.rejections.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl RejectionSink for MemorySink {
    fn on_reject(&self, identity: &str, target: &str) {
        let mut rejections = self.lock();
        if rejections.len() >= self.capacity {
            rejections.pop_front();
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        rejections.push_back(Rejection { identity: identity.to_string(), target: target.to_string() });
    }
}

/// Capture everything logged at INFO and above while `f` runs.
#[cfg(test)]
pub(crate) fn capture_logs(f: impl FnOnce()) -> String {
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct SharedWriter(Arc<Mutex<Vec<u8>>>);

    impl<'a> MakeWriter<'a> for SharedWriter {
        type Writer = SharedGuard;
        fn make_writer(&'a self) -> Self::Writer {
            SharedGuard(self.0.clone())
        }
    }

    struct SharedGuard(Arc<Mutex<Vec<u8>>>);
    impl std::io::Write for SharedGuard {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let buffer = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::fmt()
        .with_writer(BoxMakeWriter::new(SharedWriter(buffer.clone())))
        .with_ansi(false)
        .without_time()
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}
