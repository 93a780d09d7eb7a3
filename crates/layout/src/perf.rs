use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Receives per-pass timings and text cache statistics from a context.
///
/// Without the `profiling` feature the context installs [`NoOpProfiler`] and
/// never reads a clock, so these calls compile down to nothing.
pub trait Profiler: Send + Sync {
    fn record(&self, pass: &str, duration: Duration);
    fn count_hit(&self);
    fn count_miss(&self);
    fn count_frame(&self);
    fn reset(&self);

    /// Average wall time of a complete `end_layout`.
    fn avg_frame_time(&self) -> Option<Duration>;

    fn log_summary(&self) {}
}

/// A no-op profiler for production use.
/// The compiler will inline these and eliminate the overhead.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpProfiler;

impl Profiler for NoOpProfiler {
    #[inline(always)]
    fn record(&self, _pass: &str, _duration: Duration) {}
    #[inline(always)]
    fn count_hit(&self) {}
    #[inline(always)]
    fn count_miss(&self) {}
    #[inline(always)]
    fn count_frame(&self) {}
    #[inline(always)]
    fn reset(&self) {}
    #[inline(always)]
    fn avg_frame_time(&self) -> Option<Duration> {
        None
    }
}

/// Accumulates pass durations and text cache hit rates, and logs them on
/// request.
#[derive(Debug)]
pub struct DebugProfiler {
    passes: Mutex<HashMap<&'static str, Duration>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    frames: AtomicUsize,
    /// Total `end_layout` time in nanoseconds.
    frame_time_ns: AtomicU64,
}

impl DebugProfiler {
    pub fn new() -> Self {
        Self {
            passes: Mutex::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            frames: AtomicUsize::new(0),
            frame_time_ns: AtomicU64::new(0),
        }
    }

    /// Total time recorded for `pass` so far.
    pub fn pass_time(&self, pass: &str) -> Duration {
        self.passes
            .lock()
            .ok()
            .and_then(|passes| passes.get(pass).copied())
            .unwrap_or_default()
    }

    pub fn hit_rate(&self) -> Option<f64> {
        let hits = self.hits.load(Ordering::Acquire);
        let total = hits + self.misses.load(Ordering::Acquire);
        (total > 0).then(|| hits as f64 / total as f64)
    }
}

impl Default for DebugProfiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Profiler for DebugProfiler {
    fn record(&self, pass: &str, duration: Duration) {
        if let Ok(mut passes) = self.passes.lock() {
            let key = PASS_NAMES.iter().find(|name| **name == pass).copied().unwrap_or("other");
            *passes.entry(key).or_default() += duration;
            if key == PASS_FRAME {
                let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
                self.frame_time_ns.fetch_add(nanos, Ordering::Release);
            }
        }
    }

    fn count_hit(&self) {
        self.hits.fetch_add(1, Ordering::Release);
    }

    fn count_miss(&self) {
        self.misses.fetch_add(1, Ordering::Release);
    }

    fn count_frame(&self) {
        self.frames.fetch_add(1, Ordering::Release);
    }

    fn reset(&self) {
        if let Ok(mut passes) = self.passes.lock() {
            passes.clear();
        }
        self.hits.store(0, Ordering::Release);
        self.misses.store(0, Ordering::Release);
        self.frames.store(0, Ordering::Release);
        self.frame_time_ns.store(0, Ordering::Release);
    }

    fn avg_frame_time(&self) -> Option<Duration> {
        let frames = self.frames.load(Ordering::Acquire);
        if frames == 0 {
            return None;
        }
        let nanos = self.frame_time_ns.load(Ordering::Acquire);
        Some(Duration::from_nanos(nanos / frames as u64))
    }

    fn log_summary(&self) {
        let frames = self.frames.load(Ordering::Acquire);
        if frames == 0 {
            return;
        }
        log::info!("=== Layout Profile ({} frames) ===", frames);
        if let Some(rate) = self.hit_rate() {
            log::info!("Text cache hits: {:.1}%", rate * 100.0);
        }
        if let Some(avg) = self.avg_frame_time() {
            log::info!("Average end_layout: {:?}", avg);
        }
        if let Ok(passes) = self.passes.lock() {
            for name in PASS_NAMES {
                if let Some(total) = passes.get(name) {
                    log::info!("{}: {:?}", name, total);
                }
            }
        }
    }
}

pub const PASS_MEASURE: &str = "measure";
pub const PASS_DISTRIBUTE: &str = "distribute";
pub const PASS_WRAP: &str = "wrap";
pub const PASS_POSITION: &str = "position";
pub const PASS_EMIT: &str = "emit";
pub const PASS_FRAME: &str = "frame";

const PASS_NAMES: [&str; 6] = [
    PASS_MEASURE,
    PASS_DISTRIBUTE,
    PASS_WRAP,
    PASS_POSITION,
    PASS_EMIT,
    PASS_FRAME,
];

/// Wall-clock timer that only reads the clock with the `profiling` feature.
pub(crate) struct PassTimer {
    #[cfg(feature = "profiling")]
    start: instant::Instant,
}

impl PassTimer {
    #[inline(always)]
    pub(crate) fn start() -> Self {
        Self {
            #[cfg(feature = "profiling")]
            start: instant::Instant::now(),
        }
    }

    #[inline(always)]
    pub(crate) fn elapsed(&self) -> Duration {
        #[cfg(feature = "profiling")]
        {
            self.start.elapsed()
        }
        #[cfg(not(feature = "profiling"))]
        {
            Duration::ZERO
        }
    }
}

/// The profiler a new context starts with.
pub(crate) fn default_profiler() -> Box<dyn Profiler> {
    if cfg!(feature = "profiling") {
        Box::new(DebugProfiler::new())
    } else {
        Box::new(NoOpProfiler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_profiler_accumulates_passes() {
        let profiler = DebugProfiler::new();
        profiler.record(PASS_MEASURE, Duration::from_micros(5));
        profiler.record(PASS_MEASURE, Duration::from_micros(7));
        profiler.record(PASS_FRAME, Duration::from_micros(40));
        profiler.count_frame();

        assert_eq!(profiler.pass_time(PASS_MEASURE), Duration::from_micros(12));
        assert_eq!(profiler.avg_frame_time(), Some(Duration::from_micros(40)));

        profiler.reset();
        assert_eq!(profiler.pass_time(PASS_MEASURE), Duration::ZERO);
        assert_eq!(profiler.avg_frame_time(), None);
    }

    #[test]
    fn test_hit_rate() {
        let profiler = DebugProfiler::new();
        assert_eq!(profiler.hit_rate(), None);
        profiler.count_hit();
        profiler.count_hit();
        profiler.count_hit();
        profiler.count_miss();
        assert_eq!(profiler.hit_rate(), Some(0.75));
    }
}
