// Path: crates/telemetry/src/time.rs
use crate::sinks::CycleMetricsSink;
use std::time::Instant;

/// Reports the lifetime of the guard as one poll-cycle duration.
pub struct Timer<'a> {
    sink: &'a dyn CycleMetricsSink,
    start: Instant,
}

impl<'a> Timer<'a> {
    pub fn new(sink: &'a dyn CycleMetricsSink) -> Self {
        Self {
            sink,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.sink
            .observe_cycle_duration(self.start.elapsed().as_secs_f64());
    }
}
