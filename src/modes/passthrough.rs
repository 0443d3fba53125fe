//! Pass-through cadence mode.

use std::sync::Arc;

use crate::clock::Clock;
use crate::rate::{RateCounter, FRAME_RATE_AVERAGING_WINDOW_MS};
use crate::sink::FrameSink;
use crate::types::{Timestamp, VideoFrame};

/// Forwards every frame unchanged while estimating the input framerate.
///
/// Runs entirely on the adapter worker. No queueing, no timestamp rewrites,
/// no failure paths.
pub struct PassthroughMode {
    clock: Arc<dyn Clock>,
    sink: Arc<dyn FrameSink>,
    input_framerate: RateCounter,
}

impl PassthroughMode {
    pub fn new(clock: Arc<dyn Clock>, sink: Arc<dyn FrameSink>) -> Self {
        Self {
            clock,
            sink,
            input_framerate: RateCounter::new(FRAME_RATE_AVERAGING_WINDOW_MS, 1000),
        }
    }

    pub fn on_frame(&mut self, post_time: Timestamp, frames_in_flight: usize, frame: &VideoFrame) {
        self.sink.on_frame(post_time, frames_in_flight, frame);
    }

    /// Measured input rate over the averaging window, if enough frames have
    /// been ticked.
    pub fn input_fps(&mut self) -> Option<u32> {
        let now_ms = self.clock.now_ms();
        self.input_framerate.rate(now_ms)
    }

    /// Record one input frame sample at the current clock.
    pub fn tick_frame_rate(&mut self) {
        let now_ms = self.clock.now_ms();
        self.input_framerate.update(now_ms);
    }
}
