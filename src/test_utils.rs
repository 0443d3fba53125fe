//! Test helpers shared by unit tests, integration tests and benches.

#![cfg(any(test, feature = "benchmark"))]

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::clock::Clock;
use crate::sink::FrameSink;
use crate::types::{Timestamp, UpdateRect, VideoFrame};

/// Manually advanced clock for driving mode logic without a runtime.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_us: AtomicI64,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now_us.fetch_add(ms * 1000, Ordering::Relaxed);
    }

    pub fn set_ms(&self, ms: i64) {
        self.now_us.store(ms * 1000, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.now_us.load(Ordering::Relaxed))
    }
}

/// One delivery recorded by [`RecordingSink`].
#[derive(Debug, Clone)]
pub struct SinkEvent {
    pub post_time: Timestamp,
    pub frames_in_flight: usize,
    pub frame: VideoFrame,
}

/// Sink capturing every delivery for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
    discarded: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().expect("recording sink poisoned").clone()
    }

    pub fn discarded(&self) -> usize {
        self.discarded.load(Ordering::Relaxed)
    }
}

impl FrameSink for RecordingSink {
    fn on_frame(&self, post_time: Timestamp, frames_in_flight: usize, frame: &VideoFrame) {
        self.events
            .lock()
            .expect("recording sink poisoned")
            .push(SinkEvent { post_time, frames_in_flight, frame: frame.clone() });
    }

    fn on_discarded_frame(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }
}

/// A frame with a recognizable payload and a full-frame update rectangle.
pub fn test_frame(capture_time_us: i64) -> VideoFrame {
    VideoFrame::new(vec![0xab; 16], capture_time_us).with_update_rect(UpdateRect::full(320, 180))
}
