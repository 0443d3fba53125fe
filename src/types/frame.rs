//! Video frame types flowing through the cadence adapter.

use std::sync::Arc;

/// Region of a frame that changed relative to the previous frame.
///
/// An all-zero rectangle is the "empty update" sentinel: no pixels changed.
/// Downstream encoders use it to short-circuit work on repeated frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateRect {
    pub offset_x: u32,
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
}

impl UpdateRect {
    /// Rectangle covering a whole `width` x `height` frame.
    pub fn full(width: u32, height: u32) -> Self {
        Self { offset_x: 0, offset_y: 0, width, height }
    }

    /// The empty-update sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when the rectangle marks no pixels as changed.
    pub fn is_empty(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

/// A captured video frame plus mutable delivery metadata.
///
/// The payload is opaque to the adapter and shared zero-copy via `Arc`, so
/// queueing and repeating frames never copies pixel data. Timestamps of zero
/// are treated as unset and are never rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    /// Opaque media payload.
    pub data: Arc<[u8]>,

    /// Capture timestamp in microseconds. Zero means unset.
    pub capture_time_us: i64,

    /// NTP wall-clock timestamp in milliseconds. Zero means unset.
    pub ntp_time_ms: i64,

    /// Pixels changed since the previous frame.
    pub update_rect: UpdateRect,
}

impl VideoFrame {
    /// Create a frame with the given payload and capture timestamp.
    ///
    /// The NTP timestamp starts unset and the update rectangle empty; sources
    /// that track them use [`with_ntp_time_ms`](Self::with_ntp_time_ms) and
    /// [`with_update_rect`](Self::with_update_rect).
    pub fn new(data: Vec<u8>, capture_time_us: i64) -> Self {
        Self {
            data: data.into(),
            capture_time_us,
            ntp_time_ms: 0,
            update_rect: UpdateRect::empty(),
        }
    }

    /// Set the NTP wall-clock timestamp in milliseconds.
    pub fn with_ntp_time_ms(mut self, ntp_time_ms: i64) -> Self {
        self.ntp_time_ms = ntp_time_ms;
        self
    }

    /// Set the changed-pixels rectangle.
    pub fn with_update_rect(mut self, update_rect: UpdateRect) -> Self {
        self.update_rect = update_rect;
        self
    }
}
