//! Consumer-side callback contract.

use crate::types::{Timestamp, VideoFrame};

/// Downstream consumer of cadence-adapted frames, typically the encoder
/// entry point.
///
/// `on_frame` is invoked on the adapter worker; the frame reference is valid
/// only for the duration of the call, so implementations that need the frame
/// later must clone it (the payload is shared, not copied).
/// `on_discarded_frame` is a direct pass-through from the ingress context.
///
/// The sink outlives the adapter; holding it as `Arc<dyn FrameSink>` makes
/// that contract structural.
pub trait FrameSink: Send + Sync + 'static {
    /// Deliver a frame.
    ///
    /// `post_time` is the instant the frame was posted to the adapter and
    /// `frames_in_flight` the ingress backlog observed when it was consumed.
    /// Zero-hertz mode reports a constant backlog of 1 because the cadence
    /// is imposed by the adapter, not the source.
    fn on_frame(&self, post_time: Timestamp, frames_in_flight: usize, frame: &VideoFrame);

    /// The source discarded a frame before it reached the adapter.
    fn on_discarded_frame(&self) {}
}
