//! Frame cadence adaptation for real-time video pipelines.
//!
//! `frame-cadence` sits between an asynchronous frame source (a screen
//! capturer or camera thread) and an encoder consuming frames on a dedicated
//! worker. It hands frames across threads in arrival order, tracks the input
//! frame rate, and under the zero-hertz policy keeps an idle screenshare
//! stream alive by repeating the last frame, relaxing the repeat cadence
//! once every enabled spatial layer has converged.
//!
//! # Architecture
//!
//! - [`CadenceAdapter`] is the handle: ingress frames and control-plane
//!   updates go in, a worker task owning all cadence state comes alive.
//! - [`FrameSink`] is the consumer seam; [`ChannelSink`] adapts it onto an
//!   async [`EmittedFrames`] stream when callbacks are inconvenient.
//! - Passthrough mode forwards frames untouched while measuring the input
//!   rate; zero-hertz mode defers, repeats and rewrites repeat metadata.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use frame_cadence::{
//!     AdapterConfig, CadenceAdapter, ChannelSink, MonotonicClock, SourceConstraints,
//!     VideoFrame, ZeroHertzParams,
//! };
//!
//! #[tokio::main]
//! async fn main() -> frame_cadence::Result<()> {
//!     let (sink, mut emitted) = ChannelSink::channel();
//!     let adapter = CadenceAdapter::spawn(
//!         AdapterConfig { zero_hertz_screenshare_enabled: true },
//!         Arc::new(MonotonicClock::new()),
//!         sink,
//!     );
//!
//!     adapter.set_zero_hertz_mode(Some(ZeroHertzParams { num_simulcast_layers: 1 }))?;
//!     adapter.on_constraints_changed(SourceConstraints {
//!         min_fps: Some(0.0),
//!         max_fps: Some(30.0),
//!     })?;
//!
//!     adapter.on_frame(VideoFrame::new(vec![0; 16], 1));
//!     while let Some(emission) = emitted.recv().await {
//!         println!("frame at {} (backlog {})", emission.post_time, emission.frames_in_flight);
//!     }
//!     Ok(())
//! }
//! ```

mod adapter;
pub mod clock;
mod dispatcher;
mod error;
mod modes;
pub mod rate;
pub mod sink;
pub mod stream;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

pub use adapter::CadenceAdapter;
pub use clock::{Clock, MonotonicClock};
pub use error::{CadenceError, Result};
pub use modes::IDLE_REPEAT_PERIOD;
pub use rate::{RateCounter, FRAME_RATE_AVERAGING_WINDOW_MS};
pub use sink::FrameSink;
pub use stream::{ChannelSink, EmittedFrame, EmittedFrames};
pub use types::{
    AdapterConfig, SourceConstraints, Timestamp, UpdateRect, VideoFrame, ZeroHertzParams,
};
