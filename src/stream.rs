//! Bridging the sink callback onto async streams.
//!
//! The adapter delivers frames through the synchronous [`FrameSink`]
//! callback. [`ChannelSink`] forwards every delivery into a channel so
//! consumers can use ordinary stream combinators instead; the integration
//! tests drive the adapter exclusively through it.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::sink::FrameSink;
use crate::types::{Timestamp, VideoFrame};

/// One sink delivery observed through an [`EmittedFrames`] stream.
#[derive(Debug, Clone)]
pub struct EmittedFrame {
    pub post_time: Timestamp,
    pub frames_in_flight: usize,
    pub frame: VideoFrame,
}

/// Sink that forwards every delivery into an unbounded channel.
pub struct ChannelSink {
    emissions: mpsc::UnboundedSender<EmittedFrame>,
    discarded: Arc<AtomicU64>,
}

impl ChannelSink {
    /// Create a sink plus the stream of its deliveries.
    pub fn channel() -> (Arc<Self>, EmittedFrames) {
        let (emissions, receiver) = mpsc::unbounded_channel();
        let discarded = Arc::new(AtomicU64::new(0));
        let sink = Arc::new(Self { emissions, discarded: discarded.clone() });
        let frames = EmittedFrames { inner: UnboundedReceiverStream::new(receiver), discarded };
        (sink, frames)
    }
}

impl FrameSink for ChannelSink {
    fn on_frame(&self, post_time: Timestamp, frames_in_flight: usize, frame: &VideoFrame) {
        // The receiver may be gone; deliveries are then dropped on the floor
        // like any other uninterested sink.
        let _ = self.emissions.send(EmittedFrame {
            post_time,
            frames_in_flight,
            frame: frame.clone(),
        });
    }

    fn on_discarded_frame(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }
}

/// Stream of frames delivered by the adapter.
pub struct EmittedFrames {
    inner: UnboundedReceiverStream<EmittedFrame>,
    discarded: Arc<AtomicU64>,
}

impl EmittedFrames {
    /// Receive the next delivery, or `None` once the adapter and its sink
    /// are gone.
    pub async fn recv(&mut self) -> Option<EmittedFrame> {
        use futures::StreamExt;
        self.inner.next().await
    }

    /// Number of discarded-frame callbacks seen so far.
    pub fn discarded_frames(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

impl Stream for EmittedFrames {
    type Item = EmittedFrame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
