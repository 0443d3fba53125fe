//! Zero-hertz cadence mode.
//!
//! Sources constrained to `min_fps == 0` may stop producing frames for
//! arbitrarily long stretches. This mode defers each incoming frame by one
//! frame interval and, once the source goes idle, keeps the encoder fed by
//! repeating the stored frame. Repeats run at the frame interval until every
//! enabled spatial layer reports quality convergence, then relax to
//! [`IDLE_REPEAT_PERIOD`].
//!
//! All state is owned by the adapter worker. Deferred work is posted back
//! through the worker command channel: each delayed command carries this
//! instance's cancellation token (dropping the mode turns late tasks into
//! no-ops) and repeats additionally carry a generation id so that any new
//! arrival invalidates the outstanding repeat chain.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::clock::Clock;
use crate::dispatcher::Command;
use crate::sink::FrameSink;
use crate::types::{Timestamp, UpdateRect, VideoFrame, ZeroHertzParams};

/// Repeat period once all enabled spatial layers have converged.
pub const IDLE_REPEAT_PERIOD: Duration = Duration::from_secs(1);

/// Convergence tracking for one simulcast layer.
///
/// `None` means the layer is disabled; otherwise carries the layer's quality
/// convergence status.
#[derive(Debug, Clone, Copy, Default)]
struct SpatialLayerTracker {
    quality_converged: Option<bool>,
}

/// Cadence state machine for zero-hertz input.
pub struct ZeroHertzMode {
    clock: Arc<dyn Clock>,
    sink: Arc<dyn FrameSink>,
    tasks: mpsc::UnboundedSender<Command>,
    /// Invalidated when this instance is torn down; late deferred commands
    /// become no-ops.
    safety: CancellationToken,
    max_fps: f64,
    /// Nominal inter-frame period at the configured cap.
    frame_delay: Duration,
    /// Incoming frames awaiting emission, plus the frame being repeated.
    queued_frames: VecDeque<VideoFrame>,
    /// Incremented on every arrival. Scheduled repeats capture the value and
    /// self-cancel on mismatch.
    current_frame_id: u64,
    is_repeating: bool,
    layer_trackers: Vec<SpatialLayerTracker>,
}

impl ZeroHertzMode {
    pub fn new(
        clock: Arc<dyn Clock>,
        sink: Arc<dyn FrameSink>,
        tasks: mpsc::UnboundedSender<Command>,
        parent_safety: &CancellationToken,
        max_fps: f64,
        params: ZeroHertzParams,
    ) -> Self {
        debug!(max_fps, layers = params.num_simulcast_layers, "zero-hertz mode created");
        Self {
            clock,
            sink,
            tasks,
            safety: parent_safety.child_token(),
            max_fps,
            frame_delay: Duration::from_secs_f64(1.0 / max_fps),
            queued_frames: VecDeque::new(),
            current_frame_id: 0,
            is_repeating: false,
            layer_trackers: vec![SpatialLayerTracker::default(); params.num_simulcast_layers],
        }
    }

    /// Update a layer's quality convergence status. No-op while the layer is
    /// disabled.
    pub fn update_layer_converged(&mut self, spatial_index: usize, quality_converged: bool) {
        assert!(
            spatial_index < self.layer_trackers.len(),
            "spatial layer index {spatial_index} out of range ({} layers)",
            self.layer_trackers.len()
        );
        info!(layer = spatial_index, converged = quality_converged, "layer quality convergence");
        let tracker = &mut self.layer_trackers[spatial_index];
        if tracker.quality_converged.is_some() {
            tracker.quality_converged = Some(quality_converged);
        }
    }

    /// Enable or disable a layer. Enabling an already-enabled layer keeps
    /// its convergence status.
    pub fn update_layer_enabled(&mut self, spatial_index: usize, enabled: bool) {
        assert!(
            spatial_index < self.layer_trackers.len(),
            "spatial layer index {spatial_index} out of range ({} layers)",
            self.layer_trackers.len()
        );
        let tracker = &mut self.layer_trackers[spatial_index];
        if enabled {
            if tracker.quality_converged.is_none() {
                // Assume quality has not converged until hearing otherwise.
                tracker.quality_converged = Some(false);
                info!(layer = spatial_index, "layer enabled, quality assumed not converged");
            } else {
                info!(layer = spatial_index, "layer enabled");
            }
        } else {
            tracker.quality_converged = None;
            info!(layer = spatial_index, "layer disabled");
        }
    }

    pub fn on_frame(
        &mut self,
        _post_time: Timestamp,
        _frames_in_flight: usize,
        frame: &VideoFrame,
    ) {
        // A new frame invalidates prior convergence on every enabled layer.
        for tracker in &mut self.layer_trackers {
            if tracker.quality_converged.is_some() {
                tracker.quality_converged = Some(false);
            }
        }

        // Remove the stored repeating frame if there is one.
        if self.is_repeating {
            debug_assert_eq!(self.queued_frames.len(), 1);
            trace!("cancelling repeat, restarting with new frame");
            self.queued_frames.pop_front();
        }

        self.queued_frames.push_back(frame.clone());
        self.current_frame_id += 1;
        self.is_repeating = false;
        self.post_delayed(
            self.frame_delay,
            Command::EmitQueuedFrame { safety: self.safety.clone() },
        );
    }

    /// Zero-hertz imposes the cadence, so the input rate is the configured
    /// cap rather than a measurement.
    pub fn input_fps(&self) -> Option<u32> {
        Some(self.max_fps.round() as u32)
    }

    /// Deferred emission: fires one frame delay after each arrival.
    pub fn emit_queued_frame(&mut self) {
        debug_assert!(!self.queued_frames.is_empty());
        let Some(front) = self.queued_frames.front() else {
            return;
        };
        let frame = front.clone();
        self.send_frame_now(&frame);

        // Newer arrivals each have their own deferred emission pending;
        // nothing to repeat on behalf of the frame just sent.
        if self.queued_frames.len() > 1 {
            self.queued_frames.pop_front();
            return;
        }

        // Only one frame stored. Enter the repeat loop; it is cancelled by
        // `current_frame_id` advancing when new frames arrive.
        self.is_repeating = true;
        self.schedule_repeat(self.current_frame_id);
    }

    /// Deferred repeat: re-emits the stored frame unless `frame_id` has been
    /// superseded by a newer arrival.
    pub fn process_repeated_frame(&mut self, frame_id: u64, scheduled_delay: Duration) {
        debug_assert!(!self.queued_frames.is_empty());
        if frame_id != self.current_frame_id {
            trace!(frame_id, current_frame_id = self.current_frame_id, "stale repeat dropped");
            return;
        }
        let Some(frame) = self.queued_frames.front_mut() else {
            return;
        };

        // A repeated frame changes no pixels.
        frame.update_rect = UpdateRect::empty();

        // Compensate the timestamps for the wait. The wire timestamp is left
        // alone: the encoder rewrites it from its own NTP source.
        if frame.capture_time_us > 0 {
            frame.capture_time_us += scheduled_delay.as_micros() as i64;
        }
        if frame.ntp_time_ms != 0 {
            frame.ntp_time_ms += scheduled_delay.as_millis() as i64;
        }

        let frame = frame.clone();
        self.send_frame_now(&frame);
        self.schedule_repeat(frame_id);
    }

    fn schedule_repeat(&self, frame_id: u64) {
        let repeat_delay = if self.all_enabled_layers_converged() {
            IDLE_REPEAT_PERIOD
        } else {
            self.frame_delay
        };
        self.post_delayed(
            repeat_delay,
            Command::RepeatQueuedFrame {
                safety: self.safety.clone(),
                frame_id,
                scheduled_delay: repeat_delay,
            },
        );
    }

    /// Disabled layers do not participate in the vote; no enabled layers at
    /// all counts as converged.
    pub(crate) fn all_enabled_layers_converged(&self) -> bool {
        self.layer_trackers.iter().all(|tracker| tracker.quality_converged.unwrap_or(true))
    }

    fn send_frame_now(&self, frame: &VideoFrame) {
        // The ingress backlog is meaningless under an imposed cadence;
        // report a constant depth of 1.
        self.sink.on_frame(self.clock.now(), 1, frame);
    }

    fn post_delayed(&self, delay: Duration, command: Command) {
        let tasks = self.tasks.clone();
        let safety = self.safety.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = safety.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tasks.send(command);
                }
            }
        });
    }
}

impl Drop for ZeroHertzMode {
    fn drop(&mut self) {
        debug!("zero-hertz mode torn down");
        self.safety.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils::{ManualClock, RecordingSink};

    fn mode(layers: usize) -> ZeroHertzMode {
        let (tasks, _task_rx) = mpsc::unbounded_channel();
        ZeroHertzMode::new(
            ManualClock::new(),
            RecordingSink::new(),
            tasks,
            &CancellationToken::new(),
            10.0,
            ZeroHertzParams { num_simulcast_layers: layers },
        )
    }

    #[test]
    fn frame_delay_derived_from_max_fps() {
        let zero_hertz = mode(1);
        assert_eq!(zero_hertz.frame_delay, Duration::from_millis(100));
        assert_eq!(zero_hertz.input_fps(), Some(10));
    }

    #[test]
    fn no_enabled_layers_count_as_converged() {
        let zero_hertz = mode(2);
        assert!(zero_hertz.all_enabled_layers_converged());
    }

    #[test]
    fn enabling_a_layer_assumes_unconverged() {
        let mut zero_hertz = mode(1);
        zero_hertz.update_layer_enabled(0, true);
        assert!(!zero_hertz.all_enabled_layers_converged());
        zero_hertz.update_layer_converged(0, true);
        assert!(zero_hertz.all_enabled_layers_converged());
    }

    #[test]
    fn re_enabling_preserves_convergence() {
        let mut zero_hertz = mode(1);
        zero_hertz.update_layer_enabled(0, true);
        zero_hertz.update_layer_converged(0, true);
        zero_hertz.update_layer_enabled(0, true);
        assert!(zero_hertz.all_enabled_layers_converged());
    }

    #[test]
    fn convergence_on_disabled_layer_is_ignored() {
        let mut zero_hertz = mode(1);
        zero_hertz.update_layer_converged(0, true);
        // The layer stays disabled, so enabling it starts unconverged.
        zero_hertz.update_layer_enabled(0, true);
        assert!(!zero_hertz.all_enabled_layers_converged());
    }

    #[test]
    fn disabled_layer_does_not_veto_convergence() {
        let mut zero_hertz = mode(2);
        zero_hertz.update_layer_enabled(0, true);
        zero_hertz.update_layer_converged(0, true);
        assert!(zero_hertz.all_enabled_layers_converged());
    }

    #[test]
    fn disabling_clears_convergence() {
        let mut zero_hertz = mode(1);
        zero_hertz.update_layer_enabled(0, true);
        zero_hertz.update_layer_converged(0, true);
        zero_hertz.update_layer_enabled(0, false);
        zero_hertz.update_layer_enabled(0, true);
        assert!(!zero_hertz.all_enabled_layers_converged());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_layer_index_panics() {
        let mut zero_hertz = mode(1);
        zero_hertz.update_layer_enabled(1, true);
    }

    #[tokio::test(start_paused = true)]
    async fn arrival_resets_enabled_trackers_and_advances_generation() {
        let (tasks, mut task_rx) = mpsc::unbounded_channel();
        let mut zero_hertz = ZeroHertzMode::new(
            ManualClock::new(),
            RecordingSink::new(),
            tasks,
            &CancellationToken::new(),
            10.0,
            ZeroHertzParams { num_simulcast_layers: 1 },
        );
        zero_hertz.update_layer_enabled(0, true);
        zero_hertz.update_layer_converged(0, true);

        zero_hertz.on_frame(Timestamp::from_millis(0), 1, &VideoFrame::new(vec![0; 4], 1));
        assert!(!zero_hertz.all_enabled_layers_converged());
        assert_eq!(zero_hertz.current_frame_id, 1);
        assert_eq!(zero_hertz.queued_frames.len(), 1);
        assert!(!zero_hertz.is_repeating);

        // The deferred emission lands one frame delay later.
        let command = task_rx.recv().await.expect("deferred emission");
        assert!(matches!(command, Command::EmitQueuedFrame { .. }));
    }
}
