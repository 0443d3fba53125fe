//! Worker-side dispatch between the cadence modes.
//!
//! All adapter state lives here, owned by a single worker task. Every
//! mutation travels through the [`Command`] channel, which is what
//! serializes mode state without locks; deferred zero-hertz work re-enters
//! through the same channel.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::clock::Clock;
use crate::modes::{ActiveMode, PassthroughMode, ZeroHertzMode};
use crate::sink::FrameSink;
use crate::types::{AdapterConfig, SourceConstraints, Timestamp, VideoFrame, ZeroHertzParams};

/// Messages processed by the adapter worker.
#[derive(Debug)]
pub(crate) enum Command {
    /// A captured frame posted from the ingress context.
    Frame { post_time: Timestamp, frame: VideoFrame },
    /// New constraints from the source, applied on the worker.
    ConstraintsChanged(SourceConstraints),
    /// Enable or disable zero-hertz operation.
    SetZeroHertzMode(Option<ZeroHertzParams>),
    UpdateLayerEnabled { spatial_index: usize, enabled: bool },
    UpdateLayerConverged { spatial_index: usize, quality_converged: bool },
    TickFrameRate,
    InputFps(oneshot::Sender<Option<u32>>),
    /// Deferred zero-hertz emission, posted by the mode itself.
    EmitQueuedFrame { safety: CancellationToken },
    /// Deferred zero-hertz repeat, posted by the mode itself.
    RepeatQueuedFrame { safety: CancellationToken, frame_id: u64, scheduled_delay: Duration },
}

pub(crate) struct Dispatcher {
    clock: Arc<dyn Clock>,
    sink: Arc<dyn FrameSink>,
    /// Sender side of the worker channel, handed to zero-hertz instances so
    /// their deferred work re-enters the worker.
    tasks: mpsc::UnboundedSender<Command>,
    /// Adapter-scoped token; parent of every mode safety token.
    safety: CancellationToken,
    zero_hertz_screenshare_enabled: bool,
    passthrough: PassthroughMode,
    zero_hertz: Option<ZeroHertzMode>,
    zero_hertz_params: Option<ZeroHertzParams>,
    source_constraints: Option<SourceConstraints>,
    active: ActiveMode,
    /// Shared with the ingress handle; decremented as frames are consumed.
    frames_in_flight: Arc<AtomicUsize>,
    has_reported_constraint_stats: bool,
}

impl Dispatcher {
    pub(crate) fn new(
        config: AdapterConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn FrameSink>,
        tasks: mpsc::UnboundedSender<Command>,
        safety: CancellationToken,
        frames_in_flight: Arc<AtomicUsize>,
    ) -> Self {
        let passthrough = PassthroughMode::new(clock.clone(), sink.clone());
        Self {
            clock,
            sink,
            tasks,
            safety,
            zero_hertz_screenshare_enabled: config.zero_hertz_screenshare_enabled,
            passthrough,
            zero_hertz: None,
            zero_hertz_params: None,
            source_constraints: None,
            active: ActiveMode::Passthrough,
            frames_in_flight,
            has_reported_constraint_stats: false,
        }
    }

    /// Worker loop. Runs until the adapter handle shuts down or drops.
    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        debug!("cadence worker started");
        let shutdown = self.safety.clone();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }
        debug!("cadence worker stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Frame { post_time, frame } => {
                // Pre-decrement value: backlog including this frame.
                let frames_in_flight = self.frames_in_flight.fetch_sub(1, Ordering::Relaxed);
                self.on_frame(post_time, frames_in_flight, &frame);
                self.maybe_report_constraint_stats();
            }
            Command::ConstraintsChanged(constraints) => {
                let was_enabled = self.zero_hertz_active();
                self.source_constraints = Some(constraints);
                self.maybe_reconfigure(was_enabled);
            }
            Command::SetZeroHertzMode(params) => {
                let was_enabled = self.zero_hertz_params.is_some();
                if params.is_some() && !was_enabled {
                    // Re-arm the one-shot constraint statistics.
                    self.has_reported_constraint_stats = false;
                }
                self.zero_hertz_params = params;
                self.maybe_reconfigure(was_enabled);
            }
            Command::UpdateLayerEnabled { spatial_index, enabled } => {
                if let Some(zero_hertz) = &mut self.zero_hertz {
                    zero_hertz.update_layer_enabled(spatial_index, enabled);
                }
            }
            Command::UpdateLayerConverged { spatial_index, quality_converged } => {
                if let Some(zero_hertz) = &mut self.zero_hertz {
                    zero_hertz.update_layer_converged(spatial_index, quality_converged);
                }
            }
            Command::TickFrameRate => {
                // Zero-hertz imposes its own cadence and ignores ticks, but
                // the passthrough estimator stays primed so a later switch
                // back has a meaningful estimate.
                self.passthrough.tick_frame_rate();
            }
            Command::InputFps(reply) => {
                let fps = match self.active {
                    ActiveMode::Passthrough => self.passthrough.input_fps(),
                    ActiveMode::ZeroHertz => {
                        self.zero_hertz.as_ref().and_then(ZeroHertzMode::input_fps)
                    }
                };
                let _ = reply.send(fps);
            }
            Command::EmitQueuedFrame { safety } => {
                if safety.is_cancelled() {
                    trace!("dropping deferred emission for torn-down mode");
                    return;
                }
                if let Some(zero_hertz) = &mut self.zero_hertz {
                    zero_hertz.emit_queued_frame();
                }
            }
            Command::RepeatQueuedFrame { safety, frame_id, scheduled_delay } => {
                if safety.is_cancelled() {
                    trace!("dropping deferred repeat for torn-down mode");
                    return;
                }
                if let Some(zero_hertz) = &mut self.zero_hertz {
                    zero_hertz.process_repeated_frame(frame_id, scheduled_delay);
                }
            }
        }
    }

    fn on_frame(&mut self, post_time: Timestamp, frames_in_flight: usize, frame: &VideoFrame) {
        match self.active {
            ActiveMode::Passthrough => {
                self.passthrough.on_frame(post_time, frames_in_flight, frame);
            }
            ActiveMode::ZeroHertz => {
                if let Some(zero_hertz) = &mut self.zero_hertz {
                    zero_hertz.on_frame(post_time, frames_in_flight, frame);
                }
            }
        }
    }

    /// True under all of: feature toggle on, constraints present with
    /// `max_fps > 0` and `min_fps == 0`, zero-hertz params present.
    fn zero_hertz_active(&self) -> bool {
        self.zero_hertz_screenshare_enabled
            && self.zero_hertz_params.is_some()
            && self.source_constraints.as_ref().is_some_and(|constraints| {
                constraints.max_fps.unwrap_or(-1.0) > 0.0
                    && constraints.min_fps.unwrap_or(-1.0) == 0.0
            })
    }

    fn maybe_reconfigure(&mut self, was_enabled: bool) {
        let is_enabled = self.zero_hertz_active();
        if is_enabled {
            if !was_enabled {
                if let (Some(max_fps), Some(params)) = (
                    self.source_constraints.as_ref().and_then(|constraints| constraints.max_fps),
                    self.zero_hertz_params,
                ) {
                    self.zero_hertz = Some(ZeroHertzMode::new(
                        self.clock.clone(),
                        self.sink.clone(),
                        self.tasks.clone(),
                        &self.safety,
                        max_fps,
                        params,
                    ));
                    info!("zero-hertz mode activated");
                }
            }
            self.active = ActiveMode::ZeroHertz;
        } else {
            if was_enabled {
                // Drop cancels the instance's safety token, so outstanding
                // deferred emissions and repeats become no-ops.
                self.zero_hertz = None;
            }
            self.active = ActiveMode::Passthrough;
        }
    }

    /// Reports constraint statistics at most once per zero-hertz enable
    /// transition, and only while zero-hertz params are present.
    fn maybe_report_constraint_stats(&mut self) {
        if self.has_reported_constraint_stats {
            return;
        }
        self.has_reported_constraint_stats = true;
        if self.zero_hertz_params.is_none() {
            return;
        }
        info!(
            target: "cadence::stats",
            exists = self.source_constraints.is_some(),
            "frame rate constraints"
        );
        let Some(constraints) = self.source_constraints else {
            return;
        };
        info!(
            target: "cadence::stats",
            min_exists = constraints.min_fps.is_some(),
            "min frame rate constraint"
        );
        if let Some(min_fps) = constraints.min_fps {
            info!(target: "cadence::stats", min_fps, "min frame rate constraint value");
        }
        info!(
            target: "cadence::stats",
            max_exists = constraints.max_fps.is_some(),
            "max frame rate constraint"
        );
        if let Some(max_fps) = constraints.max_fps {
            info!(target: "cadence::stats", max_fps, "max frame rate constraint value");
        }
        match (constraints.min_fps, constraints.max_fps) {
            (None, Some(max_fps)) => {
                info!(target: "cadence::stats", max_fps, "max frame rate constraint, min unset");
            }
            (Some(min_fps), Some(max_fps)) => {
                if min_fps < max_fps {
                    info!(
                        target: "cadence::stats",
                        min_fps,
                        max_fps,
                        "min frame rate constraint less than max"
                    );
                }
                // Combined bucket uncovering min and max pairings, capped at
                // 60 * 60 + 60 - 1. Computed in double precision, truncated
                // once.
                let bucket = ((min_fps * 60.0 + max_fps - 1.0) as i64).min(60 * 60 + 60 - 1);
                info!(target: "cadence::stats", bucket, "combined frame rate constraints");
            }
            _ => {}
        }
    }
}
