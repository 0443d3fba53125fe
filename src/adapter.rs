//! Public adapter handle and worker spawn.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::dispatcher::{Command, Dispatcher};
use crate::error::{CadenceError, Result};
use crate::sink::FrameSink;
use crate::types::{AdapterConfig, SourceConstraints, VideoFrame, ZeroHertzParams};

/// Regulates the temporal delivery of captured frames to a [`FrameSink`].
///
/// The handle accepts frames on any thread and marshals them, in arrival
/// order, onto a dedicated worker task that owns all cadence state. The
/// worker forwards frames straight through until zero-hertz operation arms
/// (feature toggle on, `min_fps == 0`, positive `max_fps`, params set), at
/// which point frames are emitted on a deferred cadence and repeated while
/// the source idles.
///
/// Dropping the handle (or calling [`shutdown`](Self::shutdown)) stops the
/// worker; outstanding deferred emissions are discarded.
pub struct CadenceAdapter {
    commands: mpsc::UnboundedSender<Command>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn FrameSink>,
    frames_in_flight: Arc<AtomicUsize>,
    cancel: CancellationToken,
    ingress_checker: RaceChecker,
}

impl CadenceAdapter {
    /// Spawn the adapter worker and return its handle.
    ///
    /// `config` is captured once; the feature toggle is immutable for the
    /// adapter's lifetime. The sink must outlive the adapter, which holding
    /// it as an `Arc` guarantees.
    pub fn spawn(config: AdapterConfig, clock: Arc<dyn Clock>, sink: Arc<dyn FrameSink>) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let frames_in_flight = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(
            config,
            clock.clone(),
            sink.clone(),
            commands.clone(),
            cancel.clone(),
            frames_in_flight.clone(),
        );
        tokio::spawn(dispatcher.run(command_rx));
        info!(
            zero_hertz_screenshare_enabled = config.zero_hertz_screenshare_enabled,
            "cadence adapter started"
        );
        Self {
            commands,
            clock,
            sink,
            frames_in_flight,
            cancel,
            ingress_checker: RaceChecker::default(),
        }
    }

    /// Hand a captured frame to the adapter.
    ///
    /// May be called from any thread, but successive calls must be
    /// serialized by the caller; debug builds assert this. If the worker has
    /// stopped the frame is dropped.
    pub fn on_frame(&self, frame: VideoFrame) {
        let _serialized = self.ingress_checker.enter();
        let post_time = self.clock.now();
        self.frames_in_flight.fetch_add(1, Ordering::Relaxed);
        if self.commands.send(Command::Frame { post_time, frame }).is_err() {
            self.frames_in_flight.fetch_sub(1, Ordering::Relaxed);
            debug!("cadence worker gone, dropping frame");
        }
    }

    /// The source dropped a frame before it reached the adapter; forwarded
    /// straight to the sink on the calling thread.
    pub fn on_discarded_frame(&self) {
        self.sink.on_discarded_frame();
    }

    /// Report new source constraints. Validated here, applied on the worker,
    /// where they may arm or disarm zero-hertz operation.
    pub fn on_constraints_changed(&self, constraints: SourceConstraints) -> Result<()> {
        constraints.validate()?;
        info!(
            min_fps = constraints.min_fps.unwrap_or(-1.0),
            max_fps = constraints.max_fps.unwrap_or(-1.0),
            "source constraints changed"
        );
        self.send(Command::ConstraintsChanged(constraints))
    }

    /// Enable (`Some`) or disable (`None`) zero-hertz operation. The mode
    /// only becomes active once the source constraints also allow it.
    pub fn set_zero_hertz_mode(&self, params: Option<ZeroHertzParams>) -> Result<()> {
        self.send(Command::SetZeroHertzMode(params))
    }

    /// Update a spatial layer's enabled status.
    ///
    /// # Panics
    ///
    /// The worker panics if `spatial_index` is out of range for the
    /// configured layer count.
    pub fn update_layer_enabled(&self, spatial_index: usize, enabled: bool) -> Result<()> {
        self.send(Command::UpdateLayerEnabled { spatial_index, enabled })
    }

    /// Update a spatial layer's quality convergence. Ignored while the layer
    /// is disabled.
    ///
    /// # Panics
    ///
    /// The worker panics if `spatial_index` is out of range for the
    /// configured layer count.
    pub fn update_layer_converged(
        &self,
        spatial_index: usize,
        quality_converged: bool,
    ) -> Result<()> {
        self.send(Command::UpdateLayerConverged { spatial_index, quality_converged })
    }

    /// Record an input frame sample for the framerate estimate. Always feeds
    /// the passthrough estimator, whichever mode is active.
    pub fn tick_frame_rate(&self) -> Result<()> {
        self.send(Command::TickFrameRate)
    }

    /// Input framerate estimate of the active mode: a windowed measurement
    /// in passthrough, the configured `max_fps` in zero-hertz, `None` when
    /// too few samples exist.
    pub async fn input_fps(&self) -> Result<Option<u32>> {
        let (reply, response) = oneshot::channel();
        self.send(Command::InputFps(reply))?;
        response.await.map_err(|_| CadenceError::WorkerGone)
    }

    /// Stop the worker. Queued frames and scheduled repeats are discarded.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| CadenceError::WorkerGone)
    }
}

impl Drop for CadenceAdapter {
    fn drop(&mut self) {
        debug!("dropping cadence adapter");
        self.cancel.cancel();
    }
}

/// Debug-build check that a call region is never entered concurrently.
///
/// The ingress side promises serialized calls; this catches violations
/// without taking a lock in release builds.
#[derive(Debug, Default)]
struct RaceChecker {
    #[cfg(debug_assertions)]
    busy: std::sync::atomic::AtomicBool,
}

impl RaceChecker {
    fn enter(&self) -> RaceGuard<'_> {
        #[cfg(debug_assertions)]
        assert!(
            self.busy
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
                .is_ok(),
            "ingress calls must be serialized by the caller"
        );
        RaceGuard { _checker: self }
    }
}

struct RaceGuard<'a> {
    _checker: &'a RaceChecker,
}

impl Drop for RaceGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self._checker.busy.store(false, Ordering::Release);
    }
}
