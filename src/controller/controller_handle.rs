//! Controller Handle - runs the tick loop and publishes its results
//!
//! The loop lives on a dedicated thread because the input backend is polled
//! synchronously. Each tick it reads one [`RawFrame`], advances the
//! [`InputStateNormalizer`] and publishes:
//!
//! ```text
//! FrameSource ─[RawFrame]→ InputStateNormalizer ─┬─[FrameSnapshot]→ watch channel (latest state)
//!                                                 └─[InputEvent]───→ mpsc channel (every edge)
//! ```
//!
//! Readers never touch the normalizer. The snapshot carries the current and
//! previous frame together, so a reader cannot see one without the other.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::edge_tracker::{EdgeTracker, InputEvent};
use super::gamepad_state::{ButtonType, GamepadState};
use super::input_poller::{ControllerInfo, FrameSource, InputPoller, PollerError};
use super::normalizer::{InputStateNormalizer, NormalizerSettings};

/// Configuration of the tick loop
///
/// # Examples
///
/// ```rust
/// use padmonitor::controller::ControllerSettings;
///
/// // Poll at roughly 120 Hz
/// let settings = ControllerSettings {
///     poll_interval_ms: 8,
///     ..ControllerSettings::default()
/// };
/// assert_eq!(settings.idle_interval_ms, 100);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Deadzone and trigger threshold
    pub normalizer: NormalizerSettings,

    /// Tick interval while a gamepad is connected
    pub poll_interval_ms: u64,

    /// Tick interval while no gamepad is present
    pub idle_interval_ms: u64,

    /// Capacity of the input event channel
    pub event_buffer: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            normalizer: NormalizerSettings::default(),
            poll_interval_ms: 16,  // ~60 Hz
            idle_interval_ms: 100, // re-check for a device ten times a second
            event_buffer: 256,
        }
    }
}

/// Both frames of one tick, published as a single value
#[derive(Clone, Debug)]
pub struct FrameSnapshot {
    pub edges: EdgeTracker,
    pub controller: Option<ControllerInfo>,
    pub frame: u64,
    pub captured_at: DateTime<Local>,
}

impl Default for FrameSnapshot {
    fn default() -> Self {
        Self {
            edges: EdgeTracker::default(),
            controller: None,
            frame: 0,
            captured_at: Local::now(),
        }
    }
}

impl FrameSnapshot {
    pub fn state(&self) -> &GamepadState {
        self.edges.current()
    }

    pub fn is_pressed(&self, button: ButtonType) -> bool {
        self.edges.is_pressed(button)
    }

    pub fn is_triggered(&self, button: ButtonType) -> bool {
        self.edges.is_triggered(button)
    }

    pub fn is_released(&self, button: ButtonType) -> bool {
        self.edges.is_released(button)
    }
}

/// Errors that can occur while starting or stopping the controller subsystem
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The input backend could not be brought up
    #[error("Poller error: {0}")]
    PollerError(#[from] PollerError),

    #[error("Failed to spawn poll thread: {0}")]
    ThreadSpawn(String),

    /// The poll thread exited before reporting whether its source started
    #[error("Frame source stopped before it finished starting")]
    SourceLost,

    #[error("Poll thread panicked")]
    ThreadPanicked,
}

/// Handle for the running tick loop
///
/// Dropping the handle cancels the loop; [`ControllerHandle::shutdown`] also
/// waits for the thread to finish.
pub struct ControllerHandle {
    state_receiver: watch::Receiver<FrameSnapshot>,
    event_receiver: Option<mpsc::Receiver<InputEvent>>,
    cancel: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl ControllerHandle {
    /// Starts the tick loop on top of the gilrs backend.
    ///
    /// # Errors
    ///
    /// * [`ControllerError::PollerError`] - gilrs failed to initialize
    /// * [`ControllerError::ThreadSpawn`] - the OS refused a new thread
    pub async fn spawn(settings: Option<ControllerSettings>) -> Result<Self, ControllerError> {
        Self::spawn_with_source(
            || {
                let poller = InputPoller::create()?;
                Ok(poller.initialize())
            },
            settings,
        )
        .await
    }

    /// Starts the tick loop on any [`FrameSource`].
    ///
    /// The source is built by `factory` on the poll thread itself, so it does
    /// not have to be `Send`. Its construction result is awaited before this
    /// returns.
    pub async fn spawn_with_source<S, F>(
        factory: F,
        settings: Option<ControllerSettings>,
    ) -> Result<Self, ControllerError>
    where
        S: FrameSource + 'static,
        F: FnOnce() -> Result<S, ControllerError> + Send + 'static,
    {
        info!("Initializing controller with settings: {:?}", settings);
        let settings = settings.unwrap_or_default();

        let (state_sender, state_receiver) = watch::channel(FrameSnapshot::default());
        let (event_sender, event_receiver) = mpsc::channel(settings.event_buffer.max(1));
        let (ready_sender, ready_receiver) = oneshot::channel();
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();

        debug!(
            "Created event channel with buffer capacity {}",
            settings.event_buffer
        );

        let thread = std::thread::Builder::new()
            .name("padmonitor-poll".to_string())
            .spawn(move || {
                let source = match factory() {
                    Ok(source) => {
                        let _ = ready_sender.send(Ok(()));
                        source
                    }
                    Err(e) => {
                        error!("Failed to start frame source: {}", e);
                        let _ = ready_sender.send(Err(e));
                        return;
                    }
                };

                let tick_loop = TickLoop {
                    normalizer: InputStateNormalizer::new(settings.normalizer),
                    settings,
                    state_sender,
                    event_sender,
                    cancel: loop_cancel,
                };
                tick_loop.run(source);
            })
            .map_err(|e| ControllerError::ThreadSpawn(e.to_string()))?;

        match ready_receiver.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(ControllerError::SourceLost),
        }

        info!("Controller system initialized successfully");
        Ok(Self {
            state_receiver,
            event_receiver: Some(event_receiver),
            cancel,
            thread: Some(thread),
        })
    }

    // Get a receiver for the latest snapshot
    pub fn subscribe(&self) -> watch::Receiver<FrameSnapshot> {
        debug!("New subscriber to controller state");
        self.state_receiver.clone()
    }

    /// Hands out the event stream. Only the first call returns `Some`.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<InputEvent>> {
        self.event_receiver.take()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops the tick loop and waits for its thread.
    pub async fn shutdown(mut self) -> Result<(), ControllerError> {
        info!("Shutting down controller");
        self.cancel.cancel();

        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        match tokio::task::spawn_blocking(move || thread.join()).await {
            Ok(Ok(())) => {
                info!("Poll thread finished");
                Ok(())
            }
            _ => Err(ControllerError::ThreadPanicked),
        }
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// State owned by the poll thread
struct TickLoop {
    normalizer: InputStateNormalizer,
    settings: ControllerSettings,
    state_sender: watch::Sender<FrameSnapshot>,
    event_sender: mpsc::Sender<InputEvent>,
    cancel: CancellationToken,
}

impl TickLoop {
    fn run<S: FrameSource>(mut self, mut source: S) {
        info!(
            "Starting tick loop ({} ms connected, {} ms idle)",
            self.settings.poll_interval_ms, self.settings.idle_interval_ms
        );

        let mut frame: u64 = 0;

        // For performance monitoring
        let mut event_count: u64 = 0;
        let mut dropped_events: u64 = 0;
        let mut frames_since_log: u64 = 0;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(10);

        while !self.cancel.is_cancelled() {
            let raw = source.poll_frame();
            let edges = *self.normalizer.update(&raw);
            frame += 1;
            frames_since_log += 1;

            let controller = source.controller_info();
            for event in edges.events(frame, controller.as_ref()) {
                debug!("Captured event: {:?}", event);
                event_count += 1;
                if !self.publish_event(event) {
                    dropped_events += 1;
                }
            }

            self.state_sender.send_replace(FrameSnapshot {
                edges,
                controller,
                frame,
                captured_at: Local::now(),
            });

            // Log performance stats periodically
            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Tick loop stats: {} frames, {} events in last {} seconds (avg {:.2} frames/sec)",
                    frames_since_log,
                    event_count,
                    log_interval.num_seconds(),
                    frames_since_log as f64 / log_interval.num_seconds() as f64
                );
                if dropped_events > 0 {
                    warn!("Dropped {} events, consumer is falling behind", dropped_events);
                }
                frames_since_log = 0;
                event_count = 0;
                dropped_events = 0;
                last_log_time = now;
            }

            let interval = if edges.current().connected {
                self.settings.poll_interval_ms
            } else {
                self.settings.idle_interval_ms
            };
            std::thread::sleep(Duration::from_millis(interval));
        }

        info!("Tick loop stopped after {} frames", frame);
    }

    // Never blocks the tick; returns false if the event had to be dropped
    fn publish_event(&self, event: InputEvent) -> bool {
        match self.event_sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                debug!("Event channel full, dropping {:?}", event);
                false
            }
            // Nobody is listening for events, which is fine
            Err(mpsc::error::TrySendError::Closed(_)) => true,
        }
    }
}
