//! Controller subsystem for gamepad input handling
//!
//! Implements a small polling pipeline:
//!
//! 1. [`input_poller`] - Raw frame collection from gilrs
//! 2. [`normalizer`] - Frame normalization (scaling, deadzone, trigger flags)
//! 3. [`edge_tracker`] - Current/previous frame pair and edge queries
//! 4. [`controller_handle`] - Tick loop thread and publishing
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► Poller ──► Normalizer ──► FrameSnapshot / InputEvent
//!             (RawFrame)  (GamepadState)
//! ```

pub mod controller_handle;
pub mod edge_tracker;
pub mod gamepad_state;
pub mod input_poller;
pub mod normalizer;

pub use controller_handle::{ControllerError, ControllerHandle, ControllerSettings, FrameSnapshot};
pub use edge_tracker::{ButtonEdge, ConnectionState, EdgeTracker, InputEvent};
pub use gamepad_state::{apply_deadzone, ButtonSet, ButtonType, GamepadState, StickPosition};
pub use input_poller::{ControllerInfo, ControllerKind, FrameSource, InputPoller, PollerError};
pub use normalizer::{
    normalize_frame, InputStateNormalizer, NormalizerSettings, RawFrame, RawSticks, RawTriggers,
};
