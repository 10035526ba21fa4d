//! Input state normalization
//!
//! Turns one frame of raw device readings into a [`GamepadState`] and keeps the
//! previous frame around for edge queries. Everything in here is total: absent
//! devices produce the neutral state and out-of-range readings are clamped.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::edge_tracker::{ConnectionState, EdgeTracker};
use super::gamepad_state::{apply_deadzone, ButtonSet, ButtonType, GamepadState, StickPosition};

/// Largest magnitude a native axis reading can report.
pub const AXIS_MAX: f32 = 32767.0;

pub const DEFAULT_DEADZONE: f32 = 0.15;
pub const DEFAULT_TRIGGER_DIGITAL_THRESHOLD: f32 = 0.5;

/// Tunable constants of the normalizer
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerSettings {
    /// Per-axis stick deadzone as a fraction of full deflection.
    pub deadzone: f32,

    /// Analog trigger value a trigger has to exceed (strictly) to count as pressed.
    pub trigger_digital_threshold: f32,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            deadzone: DEFAULT_DEADZONE,
            trigger_digital_threshold: DEFAULT_TRIGGER_DIGITAL_THRESHOLD,
        }
    }
}

// Raw stick readings in native device units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawSticks {
    pub left_x: i32,
    pub left_y: i32,
    pub right_x: i32,
    pub right_y: i32,
}

// Raw trigger readings in native device units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawTriggers {
    pub left: i32,
    pub right: i32,
}

/// One tick worth of raw device readings.
///
/// Axis values use the device's native signed 16-bit scale but are carried as
/// `i32` so out-of-range readings can be represented (and clamped) rather than
/// wrapped. Trigger-derived entries in `buttons` are ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawFrame {
    pub device_present: bool,
    pub buttons: ButtonSet,
    pub sticks: RawSticks,
    pub triggers: RawTriggers,
}

impl RawFrame {
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// A present device with everything at rest.
    pub fn idle() -> Self {
        Self {
            device_present: true,
            ..Self::default()
        }
    }
}

/// Scales a native stick reading into `[-1.0, 1.0]`.
pub fn normalize_stick_axis(raw: i32) -> f32 {
    (raw as f32 / AXIS_MAX).clamp(-1.0, 1.0)
}

/// Scales a native trigger reading into `[0.0, 1.0]`.
pub fn normalize_trigger_axis(raw: i32) -> f32 {
    (raw as f32 / AXIS_MAX).clamp(0.0, 1.0)
}

/// Digital view of an analog trigger. The comparison is strict.
pub fn trigger_pressed(value: f32, threshold: f32) -> bool {
    value > threshold
}

/// Maps one raw frame onto a [`GamepadState`].
pub fn normalize_frame(raw: &RawFrame, settings: &NormalizerSettings) -> GamepadState {
    if !raw.device_present {
        return GamepadState::disconnected();
    }

    let stick = |x: i32, y: i32| StickPosition {
        // Each axis gets its own deadzone, not the stick vector as a whole
        x: apply_deadzone(normalize_stick_axis(x), settings.deadzone),
        y: apply_deadzone(normalize_stick_axis(y), settings.deadzone),
    };

    let left_trigger = normalize_trigger_axis(raw.triggers.left);
    let right_trigger = normalize_trigger_axis(raw.triggers.right);

    let mut buttons = raw.buttons;
    buttons.set(
        ButtonType::TriggerLeft,
        trigger_pressed(left_trigger, settings.trigger_digital_threshold),
    );
    buttons.set(
        ButtonType::TriggerRight,
        trigger_pressed(right_trigger, settings.trigger_digital_threshold),
    );

    GamepadState {
        left_stick: stick(raw.sticks.left_x, raw.sticks.left_y),
        right_stick: stick(raw.sticks.right_x, raw.sticks.right_y),
        left_trigger,
        right_trigger,
        buttons,
        connected: true,
    }
}

/// Caller-owned normalizer holding the current and previous frame.
///
/// Call [`InputStateNormalizer::update`] once per tick; the edge queries then
/// compare the frame just produced with the one before it.
#[derive(Clone, Debug, Default)]
pub struct InputStateNormalizer {
    settings: NormalizerSettings,
    edges: EdgeTracker,
}

impl InputStateNormalizer {
    pub fn new(settings: NormalizerSettings) -> Self {
        debug!("Creating input state normalizer with settings: {:?}", settings);
        Self {
            settings,
            edges: EdgeTracker::default(),
        }
    }

    pub fn settings(&self) -> &NormalizerSettings {
        &self.settings
    }

    pub fn update_settings(&mut self, settings: NormalizerSettings) {
        self.settings = settings;
    }

    /// Advances one frame: previous := current, current := normalized `raw`.
    pub fn update(&mut self, raw: &RawFrame) -> &EdgeTracker {
        let next = normalize_frame(raw, &self.settings);
        self.edges.advance(next);
        &self.edges
    }

    pub fn edges(&self) -> &EdgeTracker {
        &self.edges
    }

    pub fn current(&self) -> &GamepadState {
        self.edges.current()
    }

    pub fn previous(&self) -> &GamepadState {
        self.edges.previous()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.edges.connection_state()
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
