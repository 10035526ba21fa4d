use serde::{Deserialize, Serialize};
use std::fmt;

// Named buttons of a gamepad, face buttons by position rather than by label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonType {
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    FaceDown,
    FaceRight,
    FaceLeft,
    FaceUp,
    ShoulderLeft,
    ShoulderRight,
    // Digital view of the analog triggers, never read from the device directly
    TriggerLeft,
    TriggerRight,
    StickClickLeft,
    StickClickRight,
    Start,
    Select,
    Guide,
    Misc,
}

impl ButtonType {
    pub const COUNT: usize = 18;

    pub const ALL: [ButtonType; Self::COUNT] = [
        ButtonType::DPadUp,
        ButtonType::DPadDown,
        ButtonType::DPadLeft,
        ButtonType::DPadRight,
        ButtonType::FaceDown,
        ButtonType::FaceRight,
        ButtonType::FaceLeft,
        ButtonType::FaceUp,
        ButtonType::ShoulderLeft,
        ButtonType::ShoulderRight,
        ButtonType::TriggerLeft,
        ButtonType::TriggerRight,
        ButtonType::StickClickLeft,
        ButtonType::StickClickRight,
        ButtonType::Start,
        ButtonType::Select,
        ButtonType::Guide,
        ButtonType::Misc,
    ];

    /// Position of the button inside [`ButtonType::ALL`] and [`ButtonSet`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Buttons whose flag is computed from an analog trigger value.
    pub const fn is_trigger_derived(self) -> bool {
        matches!(self, ButtonType::TriggerLeft | ButtonType::TriggerRight)
    }

    /// Short label used in log lines.
    pub const fn label(self) -> &'static str {
        match self {
            ButtonType::DPadUp => "Up",
            ButtonType::DPadDown => "Down",
            ButtonType::DPadLeft => "Left",
            ButtonType::DPadRight => "Right",
            ButtonType::FaceDown => "v",
            ButtonType::FaceRight => ">",
            ButtonType::FaceLeft => "<",
            ButtonType::FaceUp => "^",
            ButtonType::ShoulderLeft => "L1",
            ButtonType::ShoulderRight => "R1",
            ButtonType::TriggerLeft => "L2",
            ButtonType::TriggerRight => "R2",
            ButtonType::StickClickLeft => "L3",
            ButtonType::StickClickRight => "R3",
            ButtonType::Start => "STA",
            ButtonType::Select => "SEL",
            ButtonType::Guide => "GUI",
            ButtonType::Misc => "MSC",
        }
    }
}

impl fmt::Display for ButtonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed-size set of button flags indexed by [`ButtonType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonSet([bool; ButtonType::COUNT]);

impl ButtonSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, button: ButtonType) -> bool {
        self.0[button.index()]
    }

    pub fn set(&mut self, button: ButtonType, pressed: bool) {
        self.0[button.index()] = pressed;
    }

    /// Builder-style helper, mostly for assembling frames by hand.
    pub fn with(mut self, button: ButtonType, pressed: bool) -> Self {
        self.set(button, pressed);
        self
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|&pressed| pressed)
    }

    pub fn pressed(&self) -> impl Iterator<Item = ButtonType> + '_ {
        ButtonType::ALL
            .iter()
            .copied()
            .filter(move |button| self.get(*button))
    }
}

impl FromIterator<ButtonType> for ButtonSet {
    fn from_iter<I: IntoIterator<Item = ButtonType>>(iter: I) -> Self {
        let mut set = ButtonSet::new();
        for button in iter {
            set.set(button, true);
        }
        set
    }
}

// Stick position, both components in [-1.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StickPosition {
    pub x: f32,
    pub y: f32,
}

/// Normalized state of one gamepad for a single frame.
///
/// The default value is the disconnected state: sticks centered, triggers
/// released, no buttons pressed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GamepadState {
    pub left_stick: StickPosition,
    pub right_stick: StickPosition,

    // Triggers in [0.0, 1.0]
    pub left_trigger: f32,
    pub right_trigger: f32,

    pub buttons: ButtonSet,

    pub connected: bool,
}

impl GamepadState {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn button(&self, button: ButtonType) -> bool {
        self.buttons.get(button)
    }

    pub fn is_any_button_pressed(&self) -> bool {
        self.buttons.any()
    }
}

/// Zeroes values inside the dead band and rescales the rest back onto the
/// full range, keeping the sign.
///
/// `|value| < deadzone` yields exactly `0.0`; otherwise the result is
/// `sign(value) * (|value| - deadzone) / (1 - deadzone)`. A deadzone outside
/// `[0, 1)` is clamped, and a deadzone of `1.0` zeroes everything.
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    let deadzone = deadzone.clamp(0.0, 1.0);
    if value.abs() < deadzone || deadzone >= 1.0 {
        return 0.0;
    }

    let sign = if value < 0.0 { -1.0 } else { 1.0 };
    sign * (value.abs() - deadzone) / (1.0 - deadzone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DZ: f32 = 0.15;

    #[test]
    fn test_deadzone_zeroes_dead_band() {
        assert_eq!(apply_deadzone(0.0, DZ), 0.0);
        assert_eq!(apply_deadzone(0.1, DZ), 0.0);
        assert_eq!(apply_deadzone(-0.149, DZ), 0.0);
    }

    #[test]
    fn test_deadzone_boundaries_are_exact() {
        assert_eq!(apply_deadzone(DZ, DZ), 0.0);
        assert_eq!(apply_deadzone(1.0, DZ), 1.0);
        assert_eq!(apply_deadzone(-1.0, DZ), -1.0);
    }

    #[test]
    fn test_deadzone_rescales_outside_band() {
        let half = apply_deadzone(0.575, DZ);
        assert!((half - 0.5).abs() < 1e-6);

        let neg = apply_deadzone(-0.575, DZ);
        assert!((neg + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_deadzone_is_idempotent_at_zero() {
        let once = apply_deadzone(DZ, DZ);
        assert_eq!(apply_deadzone(once, DZ), 0.0);
    }

    #[test]
    fn test_degenerate_deadzones() {
        // No deadzone passes values through
        assert_eq!(apply_deadzone(0.3, 0.0), 0.3);
        // Full deadzone never divides by zero
        assert_eq!(apply_deadzone(1.0, 1.0), 0.0);
        assert_eq!(apply_deadzone(0.7, 2.0), 0.0);
    }

    #[test]
    fn test_button_set_lookup() {
        let set: ButtonSet = [ButtonType::FaceDown, ButtonType::Guide]
            .into_iter()
            .collect();

        assert!(set.get(ButtonType::FaceDown));
        assert!(set.get(ButtonType::Guide));
        assert!(!set.get(ButtonType::FaceUp));
        assert_eq!(
            set.pressed().collect::<Vec<_>>(),
            vec![ButtonType::FaceDown, ButtonType::Guide]
        );
    }

    #[test]
    fn test_all_indices_match_positions() {
        for (position, button) in ButtonType::ALL.iter().enumerate() {
            assert_eq!(button.index(), position);
        }
    }

    #[test]
    fn test_any_button_pressed() {
        let mut state = GamepadState::disconnected();
        assert!(!state.is_any_button_pressed());

        state.buttons.set(ButtonType::DPadLeft, true);
        assert!(state.is_any_button_pressed());
        assert!(state.button(ButtonType::DPadLeft));
    }

    proptest! {
        #[test]
        fn prop_deadzone_is_odd(v in -1.0f32..=1.0, dz in 0.0f32..0.9) {
            prop_assert_eq!(apply_deadzone(-v, dz), -apply_deadzone(v, dz));
        }

        #[test]
        fn prop_deadzone_stays_in_range(v in -1.0f32..=1.0, dz in 0.0f32..0.9) {
            let out = apply_deadzone(v, dz);
            prop_assert!((-1.0..=1.0).contains(&out));
        }

        #[test]
        fn prop_dead_band_is_zero(dz in 0.01f32..0.9, t in 0.0f32..1.0) {
            let v = dz * t;
            prop_assume!(v < dz);
            prop_assert_eq!(apply_deadzone(v, dz), 0.0);
            prop_assert_eq!(apply_deadzone(-v, dz), 0.0);
        }
    }
}
