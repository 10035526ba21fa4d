use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use std::fmt;
use tracing::{debug, error, info, warn};

use super::gamepad_state::{ButtonSet, ButtonType};
use super::normalizer::{RawFrame, RawSticks, RawTriggers, AXIS_MAX};

/// Anything that can hand the tick loop one raw frame per call.
pub trait FrameSource {
    /// Reads the next frame. Must not block for longer than one tick.
    fn poll_frame(&mut self) -> RawFrame;

    /// Description of the device behind the frames, if one is attached.
    fn controller_info(&self) -> Option<ControllerInfo>;
}

// Poller errors
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("Failed to initialize input backend: {0}")]
    Initialization(String),
}

/// Controller family, derived from USB vendor and product ids
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControllerKind {
    Unknown,
    Xbox360,
    XboxOne,
    PS4,
    PS5,
    SwitchPro,
    JoyConLeft,
    JoyConRight,
    JoyConPair,
    Other,
}

const VENDOR_MICROSOFT: u16 = 0x045e;
const VENDOR_SONY: u16 = 0x054c;
const VENDOR_NINTENDO: u16 = 0x057e;

impl ControllerKind {
    pub fn classify(vendor_id: Option<u16>, product_id: Option<u16>) -> Self {
        let Some(vendor) = vendor_id else {
            return ControllerKind::Unknown;
        };
        let product = product_id.unwrap_or_default();

        match (vendor, product) {
            (VENDOR_MICROSOFT, 0x028e | 0x028f | 0x0291 | 0x0719) => ControllerKind::Xbox360,
            (VENDOR_MICROSOFT, _) => ControllerKind::XboxOne,
            (VENDOR_SONY, 0x05c4 | 0x09cc | 0x0ba0) => ControllerKind::PS4,
            (VENDOR_SONY, 0x0ce6 | 0x0df2) => ControllerKind::PS5,
            (VENDOR_NINTENDO, 0x2009) => ControllerKind::SwitchPro,
            (VENDOR_NINTENDO, 0x2006) => ControllerKind::JoyConLeft,
            (VENDOR_NINTENDO, 0x2007) => ControllerKind::JoyConRight,
            (VENDOR_NINTENDO, 0x2008) => ControllerKind::JoyConPair,
            _ => ControllerKind::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ControllerKind::Xbox360 => "Xbox360",
            ControllerKind::XboxOne => "XboxOne",
            ControllerKind::PS4 => "PS4",
            ControllerKind::PS5 => "PS5",
            ControllerKind::SwitchPro => "Switch",
            ControllerKind::JoyConLeft => "JoyL",
            ControllerKind::JoyConRight => "JoyR",
            ControllerKind::JoyConPair => "JoyPair",
            ControllerKind::Unknown | ControllerKind::Other => "Other",
        }
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Name and family of the active gamepad
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerInfo {
    pub name: String,
    pub kind: ControllerKind,
}

impl ControllerInfo {
    fn from_gamepad(gamepad: &Gamepad<'_>) -> Self {
        let name = gamepad.name();
        Self {
            name: if name.is_empty() {
                "Unknown".to_string()
            } else {
                name.to_string()
            },
            kind: ControllerKind::classify(gamepad.vendor_id(), gamepad.product_id()),
        }
    }
}

impl fmt::Display for ControllerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.kind)
    }
}

// Define poller states using statum's state macro
#[state]
#[derive(Debug, Clone)]
pub enum PollingState {
    Initializing,
    Polling,
}

#[machine]
#[derive(Debug)]
pub struct InputPoller<S: PollingState> {
    // Gilrs context
    gilrs: Gilrs,

    // Gamepad the frames are read from
    active_gamepad: Option<GamepadId>,

    // Cached description of the active gamepad
    controller: Option<ControllerInfo>,
}

impl<S: PollingState> InputPoller<S> {
    pub fn active_gamepad(&self) -> Option<GamepadId> {
        self.active_gamepad
    }

    fn activate(&mut self, id: GamepadId) {
        match self.gilrs.connected_gamepad(id) {
            Some(gamepad) => {
                let info = ControllerInfo::from_gamepad(&gamepad);
                info!("Selected gamepad: {} ({})", info, id);
                debug!("Power info for {}: {:?}", id, gamepad.power_info());
                self.active_gamepad = Some(id);
                self.controller = Some(info);
            }
            None => warn!("Gamepad {} vanished before it could be opened", id),
        }
    }
}

impl InputPoller<Initializing> {
    pub fn create() -> Result<Self, PollerError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(PollerError::Initialization(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, None, None))
    }

    // Pick the first connected gamepad and transition to Polling state
    pub fn initialize(mut self) -> InputPoller<Polling> {
        let gamepads: Vec<(GamepadId, String)> = self
            .gilrs
            .gamepads()
            .map(|(id, gamepad)| (id, gamepad.name().to_string()))
            .collect();

        if gamepads.is_empty() {
            warn!("No gamepad connected, waiting for one to appear");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (idx, (id, name)) in gamepads.iter().enumerate() {
                let uuid = self.gilrs.gamepad(*id).uuid();
                info!("  [{}] ID: {}, Name: {}, UUID: {:?}", idx, id, name, uuid);
            }
            self.activate(gamepads[0].0);
        }

        info!("Input poller initialized, transitioning to Polling state");
        self.transition()
    }
}

impl InputPoller<Polling> {
    fn handle_event(&mut self, id: GamepadId, event: EventType) {
        match event {
            EventType::Connected => {
                info!("Gamepad {} connected", id);
                if self.active_gamepad.is_none() {
                    self.activate(id);
                } else {
                    debug!("Keeping active gamepad, ignoring {}", id);
                }
            }
            EventType::Disconnected => {
                if self.active_gamepad != Some(id) {
                    debug!("Inactive gamepad {} disconnected", id);
                    return;
                }

                warn!("Active gamepad {} disconnected", id);
                self.active_gamepad = None;
                self.controller = None;

                let fallback = self
                    .gilrs
                    .gamepads()
                    .map(|(other, _)| other)
                    .find(|other| *other != id);
                if let Some(other) = fallback {
                    self.activate(other);
                }
            }
            _ => {}
        }
    }
}

impl FrameSource for InputPoller<Polling> {
    fn poll_frame(&mut self) -> RawFrame {
        // Gilrs only refreshes its cached gamepad state while events are drained
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            self.handle_event(id, event);
        }

        let Some(id) = self.active_gamepad else {
            return RawFrame::disconnected();
        };

        match self.gilrs.connected_gamepad(id) {
            Some(gamepad) => read_frame(&gamepad),
            None => {
                debug!("Active gamepad {} is no longer connected", id);
                RawFrame::disconnected()
            }
        }
    }

    fn controller_info(&self) -> Option<ControllerInfo> {
        self.controller.clone()
    }
}

fn read_frame(gamepad: &Gamepad<'_>) -> RawFrame {
    let mut buttons = ButtonSet::new();
    for button in ButtonType::ALL {
        if let Some(gilrs_button) = gilrs_button(button) {
            buttons.set(button, gamepad.is_pressed(gilrs_button));
        }
    }

    RawFrame {
        device_present: true,
        buttons,
        sticks: RawSticks {
            left_x: axis_to_raw(gamepad.value(Axis::LeftStickX)),
            left_y: axis_to_raw(gamepad.value(Axis::LeftStickY)),
            right_x: axis_to_raw(gamepad.value(Axis::RightStickX)),
            right_y: axis_to_raw(gamepad.value(Axis::RightStickY)),
        },
        triggers: RawTriggers {
            left: axis_to_raw(trigger_value(gamepad, Button::LeftTrigger2, Axis::LeftZ)),
            right: axis_to_raw(trigger_value(gamepad, Button::RightTrigger2, Axis::RightZ)),
        },
    }
}

// Analog triggers show up either as button values or as Z axes depending on the mapping
fn trigger_value(gamepad: &Gamepad<'_>, button: Button, axis: Axis) -> f32 {
    let from_button = gamepad
        .button_data(button)
        .map(|data| data.value())
        .unwrap_or(0.0);
    from_button.max(gamepad.value(axis))
}

/// Converts a gilrs axis value in `[-1.0, 1.0]` to the native integer scale.
pub fn axis_to_raw(value: f32) -> i32 {
    (value * AXIS_MAX).round() as i32
}

/// Gilrs button read for each [`ButtonType`], `None` for trigger-derived flags.
pub fn gilrs_button(button: ButtonType) -> Option<Button> {
    match button {
        ButtonType::DPadUp => Some(Button::DPadUp),
        ButtonType::DPadDown => Some(Button::DPadDown),
        ButtonType::DPadLeft => Some(Button::DPadLeft),
        ButtonType::DPadRight => Some(Button::DPadRight),
        ButtonType::FaceDown => Some(Button::South),
        ButtonType::FaceRight => Some(Button::East),
        ButtonType::FaceLeft => Some(Button::West),
        ButtonType::FaceUp => Some(Button::North),
        ButtonType::ShoulderLeft => Some(Button::LeftTrigger),
        ButtonType::ShoulderRight => Some(Button::RightTrigger),
        ButtonType::StickClickLeft => Some(Button::LeftThumb),
        ButtonType::StickClickRight => Some(Button::RightThumb),
        ButtonType::Start => Some(Button::Start),
        ButtonType::Select => Some(Button::Select),
        ButtonType::Guide => Some(Button::Mode),
        ButtonType::Misc => Some(Button::C),
        ButtonType::TriggerLeft | ButtonType::TriggerRight => None,
    }
}
