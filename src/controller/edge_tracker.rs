use super::gamepad_state::{ButtonType, GamepadState};
use super::input_poller::ControllerInfo;

/// Whether a device backs the current frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    NoDevice,
    Connected,
}

impl ConnectionState {
    fn of(state: &GamepadState) -> Self {
        if state.connected {
            ConnectionState::Connected
        } else {
            ConnectionState::NoDevice
        }
    }
}

// Direction of a button transition between two frames
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonEdge {
    Triggered,
    Released,
}

/// Discrete event derived from one frame transition
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    Connected {
        controller: Option<ControllerInfo>,
        frame: u64,
    },
    Disconnected {
        frame: u64,
    },
    Button {
        button: ButtonType,
        edge: ButtonEdge,
        frame: u64,
    },
}

/// Current and previous [`GamepadState`], nothing older.
///
/// Both start as the disconnected default. The pair is `Copy` so it can be
/// published to other tasks as one unit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EdgeTracker {
    current: GamepadState,
    previous: GamepadState,
}

impl EdgeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// previous := current, current := `next`
    pub fn advance(&mut self, next: GamepadState) {
        self.previous = self.current;
        self.current = next;
    }

    pub fn current(&self) -> &GamepadState {
        &self.current
    }

    pub fn previous(&self) -> &GamepadState {
        &self.previous
    }

    pub fn connection_state(&self) -> ConnectionState {
        ConnectionState::of(&self.current)
    }

    /// The new connection state if it changed with the last frame.
    pub fn connection_transition(&self) -> Option<ConnectionState> {
        let now = ConnectionState::of(&self.current);
        (now != ConnectionState::of(&self.previous)).then_some(now)
    }

    pub fn is_pressed(&self, button: ButtonType) -> bool {
        self.current.button(button)
    }

    pub fn is_triggered(&self, button: ButtonType) -> bool {
        self.current.button(button) && !self.previous.button(button)
    }

    pub fn is_released(&self, button: ButtonType) -> bool {
        !self.current.button(button) && self.previous.button(button)
    }

    pub fn edge(&self, button: ButtonType) -> Option<ButtonEdge> {
        if self.is_triggered(button) {
            Some(ButtonEdge::Triggered)
        } else if self.is_released(button) {
            Some(ButtonEdge::Released)
        } else {
            None
        }
    }

    pub fn triggered(&self) -> impl Iterator<Item = ButtonType> + '_ {
        ButtonType::ALL
            .iter()
            .copied()
            .filter(move |button| self.is_triggered(*button))
    }

    pub fn released(&self) -> impl Iterator<Item = ButtonType> + '_ {
        ButtonType::ALL
            .iter()
            .copied()
            .filter(move |button| self.is_released(*button))
    }

    /// Events for the last transition.
    ///
    /// A connect is reported before the buttons pressed with it, a disconnect
    /// after the releases it caused.
    pub fn events(&self, frame: u64, controller: Option<&ControllerInfo>) -> Vec<InputEvent> {
        let mut events = Vec::new();
        let transition = self.connection_transition();

        if transition == Some(ConnectionState::Connected) {
            events.push(InputEvent::Connected {
                controller: controller.cloned(),
                frame,
            });
        }

        for button in ButtonType::ALL {
            if let Some(edge) = self.edge(button) {
                events.push(InputEvent::Button {
                    button,
                    edge,
                    frame,
                });
            }
        }

        if transition == Some(ConnectionState::NoDevice) {
            events.push(InputEvent::Disconnected { frame });
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_with(buttons: &[ButtonType]) -> GamepadState {
        let mut state = GamepadState {
            connected: true,
            ..GamepadState::default()
        };
        for button in buttons {
            state.buttons.set(*button, true);
        }
        state
    }

    #[test]
    fn test_starts_disconnected() {
        let tracker = EdgeTracker::new();

        assert_eq!(tracker.connection_state(), ConnectionState::NoDevice);
        assert_eq!(tracker.connection_transition(), None);
        assert_eq!(*tracker.current(), GamepadState::disconnected());
        assert_eq!(*tracker.previous(), GamepadState::disconnected());
    }

    #[test]
    fn test_advance_shifts_current_into_previous() {
        let mut tracker = EdgeTracker::new();
        let first = connected_with(&[ButtonType::Start]);
        let second = connected_with(&[]);

        tracker.advance(first);
        tracker.advance(second);

        assert_eq!(*tracker.previous(), first);
        assert_eq!(*tracker.current(), second);
    }

    #[test]
    fn test_edges_per_button() {
        let mut tracker = EdgeTracker::new();
        tracker.advance(connected_with(&[ButtonType::FaceUp, ButtonType::DPadDown]));
        tracker.advance(connected_with(&[ButtonType::FaceUp, ButtonType::Select]));

        assert_eq!(tracker.edge(ButtonType::FaceUp), None);
        assert_eq!(tracker.edge(ButtonType::Select), Some(ButtonEdge::Triggered));
        assert_eq!(tracker.edge(ButtonType::DPadDown), Some(ButtonEdge::Released));
        assert_eq!(tracker.triggered().collect::<Vec<_>>(), vec![ButtonType::Select]);
        assert_eq!(tracker.released().collect::<Vec<_>>(), vec![ButtonType::DPadDown]);
    }

    #[test]
    fn test_connection_transitions() {
        let mut tracker = EdgeTracker::new();

        tracker.advance(connected_with(&[]));
        assert_eq!(tracker.connection_transition(), Some(ConnectionState::Connected));

        tracker.advance(connected_with(&[]));
        assert_eq!(tracker.connection_transition(), None);

        tracker.advance(GamepadState::disconnected());
        assert_eq!(tracker.connection_transition(), Some(ConnectionState::NoDevice));
    }

    #[test]
    fn test_event_order_on_connect_and_disconnect() {
        let mut tracker = EdgeTracker::new();

        tracker.advance(connected_with(&[ButtonType::Guide]));
        assert_eq!(
            tracker.events(1, None),
            vec![
                InputEvent::Connected {
                    controller: None,
                    frame: 1
                },
                InputEvent::Button {
                    button: ButtonType::Guide,
                    edge: ButtonEdge::Triggered,
                    frame: 1
                },
            ]
        );

        tracker.advance(GamepadState::disconnected());
        assert_eq!(
            tracker.events(2, None),
            vec![
                InputEvent::Button {
                    button: ButtonType::Guide,
                    edge: ButtonEdge::Released,
                    frame: 2
                },
                InputEvent::Disconnected { frame: 2 },
            ]
        );
    }

    #[test]
    fn test_steady_state_has_no_events() {
        let mut tracker = EdgeTracker::new();
        tracker.advance(connected_with(&[ButtonType::ShoulderRight]));
        tracker.advance(connected_with(&[ButtonType::ShoulderRight]));

        assert!(tracker.events(2, None).is_empty());
        assert!(tracker.is_pressed(ButtonType::ShoulderRight));
    }
}
