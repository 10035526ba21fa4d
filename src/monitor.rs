//! Log-based monitor for the controller subsystem.
//!
//! Prints every event as it arrives and a compact state line at a fixed
//! interval until it is cancelled.

use crate::controller::{ButtonEdge, FrameSnapshot, GamepadState, InputEvent};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// Monitor settings
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MonitorSettings {
    /// How often the state summary line is logged
    pub summary_interval_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            summary_interval_ms: 1000,
        }
    }
}

/// One-line description of a state, e.g.
/// `LS(+0.00, +1.00) RS(+0.00, +0.00) LT 0.00 RT 0.75 | buttons: R2 STA`.
pub fn format_summary(state: &GamepadState) -> String {
    if !state.connected {
        return "not connected".to_string();
    }

    let buttons: Vec<&str> = state.buttons.pressed().map(|b| b.label()).collect();
    let buttons = if buttons.is_empty() {
        "-".to_string()
    } else {
        buttons.join(" ")
    };

    format!(
        "LS({:+.2}, {:+.2}) RS({:+.2}, {:+.2}) LT {:.2} RT {:.2} | buttons: {}",
        state.left_stick.x,
        state.left_stick.y,
        state.right_stick.x,
        state.right_stick.y,
        state.left_trigger,
        state.right_trigger,
        buttons
    )
}

fn log_event(event: &InputEvent) {
    match event {
        InputEvent::Connected {
            controller: Some(info),
            frame,
        } => info!("Gamepad connected: {} (frame {})", info, frame),
        InputEvent::Connected {
            controller: None,
            frame,
        } => info!("Gamepad connected (frame {})", frame),
        InputEvent::Disconnected { frame } => warn!("Gamepad disconnected (frame {})", frame),
        InputEvent::Button {
            button,
            edge: ButtonEdge::Triggered,
            frame,
        } => info!("{} pressed (frame {})", button, frame),
        InputEvent::Button {
            button,
            edge: ButtonEdge::Released,
            frame,
        } => info!("{} released (frame {})", button, frame),
    }
}

/// Runs until `cancel` fires or the event stream closes.
pub async fn run(
    mut events: mpsc::Receiver<InputEvent>,
    state: watch::Receiver<FrameSnapshot>,
    settings: MonitorSettings,
    cancel: CancellationToken,
) {
    info!(
        "Monitor started, summary every {} ms",
        settings.summary_interval_ms
    );

    let mut summary = tokio::time::interval(Duration::from_millis(settings.summary_interval_ms));
    summary.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Monitor cancelled");
                break;
            }
            event = events.recv() => match event {
                Some(event) => log_event(&event),
                None => {
                    warn!("Event stream closed, stopping monitor");
                    break;
                }
            },
            _ = summary.tick() => {
                let snapshot = state.borrow().clone();
                info!("[frame {}] {}", snapshot.frame, format_summary(snapshot.state()));
            }
        }
    }

    info!("Monitor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ButtonSet, ButtonType, StickPosition};

    #[test]
    fn test_summary_disconnected() {
        assert_eq!(format_summary(&GamepadState::disconnected()), "not connected");
    }

    #[test]
    fn test_summary_connected_idle() {
        let state = GamepadState {
            connected: true,
            ..GamepadState::default()
        };

        assert_eq!(
            format_summary(&state),
            "LS(+0.00, +0.00) RS(+0.00, +0.00) LT 0.00 RT 0.00 | buttons: -"
        );
    }

    #[test]
    fn test_summary_lists_pressed_buttons_in_order() {
        let state = GamepadState {
            left_stick: StickPosition { x: -0.5, y: 1.0 },
            right_trigger: 0.75,
            buttons: ButtonSet::new()
                .with(ButtonType::Start, true)
                .with(ButtonType::TriggerRight, true),
            connected: true,
            ..GamepadState::default()
        };

        assert_eq!(
            format_summary(&state),
            "LS(-0.50, +1.00) RS(+0.00, +0.00) LT 0.00 RT 0.75 | buttons: R2 STA"
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let (_event_sender, event_receiver) = mpsc::channel(4);
        let (_state_sender, state_receiver) = watch::channel(FrameSnapshot::default());
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(
            event_receiver,
            state_receiver,
            MonitorSettings::default(),
            cancel.clone(),
        ));
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("monitor did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_when_stream_closes() {
        let (event_sender, event_receiver) = mpsc::channel(4);
        let (_state_sender, state_receiver) = watch::channel(FrameSnapshot::default());

        event_sender
            .send(InputEvent::Disconnected { frame: 3 })
            .await
            .unwrap();
        drop(event_sender);

        tokio::time::timeout(
            Duration::from_secs(1),
            run(
                event_receiver,
                state_receiver,
                MonitorSettings::default(),
                CancellationToken::new(),
            ),
        )
        .await
        .expect("monitor did not stop");
    }
}
