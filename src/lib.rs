//! Gamepad monitor: polls one controller, normalizes its input into a
//! [`controller::GamepadState`] every tick and reports button edges and
//! connection changes.

pub mod config;
pub mod controller;
pub mod monitor;
