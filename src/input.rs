//! Keyboard state tracking and its translation into pipeline [`Command`]s.
//!
//! # Bindings
//!
//! | Keys            | Command                          | Trigger  |
//! |-----------------|----------------------------------|----------|
//! | `D` / `A`       | move along +X / -X               | held     |
//! | `W` / `S`       | move along +Y / -Y               | held     |
//! | `Q` / `E`       | move along +Z / -Z               | held     |
//! | `Z` / `X` / `C` | pitch / yaw / roll (Shift: back) | held     |
//! | `=` / `-`       | zoom in / out (also mouse wheel) | held     |
//! | `M`             | cycle draw mode                  | pressed  |
//! | `Escape`        | quit                             | pressed  |

use std::collections::HashSet;

use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::pipeline::{Axis, Command, Direction};

const MOVE_KEYS: [(KeyCode, Axis, Direction); 6] = [
    (KeyCode::KeyD, Axis::X, Direction::Positive),
    (KeyCode::KeyA, Axis::X, Direction::Negative),
    (KeyCode::KeyW, Axis::Y, Direction::Positive),
    (KeyCode::KeyS, Axis::Y, Direction::Negative),
    (KeyCode::KeyQ, Axis::Z, Direction::Positive),
    (KeyCode::KeyE, Axis::Z, Direction::Negative),
];

const ROTATE_KEYS: [(KeyCode, Axis); 3] = [
    (KeyCode::KeyZ, Axis::X),
    (KeyCode::KeyX, Axis::Y),
    (KeyCode::KeyC, Axis::Z),
];

/// Per-frame keyboard state.
///
/// Feed it window events with [`handle_event`](Self::handle_event), read the
/// frame's commands with [`commands`](Self::commands), then call
/// [`begin_frame`](Self::begin_frame) to forget one-shot presses.
#[derive(Debug, Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    scroll: f32,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.scroll = 0.0;
    }

    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.key_event(key, event.state);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
            }
            WindowEvent::Focused(false) => self.keys_down.clear(),
            _ => {}
        }
    }

    /// Records a key transition. Auto-repeat presses are not new presses.
    pub fn key_event(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.keys_down.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            ElementState::Released => {
                self.keys_down.remove(&key);
            }
        }
    }

    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Commands for this frame, in a fixed order: quit, draw mode, moves,
    /// rotations, zoom.
    pub fn commands(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.key_pressed(KeyCode::Escape) {
            commands.push(Command::Quit);
        }
        if self.key_pressed(KeyCode::KeyM) {
            commands.push(Command::CycleDrawMode);
        }

        for (key, axis, direction) in MOVE_KEYS {
            if self.key_down(key) {
                commands.push(Command::Move { axis, direction });
            }
        }

        let shift = self.key_down(KeyCode::ShiftLeft) || self.key_down(KeyCode::ShiftRight);
        let direction = if shift {
            Direction::Negative
        } else {
            Direction::Positive
        };
        for (key, axis) in ROTATE_KEYS {
            if self.key_down(key) {
                commands.push(Command::Rotate { axis, direction });
            }
        }

        if self.key_down(KeyCode::Equal) || self.scroll > 0.0 {
            commands.push(Command::Zoom(Direction::Positive));
        }
        if self.key_down(KeyCode::Minus) || self.scroll < 0.0 {
            commands.push(Command::Zoom(Direction::Negative));
        }
        commands
    }
}
