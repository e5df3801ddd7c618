//! Platform abstraction layer
//!
//! Input reaches the simulation as one `TickInput` per tick, pulled from an
//! `InputSource`. Backends that see raw key presses feed a `KeyboardInput`;
//! `DemoInput` plays the game by itself; `ScriptedInput` replays a queue.

use std::collections::{HashSet, VecDeque};

use crate::Result;
use crate::settings::KeyMap;
use crate::sim::{Game, GameState, InputEvent, KeyState, TickInput};
use crate::{angle_of, normalize_degrees, toroidal_delta};

/// Input collaborator; polled once per simulation tick
pub trait InputSource {
    fn poll(&mut self, game: &Game) -> Result<TickInput>;
}

/// Key-name driven input. Held keys become the `KeyState` through the
/// keymap; presses of the command keys queue discrete events.
#[derive(Debug, Clone, Default)]
pub struct KeyboardInput {
    keymap: KeyMap,
    held: HashSet<String>,
    pending: Vec<InputEvent>,
}

impl KeyboardInput {
    pub fn new(keymap: KeyMap) -> Self {
        Self {
            keymap,
            ..Default::default()
        }
    }

    pub fn press(&mut self, key: &str) {
        if let Some(event) = command_for_key(key) {
            self.pending.push(event);
        }
        self.held.insert(key.to_string());
    }

    pub fn release(&mut self, key: &str) {
        self.held.remove(key);
    }

    /// Text typed at the name entry screen
    pub fn type_char(&mut self, c: char) {
        self.pending.push(InputEvent::Char(c));
    }
}

/// Fixed command keys
fn command_for_key(key: &str) -> Option<InputEvent> {
    match key {
        "P" | "Pause" => Some(InputEvent::PauseToggle),
        "Escape" => Some(InputEvent::Quit),
        "Return" => Some(InputEvent::Confirm),
        "1" => Some(InputEvent::Advance),
        "BackSpace" => Some(InputEvent::Backspace),
        "F1" => Some(InputEvent::ToggleBoundingBoxes),
        "F2" => Some(InputEvent::ToggleSlowMotion),
        "F3" => Some(InputEvent::SkipLevel),
        _ => None,
    }
}

impl InputSource for KeyboardInput {
    fn poll(&mut self, _game: &Game) -> Result<TickInput> {
        Ok(TickInput {
            keys: self.keymap.key_state(|name| self.held.contains(name)),
            events: std::mem::take(&mut self.pending),
        })
    }
}

/// Replays a fixed list of inputs, then idles
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    queue: VecDeque<TickInput>,
}

impl ScriptedInput {
    pub fn new(inputs: impl IntoIterator<Item = TickInput>) -> Self {
        Self {
            queue: inputs.into_iter().collect(),
        }
    }

    pub fn push(&mut self, input: TickInput) {
        self.queue.push_back(input);
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, _game: &Game) -> Result<TickInput> {
        Ok(self.queue.pop_front().unwrap_or_default())
    }
}

/// Autopilot: starts games, turns toward the nearest asteroid and shoots,
/// signs the high score table, and quits after `max_ticks`
#[derive(Debug, Clone)]
pub struct DemoInput {
    max_ticks: u64,
    polls: u64,
}

impl DemoInput {
    /// Degrees off target at which the autopilot opens fire
    const FIRE_CONE: f32 = 8.0;
    /// Ticks to linger on an attract screen before starting
    const START_DELAY: u64 = 90;

    pub fn new(max_ticks: u64) -> Self {
        Self {
            max_ticks,
            polls: 0,
        }
    }

    fn steer(game: &Game) -> KeyState {
        let Some(ship) = game.player_ship().filter(|s| s.is_active()) else {
            return KeyState::default();
        };
        let target = game
            .asteroids
            .values()
            .map(|a| toroidal_delta(ship.pos, a.pos))
            .min_by(|a, b| {
                a.length_squared()
                    .partial_cmp(&b.length_squared())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        let Some(delta) = target else {
            return KeyState::default();
        };

        // Signed error in (-180, 180]
        let mut error = normalize_degrees(angle_of(delta) - ship.angle);
        if error > 180.0 {
            error -= 360.0;
        }
        KeyState {
            left: error > 2.0,
            right: error < -2.0,
            thrust: delta.length() > 40.0,
            fire: error.abs() < Self::FIRE_CONE,
            bomb: delta.length() < 6.0,
        }
    }
}

impl InputSource for DemoInput {
    fn poll(&mut self, game: &Game) -> Result<TickInput> {
        self.polls += 1;
        if self.polls >= self.max_ticks {
            return Ok(TickInput::with_event(InputEvent::Quit));
        }

        let input = match game.state {
            GameState::NotStarted | GameState::DisplayHighScores
                if game.time_in_state() >= Self::START_DELAY =>
            {
                TickInput::with_event(InputEvent::Advance)
            }
            GameState::Playing => TickInput {
                keys: Self::steer(game),
                events: Vec::new(),
            },
            GameState::EnterHighScore => TickInput {
                keys: KeyState::default(),
                events: "DEMO"
                    .chars()
                    .map(InputEvent::Char)
                    .chain([InputEvent::Confirm])
                    .collect(),
            },
            _ => TickInput::default(),
        };
        Ok(input)
    }
}
