//! Game settings and preferences
//!
//! Read once at startup from a JSON file. Every field has a default, so a
//! partial file (or none at all) is fine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::sim::KeyState;

/// Key names bound to each ship control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMap {
    pub left: String,
    pub right: String,
    pub thrust: String,
    pub fire: String,
    pub bomb: String,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            left: "Left".to_string(),
            right: "Right".to_string(),
            thrust: "Up".to_string(),
            fire: "Space".to_string(),
            bomb: "B".to_string(),
        }
    }
}

impl KeyMap {
    /// Build the held-control state from a "is this key down" query
    pub fn key_state(&self, is_held: impl Fn(&str) -> bool) -> KeyState {
        KeyState {
            left: is_held(&self.left),
            right: is_held(&self.right),
            thrust: is_held(&self.thrust),
            fire: is_held(&self.fire),
            bomb: is_held(&self.bomb),
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Display ===
    pub h_res: u32,
    pub v_res: u32,
    pub fullscreen: bool,
    pub bitdepth: u32,

    // === Controls ===
    pub keymap: KeyMap,

    // === Debug ===
    /// Draw collision circles
    pub show_bounding_boxes: bool,
    /// Fixed RNG seed; `None` seeds each session from the clock
    pub seed: Option<u64>,

    // === Storage ===
    pub high_score_path: PathBuf,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            h_res: 800,
            v_res: 600,
            fullscreen: false,
            bitdepth: 32,

            keymap: KeyMap::default(),

            show_bounding_boxes: false,
            seed: None,

            high_score_path: PathBuf::from("asterad_scores.json"),

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. A missing file gives the defaults;
    /// a malformed one is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => {
                let settings = serde_json::from_str(&json)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}
