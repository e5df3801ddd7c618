//! Asterad - wrap-around asteroids arcade game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entity pools, physics, collisions, game state)
//! - `app`: Fixed-timestep loop driving the simulation and its collaborators
//! - `renderer`, `audio`, `platform`: Collaborator contracts (draw, sound, input)
//! - `persistence`: High-score storage
//! - `settings`: Startup configuration and key bindings

pub mod app;
pub mod audio;
pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{Error, Result};
pub use highscores::HighScores;
pub use settings::{KeyMap, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Ticks per simulated second
    pub const TICKS_PER_SECOND: u32 = 60;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World extents (the world is a torus)
    pub const X_AXIS: f32 = 100.0;
    pub const Y_AXIS: f32 = 100.0;

    /// Pool capacities
    pub const MAX_SHIPS: usize = 1;
    pub const MAX_ASTEROIDS: usize = 64;
    pub const MAX_BULLETS: usize = 50;
    pub const MAX_UFOS: usize = 1;
    pub const MAX_PARTICLES: usize = 256;

    /// Level 1 asteroid count, one more per level up to the cap
    pub const STARTING_ASTEROIDS: usize = 3;
    pub const LEVEL_ASTEROID_CAP: usize = 12;
    /// Children spawned when a large or medium asteroid breaks
    pub const ASTEROID_SPLIT_COUNT: usize = 2;

    /// Bullets (units per second / units)
    pub const BULLET_SPEED: f32 = 137.0;
    pub const BULLET_RANGE: f32 = 125.0;
    pub const UFO_BULLET_SPEED: f32 = 90.0;
    pub const UFO_BULLET_RANGE: f32 = 80.0;
    pub const BULLET_RADIUS: f32 = 0.5;

    /// Ship handling
    pub const SHIP_RADIUS: f32 = 2.5;
    pub const SHIP_TURN_RATE: f32 = 270.0; // degrees per second
    pub const SHIP_THRUST: f32 = 60.0; // units per second squared
    pub const SHIP_DAMPING: f32 = 0.99; // velocity kept per tick
    pub const SHIP_MAX_SPEED: f32 = 60.0;
    pub const SHIP_FIRE_COOLDOWN_TICKS: u32 = 8;
    pub const STARTING_LIVES: u32 = 3;
    pub const BOMBS_PER_LEVEL: u32 = 1;
    pub const BOMB_RADIUS: f32 = 20.0;

    /// UFO
    pub const UFO_LARGE_RADIUS: f32 = 4.0;
    pub const UFO_SMALL_RADIUS: f32 = 2.5;
    pub const UFO_SPEED: f32 = 18.0;

    /// Durations in ticks
    pub const RESPAWN_DELAY_TICKS: u32 = 2 * 60;
    pub const INVULNERABLE_TICKS: u32 = 3 * 60;
    pub const DEBRIS_LIFE: u32 = 150;
    pub const SPARK_LIFE: u32 = 30;
    pub const MESSAGE_LIFE: u32 = 105;
    pub const LEVEL_FINISHED_TICKS: u64 = 2 * 60;
    pub const GAME_OVER_TICKS: u64 = 4 * 60;
    pub const TITLE_SCREEN_TICKS: u64 = 10 * 60;
    pub const HIGH_SCORE_SCREEN_TICKS: u64 = 8 * 60;

    /// Extra life earned every N points
    pub const SCORE_1UP: u64 = 150_000;
    /// Points for destroying a UFO by kind
    pub const SCORE_UFO_LARGE: u64 = 20_000;
    pub const SCORE_UFO_SMALL: u64 = 50_000;

    /// Slow-motion multiplier used by the debug toggle
    pub const SLOW_MOTION_MULT: f32 = 0.25;
}

use consts::{X_AXIS, Y_AXIS};

/// Wrap a coordinate into `[0, extent)`
#[inline]
pub fn wrap_axis(value: f32, extent: f32) -> f32 {
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to exactly `extent` for tiny negative inputs
    if wrapped >= extent { 0.0 } else { wrapped }
}

/// Wrap a point into the world rectangle
#[inline]
pub fn wrap_point(p: Vec2) -> Vec2 {
    Vec2::new(wrap_axis(p.x, X_AXIS), wrap_axis(p.y, Y_AXIS))
}

/// Shortest signed offset from `a` to `b` on one toroidal axis
#[inline]
fn shortest_offset(a: f32, b: f32, extent: f32) -> f32 {
    let mut d = (b - a).rem_euclid(extent);
    if d > extent / 2.0 {
        d -= extent;
    }
    d
}

/// Shortest vector from `a` to `b` across the torus
#[inline]
pub fn toroidal_delta(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(
        shortest_offset(a.x, b.x, X_AXIS),
        shortest_offset(a.y, b.y, Y_AXIS),
    )
}

/// Shortest distance between two points on the torus
#[inline]
pub fn toroidal_distance(a: Vec2, b: Vec2) -> f32 {
    toroidal_delta(a, b).length()
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let a = angle.rem_euclid(360.0);
    if a >= 360.0 { 0.0 } else { a }
}

/// Unit direction for a heading in degrees (0 = +x, counter-clockwise)
#[inline]
pub fn heading(angle_deg: f32) -> Vec2 {
    let rad = angle_deg.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

/// Heading in degrees of a direction vector
#[inline]
pub fn angle_of(dir: Vec2) -> f32 {
    normalize_degrees(dir.y.atan2(dir.x).to_degrees())
}
