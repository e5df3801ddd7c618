//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by pool slot)
//! - No rendering or platform dependencies

pub mod arena;
pub mod collision;
pub mod physics;
pub mod session;
pub mod spawn;
pub mod state;
pub mod tick;

pub use arena::{Arena, Handle};
pub use collision::collides;
pub use physics::{advance, rotate};
pub use session::{asteroid_count_for_level, asteroid_speed_mult, calculate_hit_score, lives_earned};
pub use state::{
    Asteroid, AsteroidSize, Bullet, BulletOwner, Game, GameEvent, GameState, Particle,
    ParticleKind, Ship, ShipStatus, Ufo, UfoKind,
};
pub use tick::{InputEvent, KeyState, TickInput, tick};
