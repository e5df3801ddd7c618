//! Game session and entity types
//!
//! `Game` is the whole session context: the state machine, timers, entity
//! pools, score table and pending events. Subsystems take it by `&mut`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::arena::{Arena, Handle};
use crate::consts::*;
use crate::highscores::HighScores;
use crate::settings::Settings;

/// Which screen / phase the game is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Title screen, game has not started
    NotStarted,
    /// Showing the high-score table between games
    DisplayHighScores,
    /// Game in progress
    Playing,
    /// All ships gone
    GameOver,
    /// Level cleared, next one is about to start
    LevelFinished,
    /// Player posted a high score and is typing a name
    EnterHighScore,
}

/// Discrete things that happened during a tick (audio triggers)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    ShipFire,
    UfoFire,
    Thrust,
    ExplosionSmall,
    ExplosionMedium,
    ExplosionLarge,
    UfoAppear,
    ExtraLife,
    GameOver,
}

/// Asteroid size tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsteroidSize {
    Large,
    Medium,
    Small,
}

impl AsteroidSize {
    pub fn radius(self) -> f32 {
        match self {
            AsteroidSize::Large => 8.0,
            AsteroidSize::Medium => 4.5,
            AsteroidSize::Small => 2.5,
        }
    }

    /// Base drift speed before the level multiplier
    pub fn base_speed(self) -> f32 {
        match self {
            AsteroidSize::Large => 6.0,
            AsteroidSize::Medium => 10.0,
            AsteroidSize::Small => 15.0,
        }
    }

    /// Points for a hit, before range and level bonuses
    pub fn base_score(self) -> u64 {
        match self {
            AsteroidSize::Large => 1_000,
            AsteroidSize::Medium => 2_500,
            AsteroidSize::Small => 5_000,
        }
    }

    /// Tier produced when this asteroid breaks
    pub fn child(self) -> Option<AsteroidSize> {
        match self {
            AsteroidSize::Large => Some(AsteroidSize::Medium),
            AsteroidSize::Medium => Some(AsteroidSize::Small),
            AsteroidSize::Small => None,
        }
    }

    pub fn explosion(self) -> GameEvent {
        match self {
            AsteroidSize::Large => GameEvent::ExplosionLarge,
            AsteroidSize::Medium => GameEvent::ExplosionMedium,
            AsteroidSize::Small => GameEvent::ExplosionSmall,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Asteroid {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Degrees, [0, 360)
    pub angle: f32,
    /// Degrees per second
    pub spin: f32,
    pub size: AsteroidSize,
    /// Outline seed for the renderer
    pub shape_seed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipStatus {
    Active,
    /// Blown up, waiting to respawn
    Exploded { respawn_in: u32 },
}

/// The player's ship. Lives in the pool for the whole game, so score
/// handles captured by bullets stay valid across deaths.
#[derive(Debug, Clone)]
pub struct Ship {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub thrusting: bool,
    pub lives: u32,
    pub score: u64,
    pub invulnerable_ticks: u32,
    pub fire_cooldown: u32,
    pub bombs: u32,
    pub status: ShipStatus,
}

impl Ship {
    pub fn new() -> Self {
        Self {
            pos: Vec2::new(X_AXIS / 2.0, Y_AXIS / 2.0),
            vel: Vec2::ZERO,
            angle: 90.0,
            thrusting: false,
            lives: STARTING_LIVES,
            score: 0,
            invulnerable_ticks: 0,
            fire_cooldown: 0,
            bombs: BOMBS_PER_LEVEL,
            status: ShipStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ShipStatus::Active
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ticks > 0
    }

    /// Active and outside the post-respawn grace window
    pub fn is_vulnerable(&self) -> bool {
        self.is_active() && !self.is_invulnerable()
    }
}

impl Default for Ship {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UfoKind {
    /// Big, slow to die, sprays bullets
    Large,
    /// Small, fragile, aims at the ship
    Small,
}

impl UfoKind {
    pub fn radius(self) -> f32 {
        match self {
            UfoKind::Large => UFO_LARGE_RADIUS,
            UfoKind::Small => UFO_SMALL_RADIUS,
        }
    }

    pub fn hit_points(self) -> u32 {
        match self {
            UfoKind::Large => 2,
            UfoKind::Small => 1,
        }
    }

    pub fn score(self) -> u64 {
        match self {
            UfoKind::Large => SCORE_UFO_LARGE,
            UfoKind::Small => SCORE_UFO_SMALL,
        }
    }

    /// Maximum aim error in degrees
    pub fn aim_spread(self) -> f32 {
        match self {
            UfoKind::Large => 45.0,
            UfoKind::Small => 6.0,
        }
    }

    /// Ticks between shots
    pub fn fire_interval(self) -> u32 {
        match self {
            UfoKind::Large => 75,
            UfoKind::Small => 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ufo {
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: UfoKind,
    pub hp: u32,
    pub fire_timer: u32,
    /// Ticks until the next vertical course change
    pub course_timer: u32,
    /// Horizontal distance left before the UFO leaves
    pub travel_left: f32,
}

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletOwner {
    /// Fired by the player; score goes to this ship
    Ship(Handle<Ship>),
    /// Fired by a UFO; never scores, never hurts UFOs
    Ufo(Handle<Ufo>),
}

impl BulletOwner {
    pub fn is_ship(&self) -> bool {
        matches!(self, BulletOwner::Ship(_))
    }
}

#[derive(Debug, Clone)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Distance left before the bullet dissipates
    pub range: f32,
    /// Range at fire time, for long-shot scoring
    pub max_range: f32,
    pub owner: BulletOwner,
}

impl Bullet {
    /// Fraction of the range already travelled, 0..=1
    pub fn travelled_fraction(&self) -> f32 {
        if self.max_range <= 0.0 {
            return 0.0;
        }
        (1.0 - self.range / self.max_range).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    /// Spinning hull fragment from a destroyed ship or UFO
    Debris,
    /// Short-lived impact spark
    Spark,
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub spin: f32,
    pub life: u32,
    pub kind: ParticleKind,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct Game {
    pub state: GameState,
    pub quit: bool,
    pub paused: bool,
    /// Simulation ticks since startup (frozen while paused)
    pub ticks: u64,
    /// Tick at which `state` was entered
    pub state_start_time: u64,
    /// Ticks until the next UFO
    pub ufo_timer: u32,
    /// Ticks until `message` disappears
    pub message_timer: u32,
    pub message: Option<String>,
    pub show_bounding_boxes: bool,
    /// Global slow-motion factor, 0..=1
    pub time_mult: f32,
    pub level: u32,
    pub settings: Settings,
    pub high_scores: HighScores,
    /// Table changed since last save
    pub high_scores_dirty: bool,
    /// Name being typed in `EnterHighScore`
    pub name_entry: String,
    pub player: Option<Handle<Ship>>,
    pub ships: Arena<Ship>,
    pub asteroids: Arena<Asteroid>,
    pub bullets: Arena<Bullet>,
    pub ufos: Arena<Ufo>,
    pub particles: Arena<Particle>,
    /// Split children waiting for the post-collision spawn
    pub(crate) pending_asteroids: Vec<Asteroid>,
    /// Events raised since the last drain
    pub events: Vec<GameEvent>,
    seed: u64,
    rng: Pcg32,
}

/// Seed for sessions without a configured one: wall clock nanoseconds,
/// mixed with a per-process counter so sessions created in the same instant
/// still differ
pub fn clock_seed() -> u64 {
    static SESSIONS: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5eed_a57e);
    let n = SESSIONS.fetch_add(1, Ordering::Relaxed);
    nanos ^ n.wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

impl Game {
    /// Create a session at the title screen. Without a configured seed the
    /// session is seeded from the clock.
    pub fn new(settings: Settings, high_scores: HighScores) -> Self {
        let seed = settings.seed.unwrap_or_else(clock_seed);
        let mut game = Self {
            state: GameState::NotStarted,
            quit: false,
            paused: false,
            ticks: 0,
            state_start_time: 0,
            ufo_timer: 0,
            message_timer: 0,
            message: None,
            show_bounding_boxes: settings.show_bounding_boxes,
            time_mult: 1.0,
            level: 1,
            settings,
            high_scores,
            high_scores_dirty: false,
            name_entry: String::new(),
            player: None,
            ships: Arena::with_capacity(MAX_SHIPS),
            asteroids: Arena::with_capacity(MAX_ASTEROIDS),
            bullets: Arena::with_capacity(MAX_BULLETS),
            ufos: Arena::with_capacity(MAX_UFOS),
            particles: Arena::with_capacity(MAX_PARTICLES),
            pending_asteroids: Vec::new(),
            events: Vec::new(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
        };
        game.build_demo_objects();
        game
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Clear every pool and per-game counter for a fresh game
    pub fn reset(&mut self) {
        self.ships.clear();
        self.asteroids.clear();
        self.bullets.clear();
        self.ufos.clear();
        self.particles.clear();
        self.pending_asteroids.clear();
        self.player = None;
        self.level = 1;
        self.paused = false;
        self.time_mult = 1.0;
        self.message = None;
        self.message_timer = 0;
        self.name_entry.clear();
        self.ufo_timer = 0;
    }

    /// Switch state and stamp the entry tick
    pub fn set_game_state(&mut self, new_state: GameState) {
        if self.state != new_state {
            log::info!("Game state {:?} -> {:?}", self.state, new_state);
        }
        self.state = new_state;
        self.state_start_time = self.ticks;
    }

    /// Ticks spent in the current state
    pub fn time_in_state(&self) -> u64 {
        self.ticks.saturating_sub(self.state_start_time)
    }

    /// Show a transient on-screen message
    pub fn display_message(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::debug!("Message: {}", text);
        self.message = Some(text);
        self.message_timer = MESSAGE_LIFE;
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn player_ship(&self) -> Option<&Ship> {
        self.player.and_then(|h| self.ships.get(h))
    }

    pub fn player_ship_mut(&mut self) -> Option<&mut Ship> {
        self.player.and_then(|h| self.ships.get_mut(h))
    }

    pub fn score(&self) -> u64 {
        self.player_ship().map(|s| s.score).unwrap_or(0)
    }

    pub fn lives(&self) -> u32 {
        self.player_ship().map(|s| s.lives).unwrap_or(0)
    }

    pub(crate) fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.random_range(min..max)
    }

    pub(crate) fn random_bool(&mut self, p: f32) -> bool {
        self.rng.random_bool(p.clamp(0.0, 1.0) as f64)
    }

    pub(crate) fn random_u32(&mut self) -> u32 {
        self.rng.random()
    }

    pub(crate) fn random_point(&mut self) -> Vec2 {
        Vec2::new(self.random_range(0.0, X_AXIS), self.random_range(0.0, Y_AXIS))
    }
}
