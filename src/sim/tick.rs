//! Fixed timestep simulation tick
//!
//! Core game loop: discrete input events first, then the state machine
//! decides which subsystems run this tick.

use super::state::{Game, GameState, Ship, ShipStatus};
use crate::consts::*;

/// Held controls for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    pub left: bool,
    pub right: bool,
    pub thrust: bool,
    pub fire: bool,
    pub bomb: bool,
}

/// Edge-triggered input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    PauseToggle,
    /// Start a game from the attract screens, or skip the game-over wait
    Advance,
    Quit,
    /// Typed character for name entry
    Char(char),
    Backspace,
    Confirm,
    ToggleBoundingBoxes,
    ToggleSlowMotion,
    /// Debug: clear the field
    SkipLevel,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    pub keys: KeyState,
    pub events: Vec<InputEvent>,
}

impl TickInput {
    pub fn with_event(event: InputEvent) -> Self {
        Self {
            keys: KeyState::default(),
            events: vec![event],
        }
    }
}

/// Advance the game by one fixed timestep
pub fn tick(game: &mut Game, input: &TickInput) {
    for event in &input.events {
        game.handle_event(*event);
    }

    // Pause freezes everything, timers included
    if game.quit || game.paused {
        return;
    }

    game.ticks += 1;
    if game.message_timer > 0 {
        game.message_timer -= 1;
        if game.message_timer == 0 {
            game.message = None;
        }
    }

    let dt = game.step_dt();
    match game.state {
        GameState::NotStarted | GameState::DisplayHighScores => {
            game.move_objects(dt);
            game.cycle_attract_screens();
        }
        GameState::Playing => game.tick_playing(&input.keys, dt),
        GameState::LevelFinished => {
            // Ship still flies, nothing fires or collides
            if let Some(ship) = game.player {
                let keys = KeyState {
                    fire: false,
                    bomb: false,
                    ..input.keys
                };
                game.move_ship(ship, &keys, dt);
            }
            game.move_objects(dt);
            if game.time_in_state() >= LEVEL_FINISHED_TICKS {
                game.init_level(game.level + 1);
            }
        }
        GameState::GameOver => {
            game.move_objects(dt);
            if game.time_in_state() >= GAME_OVER_TICKS {
                game.finish_game_over();
            }
        }
        GameState::EnterHighScore => {}
    }
    game.reclaim_pools();
}

impl Game {
    /// Start a new game at level 1
    pub fn start(&mut self) {
        log::info!("New game (seed {:#x})", self.seed());
        self.reset();
        self.player = self.ships.spawn(Ship::new());
        self.init_level(1);
    }

    /// Set up `level`: a fresh asteroid field, bombs refilled, an exploded
    /// ship with lives left put back in play
    pub fn init_level(&mut self, level: u32) {
        self.level = level.max(1);
        self.asteroids.clear();
        self.pending_asteroids.clear();
        self.bullets.clear();
        self.ufos.clear();

        self.set_game_state(GameState::Playing);
        if let Some(ship) = self.player {
            let respawn = match self.ships.get_mut(ship) {
                Some(s) => {
                    s.bombs = BOMBS_PER_LEVEL;
                    matches!(s.status, ShipStatus::Exploded { .. }) && s.lives > 0
                }
                None => false,
            };
            if respawn {
                self.respawn(ship);
            }
        }

        let count = super::session::asteroid_count_for_level(self.level);
        self.spawn_asteroid_field(count);
        self.reset_ufo_timer();
        self.display_message(format!("Level {}", self.level));
        log::info!(
            "Level {} started: {} asteroids, speed x{:.2}",
            self.level,
            count,
            super::session::asteroid_speed_mult(self.level)
        );
    }

    /// End-of-level check, run after collisions each `Playing` tick
    pub fn check_game_status(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        if self.asteroids.is_empty() && self.pending_asteroids.is_empty() {
            log::info!("Level {} cleared", self.level);
            self.set_game_state(GameState::LevelFinished);
            self.display_message(format!("Level {} complete", self.level));
        }
    }

    /// Re-arm the UFO countdown; UFOs come sooner on later levels
    pub fn reset_ufo_timer(&mut self) {
        let base = (20.0 - 1.5 * self.level.saturating_sub(1) as f32).max(6.0);
        let seconds = base + self.random_range(0.0, 5.0);
        self.ufo_timer = (seconds * TICKS_PER_SECOND as f32) as u32;
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Quit => {
                log::info!("Quit requested");
                self.quit = true;
                return;
            }
            InputEvent::PauseToggle => {
                if matches!(self.state, GameState::Playing | GameState::LevelFinished) {
                    self.paused = !self.paused;
                    log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
                }
                return;
            }
            _ => {}
        }
        if self.paused {
            return;
        }

        match (event, self.state) {
            (InputEvent::Advance, GameState::NotStarted | GameState::DisplayHighScores) => {
                self.start()
            }
            (InputEvent::Advance, GameState::GameOver) => self.finish_game_over(),
            (InputEvent::Char(c), GameState::EnterHighScore) => self.push_name_char(c),
            (InputEvent::Backspace, GameState::EnterHighScore) => self.pop_name_char(),
            (InputEvent::Confirm, GameState::EnterHighScore) => self.commit_high_score(),
            (InputEvent::ToggleBoundingBoxes, _) => {
                self.show_bounding_boxes = !self.show_bounding_boxes;
            }
            (InputEvent::ToggleSlowMotion, _) => {
                self.time_mult = if self.time_mult < 1.0 {
                    1.0
                } else {
                    SLOW_MOTION_MULT
                };
                log::debug!("Time multiplier {}", self.time_mult);
            }
            (InputEvent::SkipLevel, GameState::Playing) => self.hit_all_asteroids(),
            _ => {}
        }
    }

    fn tick_playing(&mut self, keys: &KeyState, dt: f32) {
        if let Some(ship) = self.player {
            if keys.fire {
                self.ship_fire(ship);
            }
            if keys.bomb {
                self.ship_bomb(ship);
            }
            self.move_ship(ship, keys, dt);
            self.update_respawn(ship);
        }

        self.update_ufo_fire();
        self.move_objects(dt);
        self.detect_collisions();
        // The ship's last life went in the collisions above
        if self.state != GameState::Playing {
            return;
        }

        self.ufo_timer = self.ufo_timer.saturating_sub(1);
        if self.ufo_timer == 0 {
            self.spawn_ufo();
            self.reset_ufo_timer();
        }

        self.check_game_status();
    }

    fn update_ufo_fire(&mut self) {
        let mut ready = Vec::new();
        for (h, ufo) in self.ufos.iter_mut() {
            ufo.fire_timer = ufo.fire_timer.saturating_sub(1);
            if ufo.fire_timer == 0 {
                ufo.fire_timer = ufo.kind.fire_interval();
                ready.push(h);
            }
        }
        for h in ready {
            self.ufo_fire(h);
        }
    }

    /// Title and high-score screens take turns until someone presses start
    fn cycle_attract_screens(&mut self) {
        match self.state {
            GameState::NotStarted if self.time_in_state() >= TITLE_SCREEN_TICKS => {
                self.set_game_state(GameState::DisplayHighScores);
            }
            GameState::DisplayHighScores if self.time_in_state() >= HIGH_SCORE_SCREEN_TICKS => {
                self.set_game_state(GameState::NotStarted);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::HighScores;
    use crate::settings::Settings;
    use crate::sim::state::{AsteroidSize, GameEvent};
    use glam::Vec2;

    fn game(seed: u64) -> Game {
        let settings = Settings {
            seed: Some(seed),
            ..Default::default()
        };
        Game::new(settings, HighScores::new())
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    #[test]
    fn test_advance_starts_game() {
        let mut g = game(1);
        assert_eq!(g.state, GameState::NotStarted);
        tick(&mut g, &TickInput::with_event(InputEvent::Advance));
        assert_eq!(g.state, GameState::Playing);
        assert_eq!(g.level, 1);
        assert_eq!(g.asteroids.len(), STARTING_ASTEROIDS);
        assert_eq!(g.lives(), STARTING_LIVES);
        assert_eq!(g.message.as_deref(), Some("Level 1"));
    }

    #[test]
    fn test_tick_pause() {
        let mut g = game(2);
        g.start();
        let before: Vec<Vec2> = g.asteroids.values().map(|a| a.pos).collect();
        let (ufo_timer, message_timer, ticks) = (g.ufo_timer, g.message_timer, g.ticks);

        tick(&mut g, &TickInput::with_event(InputEvent::PauseToggle));
        assert!(g.paused);
        for _ in 0..30 {
            tick(&mut g, &idle());
        }
        let after: Vec<Vec2> = g.asteroids.values().map(|a| a.pos).collect();
        assert_eq!(before, after);
        assert_eq!(g.ufo_timer, ufo_timer);
        assert_eq!(g.message_timer, message_timer);
        assert_eq!(g.ticks, ticks);

        // Unpause resumes on the same tick
        tick(&mut g, &TickInput::with_event(InputEvent::PauseToggle));
        assert!(!g.paused);
        assert_eq!(g.ticks, ticks + 1);
    }

    #[test]
    fn test_quit_works_while_paused() {
        let mut g = game(3);
        g.start();
        tick(&mut g, &TickInput::with_event(InputEvent::PauseToggle));
        tick(&mut g, &TickInput::with_event(InputEvent::Quit));
        assert!(g.quit);
    }

    #[test]
    fn test_pause_ignored_on_title() {
        let mut g = game(3);
        tick(&mut g, &TickInput::with_event(InputEvent::PauseToggle));
        assert!(!g.paused);
    }

    #[test]
    fn test_cleared_field_finishes_level() {
        let mut g = game(4);
        g.start();
        tick(&mut g, &TickInput::with_event(InputEvent::SkipLevel));
        assert_eq!(g.state, GameState::LevelFinished);
        assert_eq!(g.score(), 0, "skipping a level scores nothing");

        for _ in 0..LEVEL_FINISHED_TICKS {
            tick(&mut g, &idle());
        }
        assert_eq!(g.state, GameState::Playing);
        assert_eq!(g.level, 2);
        assert_eq!(g.asteroids.len(), STARTING_ASTEROIDS + 1);
    }

    #[test]
    fn test_determinism() {
        let mut g1 = game(99_999);
        let mut g2 = game(99_999);

        let inputs = [
            TickInput::with_event(InputEvent::Advance),
            TickInput {
                keys: KeyState {
                    thrust: true,
                    fire: true,
                    ..Default::default()
                },
                events: Vec::new(),
            },
            TickInput {
                keys: KeyState {
                    left: true,
                    ..Default::default()
                },
                events: Vec::new(),
            },
            TickInput::default(),
        ];

        for _ in 0..50 {
            for input in &inputs[1..] {
                tick(&mut g1, input);
                tick(&mut g2, input);
            }
        }
        tick(&mut g1, &inputs[0]);
        tick(&mut g2, &inputs[0]);
        for _ in 0..200 {
            for input in &inputs[1..] {
                tick(&mut g1, input);
                tick(&mut g2, input);
            }
        }

        assert_eq!(g1.ticks, g2.ticks);
        assert_eq!(g1.state, g2.state);
        assert_eq!(g1.score(), g2.score());
        let p1: Vec<Vec2> = g1.asteroids.values().map(|a| a.pos).collect();
        let p2: Vec<Vec2> = g2.asteroids.values().map(|a| a.pos).collect();
        assert_eq!(p1, p2);
        let s1 = g1.player_ship().unwrap();
        let s2 = g2.player_ship().unwrap();
        assert!((s1.angle - s2.angle).abs() < 0.0001);
    }

    #[test]
    fn test_message_times_out() {
        let mut g = game(5);
        g.start();
        g.asteroids.clear();
        // Keep the level open so no new message appears
        let rock = g.make_asteroid(AsteroidSize::Small, Vec2::new(5.0, 5.0), 0.0);
        let rock = crate::sim::state::Asteroid {
            vel: Vec2::ZERO,
            ..rock
        };
        g.spawn_asteroid(rock);
        g.ufo_timer = u32::MAX;
        for _ in 0..MESSAGE_LIFE {
            tick(&mut g, &idle());
        }
        assert_eq!(g.message, None);
        assert_eq!(g.message_timer, 0);
    }

    #[test]
    fn test_ufo_timer_spawns_ufo() {
        let mut g = game(6);
        g.start();
        g.ufo_timer = 1;
        tick(&mut g, &idle());
        assert_eq!(g.ufos.len(), 1);
        assert!(g.events.contains(&GameEvent::UfoAppear));
        assert!(g.ufo_timer > 0);
    }

    #[test]
    fn test_ufo_fires_on_interval() {
        let mut g = game(7);
        g.start();
        g.ufo_timer = 1;
        tick(&mut g, &idle());
        g.drain_events();
        let interval = g.ufos.values().next().unwrap().kind.fire_interval();
        for _ in 0..interval {
            tick(&mut g, &idle());
        }
        assert!(g.drain_events().contains(&GameEvent::UfoFire));
    }

    #[test]
    fn test_respawn_after_delay_is_invulnerable() {
        let mut g = game(8);
        g.start();
        g.asteroids.clear();
        let rock = g.make_asteroid(AsteroidSize::Large, Vec2::new(5.0, 5.0), 0.0);
        g.spawn_asteroid(crate::sim::state::Asteroid {
            vel: Vec2::ZERO,
            ..rock
        });
        g.ufo_timer = u32::MAX;
        let ship = g.player.unwrap();
        g.hit_ship(ship);
        assert!(!g.player_ship().unwrap().is_active());

        for _ in 0..RESPAWN_DELAY_TICKS {
            tick(&mut g, &idle());
        }
        let s = g.player_ship().unwrap();
        assert!(s.is_active());
        assert!(s.is_invulnerable());
        assert_eq!(s.lives, STARTING_LIVES - 1);
    }

    /// Park a stationary large rock at `pos`
    fn park_rock(g: &mut Game, pos: Vec2) {
        let rock = g.make_asteroid(AsteroidSize::Large, pos, 0.0);
        g.spawn_asteroid(crate::sim::state::Asteroid {
            vel: Vec2::ZERO,
            ..rock
        });
    }

    #[test]
    fn test_grace_window_then_rock_costs_a_life() {
        let mut g = game(12);
        g.start();
        g.asteroids.clear();
        // Keeps the level from finishing
        park_rock(&mut g, Vec2::new(5.0, 5.0));
        g.ufo_timer = u32::MAX;
        let ship = g.player.unwrap();
        g.hit_ship(ship);
        for _ in 0..RESPAWN_DELAY_TICKS {
            tick(&mut g, &idle());
        }
        let s = g.player_ship().unwrap();
        assert!(s.is_active() && s.is_invulnerable());
        let lives = s.lives;
        let pos = s.pos;
        park_rock(&mut g, pos);

        for i in 1..INVULNERABLE_TICKS {
            tick(&mut g, &idle());
            assert_eq!(g.lives(), lives, "life lost on tick {i} of the grace window");
            assert!(g.player_ship().unwrap().is_active());
        }
        tick(&mut g, &idle());
        assert_eq!(g.lives(), lives - 1);
        assert!(!g.player_ship().unwrap().is_active());
        assert_eq!(g.state, GameState::Playing);
    }

    #[test]
    fn test_no_ufo_launch_on_game_over_tick() {
        let mut g = game(13);
        g.start();
        g.player_ship_mut().unwrap().lives = 1;
        let pos = g.player_ship().unwrap().pos;
        park_rock(&mut g, pos);
        g.ufo_timer = 1;
        tick(&mut g, &idle());
        assert_eq!(g.state, GameState::GameOver);
        assert!(g.ufos.is_empty());
        assert!(!g.events.contains(&GameEvent::UfoAppear));
    }

    #[test]
    fn test_attract_screens_start_without_leftovers() {
        let mut g = game(14);
        g.start();
        let ship = g.player.unwrap();
        assert!(g.ship_fire(ship));
        assert!(g.spawn_ufo().is_some());
        g.player_ship_mut().unwrap().lives = 1;
        g.hit_ship(ship);
        assert_eq!(g.state, GameState::GameOver);
        assert!(!g.particles.is_empty());

        tick(&mut g, &TickInput::with_event(InputEvent::Advance));
        assert_eq!(g.state, GameState::DisplayHighScores);
        assert!(g.ufos.is_empty());
        assert!(g.bullets.is_empty());
        assert!(g.particles.is_empty());
        assert_eq!(g.asteroids.len(), 6);

        for _ in 0..60 {
            tick(&mut g, &idle());
        }
        assert!(g.ufos.is_empty());
        assert!(g.bullets.is_empty());
    }

    #[test]
    fn test_game_over_then_high_score_entry() {
        let mut g = game(9);
        g.start();
        let ship = g.player.unwrap();
        g.increment_score(ship, 2_500);
        g.player_ship_mut().unwrap().lives = 1;
        g.hit_ship(ship);
        assert_eq!(g.state, GameState::GameOver);

        for _ in 0..GAME_OVER_TICKS {
            tick(&mut g, &idle());
        }
        assert_eq!(g.state, GameState::EnterHighScore);

        let typing = TickInput {
            keys: KeyState::default(),
            events: vec![
                InputEvent::Char('B'),
                InputEvent::Char('O'),
                InputEvent::Char('B'),
                InputEvent::Confirm,
            ],
        };
        tick(&mut g, &typing);
        assert_eq!(g.state, GameState::DisplayHighScores);
        assert_eq!(g.high_scores.entries[0].name, "BOB");
        assert_eq!(g.high_scores.entries[0].level, 1);
    }

    #[test]
    fn test_advance_skips_game_over_wait() {
        let mut g = game(10);
        g.start();
        let ship = g.player.unwrap();
        g.player_ship_mut().unwrap().lives = 1;
        g.hit_ship(ship);
        tick(&mut g, &TickInput::with_event(InputEvent::Advance));
        // Zero score goes straight to the table
        assert_eq!(g.state, GameState::DisplayHighScores);
    }

    #[test]
    fn test_attract_screens_alternate() {
        let mut g = game(11);
        for _ in 0..TITLE_SCREEN_TICKS {
            tick(&mut g, &idle());
        }
        assert_eq!(g.state, GameState::DisplayHighScores);
        for _ in 0..HIGH_SCORE_SCREEN_TICKS {
            tick(&mut g, &idle());
        }
        assert_eq!(g.state, GameState::NotStarted);
        assert!(!g.asteroids.is_empty(), "demo asteroids keep drifting");
    }

    #[test]
    fn test_slow_motion_toggle() {
        let mut g = game(12);
        tick(&mut g, &TickInput::with_event(InputEvent::ToggleSlowMotion));
        assert_eq!(g.time_mult, SLOW_MOTION_MULT);
        tick(&mut g, &TickInput::with_event(InputEvent::ToggleSlowMotion));
        assert_eq!(g.time_mult, 1.0);
    }
}
