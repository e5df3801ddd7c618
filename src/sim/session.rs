//! Score, lives, level progression and the end-of-game hand-off

use super::arena::Handle;
use super::state::{Asteroid, Bullet, Game, GameEvent, GameState, Ship, ShipStatus};
use crate::consts::*;
use crate::highscores::MAX_NAME_LEN;

/// Large asteroids at the start of `level` (1-based)
pub fn asteroid_count_for_level(level: u32) -> usize {
    (STARTING_ASTEROIDS + level.saturating_sub(1) as usize).min(LEVEL_ASTEROID_CAP)
}

/// Asteroid speed multiplier for `level`; never decreases
pub fn asteroid_speed_mult(level: u32) -> f32 {
    (1.0 + 0.08 * level.saturating_sub(1) as f32).min(2.0)
}

/// Points for a bullet kill: smaller rocks pay more, and long shots earn up
/// to half the base value again
pub fn calculate_hit_score(bullet: &Bullet, asteroid: &Asteroid) -> u64 {
    let base = asteroid.size.base_score();
    let long_shot = (base as f32 * 0.5 * bullet.travelled_fraction()) as u64;
    base + long_shot
}

/// Most `ExtraLife` events raised by a single score change
const MAX_EXTRA_LIFE_EVENTS: u32 = 8;

/// Extra lives earned moving from `old` to `new` points
pub fn lives_earned(old: u64, new: u64) -> u32 {
    let earned = (new / SCORE_1UP).saturating_sub(old / SCORE_1UP);
    u32::try_from(earned).unwrap_or(u32::MAX)
}

impl Game {
    /// Add points to a ship, granting a life for every `SCORE_1UP` boundary
    /// crossed. Returns the number of lives granted.
    pub fn increment_score(&mut self, ship: Handle<Ship>, points: u64) -> u32 {
        let Some(s) = self.ships.get_mut(ship) else {
            return 0;
        };
        let old = s.score;
        s.score = s.score.saturating_add(points);
        let extra = lives_earned(old, s.score);
        s.lives = s.lives.saturating_add(extra);
        if extra > 0 {
            log::info!("Extra life x{} at {} points", extra, s.score);
            for _ in 0..extra.min(MAX_EXTRA_LIFE_EVENTS) {
                self.emit(GameEvent::ExtraLife);
            }
            self.display_message("Extra life!");
        }
        extra
    }

    /// Put an exploded ship back in the middle with a grace window
    pub fn respawn(&mut self, ship: Handle<Ship>) {
        if self.state != GameState::Playing {
            debug_assert!(false, "respawn outside Playing ({:?})", self.state);
            log::warn!("Ignoring respawn in {:?}", self.state);
            return;
        }
        let Some(s) = self.ships.get_mut(ship) else {
            return;
        };
        *s = Ship {
            lives: s.lives,
            score: s.score,
            bombs: s.bombs,
            invulnerable_ticks: INVULNERABLE_TICKS,
            ..Ship::new()
        };
        log::debug!("Ship respawned, {} lives left", s.lives);
    }

    /// All ships gone
    pub fn game_over(&mut self) {
        log::info!("Game over at level {} with {} points", self.level, self.score());
        self.set_game_state(GameState::GameOver);
        self.emit(GameEvent::GameOver);
        self.display_message("Game over");
    }

    /// Leave `GameOver`: name entry if the score made the table, otherwise
    /// straight to the table
    pub fn finish_game_over(&mut self) {
        if self.state != GameState::GameOver {
            debug_assert!(false, "finish_game_over outside GameOver ({:?})", self.state);
            return;
        }
        if self.high_scores.qualifies(self.score()) {
            self.name_entry.clear();
            self.set_game_state(GameState::EnterHighScore);
        } else {
            self.build_demo_objects();
            self.set_game_state(GameState::DisplayHighScores);
        }
    }

    pub fn push_name_char(&mut self, c: char) {
        if self.name_entry.chars().count() < MAX_NAME_LEN && !c.is_control() {
            self.name_entry.push(c);
        }
    }

    pub fn pop_name_char(&mut self) {
        self.name_entry.pop();
    }

    /// Record the typed name and show the table
    pub fn commit_high_score(&mut self) {
        if self.state != GameState::EnterHighScore {
            debug_assert!(false, "commit_high_score outside EnterHighScore ({:?})", self.state);
            return;
        }
        let name = match self.name_entry.trim() {
            "" => "ANONYMOUS".to_string(),
            name => name.to_string(),
        };
        let score = self.score();
        if let Some(rank) = self.high_scores.add_score(name.clone(), score, self.level) {
            log::info!("{} placed #{} with {}", name, rank, score);
            self.high_scores_dirty = true;
        }
        self.name_entry.clear();
        self.build_demo_objects();
        self.set_game_state(GameState::DisplayHighScores);
    }

    /// Count an exploded ship down to its respawn
    pub(crate) fn update_respawn(&mut self, ship: Handle<Ship>) {
        let Some(s) = self.ships.get_mut(ship) else {
            return;
        };
        if s.lives == 0 {
            return;
        }
        if let ShipStatus::Exploded { respawn_in } = s.status {
            let respawn_in = respawn_in.saturating_sub(1);
            s.status = ShipStatus::Exploded { respawn_in };
            if respawn_in == 0 {
                self.respawn(ship);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::HighScores;
    use crate::settings::Settings;
    use crate::sim::state::{AsteroidSize, BulletOwner};
    use glam::Vec2;

    fn playing_game() -> (Game, Handle<Ship>) {
        let mut g = Game::new(Settings::default(), HighScores::new());
        g.start();
        let ship = g.player.unwrap();
        (g, ship)
    }

    #[test]
    fn test_extra_life_single_threshold() {
        let (mut g, ship) = playing_game();
        g.ships.get_mut(ship).unwrap().score = 149_999;
        let lives = g.lives();
        assert_eq!(g.increment_score(ship, 5_000), 1);
        assert_eq!(g.score(), 154_999);
        assert_eq!(g.lives(), lives + 1);
        assert!(g.events.contains(&GameEvent::ExtraLife));
    }

    #[test]
    fn test_extra_life_multiple_thresholds() {
        let (mut g, ship) = playing_game();
        let lives = g.lives();
        assert_eq!(g.increment_score(ship, 450_000), 3);
        assert_eq!(g.lives(), lives + 3);
        assert_eq!(
            g.events.iter().filter(|e| **e == GameEvent::ExtraLife).count(),
            3
        );
    }

    #[test]
    fn test_huge_score_saturates_lives() {
        assert_eq!(lives_earned(0, u64::MAX), u32::MAX);
        assert_eq!(lives_earned(SCORE_1UP * 2, SCORE_1UP * 5), 3);

        let (mut g, ship) = playing_game();
        g.ships.get_mut(ship).unwrap().lives = u32::MAX - 1;
        assert_eq!(g.increment_score(ship, u64::MAX), u32::MAX);
        assert_eq!(g.score(), u64::MAX);
        assert_eq!(g.lives(), u32::MAX);
        assert_eq!(
            g.events.iter().filter(|e| **e == GameEvent::ExtraLife).count(),
            MAX_EXTRA_LIFE_EVENTS as usize
        );
    }

    #[test]
    fn test_no_extra_life_below_threshold() {
        let (mut g, ship) = playing_game();
        let lives = g.lives();
        assert_eq!(g.increment_score(ship, SCORE_1UP - 1), 0);
        assert_eq!(g.lives(), lives);
    }

    #[test]
    fn test_hit_score_favours_small_and_long_shots() {
        let (mut g, ship) = playing_game();
        let mut bullet = Bullet {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            range: BULLET_RANGE,
            max_range: BULLET_RANGE,
            owner: BulletOwner::Ship(ship),
        };
        let large = g.make_asteroid(AsteroidSize::Large, Vec2::ZERO, 0.0);
        let medium = g.make_asteroid(AsteroidSize::Medium, Vec2::ZERO, 0.0);
        let small = g.make_asteroid(AsteroidSize::Small, Vec2::ZERO, 0.0);
        let (l, m, s) = (
            calculate_hit_score(&bullet, &large),
            calculate_hit_score(&bullet, &medium),
            calculate_hit_score(&bullet, &small),
        );
        assert!(l < m && m < s);
        assert_eq!(s, AsteroidSize::Small.base_score());

        bullet.range = 0.0;
        assert_eq!(
            calculate_hit_score(&bullet, &small),
            AsteroidSize::Small.base_score() * 3 / 2
        );
    }

    #[test]
    fn test_difficulty_is_monotonic() {
        for level in 1..40 {
            assert!(asteroid_count_for_level(level + 1) >= asteroid_count_for_level(level));
            assert!(asteroid_speed_mult(level + 1) >= asteroid_speed_mult(level));
        }
        assert_eq!(asteroid_count_for_level(1), STARTING_ASTEROIDS);
        assert!(asteroid_count_for_level(100) <= MAX_ASTEROIDS);
    }

    #[test]
    fn test_respawn_grants_invulnerability() {
        let (mut g, ship) = playing_game();
        {
            let s = g.ships.get_mut(ship).unwrap();
            s.status = ShipStatus::Exploded { respawn_in: 1 };
            s.pos = Vec2::new(3.0, 3.0);
        }
        g.update_respawn(ship);
        let s = g.ships.get(ship).unwrap();
        assert!(s.is_active());
        assert_eq!(s.invulnerable_ticks, INVULNERABLE_TICKS);
        assert_eq!(s.pos, Vec2::new(X_AXIS / 2.0, Y_AXIS / 2.0));
    }

    #[test]
    fn test_game_over_routes_by_qualification() {
        let (mut g, ship) = playing_game();
        g.increment_score(ship, 1_000);
        g.game_over();
        g.finish_game_over();
        assert_eq!(g.state, GameState::EnterHighScore);

        let (mut g, _) = playing_game();
        // Zero never qualifies
        g.game_over();
        g.finish_game_over();
        assert_eq!(g.state, GameState::DisplayHighScores);
    }

    #[test]
    fn test_commit_high_score() {
        let (mut g, ship) = playing_game();
        g.increment_score(ship, 7_500);
        g.game_over();
        g.finish_game_over();
        for c in "ACE\u{8}".chars() {
            g.push_name_char(c);
        }
        g.commit_high_score();
        assert_eq!(g.state, GameState::DisplayHighScores);
        assert!(g.high_scores_dirty);
        let top = &g.high_scores.entries[0];
        assert_eq!(top.name, "ACE");
        assert_eq!(top.score, 7_500);
    }

    #[test]
    fn test_name_entry_is_bounded() {
        let (mut g, _) = playing_game();
        for _ in 0..MAX_NAME_LEN + 5 {
            g.push_name_char('Z');
        }
        assert_eq!(g.name_entry.chars().count(), MAX_NAME_LEN);
        g.pop_name_char();
        assert_eq!(g.name_entry.chars().count(), MAX_NAME_LEN - 1);
    }
}
