//! Rendering collaborator
//!
//! The simulation never draws. Once per frame the loop captures a read-only
//! `Frame` snapshot and hands it to a `Renderer` backend. Coordinates in the
//! frame are world units; `Frame::to_screen` maps them onto the window.

use glam::Vec2;

use crate::Result;
use crate::consts::{BULLET_RADIUS, SHIP_RADIUS, X_AXIS, Y_AXIS};
use crate::highscores::HighScoreEntry;
use crate::sim::{AsteroidSize, Game, GameState, ParticleKind, UfoKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteKind {
    Ship { thrusting: bool, invulnerable: bool },
    Asteroid { size: AsteroidSize, shape_seed: u32 },
    ShipBullet,
    UfoBullet,
    Ufo(UfoKind),
    Particle(ParticleKind),
}

/// One drawable entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub kind: SpriteKind,
    pub pos: Vec2,
    /// Degrees
    pub angle: f32,
    /// Collision radius, for bounding-box overlays
    pub radius: f32,
}

/// Heads-up display fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hud {
    pub score: u64,
    pub lives: u32,
    pub bombs: u32,
    pub level: u32,
    pub high_score: u64,
    pub message: Option<String>,
}

/// Everything a backend needs to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub state: GameState,
    pub sprites: Vec<Sprite>,
    pub hud: Hud,
    pub high_scores: Vec<HighScoreEntry>,
    /// Name typed so far in `EnterHighScore`
    pub name_entry: String,
    pub show_bounding_boxes: bool,
    pub paused: bool,
    pub resolution: (u32, u32),
}

impl Frame {
    /// Snapshot the game. Back to front: particles, asteroids, bullets,
    /// UFO, ship.
    pub fn capture(game: &Game) -> Self {
        let mut sprites = Vec::with_capacity(
            game.particles.len()
                + game.asteroids.len()
                + game.bullets.len()
                + game.ufos.len()
                + 1,
        );

        sprites.extend(game.particles.values().map(|p| Sprite {
            kind: SpriteKind::Particle(p.kind),
            pos: p.pos,
            angle: p.angle,
            radius: 0.0,
        }));
        sprites.extend(game.asteroids.values().map(|a| Sprite {
            kind: SpriteKind::Asteroid {
                size: a.size,
                shape_seed: a.shape_seed,
            },
            pos: a.pos,
            angle: a.angle,
            radius: a.size.radius(),
        }));
        sprites.extend(game.bullets.values().map(|b| Sprite {
            kind: if b.owner.is_ship() {
                SpriteKind::ShipBullet
            } else {
                SpriteKind::UfoBullet
            },
            pos: b.pos,
            angle: crate::angle_of(b.vel),
            radius: BULLET_RADIUS,
        }));
        sprites.extend(game.ufos.values().map(|u| Sprite {
            kind: SpriteKind::Ufo(u.kind),
            pos: u.pos,
            angle: 0.0,
            radius: u.kind.radius(),
        }));
        if let Some(ship) = game.player_ship().filter(|s| s.is_active()) {
            sprites.push(Sprite {
                kind: SpriteKind::Ship {
                    thrusting: ship.thrusting,
                    invulnerable: ship.is_invulnerable(),
                },
                pos: ship.pos,
                angle: ship.angle,
                radius: SHIP_RADIUS,
            });
        }

        let hud = Hud {
            score: game.score(),
            lives: game.lives(),
            bombs: game.player_ship().map(|s| s.bombs).unwrap_or(0),
            level: game.level,
            high_score: game.high_scores.top_score().unwrap_or(0),
            message: game.message.clone(),
        };

        Self {
            state: game.state,
            sprites,
            hud,
            high_scores: game.high_scores.entries.clone(),
            name_entry: game.name_entry.clone(),
            show_bounding_boxes: game.show_bounding_boxes,
            paused: game.paused,
            resolution: (game.settings.h_res, game.settings.v_res),
        }
    }

    /// World units to pixels, y down
    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        let (w, h) = self.resolution;
        Vec2::new(
            world.x / X_AXIS * w as f32,
            (1.0 - world.y / Y_AXIS) * h as f32,
        )
    }
}

/// Drawing backend collaborator
pub trait Renderer {
    fn render(&mut self, frame: &Frame) -> Result<()>;

    /// Release backend resources before exit
    fn shutdown(&mut self) {}
}

/// Renderer that logs a one-line summary per state change; for headless runs
#[derive(Debug, Default)]
pub struct LogRenderer {
    last_state: Option<GameState>,
    pub frames: u64,
}

impl Renderer for LogRenderer {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        self.frames += 1;
        if self.last_state != Some(frame.state) {
            self.last_state = Some(frame.state);
            log::info!(
                "[{:?}] level {} score {} lives {} ({} sprites)",
                frame.state,
                frame.hud.level,
                frame.hud.score,
                frame.hud.lives,
                frame.sprites.len()
            );
        }
        log::trace!("frame {}: {} sprites", self.frames, frame.sprites.len());
        Ok(())
    }

    fn shutdown(&mut self) {
        log::info!("Renderer shut down after {} frames", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::HighScores;
    use crate::settings::Settings;

    #[test]
    fn test_capture_title_screen() {
        let game = Game::new(Settings::default(), HighScores::new());
        let frame = Frame::capture(&game);
        assert_eq!(frame.state, GameState::NotStarted);
        assert_eq!(frame.sprites.len(), game.asteroids.len());
        assert!(
            frame
                .sprites
                .iter()
                .all(|s| matches!(s.kind, SpriteKind::Asteroid { .. }))
        );
    }

    #[test]
    fn test_asteroid_sprites_carry_outline_inputs() {
        let game = Game::new(Settings::default(), HighScores::new());
        let frame = Frame::capture(&game);
        let rocks: Vec<_> = frame
            .sprites
            .iter()
            .filter_map(|s| match s.kind {
                SpriteKind::Asteroid { size, shape_seed } => Some((size, shape_seed, s)),
                _ => None,
            })
            .collect();
        assert_eq!(rocks.len(), game.asteroids.len());
        for ((size, shape_seed, sprite), a) in rocks.into_iter().zip(game.asteroids.values()) {
            assert_eq!(size, a.size);
            assert_eq!(shape_seed, a.shape_seed);
            assert_eq!(sprite.angle, a.angle);
            assert_eq!(sprite.radius, a.size.radius());
        }
    }

    #[test]
    fn test_capture_playing_has_ship_last() {
        let mut game = Game::new(Settings::default(), HighScores::new());
        game.start();
        let frame = Frame::capture(&game);
        assert!(matches!(
            frame.sprites.last().map(|s| s.kind),
            Some(SpriteKind::Ship { .. })
        ));
        assert_eq!(frame.hud.lives, game.lives());
        assert_eq!(frame.hud.level, 1);
        assert_eq!(frame.hud.message.as_deref(), Some("Level 1"));
    }

    #[test]
    fn test_capture_carries_debug_flag() {
        let settings = Settings {
            show_bounding_boxes: true,
            ..Default::default()
        };
        let game = Game::new(settings, HighScores::new());
        assert!(Frame::capture(&game).show_bounding_boxes);
    }

    #[test]
    fn test_to_screen_flips_y() {
        let game = Game::new(Settings::default(), HighScores::new());
        let frame = Frame::capture(&game);
        assert_eq!(frame.to_screen(Vec2::ZERO), Vec2::new(0.0, 600.0));
        assert_eq!(frame.to_screen(Vec2::new(50.0, 50.0)), Vec2::new(400.0, 300.0));
    }
}
