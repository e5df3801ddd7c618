//! Collision detection and resolution
//!
//! Everything is a circle and distances are measured across the torus.
//! Resolution runs in a fixed priority order; anything destroyed is flagged
//! dead at once so it cannot be hit, or score, twice in the same pass.
//! Dead slots are reclaimed and split children spawned once the pass is done.

use glam::Vec2;

use super::arena::Handle;
use super::session::calculate_hit_score;
use super::state::{
    Asteroid, Bullet, BulletOwner, Game, GameEvent, GameState, Ship, ShipStatus, Ufo,
};
use crate::consts::*;
use crate::{angle_of, toroidal_distance};

/// Circle overlap on the torus
#[inline]
pub fn collides(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> bool {
    toroidal_distance(a_pos, b_pos) < a_radius + b_radius
}

impl Game {
    /// Resolve this tick's collisions, then compact the pools
    pub fn detect_collisions(&mut self) {
        self.resolve_bullets_vs_asteroids();
        self.resolve_bullets_vs_ufos();
        self.resolve_ufo_bullets_vs_ship();
        self.resolve_asteroids_vs_ship();
        self.resolve_ship_vs_ufos();
        self.reclaim_pools();
        self.flush_pending_asteroids();
    }

    pub(crate) fn reclaim_pools(&mut self) {
        self.asteroids.reclaim();
        self.bullets.reclaim();
        self.ufos.reclaim();
        self.particles.reclaim();
    }

    /// Closest live asteroid overlapping a circle; ties go to the lower slot
    fn closest_asteroid_hit(&self, pos: Vec2, radius: f32) -> Option<Handle<Asteroid>> {
        let mut best: Option<(f32, Handle<Asteroid>)> = None;
        for (h, asteroid) in self.asteroids.iter() {
            let d = toroidal_distance(pos, asteroid.pos);
            if d >= radius + asteroid.size.radius() {
                continue;
            }
            // Slot order iteration: strict < keeps the earliest on ties
            if best.is_none_or(|(best_d, _)| d < best_d) {
                best = Some((d, h));
            }
        }
        best.map(|(_, h)| h)
    }

    fn resolve_bullets_vs_asteroids(&mut self) {
        for bh in self.bullets.handles() {
            let Some(bullet) = self.bullets.get(bh).cloned() else {
                continue;
            };
            if let Some(ah) = self.closest_asteroid_hit(bullet.pos, BULLET_RADIUS) {
                self.bullets.kill(bh);
                self.hit_asteroid(ah, Some(&bullet));
            }
        }
    }

    fn resolve_bullets_vs_ufos(&mut self) {
        for bh in self.bullets.handles() {
            let Some(bullet) = self.bullets.get(bh).cloned() else {
                continue;
            };
            if !bullet.owner.is_ship() {
                continue;
            }
            let target = self
                .ufos
                .iter()
                .find(|(_, u)| collides(bullet.pos, BULLET_RADIUS, u.pos, u.kind.radius()))
                .map(|(h, _)| h);
            if let Some(uh) = target {
                self.bullets.kill(bh);
                self.hit_ufo(uh, Some(&bullet));
            }
        }
    }

    fn resolve_ufo_bullets_vs_ship(&mut self) {
        let Some(ph) = self.player else {
            return;
        };
        for bh in self.bullets.handles() {
            // A ship in its grace window lets UFO fire pass through
            let Some(ship) = self.ships.get(ph).filter(|s| s.is_vulnerable()) else {
                return;
            };
            let ship_pos = ship.pos;
            let Some(bullet) = self.bullets.get(bh) else {
                continue;
            };
            if bullet.owner.is_ship() {
                continue;
            }
            if collides(bullet.pos, BULLET_RADIUS, ship_pos, SHIP_RADIUS) {
                self.bullets.kill(bh);
                self.hit_ship(ph);
            }
        }
    }

    fn resolve_asteroids_vs_ship(&mut self) {
        let Some(ph) = self.player else {
            return;
        };
        let Some(ship_pos) = self.ships.get(ph).filter(|s| s.is_vulnerable()).map(|s| s.pos) else {
            return;
        };
        if let Some(ah) = self.closest_asteroid_hit(ship_pos, SHIP_RADIUS) {
            self.destroy_asteroid(ah);
            self.hit_ship(ph);
        }
    }

    fn resolve_ship_vs_ufos(&mut self) {
        let Some(ph) = self.player else {
            return;
        };
        let Some(ship_pos) = self.ships.get(ph).filter(|s| s.is_active()).map(|s| s.pos) else {
            return;
        };
        let rammed: Vec<_> = self
            .ufos
            .iter()
            .filter(|(_, u)| collides(ship_pos, SHIP_RADIUS, u.pos, u.kind.radius()))
            .map(|(h, _)| h)
            .collect();
        for uh in rammed {
            self.destroy_ufo(uh);
            self.hit_ship(ph);
        }
    }

    /// Break an asteroid: flag it dead, queue its children, throw sparks.
    /// Returns the destroyed asteroid, or `None` if it was already gone.
    pub fn destroy_asteroid(&mut self, handle: Handle<Asteroid>) -> Option<Asteroid> {
        let asteroid = self.asteroids.get(handle).cloned()?;
        self.asteroids.kill(handle);
        self.split_asteroid(&asteroid);
        self.emit(asteroid.size.explosion());
        self.create_sparks(asteroid.pos, 6, 0.0, 360.0, 20.0);
        Some(asteroid)
    }

    /// A bullet (or nothing, for rams) hit an asteroid. Ship-owned bullets
    /// score for the ship captured at fire time.
    pub fn hit_asteroid(&mut self, handle: Handle<Asteroid>, bullet: Option<&Bullet>) {
        let Some(asteroid) = self.destroy_asteroid(handle) else {
            return;
        };
        if let Some(bullet) = bullet {
            if let BulletOwner::Ship(ship) = bullet.owner {
                let points = calculate_hit_score(bullet, &asteroid);
                self.increment_score(ship, points);
            }
        }
    }

    /// Remove a UFO outright, with debris
    pub fn destroy_ufo(&mut self, handle: Handle<Ufo>) -> Option<Ufo> {
        let ufo = self.ufos.get(handle).cloned()?;
        self.ufos.kill(handle);
        self.create_debris(ufo.pos, ufo.vel, 8);
        self.emit(GameEvent::ExplosionLarge);
        self.reset_ufo_timer();
        log::debug!("{:?} UFO destroyed", ufo.kind);
        Some(ufo)
    }

    /// Damage a UFO by one hit point. Returns true if it was destroyed.
    pub fn hit_ufo(&mut self, handle: Handle<Ufo>, bullet: Option<&Bullet>) -> bool {
        let Some(ufo) = self.ufos.get_mut(handle) else {
            return false;
        };
        ufo.hp = ufo.hp.saturating_sub(1);
        let (pos, hp, kind) = (ufo.pos, ufo.hp, ufo.kind);

        // Sparks fly back along the bullet's path
        let back = bullet.map(|b| angle_of(-b.vel)).unwrap_or(0.0);
        self.create_sparks(pos, 5, back - 60.0, back + 60.0, 25.0);

        if hp > 0 {
            self.emit(GameEvent::ExplosionSmall);
            return false;
        }
        self.destroy_ufo(handle);
        if let Some(BulletOwner::Ship(ship)) = bullet.map(|b| b.owner) {
            self.increment_score(ship, kind.score());
        }
        true
    }

    /// Take a life from the ship unless it is exploded or invulnerable
    pub fn hit_ship(&mut self, ship: Handle<Ship>) {
        let Some(s) = self.ships.get_mut(ship) else {
            return;
        };
        if !s.is_vulnerable() {
            return;
        }
        s.lives = s.lives.saturating_sub(1);
        s.status = ShipStatus::Exploded {
            respawn_in: RESPAWN_DELAY_TICKS,
        };
        s.thrusting = false;
        let (pos, vel, lives) = (s.pos, s.vel, s.lives);
        s.vel = Vec2::ZERO;

        self.create_debris(pos, vel, 12);
        self.emit(GameEvent::ExplosionLarge);
        log::debug!("Ship destroyed, {} lives left", lives);
        if lives == 0 && self.state == GameState::Playing {
            self.game_over();
        }
    }

    /// Destroy every asteroid at once; no splitting, no score
    pub fn hit_all_asteroids(&mut self) {
        let count = self.asteroids.len();
        for h in self.asteroids.handles() {
            self.asteroids.kill(h);
        }
        self.pending_asteroids.clear();
        self.asteroids.reclaim();
        if count > 0 {
            self.emit(GameEvent::ExplosionLarge);
        }
        log::info!("Destroyed all {} asteroids", count);
    }

    /// Smart bomb: break every asteroid near the ship, scoring base points
    pub fn ship_bomb(&mut self, ship: Handle<Ship>) -> bool {
        let Some(s) = self.ships.get_mut(ship) else {
            return false;
        };
        if !s.is_active() || s.bombs == 0 {
            return false;
        }
        s.bombs -= 1;
        let centre = s.pos;

        let targets: Vec<_> = self
            .asteroids
            .iter()
            .filter(|(_, a)| collides(centre, BOMB_RADIUS, a.pos, a.size.radius()))
            .map(|(h, _)| h)
            .collect();
        for ah in targets {
            if let Some(asteroid) = self.destroy_asteroid(ah) {
                self.increment_score(ship, asteroid.size.base_score());
            }
        }
        self.create_sparks(centre, 24, 0.0, 360.0, 40.0);
        self.emit(GameEvent::ExplosionLarge);
        true
    }
}
