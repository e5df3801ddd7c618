//! Kinematic integration on the torus
//!
//! Positions advance by `vel * dt` and wrap per axis; angles stay in
//! [0, 360). `dt` already includes the global slow-motion multiplier.

use glam::Vec2;

use super::arena::Handle;
use super::state::{Game, GameEvent, Ship};
use super::tick::KeyState;
use crate::consts::*;
use crate::{heading, normalize_degrees, wrap_point};

/// Translate and wrap
#[inline]
pub fn advance(pos: Vec2, vel: Vec2, dt: f32) -> Vec2 {
    wrap_point(pos + vel * dt)
}

/// Rotate by `rate` degrees per second
#[inline]
pub fn rotate(angle: f32, rate: f32, dt: f32) -> f32 {
    normalize_degrees(angle + rate * dt)
}

impl Game {
    /// Effective timestep for this tick
    pub fn step_dt(&self) -> f32 {
        SIM_DT * self.time_mult.clamp(0.0, 1.0)
    }

    /// Advance every pooled entity except the ship. Bullets burn range,
    /// particles burn lifetime, UFOs leave after crossing the world.
    pub fn move_objects(&mut self, dt: f32) {
        for (_, asteroid) in self.asteroids.iter_mut() {
            asteroid.pos = advance(asteroid.pos, asteroid.vel, dt);
            asteroid.angle = rotate(asteroid.angle, asteroid.spin, dt);
        }

        let mut expired = Vec::new();
        for (h, bullet) in self.bullets.iter_mut() {
            bullet.pos = advance(bullet.pos, bullet.vel, dt);
            bullet.range -= bullet.vel.length() * dt;
            if bullet.range <= 0.0 {
                bullet.range = 0.0;
                expired.push(h);
            }
        }
        for h in expired {
            self.bullets.kill(h);
        }

        let mut faded = Vec::new();
        for (h, particle) in self.particles.iter_mut() {
            particle.pos = advance(particle.pos, particle.vel, dt);
            particle.angle = rotate(particle.angle, particle.spin, dt);
            particle.life = particle.life.saturating_sub(1);
            if particle.life == 0 {
                faded.push(h);
            }
        }
        for h in faded {
            self.particles.kill(h);
        }

        let mut departed = Vec::new();
        let mut course_changes = Vec::new();
        for (h, ufo) in self.ufos.iter_mut() {
            ufo.pos = advance(ufo.pos, ufo.vel, dt);
            ufo.travel_left -= ufo.vel.x.abs() * dt;
            if ufo.travel_left <= 0.0 {
                departed.push(h);
                continue;
            }
            ufo.course_timer = ufo.course_timer.saturating_sub(1);
            if ufo.course_timer == 0 {
                course_changes.push(h);
            }
        }
        for h in course_changes {
            let choice = self.random_range(0.0, 3.0) as i32 - 1;
            let timer = self.random_range(60.0, 180.0) as u32;
            if let Some(ufo) = self.ufos.get_mut(h) {
                ufo.vel.y = choice as f32 * ufo.vel.x.abs() * 0.6;
                ufo.course_timer = timer;
            }
        }
        for h in departed {
            log::debug!("UFO {:?} left the screen", h);
            self.ufos.kill(h);
            self.reset_ufo_timer();
        }
    }

    /// Apply controls to the ship and move it. Timers count down every
    /// tick; an exploded ship does not move.
    pub fn move_ship(&mut self, ship: Handle<Ship>, keys: &KeyState, dt: f32) {
        let Some(s) = self.ships.get_mut(ship) else {
            return;
        };
        s.fire_cooldown = s.fire_cooldown.saturating_sub(1);
        s.invulnerable_ticks = s.invulnerable_ticks.saturating_sub(1);
        if !s.is_active() {
            s.thrusting = false;
            return;
        }

        if keys.left {
            s.angle = rotate(s.angle, SHIP_TURN_RATE, dt);
        }
        if keys.right {
            s.angle = rotate(s.angle, -SHIP_TURN_RATE, dt);
        }

        let was_thrusting = s.thrusting;
        s.thrusting = keys.thrust;
        if keys.thrust {
            s.vel += heading(s.angle) * SHIP_THRUST * dt;
        }
        // Per-tick damping, scaled for slow motion
        s.vel *= SHIP_DAMPING.powf(dt / SIM_DT);
        if s.vel.length() > SHIP_MAX_SPEED {
            s.vel = s.vel.normalize() * SHIP_MAX_SPEED;
        }
        s.pos = advance(s.pos, s.vel, dt);

        if keys.thrust && !was_thrusting {
            self.emit(GameEvent::Thrust);
        }
    }
}
