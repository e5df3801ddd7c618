//! Entity creation: asteroid fields and splits, bullets, UFOs, particles
//!
//! Every spawn goes through a fixed-capacity pool. A full pool drops the
//! spawn; nothing else is disturbed.

use glam::Vec2;

use super::arena::Handle;
use super::session::{asteroid_count_for_level, asteroid_speed_mult};
use super::state::{
    Asteroid, AsteroidSize, Bullet, BulletOwner, Game, GameEvent, Particle, ParticleKind, Ship,
    Ufo, UfoKind,
};
use crate::consts::*;
use crate::{angle_of, heading, normalize_degrees, toroidal_delta, toroidal_distance, wrap_point};

/// Minimum distance between the ship and a freshly spawned asteroid
const SAFE_SPAWN_DISTANCE: f32 = 25.0;

impl Game {
    /// Build an asteroid of `size` drifting along `direction` (degrees)
    pub fn make_asteroid(&mut self, size: AsteroidSize, pos: Vec2, direction: f32) -> Asteroid {
        let jitter = self.random_range(0.8, 1.2);
        let speed = size.base_speed() * asteroid_speed_mult(self.level) * jitter;
        Asteroid {
            pos: wrap_point(pos),
            vel: heading(direction) * speed,
            angle: self.random_range(0.0, 360.0),
            spin: self.random_range(-90.0, 90.0),
            size,
            shape_seed: self.random_u32(),
        }
    }

    pub fn spawn_asteroid(&mut self, asteroid: Asteroid) -> Option<Handle<Asteroid>> {
        let handle = self.asteroids.spawn(asteroid);
        if handle.is_none() {
            log::trace!("Asteroid pool full, spawn dropped");
        }
        handle
    }

    /// Scatter `count` large asteroids away from the world centre
    pub fn spawn_asteroid_field(&mut self, count: usize) {
        let centre = self
            .player_ship()
            .map(|s| s.pos)
            .unwrap_or(Vec2::new(X_AXIS / 2.0, Y_AXIS / 2.0));
        for _ in 0..count {
            let mut pos = self.random_point();
            // Bounded retries; a crowded field just accepts the last roll
            for _ in 0..16 {
                if toroidal_distance(pos, centre) >= SAFE_SPAWN_DISTANCE {
                    break;
                }
                pos = self.random_point();
            }
            let direction = self.random_range(0.0, 360.0);
            let asteroid = self.make_asteroid(AsteroidSize::Large, pos, direction);
            self.spawn_asteroid(asteroid);
        }
    }

    /// Queue the children of a destroyed asteroid. They diverge from the
    /// parent's heading on alternating sides.
    pub(crate) fn split_asteroid(&mut self, parent: &Asteroid) {
        let Some(child_size) = parent.size.child() else {
            return;
        };
        let base = if parent.vel.length_squared() > 0.0 {
            angle_of(parent.vel)
        } else {
            self.random_range(0.0, 360.0)
        };
        for i in 0..ASTEROID_SPLIT_COUNT {
            let side = if i % 2 == 0 { 1.0 } else { -1.0 };
            let offset = self.random_range(20.0, 60.0) * side;
            let direction = normalize_degrees(base + offset);
            let child = self.make_asteroid(child_size, parent.pos, direction);
            self.pending_asteroids.push(child);
        }
    }

    /// Spawn queued split children, dropping whatever does not fit
    pub(crate) fn flush_pending_asteroids(&mut self) {
        let pending = std::mem::take(&mut self.pending_asteroids);
        let mut dropped = 0;
        for asteroid in pending {
            if self.asteroids.spawn(asteroid).is_none() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            log::debug!("Asteroid pool full, dropped {} split children", dropped);
        }
    }

    /// Drifting asteroids, and nothing else, for the title and high-score screens
    pub fn build_demo_objects(&mut self) {
        self.asteroids.clear();
        self.pending_asteroids.clear();
        self.bullets.clear();
        self.ufos.clear();
        self.particles.clear();
        let sizes = [
            AsteroidSize::Large,
            AsteroidSize::Large,
            AsteroidSize::Medium,
            AsteroidSize::Medium,
            AsteroidSize::Small,
            AsteroidSize::Small,
        ];
        for size in sizes {
            let pos = self.random_point();
            let direction = self.random_range(0.0, 360.0);
            let asteroid = self.make_asteroid(size, pos, direction);
            self.spawn_asteroid(asteroid);
        }
    }

    /// Fire a bullet from the ship's nose. Returns false if the ship cannot
    /// fire (exploded, cooling down, or the bullet pool is full).
    pub fn ship_fire(&mut self, ship: Handle<Ship>) -> bool {
        let Some(s) = self.ships.get(ship) else {
            return false;
        };
        if !s.is_active() || s.fire_cooldown > 0 {
            return false;
        }
        let dir = heading(s.angle);
        let bullet = Bullet {
            pos: wrap_point(s.pos + dir * SHIP_RADIUS),
            vel: dir * BULLET_SPEED + s.vel,
            range: BULLET_RANGE,
            max_range: BULLET_RANGE,
            owner: BulletOwner::Ship(ship),
        };
        if self.bullets.spawn(bullet).is_none() {
            return false;
        }
        if let Some(s) = self.ships.get_mut(ship) {
            s.fire_cooldown = SHIP_FIRE_COOLDOWN_TICKS;
        }
        self.emit(GameEvent::ShipFire);
        true
    }

    /// Fire at the player (or anywhere, if there is no live ship)
    pub fn ufo_fire(&mut self, ufo: Handle<Ufo>) -> bool {
        let Some(u) = self.ufos.get(ufo) else {
            return false;
        };
        let (origin, kind) = (u.pos, u.kind);
        let target = self.player_ship().filter(|s| s.is_active()).map(|s| s.pos);
        let aim = match target {
            Some(target) => {
                let spread = kind.aim_spread();
                angle_of(toroidal_delta(origin, target)) + self.random_range(-spread, spread)
            }
            None => self.random_range(0.0, 360.0),
        };
        let dir = heading(aim);
        let bullet = Bullet {
            pos: wrap_point(origin + dir * kind.radius()),
            vel: dir * UFO_BULLET_SPEED,
            range: UFO_BULLET_RANGE,
            max_range: UFO_BULLET_RANGE,
            owner: BulletOwner::Ufo(ufo),
        };
        if self.bullets.spawn(bullet).is_none() {
            return false;
        }
        self.emit(GameEvent::UfoFire);
        true
    }

    /// Launch a UFO from a random side; small UFOs get likelier each level
    pub fn spawn_ufo(&mut self) -> Option<Handle<Ufo>> {
        let small_chance = (0.15 * self.level as f32).min(0.85);
        let kind = if self.random_bool(small_chance) {
            UfoKind::Small
        } else {
            UfoKind::Large
        };
        let from_left = self.random_bool(0.5);
        let speed = match kind {
            UfoKind::Large => UFO_SPEED,
            UfoKind::Small => UFO_SPEED * 1.3,
        };
        let ufo = Ufo {
            pos: Vec2::new(
                if from_left { 0.0 } else { X_AXIS - 0.01 },
                self.random_range(0.0, Y_AXIS),
            ),
            vel: Vec2::new(if from_left { speed } else { -speed }, 0.0),
            kind,
            hp: kind.hit_points(),
            fire_timer: kind.fire_interval(),
            course_timer: self.random_range(60.0, 180.0) as u32,
            travel_left: X_AXIS,
        };
        let handle = self.ufos.spawn(ufo);
        match handle {
            Some(h) => {
                log::debug!("{:?} UFO spawned {:?} at level {}", kind, h, self.level);
                self.emit(GameEvent::UfoAppear);
            }
            None => log::trace!("UFO already on screen, spawn dropped"),
        }
        handle
    }

    /// Burst of spinning hull fragments
    pub fn create_debris(&mut self, pos: Vec2, vel: Vec2, count: usize) {
        for _ in 0..count {
            let dir = heading(self.random_range(0.0, 360.0));
            let speed = self.random_range(3.0, 12.0);
            let particle = Particle {
                pos,
                vel: vel * 0.5 + dir * speed,
                angle: self.random_range(0.0, 360.0),
                spin: self.random_range(-180.0, 180.0),
                life: (DEBRIS_LIFE as f32 * self.random_range(0.5, 1.0)) as u32,
                kind: ParticleKind::Debris,
            };
            if self.particles.spawn(particle).is_none() {
                break;
            }
        }
    }

    /// Sparks fanned between two headings (degrees)
    pub fn create_sparks(
        &mut self,
        pos: Vec2,
        count: usize,
        min_angle: f32,
        max_angle: f32,
        max_speed: f32,
    ) {
        for _ in 0..count {
            let angle = self.random_range(min_angle, max_angle);
            let speed = self.random_range(max_speed * 0.3, max_speed);
            let particle = Particle {
                pos,
                vel: heading(angle) * speed,
                angle: normalize_degrees(angle),
                spin: 0.0,
                life: (SPARK_LIFE as f32 * self.random_range(0.5, 1.0)) as u32,
                kind: ParticleKind::Spark,
            };
            if self.particles.spawn(particle).is_none() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::HighScores;
    use crate::settings::Settings;

    fn empty_game() -> Game {
        let mut g = Game::new(Settings::default(), HighScores::new());
        g.asteroids.clear();
        g
    }

    fn large_at(g: &mut Game, pos: Vec2) -> Asteroid {
        g.make_asteroid(AsteroidSize::Large, pos, 0.0)
    }

    #[test]
    fn test_split_large_yields_two_divergent_mediums() {
        let mut g = empty_game();
        let parent = large_at(&mut g, Vec2::new(30.0, 30.0));
        g.split_asteroid(&parent);
        g.flush_pending_asteroids();

        let children: Vec<_> = g.asteroids.values().cloned().collect();
        assert_eq!(children.len(), ASTEROID_SPLIT_COUNT);
        for child in &children {
            assert_eq!(child.size, AsteroidSize::Medium);
            assert!(child.vel.length() > 0.0);
            assert_eq!(child.pos, parent.pos);
        }
        assert!(children[0].vel.angle_to(children[1].vel).abs() > 0.1);
    }

    #[test]
    fn test_split_small_yields_nothing() {
        let mut g = empty_game();
        let parent = g.make_asteroid(AsteroidSize::Small, Vec2::new(5.0, 5.0), 0.0);
        g.split_asteroid(&parent);
        assert!(g.pending_asteroids.is_empty());
    }

    #[test]
    fn test_split_overflow_drops_children() {
        let mut g = empty_game();
        for _ in 0..MAX_ASTEROIDS - 1 {
            let a = large_at(&mut g, Vec2::new(10.0, 10.0));
            g.spawn_asteroid(a).unwrap();
        }
        let parent = large_at(&mut g, Vec2::new(50.0, 50.0));
        g.split_asteroid(&parent);
        g.flush_pending_asteroids();
        assert_eq!(g.asteroids.len(), MAX_ASTEROIDS);
        assert!(g.pending_asteroids.is_empty());
    }

    #[test]
    fn test_asteroid_field_keeps_clear_of_centre() {
        let mut g = empty_game();
        g.spawn_asteroid_field(asteroid_count_for_level(1));
        assert_eq!(g.asteroids.len(), STARTING_ASTEROIDS);
        let centre = Vec2::new(X_AXIS / 2.0, Y_AXIS / 2.0);
        assert!(
            g.asteroids
                .values()
                .all(|a| toroidal_distance(a.pos, centre) >= SAFE_SPAWN_DISTANCE)
        );
    }

    #[test]
    fn test_ship_fire_respects_cooldown_and_capacity() {
        let mut g = empty_game();
        let ship = g.ships.spawn(Ship::new()).unwrap();
        assert!(g.ship_fire(ship));
        assert!(!g.ship_fire(ship), "cooldown blocks second shot");
        assert_eq!(g.bullets.len(), 1);
        assert_eq!(g.drain_events(), vec![GameEvent::ShipFire]);

        while g.bullets.len() < MAX_BULLETS {
            g.ships.get_mut(ship).unwrap().fire_cooldown = 0;
            assert!(g.ship_fire(ship));
        }
        g.ships.get_mut(ship).unwrap().fire_cooldown = 0;
        assert!(!g.ship_fire(ship), "full pool drops the shot");
        assert_eq!(g.bullets.len(), MAX_BULLETS);
    }

    #[test]
    fn test_small_ufo_aims_near_ship() {
        let mut g = empty_game();
        let ship = g.ships.spawn(Ship::new()).unwrap();
        g.player = Some(ship);
        let ufo = g
            .ufos
            .spawn(Ufo {
                pos: Vec2::new(10.0, 50.0),
                vel: Vec2::ZERO,
                kind: UfoKind::Small,
                hp: 1,
                fire_timer: 0,
                course_timer: 0,
                travel_left: X_AXIS,
            })
            .unwrap();
        assert!(g.ufo_fire(ufo));
        let (_, bullet) = g.bullets.iter().next().unwrap();
        let aim = angle_of(bullet.vel);
        // Ship is due +x of the UFO
        let err = aim.min(360.0 - aim);
        assert!(err <= UfoKind::Small.aim_spread() + 1e-3, "aim error {err}");
        assert_eq!(bullet.owner, BulletOwner::Ufo(ufo));
    }

    #[test]
    fn test_spawn_ufo_single_slot() {
        let mut g = empty_game();
        assert!(g.spawn_ufo().is_some());
        assert!(g.spawn_ufo().is_none());
        assert_eq!(g.ufos.len(), 1);
    }

    #[test]
    fn test_particles_stop_at_capacity() {
        let mut g = empty_game();
        g.create_debris(Vec2::ZERO, Vec2::ZERO, MAX_PARTICLES + 20);
        assert_eq!(g.particles.len(), MAX_PARTICLES);
        g.create_sparks(Vec2::ZERO, 5, 0.0, 90.0, 20.0);
        assert_eq!(g.particles.len(), MAX_PARTICLES);
    }
}
