//! Transient projectiles

use glam::Vec3;

use crate::core::config;
use crate::core::types::InstanceId;

/// A projectile in flight, owned by the world pool
///
/// Removed from the pool once its stopped flag is set.
#[derive(Debug, Clone)]
pub struct Bullet {
    item: InstanceId,
    pos: Vec3,
    vel: Vec3,
    traveled: f32,
    stopped: bool,
}

impl Bullet {
    /// Velocity is the normalized direction scaled by `speed`
    pub fn new(item: InstanceId, origin: Vec3, dir: Vec3, speed: f32) -> Self {
        Self {
            item,
            pos: origin,
            vel: dir.normalize_or_zero() * speed,
            traveled: 0.0,
            stopped: false,
        }
    }

    pub fn item(&self) -> InstanceId {
        self.item
    }

    pub fn position(&self) -> Vec3 {
        self.pos
    }

    pub fn velocity(&self) -> Vec3 {
        self.vel
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Collision response from the physics collaborator
    pub fn set_stopped(&mut self) {
        self.stopped = true;
    }

    /// Integrate `dt` milliseconds of flight
    pub fn tick(&mut self, dt: u64) {
        if self.stopped {
            return;
        }
        let step = self.vel * (dt as f32 / 1000.0);
        self.pos += step;
        self.traveled += step.length();
        if self.traveled > config::config().bullet_max_range {
            self.stopped = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_is_direction_times_speed() {
        let b = Bullet::new(1, Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), 100.0);
        assert!((b.velocity() - Vec3::new(0.0, 0.0, 100.0)).length() < 1e-4);
    }

    #[test]
    fn test_flight_stops_past_max_range() {
        let b0 = Bullet::new(1, Vec3::ZERO, Vec3::X, 1000.0);
        let mut b = b0.clone();
        b.tick(1000);
        assert!(!b.is_stopped());
        for _ in 0..20 {
            b.tick(1000);
        }
        assert!(b.is_stopped());
    }

    #[test]
    fn test_zero_direction_does_not_blow_up() {
        let mut b = Bullet::new(1, Vec3::ZERO, Vec3::ZERO, 100.0);
        b.tick(16);
        assert_eq!(b.position(), Vec3::ZERO);
    }
}
