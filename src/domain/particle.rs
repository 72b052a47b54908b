/// Footstep dust: short-lived cosmetic particles kicked up at the
/// player's feet. Purely visual; nothing collides with them.
///
/// The pool has a fixed capacity. Spawning into a full pool evicts the
/// oldest particle, and expired particles are dropped every frame, so the
/// pool never grows past `capacity`.

use std::collections::VecDeque;

use rand::Rng;

pub const DUST_COLOR: (u8, u8, u8) = (200, 200, 200);
const SHRINK_PER_FRAME: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    /// Frames left.
    pub lifetime: u32,
    pub color: (u8, u8, u8),
}

impl Particle {
    /// A dust puff at `(x, y)` with randomized size, life and drift.
    pub fn dust(x: f32, y: f32, rng: &mut impl Rng) -> Self {
        Particle {
            x,
            y,
            vx: rng.gen_range(-1.0..=1.0),
            vy: rng.gen_range(-1.0..=1.0),
            radius: rng.gen_range(2..=5) as f32,
            lifetime: rng.gen_range(20..=50),
            color: DUST_COLOR,
        }
    }

    fn tick(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        self.radius -= SHRINK_PER_FRAME;
        self.lifetime = self.lifetime.saturating_sub(1);
    }

    pub fn is_alive(&self) -> bool {
        self.lifetime > 0 && self.radius > 0.0
    }
}

#[derive(Clone, Debug)]
pub struct ParticlePool {
    particles: VecDeque<Particle>,
    capacity: usize,
}

impl ParticlePool {
    pub fn new(capacity: usize) -> Self {
        ParticlePool {
            particles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn spawn(&mut self, particle: Particle) {
        if self.capacity == 0 {
            return;
        }
        if self.particles.len() == self.capacity {
            self.particles.pop_front();
        }
        self.particles.push_back(particle);
    }

    /// Advance every particle one frame, dropping the dead ones.
    pub fn update(&mut self) {
        for p in self.particles.iter_mut() {
            p.tick();
        }
        self.particles.retain(Particle::is_alive);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn puff(lifetime: u32) -> Particle {
        Particle { x: 0.0, y: 0.0, vx: 1.0, vy: -0.5, radius: 3.0, lifetime, color: DUST_COLOR }
    }

    #[test]
    fn dust_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = Particle::dust(10.0, 20.0, &mut rng);
            assert!((2.0..=5.0).contains(&p.radius));
            assert!((20..=50).contains(&p.lifetime));
            assert!((-1.0..=1.0).contains(&p.vx));
            assert!((-1.0..=1.0).contains(&p.vy));
            assert_eq!((p.x, p.y), (10.0, 20.0));
            assert_eq!(p.color, DUST_COLOR);
        }
    }

    #[test]
    fn full_pool_evicts_oldest() {
        let mut pool = ParticlePool::new(3);
        for life in [10, 11, 12, 13] {
            pool.spawn(puff(life));
        }
        assert_eq!(pool.iter().count(), 3);
        let lives: Vec<u32> = pool.iter().map(|p| p.lifetime).collect();
        assert_eq!(lives, vec![11, 12, 13]);
    }

    #[test]
    fn update_moves_shrinks_and_expires() {
        let mut pool = ParticlePool::new(8);
        pool.spawn(puff(2));
        pool.spawn(puff(40));
        pool.update();
        let first = pool.iter().next().copied().expect("still alive");
        assert_eq!((first.x, first.y), (1.0, -0.5));
        assert!((first.radius - 2.9).abs() < 1e-5);
        pool.update();
        assert_eq!(pool.iter().count(), 1);
    }

    #[test]
    fn shrinking_to_nothing_expires() {
        let mut pool = ParticlePool::new(4);
        pool.spawn(puff(1000));
        for _ in 0..31 {
            pool.update();
        }
        assert_eq!(pool.iter().count(), 0);
    }

    #[test]
    fn zero_capacity_holds_nothing() {
        let mut pool = ParticlePool::new(0);
        pool.spawn(puff(5));
        assert_eq!(pool.iter().count(), 0);
    }
}
