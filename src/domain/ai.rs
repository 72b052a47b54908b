/// Enemy patrol AI.
///
/// An enemy walks at constant speed and turns around on three triggers,
/// evaluated in this order each frame (later ones override):
///
///   1. **Wall**  : the horizontal pass clamped against a solid tile.
///   2. **Ledge** : grounded, no wall hit, and the probe just ahead of
///                   the leading foot finds no solid tile.
///   3. **Patrol**: x left `[spawn_x - d, spawn_x + d]`; direction is
///                   forced back toward `spawn_x`.
///
/// The walk animation only runs while grounded. `update` returns false
/// once the enemy has fallen past the fallout line; the caller drops it.

use super::entity::{Enemy, Facing};
use super::geometry::Rect;
use super::tile::{overlaps_any, Tile};

const PROBE_WIDTH: u32 = 2;
const PROBE_HEIGHT: u32 = 5;

impl Enemy {
    pub fn update(&mut self, solids: &[Tile], fallout_y: f32) -> bool {
        self.body.vx = self.speed * self.direction.sign();
        let contacts = self.body.step(solids);

        if let Some(axis) = contacts.last_axis() {
            self.last_contact_axis = Some(axis);
        }
        self.on_platform = self.body.on_ground;

        if contacts.wall {
            self.direction = self.direction.reversed();
        } else if self.body.on_ground && !overlaps_any(&self.ledge_probe(), solids) {
            self.direction = self.direction.reversed();
        }

        let x = self.body.rect.x;
        if x > self.spawn_x + self.patrol_distance {
            self.direction = Facing::Left;
        } else if x < self.spawn_x - self.patrol_distance {
            self.direction = Facing::Right;
        }

        if self.body.on_ground {
            self.anim.advance(1.0);
        }

        self.body.rect.y <= fallout_y
    }

    /// Thin rectangle just below the floor line, `look_ahead` past the
    /// leading edge.
    pub fn ledge_probe(&self) -> Rect {
        let r = &self.body.rect;
        let x = match self.direction {
            Facing::Right => r.right() + self.look_ahead,
            Facing::Left => r.left() - self.look_ahead - PROBE_WIDTH as f32,
        };
        Rect::new(x, r.bottom(), PROBE_WIDTH, PROBE_HEIGHT)
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
