/// Kinematic body: the motion/collision layer shared by Player and Enemy.
///
/// ## Per-frame contract
///
///   1. GRAVITY    : `vy += gravity`, every frame, unconditionally.
///                    A grounded body sinks a fraction into the floor and
///                    is pushed back out by the vertical pass below.
///   2. HORIZONTAL : `x += vx`, then clamp against every overlapping
///                    solid tile (moving right → right edge to tile left,
///                    moving left → left edge to tile right).
///   3. VERTICAL   : `y += vy`, reset `on_ground`, clamp against every
///                    overlapping tile (falling → land, `vy = 0`,
///                    `on_ground = true`; rising → bump head, `vy = 0`).
///
/// Axes are resolved independently and in that order. Multiple overlaps
/// on one axis are clamped in tile order, so the last overlapping tile
/// wins. Tiles are grid aligned and per-frame steps are far smaller than
/// a tile, so double overlaps are rare. Corner clipping at grid seams is
/// a known artifact of this scheme and is left alone.

use super::geometry::Rect;
use super::tile::Tile;

/// Which axis a clamp happened on (diagnostic only).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// What `move_and_collide` ran into this frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Contacts {
    /// A solid tile stopped horizontal motion.
    pub wall: bool,
    /// Landed on a tile (falling).
    pub floor: bool,
    /// Hit a tile from below (rising).
    pub ceiling: bool,
}

impl Contacts {
    /// The axis most recently resolved with a clamp, if any.
    pub fn last_axis(&self) -> Option<Axis> {
        if self.floor || self.ceiling {
            Some(Axis::Vertical)
        } else if self.wall {
            Some(Axis::Horizontal)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug)]
pub struct KinematicBody {
    pub rect: Rect,
    pub vx: f32,
    pub vy: f32,
    pub on_ground: bool,
    /// Added to `vy` each frame.
    pub gravity: f32,
}

impl KinematicBody {
    pub fn new(x: f32, y: f32, w: u32, h: u32, gravity: f32) -> Self {
        KinematicBody {
            rect: Rect::new(x, y, w, h),
            vx: 0.0,
            vy: 0.0,
            on_ground: false,
            gravity,
        }
    }

    pub fn apply_gravity(&mut self) {
        self.vy += self.gravity;
    }

    /// Move by `(vx, vy)`, resolving each axis against `solids`.
    pub fn move_and_collide(&mut self, solids: &[Tile]) -> Contacts {
        let mut contacts = Contacts::default();

        // ── Horizontal pass ──
        self.rect.x += self.vx;
        for tile in solids {
            if !self.rect.overlaps(&tile.rect) { continue; }
            if self.vx > 0.0 {
                self.rect.set_right(tile.rect.left());
                contacts.wall = true;
            } else if self.vx < 0.0 {
                self.rect.x = tile.rect.right();
                contacts.wall = true;
            }
        }

        // ── Vertical pass ──
        self.rect.y += self.vy;
        self.on_ground = false;
        for tile in solids {
            if !self.rect.overlaps(&tile.rect) { continue; }
            if self.vy > 0.0 {
                self.rect.set_bottom(tile.rect.top());
                self.vy = 0.0;
                self.on_ground = true;
                contacts.floor = true;
            } else if self.vy < 0.0 {
                self.rect.y = tile.rect.bottom();
                self.vy = 0.0;
                contacts.ceiling = true;
            }
        }

        contacts
    }

    /// Gravity, then both collision passes.
    pub fn step(&mut self, solids: &[Tile]) -> Contacts {
        self.apply_gravity();
        self.move_and_collide(solids)
    }

    /// Put the body at `(x, y)` at rest.
    pub fn teleport(&mut self, x: f32, y: f32) {
        self.rect.x = x;
        self.rect.y = y;
        self.vx = 0.0;
        self.vy = 0.0;
        self.on_ground = false;
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::overlaps_any;

    fn body_at(x: f32, y: f32) -> KinematicBody {
        KinematicBody::new(x, y, 32, 32, 1.0)
    }

    fn floor(cols: std::ops::Range<i32>, row: i32) -> Vec<Tile> {
        cols.map(|c| Tile::new(c as f32 * 32.0, row as f32 * 32.0, 32)).collect()
    }

    // ── Vertical ──

    #[test]
    fn falling_body_lands_on_tile_top() {
        let tiles = vec![Tile::new(0.0, 64.0, 32)];
        let mut b = body_at(0.0, 30.0);
        b.vy = 4.0;
        let c = b.step(&tiles);
        assert_eq!(b.rect.bottom(), 64.0);
        assert_eq!(b.vy, 0.0);
        assert!(b.on_ground);
        assert!(c.floor);
        assert_eq!(c.last_axis(), Some(Axis::Vertical));
    }

    #[test]
    fn resting_body_stays_grounded() {
        let tiles = floor(0..4, 2);
        let mut b = body_at(16.0, 32.0);
        for _ in 0..10 {
            b.step(&tiles);
            assert!(b.on_ground);
            assert_eq!(b.rect.bottom(), 64.0);
        }
    }

    #[test]
    fn rising_body_bumps_head() {
        let tiles = vec![Tile::new(0.0, 0.0, 32)];
        let mut b = body_at(0.0, 40.0);
        b.gravity = 0.0;
        b.vy = -20.0;
        let c = b.move_and_collide(&tiles);
        assert_eq!(b.rect.top(), 32.0);
        assert_eq!(b.vy, 0.0);
        assert!(!b.on_ground);
        assert!(c.ceiling);
    }

    #[test]
    fn free_fall_accumulates_gravity() {
        let mut b = body_at(0.0, 0.0);
        for _ in 0..3 { b.step(&[]); }
        assert_eq!(b.vy, 3.0);
        assert_eq!(b.rect.y, 6.0);
        assert!(!b.on_ground);
    }

    // ── Horizontal ──

    #[test]
    fn moving_right_clamps_to_tile_left_regardless_of_gap() {
        for gap in [0.5_f32, 1.0, 3.0, 7.5] {
            let wall = vec![Tile::new(32.0 + gap, 0.0, 32)];
            let mut b = body_at(0.0, 0.0);
            b.gravity = 0.0;
            b.vx = 8.0;
            let c = b.move_and_collide(&wall);
            assert_eq!(b.rect.right(), wall[0].rect.left(), "gap {gap}");
            assert!(c.wall);
        }
    }

    #[test]
    fn moving_left_clamps_to_tile_right() {
        let wall = vec![Tile::new(0.0, 0.0, 32)];
        let mut b = body_at(35.0, 0.0);
        b.gravity = 0.0;
        b.vx = -4.0;
        b.move_and_collide(&wall);
        assert_eq!(b.rect.left(), 32.0);
    }

    #[test]
    fn walking_along_floor_is_not_a_wall() {
        let tiles = floor(0..6, 2);
        let mut b = body_at(0.0, 32.0);
        b.vx = 4.0;
        let c = b.step(&tiles);
        assert!(!c.wall);
        assert_eq!(b.rect.x, 4.0);
        assert!(b.on_ground);
    }

    #[test]
    fn no_overlap_remains_after_resolution() {
        let mut tiles = floor(0..8, 4);
        tiles.push(Tile::new(160.0, 96.0, 32));
        // Standing on the floor, walking into the block.
        let mut b = body_at(100.0, 96.0);
        b.vx = 4.0;
        for _ in 0..60 {
            b.step(&tiles);
            assert!(!overlaps_any(&b.rect, &tiles));
        }
        assert_eq!(b.rect.right(), 160.0);
        assert_eq!(b.rect.bottom(), 128.0);
        assert!(b.on_ground);
    }

    #[test]
    fn zero_velocity_inside_tile_is_left_alone() {
        let tiles = vec![Tile::new(0.0, 0.0, 32)];
        let mut b = body_at(8.0, 8.0);
        b.gravity = 0.0;
        let c = b.move_and_collide(&tiles);
        assert_eq!(c, Contacts::default());
        assert_eq!(b.rect.x, 8.0);
    }

    #[test]
    fn teleport_resets_motion() {
        let mut b = body_at(0.0, 0.0);
        b.vx = 3.0;
        b.vy = -7.0;
        b.on_ground = true;
        b.teleport(50.0, 60.0);
        assert_eq!((b.rect.x, b.rect.y, b.vx, b.vy), (50.0, 60.0, 0.0, 0.0));
        assert!(!b.on_ground);
    }
}
