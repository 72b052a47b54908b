/// Axis-aligned rectangles in world units.
///
/// Position is the top-left corner and may be fractional (bodies move by
/// float velocities). Width and height are positive integers.
///
/// Overlap is strict: two rectangles that only share an edge do NOT
/// overlap. A body resting exactly on a tile's top edge is therefore not
/// colliding with it, which is what keeps the horizontal pass quiet while
/// walking along the floor.

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: u32, h: u32) -> Self {
        debug_assert!(w > 0 && h > 0, "rect must have positive size");
        Rect { x, y, w, h }
    }

    #[inline]
    pub fn width(&self) -> f32 { self.w as f32 }
    #[inline]
    pub fn height(&self) -> f32 { self.h as f32 }

    #[inline]
    pub fn left(&self) -> f32 { self.x }
    #[inline]
    pub fn right(&self) -> f32 { self.x + self.width() }
    #[inline]
    pub fn top(&self) -> f32 { self.y }
    #[inline]
    pub fn bottom(&self) -> f32 { self.y + self.height() }

    #[inline]
    pub fn center_x(&self) -> f32 { self.x + self.width() / 2.0 }
    #[inline]
    pub fn center_y(&self) -> f32 { self.y + self.height() / 2.0 }

    pub fn center(&self) -> (f32, f32) {
        (self.center_x(), self.center_y())
    }

    /// Move so the right edge sits at `x`.
    #[inline]
    pub fn set_right(&mut self, x: f32) { self.x = x - self.width(); }
    /// Move so the bottom edge sits at `y`.
    #[inline]
    pub fn set_bottom(&mut self, y: f32) { self.y = y - self.height(); }

    pub fn set_center(&mut self, cx: f32, cy: f32) {
        self.x = cx - self.width() / 2.0;
        self.y = cy - self.height() / 2.0;
    }

    /// Strict interior overlap (shared edges do not count).
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Same size, shifted by `(-dx, -dy)`.
    pub fn offset(&self, dx: f32, dy: f32) -> Rect {
        Rect { x: self.x - dx, y: self.y - dy, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_follow_size() {
        let r = Rect::new(10.0, 20.0, 32, 16);
        assert_eq!(r.right(), 42.0);
        assert_eq!(r.bottom(), 36.0);
        assert_eq!(r.center(), (26.0, 28.0));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 32, 32);
        let right = Rect::new(32.0, 0.0, 32, 32);
        let below = Rect::new(0.0, 32.0, 32, 32);
        assert!(!a.overlaps(&right));
        assert!(!a.overlaps(&below));
    }

    #[test]
    fn fractional_intrusion_overlaps() {
        let a = Rect::new(0.0, 0.5, 32, 32);
        let below = Rect::new(0.0, 32.0, 32, 32);
        assert!(a.overlaps(&below));
        assert!(below.overlaps(&a));
    }

    #[test]
    fn set_edges_keep_size() {
        let mut r = Rect::new(0.0, 0.0, 64, 64);
        r.set_right(100.0);
        r.set_bottom(50.0);
        assert_eq!(r, Rect::new(36.0, -14.0, 64, 64));
    }

    #[test]
    fn offset_is_pure() {
        let r = Rect::new(100.0, 50.0, 64, 64);
        let moved = r.offset(30.0, 10.0);
        assert_eq!(moved, Rect::new(70.0, 40.0, 64, 64));
        assert_eq!(r.x, 100.0);
    }
}
