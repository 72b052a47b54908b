/// Level grid cells and the static solid tiles they produce.
/// Cell semantics are centralized here; the parser only walks the grid.

use super::geometry::Rect;

/// One character of a level row.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cell {
    Empty,
    Solid,        // '#'
    DeathZone,    // 'X'
    PlayerSpawn,  // 'S'
    EnemySpawn,   // 'E'
}

impl Cell {
    /// Any unrecognized character is empty space.
    pub fn from_char(ch: char) -> Cell {
        match ch {
            '#' => Cell::Solid,
            'X' => Cell::DeathZone,
            'S' => Cell::PlayerSpawn,
            'E' => Cell::EnemySpawn,
            _ => Cell::Empty,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Empty
    }
}

/// A static solid rectangle. Immutable after level load.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Tile {
    pub rect: Rect,
}

impl Tile {
    pub fn new(x: f32, y: f32, size: u32) -> Self {
        Tile { rect: Rect::new(x, y, size, size) }
    }
}

/// Does `rect` overlap any solid tile?
pub fn overlaps_any(rect: &Rect, solids: &[Tile]) -> bool {
    solids.iter().any(|t| t.rect.overlaps(rect))
}
