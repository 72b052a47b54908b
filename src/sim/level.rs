/// Level grid parsing and loading.
///
/// ## Sources (priority order):
///   1. `general.level_file` from config, if set and readable
///   2. The built-in embedded level
///
/// ## File format (`.txt`):
///   `;` lines are comments; the first one is the level name.
///   Every other non-empty line is a grid row. Rows may differ in length
///   and are not padded.
///
/// ## Tile legend:
///   '#' = Solid tile     'X' = Death zone
///   'S' = Player spawn   'E' = Enemy spawn
///   anything else = Empty
///
/// Parsing is one pass, top-to-bottom, left-to-right. With several `S`
/// markers the last one wins.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::config::GameConfig;
use crate::domain::geometry::Rect;
use crate::domain::tile::{Cell, Tile};

/// Everything the grid describes, in world units.
#[derive(Clone, Debug, Default)]
pub struct LevelLayout {
    pub tiles: Vec<Tile>,
    pub player_spawn: Option<(f32, f32)>,
    /// In grid order.
    pub enemy_spawns: Vec<(f32, f32)>,
    pub death_zones: Vec<Rect>,
    /// Longest row × tile size.
    pub width: u32,
    /// Row count × tile size.
    pub height: u32,
}

/// A named grid, before parsing.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read level file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level file {path} has no grid rows")]
    Empty { path: PathBuf },
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

pub fn parse_level<S: AsRef<str>>(rows: &[S], tile_size: u32) -> LevelLayout {
    let ts = tile_size as f32;
    let mut layout = LevelLayout::default();
    let mut widest = 0usize;

    for (row, line) in rows.iter().enumerate() {
        let line = line.as_ref();
        widest = widest.max(line.chars().count());
        for (col, ch) in line.chars().enumerate() {
            let (x, y) = (col as f32 * ts, row as f32 * ts);
            match Cell::from_char(ch) {
                Cell::Solid => layout.tiles.push(Tile::new(x, y, tile_size)),
                Cell::DeathZone => layout.death_zones.push(Rect::new(x, y, tile_size, tile_size)),
                Cell::PlayerSpawn => layout.player_spawn = Some((x, y)),
                Cell::EnemySpawn => layout.enemy_spawns.push((x, y)),
                Cell::Empty => {}
            }
        }
    }

    layout.width = widest as u32 * tile_size;
    layout.height = rows.len() as u32 * tile_size;
    layout
}

/// Split a level file into name and rows.
pub fn parse_level_text(text: &str, fallback_name: &str) -> LevelDef {
    let mut name = None;
    let mut rows = Vec::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(comment) = line.strip_prefix(';') {
            if name.is_none() {
                name = Some(comment.trim().to_string());
            }
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        rows.push(line.to_string());
    }
    LevelDef {
        name: name.filter(|n| !n.is_empty()).unwrap_or_else(|| fallback_name.to_string()),
        rows,
    }
}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

pub fn read_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let text = fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Untitled");
    let def = parse_level_text(&text, stem);
    if def.rows.is_empty() {
        return Err(LevelError::Empty { path: path.to_path_buf() });
    }
    Ok(def)
}

/// The configured level file, or the embedded level if there is none or
/// it can't be used.
pub fn load_level_def(config: &GameConfig) -> LevelDef {
    if let Some(path) = &config.level_file {
        match read_level_file(path) {
            Ok(def) => {
                info!("loaded level '{}' from {}", def.name, path.display());
                return def;
            }
            Err(e) => warn!("{e}; using the built-in level"),
        }
    }
    embedded_level()
}

pub fn embedded_level() -> LevelDef {
    LevelDef {
        name: EMBEDDED_NAME.to_string(),
        rows: EMBEDDED_ROWS.iter().map(|r| r.to_string()).collect(),
    }
}

const EMBEDDED_NAME: &str = "The Long Road";

const EMBEDDED_ROWS: [&str; 14] = [
    "......................................................................................",
    "......................................................................................",
    "......................................................................................",
    "......................................................................................",
    ".......S......####.......#######............................####......................",
    "......................................................................................",
    "......####....########################.........E..............................E.....",
    "......................................................................................",
    "..............#####...........................................####....................",
    "......................................................................................",
    "#####..............E...............####...............................................",
    "######...........................####...............................................",
    "#######################....#####################........##########################",
    "XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX",
];

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
