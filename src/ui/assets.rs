/// Sprite cache: loading and sharing glyph sprite sheets.
///
/// Sheets live in `<assets_dir>/<name>.txt`:
///
///   ```text
///   color: 200,220,255
///   ---
///    o
///   /|\
///   ---
///    o
///   /|>
///   ```
///
/// An optional `color: r,g,b` header, then frames separated by `---`
/// lines. Each sheet is read once; every later request for the same name
/// returns the same `Arc`. A sheet that can't be read is replaced by a
/// solid placeholder, logged once.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use log::warn;

use crate::sim::view::SheetId;

/// Shared, immutable sheet handle.
pub type SpriteHandle = Arc<Sprite>;

#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    /// Glyph rows per frame. Empty for a placeholder.
    pub frames: Vec<Vec<String>>,
    pub color: (u8, u8, u8),
}

impl Sprite {
    pub fn placeholder(color: (u8, u8, u8)) -> Self {
        Sprite { frames: Vec::new(), color }
    }

    /// Frame `index`, wrapping around short sheets.
    pub fn frame(&self, index: usize) -> Option<&[String]> {
        if self.frames.is_empty() {
            return None;
        }
        Some(&self.frames[index % self.frames.len()])
    }
}

/// Parse a sheet. `None` if it has no frames at all.
pub fn parse_sprite(text: &str, default_color: (u8, u8, u8)) -> Option<Sprite> {
    let mut color = default_color;
    let mut frames = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rgb) = line.strip_prefix("color:") {
            if let Some(c) = parse_rgb(rgb) {
                color = c;
            }
            continue;
        }
        if line.trim() == "---" {
            if !current.is_empty() {
                frames.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(line.to_string());
    }
    if !current.is_empty() {
        frames.push(current);
    }

    // Drop blank-only frames (e.g. a trailing newline after the header).
    frames.retain(|f: &Vec<String>| f.iter().any(|row| !row.trim().is_empty()));
    if frames.is_empty() {
        return None;
    }
    Some(Sprite { frames, color })
}

fn parse_rgb(s: &str) -> Option<(u8, u8, u8)> {
    let mut parts = s.split(',').map(|p| p.trim().parse::<u8>());
    let r = parts.next()?.ok()?;
    let g = parts.next()?.ok()?;
    let b = parts.next()?.ok()?;
    Some((r, g, b))
}

#[derive(Debug, Default)]
pub struct AssetCache {
    base_dir: PathBuf,
    sprites: HashMap<String, SpriteHandle>,
}

impl AssetCache {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        AssetCache {
            base_dir: base_dir.into(),
            sprites: HashMap::new(),
        }
    }

    /// Cached handle for `name`, reading the file on first use.
    pub fn load_image(&mut self, name: &str) -> Option<SpriteHandle> {
        if let Some(sprite) = self.sprites.get(name) {
            return Some(Arc::clone(sprite));
        }
        let path = self.base_dir.join(format!("{name}.txt"));
        let text = fs::read_to_string(&path).ok()?;
        let sprite = Arc::new(parse_sprite(&text, (255, 255, 255))?);
        self.sprites.insert(name.to_string(), Arc::clone(&sprite));
        Some(sprite)
    }

    /// Like `load_image`, but a failure yields a cached solid placeholder.
    pub fn image_or_placeholder(&mut self, name: &str, color: (u8, u8, u8)) -> SpriteHandle {
        if let Some(sprite) = self.load_image(name) {
            return sprite;
        }
        warn!("sprite '{name}' not found in {}, using a placeholder", self.base_dir.display());
        let sprite = Arc::new(Sprite::placeholder(color));
        self.sprites.insert(name.to_string(), Arc::clone(&sprite));
        sprite
    }

    /// Load every sheet up front.
    pub fn preload(&mut self) {
        for sheet in SheetId::ALL {
            self.image_or_placeholder(sheet.asset_name(), sheet.placeholder_color());
        }
    }

    pub fn sheet(&self, sheet: SheetId) -> Option<&SpriteHandle> {
        self.sprites.get(sheet.asset_name())
    }
}
