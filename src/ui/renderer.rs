/// Terminal renderer for the platformer.
///
/// Each frame is composed into `front`, compared cell by cell against
/// `back` (what the terminal already shows), and only the differing cells
/// are queued. One flush per frame, then the buffers swap.
///
/// World units map to terminal cells through `cell_w` × `cell_h`
/// (16 × 32 by default, so a 32-unit tile is two columns by one row).
/// The renderer only reads a `FrameView`; it never touches the world.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::geometry::Rect;
use crate::domain::particle::Particle;
use crate::sim::view::{FrameView, SheetId, SpriteView};
use super::assets::AssetCache;

// ── Cells ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Night-sky background. Also used for `Clear`, so gaps between rows
    /// on VTE terminals match the cells.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Never composed, so a back buffer full of these repaints everything.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

/// Row-major grid of cells. Writes outside the grid are dropped.
struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(width: usize, height: usize) -> Self {
        FrameBuffer { width, height, cells: vec![Cell::BLANK; width * height] }
    }

    fn resize(&mut self, width: usize, height: usize) {
        if (width, height) != (self.width, self.height) {
            *self = FrameBuffer::new(width, height);
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        self.index(x, y).map_or(Cell::BLANK, |i| self.cells[i])
    }

    /// Foreground glyph only; keeps whatever background is already there.
    fn set_glyph(&mut self, x: usize, y: usize, ch: char, fg: Color) {
        if let Some(i) = self.index(x, y) {
            let cell = &mut self.cells[i];
            cell.ch = ch;
            cell.fg = fg;
        }
    }

    /// Background only; keeps the glyph already there.
    fn set_bg(&mut self, x: usize, y: usize, bg: Color) {
        if let Some(i) = self.index(x, y) {
            self.cells[i].bg = bg;
        }
    }

    /// One column per char, clipped at the right edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (cx, ch) in (x..self.width).zip(s.chars()) {
            self.set(cx, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Projection ──

/// A world rect in terminal cells. May hang off any edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct CellRect {
    col: i32,
    row: i32,
    w: i32,
    h: i32,
}

/// Viewport rect → cell rect relative to the map origin.
fn project(rect: &Rect, cell_w: u32, cell_h: u32) -> CellRect {
    let (cw, ch) = (cell_w.max(1) as f32, cell_h.max(1) as f32);
    CellRect {
        col: (rect.x / cw).floor() as i32,
        row: (rect.y / ch).floor() as i32,
        w: ((rect.w as f32 / cw).ceil() as i32).max(1),
        h: ((rect.h as f32 / ch).ceil() as i32).max(1),
    }
}

/// Glyph as seen in a mirror.
fn mirror_glyph(c: char) -> char {
    match c {
        '/' => '\\',
        '\\' => '/',
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '<' => '>',
        '>' => '<',
        other => other,
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb { r, g, b }
}

/// Run `setup`; when it fails, run `undo` before handing back the error.
fn setup_or_undo<S, T>(
    state: &mut S,
    setup: impl FnOnce(&mut S) -> io::Result<T>,
    undo: impl FnOnce(&mut S) -> io::Result<()>,
) -> io::Result<T> {
    setup(state).map_err(|e| {
        if let Err(undo_err) = undo(state) {
            log::warn!("terminal restore after failed init also failed: {undo_err}");
        }
        e
    })
}

// ── Renderer ──

/// Vertical layout
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;
/// HUD + message bar + help bar
const RESERVED_ROWS: usize = 3;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    cell_w: u32,
    cell_h: u32,
    /// Key release reporting was switched on at init.
    enhanced: bool,
}

impl Renderer {
    pub fn new(cell_w: u32, cell_h: u32) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
            enhanced: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the
    /// terminal will report key releases.
    /// If setup fails after raw mode is on, the terminal is restored
    /// before the error is returned.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        setup_or_undo(self, Renderer::enter_screen, Renderer::cleanup)
    }

    fn enter_screen(&mut self) -> io::Result<bool> {
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.set_size(tw as usize, th as usize);
        Ok(self.enhanced)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn set_size(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    fn map_rows(&self) -> usize {
        self.term_h.saturating_sub(RESERVED_ROWS).max(1)
    }

    /// Poll the terminal size. Returns the viewport in world units.
    pub fn sync_size(&mut self) -> io::Result<(u32, u32)> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.set_size(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }
        Ok(self.viewport())
    }

    pub fn viewport(&self) -> (u32, u32) {
        (
            self.term_w as u32 * self.cell_w,
            self.map_rows() as u32 * self.cell_h,
        )
    }

    pub fn render(&mut self, view: &FrameView, assets: &AssetCache, warnings: &[String]) -> io::Result<()> {
        self.compose(view, assets, warnings);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Queue every cell that differs from `back`, then flush once.
    fn flush_diff(&mut self) -> io::Result<()> {
        // ResetColor would fall back to the terminal's own default, not BASE_BG.
        let (mut fg, mut bg) = (Color::White, Cell::BASE_BG);
        queue!(self.writer, SetForegroundColor(fg), SetBackgroundColor(bg))?;

        // Where the terminal cursor sits after the last Print, if known.
        let mut cursor_at: Option<usize> = None;
        let width = self.front.width;

        for (i, (&cell, &shown)) in self.front.cells.iter().zip(&self.back.cells).enumerate() {
            if cell == shown {
                continue;
            }
            let (x, y) = (i % width, i / width);
            if cursor_at != Some(i) || x == 0 {
                queue!(self.writer, MoveTo(x as u16, y as u16))?;
            }
            if cell.fg != fg {
                fg = cell.fg;
                queue!(self.writer, SetForegroundColor(fg))?;
            }
            if cell.bg != bg {
                bg = cell.bg;
                queue!(self.writer, SetBackgroundColor(bg))?;
            }
            queue!(self.writer, Print(cell.ch))?;
            cursor_at = Some(i + 1);
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, view: &FrameView, assets: &AssetCache, warnings: &[String]) {
        self.front.clear();

        for tile in &view.tiles {
            self.compose_rect(view, tile, SheetId::Tile, 0, true, assets);
        }
        for enemy in &view.enemies {
            self.compose_sprite(view, enemy, assets);
        }
        self.compose_sprite(view, &view.player, assets);
        self.compose_sprite(view, &view.sword, assets);
        for p in &view.particles {
            self.compose_particle(view, p);
        }

        self.compose_hud(view);
        self.compose_message(warnings);
        self.compose_help();

        if view.paused {
            self.compose_pause_overlay();
        }
    }

    fn compose_sprite(&mut self, view: &FrameView, s: &SpriteView, assets: &AssetCache) {
        if s.visible {
            self.compose_rect(view, &s.rect, s.sheet, s.frame, s.facing_right, assets);
        }
    }

    /// Draw one sheet frame into the projected rect, clipped to the map.
    /// Placeholders (and sheets never loaded) fill the rect solid.
    fn compose_rect(
        &mut self,
        view: &FrameView,
        rect: &Rect,
        sheet: SheetId,
        frame: usize,
        facing_right: bool,
        assets: &AssetCache,
    ) {
        let cr = project(&view.camera.apply(rect), self.cell_w, self.cell_h);
        let map_rows = self.map_rows() as i32;
        let in_map = |col: i32, row: i32| col >= 0 && row >= 0 && row < map_rows;

        let sprite = assets.sheet(sheet);
        let rows = sprite.and_then(|s| s.frame(frame));
        let Some(rows) = rows else {
            let bg = rgb(sprite.map(|s| s.color).unwrap_or(sheet.placeholder_color()));
            for dy in 0..cr.h {
                for dx in 0..cr.w {
                    let (col, row) = (cr.col + dx, cr.row + dy);
                    if in_map(col, row) {
                        self.front.set_bg(col as usize, MAP_ROW + row as usize, bg);
                    }
                }
            }
            return;
        };

        let fg = rgb(sprite.map(|s| s.color).unwrap_or((255, 255, 255)));
        for (dy, line) in rows.iter().enumerate() {
            let glyphs: Vec<char> = if facing_right {
                line.chars().collect()
            } else {
                // Pad to the sprite width so mirroring keeps the anchor.
                let mut g: Vec<char> = line.chars().collect();
                g.resize(cr.w.max(g.len() as i32) as usize, ' ');
                g.into_iter().rev().map(mirror_glyph).collect()
            };
            for (dx, ch) in glyphs.into_iter().enumerate() {
                if ch == ' ' {
                    continue;
                }
                let (col, row) = (cr.col + dx as i32, cr.row + dy as i32);
                if in_map(col, row) {
                    self.front.set_glyph(col as usize, MAP_ROW + row as usize, ch, fg);
                }
            }
        }
    }

    fn compose_particle(&mut self, view: &FrameView, p: &Particle) {
        let dot = Rect::new(p.x, p.y, 1, 1);
        let cr = project(&view.camera.apply(&dot), self.cell_w, self.cell_h);
        if cr.col < 0 || cr.row < 0 || cr.row >= self.map_rows() as i32 {
            return;
        }
        let ch = if p.radius >= 3.5 { 'o' } else if p.radius >= 1.5 { '·' } else { '.' };
        self.front.set_glyph(cr.col as usize, MAP_ROW + cr.row as usize, ch, rgb(p.color));
    }

    fn compose_hud(&mut self, view: &FrameView) {
        self.front.fill_row(HUD_ROW, HUD_BG);

        const BAR: usize = 20;
        let max = view.max_health.max(1);
        let filled = (view.health.clamp(0, max) as usize * BAR) / max as usize;
        let bar: String = "█".repeat(filled) + &"░".repeat(BAR - filled);

        let status = if view.dead { "  ✝ FALLEN" } else { "" };
        let hud = format!(
            " MAGE KNIGHT │ {} │ HP {:>3}/{:<3} {}{} ",
            view.level_name, view.health.max(0), view.max_health, bar, status,
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    /// Most recent logged warning, if any.
    fn compose_message(&mut self, warnings: &[String]) {
        let row = MAP_ROW + self.map_rows();
        if row >= self.front.height {
            return;
        }
        if let Some(last) = warnings.last() {
            self.front.fill_row(row, MSG_BG);
            let msg = format!(" ◈ {last} ");
            self.front.put_str(0, row, &msg, Color::Black, MSG_BG);
        }
    }

    fn compose_help(&mut self) {
        let row = MAP_ROW + self.map_rows() + 1;
        if row >= self.front.height {
            return;
        }
        let help = " A/D ←/→:Move  Space/W ↑:Jump  J/Z:Sword  Tab:Keys  Esc/P:Pause  Q:Quit";
        self.front.put_str(0, row, help, Color::DarkGrey, Cell::BASE_BG);
    }

    fn compose_pause_overlay(&mut self) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let hdr = Color::Rgb { r: 255, g: 220, b: 50 };
        let key_c = Color::Rgb { r: 100, g: 200, b: 255 };

        let view_rows = self.map_rows();
        let box_w = 28_usize.min(self.term_w);
        let box_h = 7_usize.min(view_rows);
        let box_x = self.term_w.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + view_rows.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::new(' ', Color::White, dim));
            }
        }

        self.front.put_str(box_x + 4, box_y + 1, "╔══════════════════╗", hdr, dim);
        self.front.put_str(box_x + 4, box_y + 2, "║      PAUSED      ║", hdr, dim);
        self.front.put_str(box_x + 4, box_y + 3, "╚══════════════════╝", hdr, dim);
        self.front.put_str(box_x + 2, box_y + 5, "Esc/P Resume   Q Quit", key_c, dim);
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::config::GameConfig;
    use crate::sim::level::LevelDef;
    use crate::sim::world::{Camera, WorldState};

    fn renderer(w: usize, h: usize) -> Renderer {
        let mut r = Renderer::new(16, 32);
        r.set_size(w, h);
        r
    }

    fn row_text(r: &Renderer, y: usize) -> String {
        (0..r.front.width).map(|x| r.front.get(x, y).ch).collect()
    }

    fn view_of(rows: &[&str]) -> FrameView {
        let def = LevelDef {
            name: "render".into(),
            rows: rows.iter().map(|r| r.to_string()).collect(),
        };
        let w = WorldState::new(&def, &GameConfig::default());
        FrameView::capture(&w)
    }

    // ── Projection ──

    #[test]
    fn tile_is_two_columns_one_row() {
        let cr = project(&Rect::new(64.0, 32.0, 32, 32), 16, 32);
        assert_eq!(cr, CellRect { col: 4, row: 1, w: 2, h: 1 });
    }

    #[test]
    fn projection_follows_camera() {
        let mut cam = Camera::new(640, 480, 3000, 3000);
        cam.update(&Rect::new(1000.0, 1000.0, 64, 64));
        let on_screen = Rect::new(cam.x + 4.0, cam.y + 32.0, 64, 64);
        let cr = project(&cam.apply(&on_screen), 16, 32);
        assert_eq!((cr.col, cr.row), (0, 1));
        assert_eq!((cr.w, cr.h), (4, 2));
        let behind = Rect::new(cam.x - 40.0, cam.y, 32, 32);
        assert!(project(&cam.apply(&behind), 16, 32).col < 0);
    }

    #[test]
    fn mirroring_swaps_brackets() {
        let s: String = "/|>".chars().rev().map(mirror_glyph).collect();
        assert_eq!(s, "<|\\");
    }

    // ── Compose ──

    #[test]
    fn placeholder_tiles_fill_solid() {
        let mut r = renderer(40, 12);
        let view = view_of(&["S...", "....", "####"]);
        let dir = tempfile::tempdir().expect("tempdir");
        let mut assets = AssetCache::new(dir.path());
        assets.preload();
        r.compose(&view, &assets, &[]);
        // Row 2 of the level → map row 2.
        let cell = r.front.get(0, MAP_ROW + 2);
        assert_eq!(cell.bg, rgb(SheetId::Tile.placeholder_color()));
    }

    #[test]
    fn glyph_sheets_are_drawn_and_mirrored() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("tile.txt"), "[]\n").expect("write");
        fs::write(dir.path().join("player-idle.txt"), "ab/>\n").expect("write");
        let mut assets = AssetCache::new(dir.path());
        assets.preload();

        let mut r = renderer(40, 12);
        let mut view = view_of(&["S...", "....", "....", "####"]);
        r.compose(&view, &assets, &[]);
        assert!(row_text(&r, MAP_ROW + 3).starts_with("[][][][]"));
        assert!(row_text(&r, MAP_ROW).starts_with("ab/>"));

        view.player.facing_right = false;
        r.compose(&view, &assets, &[]);
        assert!(row_text(&r, MAP_ROW).starts_with("<\\ba"));
    }

    #[test]
    fn hud_shows_level_and_health() {
        let mut r = renderer(80, 12);
        let view = view_of(&["S...", "####"]);
        r.compose(&view, &AssetCache::default(), &[]);
        let hud = row_text(&r, HUD_ROW);
        assert!(hud.contains("render"));
        assert!(hud.contains("HP 100/100"));
    }

    #[test]
    fn latest_warning_on_message_bar() {
        let mut r = renderer(80, 12);
        let view = view_of(&["S...", "####"]);
        let warnings = vec!["old".to_string(), "sprite 'tile' missing".to_string()];
        r.compose(&view, &AssetCache::default(), &warnings);
        let msg = row_text(&r, MAP_ROW + r.map_rows());
        assert!(msg.contains("sprite 'tile' missing"));
        assert!(!msg.contains("old"));
    }

    #[test]
    fn pause_overlay() {
        let mut r = renderer(80, 20);
        let mut view = view_of(&["S...", "####"]);
        view.paused = true;
        r.compose(&view, &AssetCache::default(), &[]);
        assert!((0..r.front.height).any(|y| row_text(&r, y).contains("PAUSED")));
    }

    // ── Init ──

    #[derive(Default)]
    struct Term {
        raw: bool,
        undone: u32,
    }

    #[test]
    fn failed_setup_restores_terminal() {
        let mut term = Term { raw: true, undone: 0 };
        let result: io::Result<bool> = setup_or_undo(
            &mut term,
            |_| Err(io::Error::new(io::ErrorKind::Other, "no alternate screen")),
            |t| {
                t.raw = false;
                t.undone += 1;
                Ok(())
            },
        );
        assert!(result.is_err());
        assert!(!term.raw);
        assert_eq!(term.undone, 1);
    }

    #[test]
    fn successful_setup_is_not_undone() {
        let mut term = Term::default();
        let result = setup_or_undo(&mut term, |_| Ok(true), |t| {
            t.undone += 1;
            Ok(())
        });
        assert!(result.expect("setup succeeds"));
        assert_eq!(term.undone, 0);
    }

    #[test]
    fn viewport_tracks_terminal() {
        let r = renderer(80, 24);
        assert_eq!(r.viewport(), (80 * 16, 21 * 32));
    }
}
