/// WorldState: the complete snapshot of a running game.
///
/// ## Ownership
///
///   - `tiles` and `death_zones` come from the level and are never
///     mutated afterwards; the player and every enemy borrow `tiles`
///     read-only for collision.
///   - `player` lives for the whole level; death is a state, not removal.
///   - `enemies` shrinks when an enemy falls out of the world.
///
/// ## Camera / Viewport
///
/// World units are level pixels. The camera holds the
/// world-space top-left of the viewport; `apply` projects a world rect
/// into viewport space without touching the source.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{CombatConfig, GameConfig};
use crate::domain::entity::{Enemy, Player};
use crate::domain::geometry::Rect;
use crate::domain::particle::ParticlePool;
use crate::domain::tile::Tile;
use crate::sim::level::{parse_level, LevelDef};

#[derive(Clone, Debug)]
pub struct Camera {
    /// World X of the viewport's left edge.
    pub x: f32,
    /// World Y of the viewport's top edge.
    pub y: f32,
    pub view_w: u32,
    pub view_h: u32,
    pub level_w: u32,
    pub level_h: u32,
}

impl Camera {
    pub fn new(view_w: u32, view_h: u32, level_w: u32, level_h: u32) -> Self {
        Camera { x: 0.0, y: 0.0, view_w, view_h, level_w, level_h }
    }

    /// Viewport size changes with the terminal.
    pub fn resize(&mut self, view_w: u32, view_h: u32) {
        self.view_w = view_w;
        self.view_h = view_h;
    }

    /// Center on `target`, then clamp to the level. A level smaller than
    /// the viewport on an axis pins that axis to 0.
    pub fn update(&mut self, target: &Rect) {
        let (cx, cy) = target.center();
        self.x = clamp_axis(cx - self.view_w as f32 / 2.0, self.level_w, self.view_w);
        self.y = clamp_axis(cy - self.view_h as f32 / 2.0, self.level_h, self.view_h);
    }

    /// World rect → viewport rect. Pure.
    pub fn apply(&self, rect: &Rect) -> Rect {
        rect.offset(self.x, self.y)
    }

    /// Does `rect` intersect the viewport?
    pub fn sees(&self, rect: &Rect) -> bool {
        let view = Rect::new(self.x, self.y, self.view_w.max(1), self.view_h.max(1));
        view.overlaps(rect)
    }
}

fn clamp_axis(desired: f32, level: u32, view: u32) -> f32 {
    let max = level as f32 - view as f32;
    desired.min(max).max(0.0)
}

pub struct WorldState {
    // ── Level (read-only after load) ──
    pub level_name: String,
    pub tiles: Vec<Tile>,
    pub death_zones: Vec<Rect>,
    /// Pixel height; falling past it kills the player.
    pub level_h: u32,
    pub fallout_y: f32,

    // ── Entities ──
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub particles: ParticlePool,

    // ── Combat ──
    /// Frames left in the post-hit invulnerability window.
    pub invulnerable_timer: u32,
    pub combat: CombatConfig,
    pub respawn_delay: u32,

    // ── Meta ──
    pub camera: Camera,
    pub tick: u64,
    pub paused: bool,
    pub rng: StdRng,
}

// ── Construction ──

impl WorldState {
    pub fn new(def: &LevelDef, config: &GameConfig) -> Self {
        let layout = parse_level(&def.rows, config.level.tile_size);
        let (sx, sy) = layout.player_spawn.unwrap_or_else(|| {
            let [x, y] = config.level.default_spawn;
            log::warn!("level '{}' has no player spawn, using ({x}, {y})", def.name);
            (x, y)
        });

        let player = Player::new(sx, sy, &config.player, &config.sword);
        let enemies = layout.enemy_spawns.iter()
            .enumerate()
            .map(|(i, &(x, y))| Enemy::new(x, y, config.patrol_distance(i), &config.enemy))
            .collect();

        let mut camera = Camera::new(
            config.screen.viewport_width,
            config.screen.viewport_height,
            layout.width,
            layout.height,
        );
        camera.update(player.rect());

        log::info!(
            "level '{}': {} tiles, {} enemies, {} death zones, {}x{}",
            def.name, layout.tiles.len(), layout.enemy_spawns.len(),
            layout.death_zones.len(), layout.width, layout.height,
        );

        WorldState {
            level_name: def.name.clone(),
            tiles: layout.tiles,
            death_zones: layout.death_zones,
            level_h: layout.height,
            fallout_y: config.level.fallout_y,
            player,
            enemies,
            particles: ParticlePool::new(config.particles.capacity),
            invulnerable_timer: 0,
            combat: config.combat.clone(),
            respawn_delay: config.player.respawn_delay_frames,
            camera,
            tick: 0,
            paused: false,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_timer > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_at(x: f32, y: f32) -> Rect {
        Rect::new(x, y, 64, 64)
    }

    #[test]
    fn camera_centers_in_open_space() {
        let mut cam = Camera::new(640, 480, 3000, 2000);
        cam.update(&target_at(1000.0, 800.0));
        assert_eq!((cam.x, cam.y), (1032.0 - 320.0, 832.0 - 240.0));
    }

    #[test]
    fn camera_clamps_at_far_right() {
        let mut cam = Camera::new(640, 480, 2752, 448);
        cam.update(&target_at(2752.0 - 64.0, 100.0));
        assert_eq!(cam.x, (2752 - 640) as f32);
        cam.update(&target_at(5000.0, 100.0));
        assert_eq!(cam.x, (2752 - 640) as f32);
    }

    #[test]
    fn camera_clamps_at_origin() {
        let mut cam = Camera::new(640, 480, 2752, 2000);
        cam.update(&target_at(-300.0, -300.0));
        assert_eq!((cam.x, cam.y), (0.0, 0.0));
    }

    #[test]
    fn small_level_pins_to_zero() {
        // 14 rows × 32 = 448 < 480 viewport height.
        let mut cam = Camera::new(640, 480, 2752, 448);
        cam.update(&target_at(100.0, 400.0));
        assert_eq!(cam.y, 0.0);
    }

    #[test]
    fn apply_is_a_pure_projection() {
        let mut cam = Camera::new(640, 480, 3000, 3000);
        cam.update(&target_at(1000.0, 1000.0));
        let r = target_at(1000.0, 1000.0);
        let p = cam.apply(&r);
        assert_eq!((p.x, p.y), (1000.0 - cam.x, 1000.0 - cam.y));
        assert_eq!((p.w, p.h), (64, 64));
        assert_eq!(r, target_at(1000.0, 1000.0));
    }

    #[test]
    fn sees_only_the_viewport() {
        let cam = Camera::new(640, 480, 3000, 3000);
        assert!(cam.sees(&target_at(600.0, 400.0)));
        assert!(!cam.sees(&target_at(640.0, 0.0)));
    }

    #[test]
    fn world_from_embedded_level() {
        let cfg = GameConfig::default();
        let w = WorldState::new(&crate::sim::level::embedded_level(), &cfg);
        assert_eq!(w.enemies.len(), 3);
        let patrols: Vec<f32> = w.enemies.iter().map(|e| e.patrol_distance).collect();
        assert_eq!(patrols, vec![150.0, 200.0, 250.0]);
        assert_eq!(w.player.spawn, (224.0, 128.0));
        assert_eq!((w.camera.level_w, w.level_h), (86 * 32, 14 * 32));
    }

    #[test]
    fn missing_spawn_uses_default() {
        let cfg = GameConfig::default();
        let def = LevelDef { name: "flat".into(), rows: vec!["....".into(), "####".into()] };
        let w = WorldState::new(&def, &cfg);
        assert_eq!(w.player.spawn, (50.0, 50.0));
        assert!(w.enemies.is_empty());
    }
}
