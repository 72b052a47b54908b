/// FrameView: the read-only surface handed to the renderer each frame.
///
/// Everything is in world units; the renderer projects with `camera`.
/// Capturing never mutates the world.

use crate::domain::entity::{AttackState, Facing, MoveState, Skin};
use crate::domain::geometry::Rect;
use crate::domain::particle::Particle;
use super::world::{Camera, WorldState};

/// Blink half-period while invulnerable, in frames.
const BLINK_FRAMES: u32 = 5;

/// Which sprite sheet a drawable uses.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SheetId {
    PlayerIdle(Skin),
    PlayerMoving(Skin),
    SwordIdle,
    SwordAttack,
    EnemyWalk,
    Tile,
}

impl SheetId {
    /// Every sheet, loaded up front. Demon slots included.
    pub const ALL: [SheetId; 8] = [
        SheetId::PlayerIdle(Skin::Normal),
        SheetId::PlayerMoving(Skin::Normal),
        SheetId::PlayerIdle(Skin::Demon),
        SheetId::PlayerMoving(Skin::Demon),
        SheetId::SwordIdle,
        SheetId::SwordAttack,
        SheetId::EnemyWalk,
        SheetId::Tile,
    ];

    /// Asset file stem under the assets dir.
    pub fn asset_name(self) -> &'static str {
        match self {
            SheetId::PlayerIdle(Skin::Normal) => "player-idle",
            SheetId::PlayerMoving(Skin::Normal) => "player-moving",
            SheetId::PlayerIdle(Skin::Demon) => "demon-idle",
            SheetId::PlayerMoving(Skin::Demon) => "demon-moving",
            SheetId::SwordIdle => "sword-idle",
            SheetId::SwordAttack => "sword-attack",
            SheetId::EnemyWalk => "enemy-walk",
            SheetId::Tile => "tile",
        }
    }

    /// Placeholder colour when the sheet can't be loaded.
    pub fn placeholder_color(self) -> (u8, u8, u8) {
        match self {
            SheetId::PlayerIdle(_) | SheetId::PlayerMoving(_) => (255, 255, 255),
            SheetId::SwordIdle | SheetId::SwordAttack => (255, 0, 0),
            SheetId::EnemyWalk => (255, 0, 0),
            SheetId::Tile => (100, 100, 100),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteView {
    pub rect: Rect,
    pub sheet: SheetId,
    pub frame: usize,
    pub facing_right: bool,
    pub visible: bool,
}

#[derive(Clone, Debug)]
pub struct FrameView {
    pub camera: Camera,
    pub level_name: String,
    pub player: SpriteView,
    pub sword: SpriteView,
    pub enemies: Vec<SpriteView>,
    /// Only tiles intersecting the viewport.
    pub tiles: Vec<Rect>,
    pub particles: Vec<Particle>,
    pub health: i32,
    pub max_health: i32,
    pub dead: bool,
    pub paused: bool,
}

impl FrameView {
    pub fn capture(world: &WorldState) -> Self {
        let cam = &world.camera;
        let p = &world.player;

        let blink_on = (world.invulnerable_timer / BLINK_FRAMES) % 2 == 0;
        let player = SpriteView {
            rect: *p.rect(),
            sheet: match p.move_state {
                MoveState::Idle => SheetId::PlayerIdle(p.skin),
                MoveState::Moving => SheetId::PlayerMoving(p.skin),
            },
            frame: p.anim.frame,
            facing_right: p.facing == Facing::Right,
            visible: !p.dead && (!world.is_invulnerable() || blink_on),
        };

        let sword = SpriteView {
            rect: p.sword.rect,
            sheet: match p.sword.state {
                AttackState::Idle => SheetId::SwordIdle,
                AttackState::Attacking => SheetId::SwordAttack,
            },
            frame: p.sword.anim.frame,
            facing_right: player.facing_right,
            visible: player.visible,
        };

        let enemies = world.enemies.iter()
            .filter(|e| cam.sees(e.rect()))
            .map(|e| SpriteView {
                rect: *e.rect(),
                sheet: SheetId::EnemyWalk,
                frame: e.anim.frame,
                facing_right: e.is_facing_right(),
                visible: true,
            })
            .collect();

        FrameView {
            camera: cam.clone(),
            level_name: world.level_name.clone(),
            player,
            sword,
            enemies,
            tiles: world.tiles.iter().map(|t| t.rect).filter(|r| cam.sees(r)).collect(),
            particles: world.particles.iter().copied().collect(),
            health: p.health,
            max_health: p.max_health,
            dead: p.dead,
            paused: world.paused,
        }
    }
}
