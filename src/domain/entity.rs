/// Entities: Player (with its Sword) and Enemy, plus the small state
/// machines and clocks they share. Per-frame behavior lives in
/// `rules` (player) and `ai` (enemy); lifecycle transitions that other
/// systems trigger (knockback, damage, death, respawn) live here.

use crate::config::{EnemyConfig, PlayerConfig, SwordConfig};

use super::geometry::Rect;
use super::physics::{Axis, KinematicBody};

/// Animation frames per sheet.
pub const PLAYER_FRAMES: usize = 6;
pub const SWORD_FRAMES: usize = 6;
pub const ENEMY_FRAMES: usize = 2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// -1 for Left, +1 for Right.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn reversed(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveState {
    Idle,
    Moving,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AttackState {
    Idle,
    Attacking,
}

/// Visual skin. `Demon` has asset slots but nothing selects it yet.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Skin {
    Normal,
    Demon,
}

// ══════════════════════════════════════════════════════════════
// Input capability
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
    Attack,
}

/// The only way the core reads input. Level-sensed: "is it down now?"
pub trait Controls {
    fn is_pressed(&self, action: Action) -> bool;
}

/// A plain snapshot of pressed actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
    pub attack: bool,
}

impl FrameInput {
    #[cfg(test)]
    pub fn pressing(actions: &[Action]) -> Self {
        let mut input = FrameInput::default();
        for a in actions {
            match a {
                Action::MoveLeft => input.move_left = true,
                Action::MoveRight => input.move_right = true,
                Action::Jump => input.jump = true,
                Action::Attack => input.attack = true,
            }
        }
        input
    }

    /// Freeze any `Controls` into a snapshot for one step.
    pub fn sample(controls: &dyn Controls) -> Self {
        FrameInput {
            move_left: controls.is_pressed(Action::MoveLeft),
            move_right: controls.is_pressed(Action::MoveRight),
            jump: controls.is_pressed(Action::Jump),
            attack: controls.is_pressed(Action::Attack),
        }
    }
}

impl Controls for FrameInput {
    fn is_pressed(&self, action: Action) -> bool {
        match action {
            Action::MoveLeft => self.move_left,
            Action::MoveRight => self.move_right,
            Action::Jump => self.jump,
            Action::Attack => self.attack,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Animation clock
// ══════════════════════════════════════════════════════════════

/// Cycles `frame` through `0..frames` every `interval` units.
/// Units are whatever the owner feeds `advance` (milliseconds for the
/// player and sword, frames for enemies).
#[derive(Clone, Debug)]
pub struct AnimClock {
    pub frame: usize,
    pub frames: usize,
    pub elapsed: f32,
    pub interval: f32,
}

impl AnimClock {
    pub fn new(frames: usize, interval: f32) -> Self {
        AnimClock { frame: 0, frames, elapsed: 0.0, interval }
    }

    /// Accumulate time. Returns true on the tick that advanced the frame.
    pub fn advance(&mut self, amount: f32) -> bool {
        self.elapsed += amount;
        if self.elapsed >= self.interval {
            self.elapsed = 0.0;
            self.frame = (self.frame + 1) % self.frames.max(1);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.frame = 0;
        self.elapsed = 0.0;
    }
}

// ══════════════════════════════════════════════════════════════
// Footstep cadence
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FootSide {
    Left,
    Right,
}

/// One footstep cue: side plus one of three variants.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Footstep {
    pub side: FootSide,
    pub variant: u8,
}

impl Footstep {
    pub fn clip_name(&self) -> String {
        let side = match self.side {
            FootSide::Left => 'l',
            FootSide::Right => 'r',
        };
        format!("footstep-{}{}", side, self.variant)
    }
}

pub const FOOTSTEP_VARIANTS: u8 = 3;

/// Alternates L/R; the variant advances after each right step.
/// Cues closer together than `interval_ms` are swallowed.
#[derive(Clone, Debug)]
pub struct FootstepCadence {
    pub side: FootSide,
    pub variant: u8,
    since_last_ms: f32,
    interval_ms: f32,
}

impl FootstepCadence {
    pub fn new(interval_ms: f32) -> Self {
        FootstepCadence {
            side: FootSide::Left,
            variant: 0,
            since_last_ms: f32::INFINITY,
            interval_ms,
        }
    }

    pub fn elapse(&mut self, dt_ms: f32) {
        self.since_last_ms += dt_ms;
    }

    pub fn try_step(&mut self) -> Option<Footstep> {
        if self.since_last_ms <= self.interval_ms {
            return None;
        }
        let step = Footstep { side: self.side, variant: self.variant };
        match self.side {
            FootSide::Left => self.side = FootSide::Right,
            FootSide::Right => {
                self.side = FootSide::Left;
                self.variant = (self.variant + 1) % FOOTSTEP_VARIANTS;
            }
        }
        self.since_last_ms = 0.0;
        Some(step)
    }
}

// ══════════════════════════════════════════════════════════════
// Sword
// ══════════════════════════════════════════════════════════════

/// The player's melee weapon. Rides at a fixed offset from the player's
/// center; the horizontal offset mirrors with facing.
#[derive(Clone, Debug)]
pub struct Sword {
    pub rect: Rect,
    pub x_offset: f32,
    pub y_offset: f32,
    pub state: AttackState,
    pub anim: AnimClock,
}

impl Sword {
    pub fn new(owner: &Rect, cfg: &SwordConfig) -> Self {
        let mut sword = Sword {
            rect: Rect::new(owner.x, owner.y, cfg.size, cfg.size),
            x_offset: cfg.x_offset,
            y_offset: cfg.y_offset,
            state: AttackState::Idle,
            anim: AnimClock::new(SWORD_FRAMES, 1000.0 / cfg.animation_fps),
        };
        sword.follow(owner, Facing::Right);
        sword
    }

    pub fn is_attacking(&self) -> bool {
        self.state == AttackState::Attacking
    }

    /// Start a swing. Returns false (no-op) while a swing is running.
    pub fn attack(&mut self) -> bool {
        if self.is_attacking() {
            return false;
        }
        self.state = AttackState::Attacking;
        self.anim.reset();
        true
    }

    pub fn follow(&mut self, owner: &Rect, facing: Facing) {
        let (cx, cy) = owner.center();
        self.rect.set_center(cx + self.x_offset * facing.sign(), cy + self.y_offset);
    }

    /// Reposition, then run the swing through all frames back to Idle.
    pub fn update(&mut self, owner: &Rect, facing: Facing, dt_ms: f32) {
        self.follow(owner, facing);
        if !self.is_attacking() {
            return;
        }
        self.anim.elapsed += dt_ms;
        if self.anim.elapsed >= self.anim.interval {
            self.anim.elapsed = 0.0;
            self.anim.frame += 1;
            if self.anim.frame >= SWORD_FRAMES {
                self.state = AttackState::Idle;
                self.anim.frame = 0;
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Player {
    pub body: KinematicBody,
    /// Fixed at construction.
    pub spawn: (f32, f32),
    pub health: i32,
    pub max_health: i32,
    pub facing: Facing,
    pub move_state: MoveState,
    pub skin: Skin,
    pub dead: bool,
    /// Frames spent dead; the orchestrator decides when to respawn.
    pub respawn_timer: u32,
    pub sword: Sword,
    pub anim: AnimClock,
    pub footsteps: FootstepCadence,
    pub speed: f32,
    pub jump_speed: f32,
}

impl Player {
    pub fn new(x: f32, y: f32, cfg: &PlayerConfig, sword: &SwordConfig) -> Self {
        let body = KinematicBody::new(x, y, cfg.width, cfg.height, cfg.gravity);
        let sword = Sword::new(&body.rect, sword);
        Player {
            body,
            spawn: (x, y),
            health: cfg.max_health,
            max_health: cfg.max_health,
            facing: Facing::Right,
            move_state: MoveState::Idle,
            skin: Skin::Normal,
            dead: false,
            respawn_timer: 0,
            sword,
            anim: AnimClock::new(PLAYER_FRAMES, 1000.0 / cfg.animation_fps),
            footsteps: FootstepCadence::new(cfg.footstep_interval_ms),
            speed: cfg.speed,
            jump_speed: cfg.jump_speed,
        }
    }

    pub fn rect(&self) -> &Rect {
        &self.body.rect
    }

    /// Overwrite velocity with a knockback impulse.
    /// `direction` is ±1; the invulnerability window belongs to the caller.
    pub fn apply_knockback(&mut self, direction: f32, force_x: f32, force_y: f32) {
        self.body.vx = direction * force_x;
        self.body.vy = force_y;
        self.body.on_ground = false;
    }

    /// Subtract health, clamped at 0. Returns true if health is now 0.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.health = (self.health - amount).clamp(0, self.max_health);
        self.health == 0
    }

    /// Enter the dead state. Idempotent: returns false if already dead.
    pub fn die(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.respawn_timer = 0;
        true
    }

    /// Back to the spawn point at rest with full health.
    pub fn respawn(&mut self) {
        let (x, y) = self.spawn;
        self.body.teleport(x, y);
        self.dead = false;
        self.respawn_timer = 0;
        self.health = self.max_health;
        self.move_state = MoveState::Idle;
        self.sword.state = AttackState::Idle;
        self.sword.anim.reset();
        self.sword.follow(&self.body.rect, self.facing);
    }
}

// ══════════════════════════════════════════════════════════════
// Enemy
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Enemy {
    pub body: KinematicBody,
    /// Patrol origin.
    pub spawn_x: f32,
    /// Max horizontal excursion from `spawn_x`.
    pub patrol_distance: f32,
    /// Walking direction; also the facing.
    pub direction: Facing,
    pub speed: f32,
    /// Ledge probe distance ahead of the leading edge.
    pub look_ahead: f32,
    pub anim: AnimClock,
    // ── Diagnostics (not authoritative) ──
    pub last_contact_axis: Option<Axis>,
    pub on_platform: bool,
}

impl Enemy {
    pub fn new(x: f32, y: f32, patrol_distance: f32, cfg: &EnemyConfig) -> Self {
        Enemy {
            body: KinematicBody::new(x, y, cfg.width, cfg.height, cfg.gravity),
            spawn_x: x,
            patrol_distance,
            direction: Facing::Right,
            speed: cfg.speed,
            look_ahead: cfg.look_ahead,
            anim: AnimClock::new(ENEMY_FRAMES, cfg.animation_ticks as f32),
            last_contact_axis: None,
            on_platform: false,
        }
    }

    pub fn rect(&self) -> &Rect {
        &self.body.rect
    }

    pub fn is_facing_right(&self) -> bool {
        self.direction == Facing::Right
    }

    /// Stateless overlap test against the player's body.
    pub fn touches(&self, player: &Player) -> bool {
        self.body.rect.overlaps(player.rect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn player() -> Player {
        let cfg = GameConfig::default();
        Player::new(100.0, 50.0, &cfg.player, &cfg.sword)
    }

    // ── AnimClock ──

    #[test]
    fn anim_clock_wraps() {
        let mut c = AnimClock::new(3, 10.0);
        let ticks: Vec<bool> = (0..4).map(|_| c.advance(10.0)).collect();
        assert_eq!(ticks, vec![true, true, true, true]);
        assert_eq!(c.frame, 1);
        assert!(!c.advance(4.0));
        assert_eq!(c.frame, 1);
    }

    // ── Footsteps ──

    #[test]
    fn footsteps_alternate_and_cycle_variants() {
        let mut f = FootstepCadence::new(300.0);
        let mut names = vec![];
        for _ in 0..7 {
            let s = f.try_step().expect("interval elapsed");
            names.push(s.clip_name());
            f.elapse(301.0);
        }
        assert_eq!(names, vec![
            "footstep-l0", "footstep-r0",
            "footstep-l1", "footstep-r1",
            "footstep-l2", "footstep-r2",
            "footstep-l0",
        ]);
    }

    #[test]
    fn footsteps_are_rate_limited() {
        let mut f = FootstepCadence::new(300.0);
        assert!(f.try_step().is_some());
        f.elapse(166.0);
        assert!(f.try_step().is_none());
        f.elapse(166.0);
        assert!(f.try_step().is_some());
    }

    // ── Sword ──

    #[test]
    fn sword_offset_mirrors_with_facing() {
        let p = player();
        let mut s = p.sword.clone();
        let (cx, cy) = p.rect().center();
        s.follow(p.rect(), Facing::Right);
        assert_eq!(s.rect.center(), (cx + 20.0, cy + 5.0));
        s.follow(p.rect(), Facing::Left);
        assert_eq!(s.rect.center(), (cx - 20.0, cy + 5.0));
    }

    #[test]
    fn swing_runs_six_frames_then_idles() {
        let p = player();
        let mut s = p.sword.clone();
        assert!(s.attack());
        assert!(!s.attack(), "second press during swing is a no-op");
        let interval = s.anim.interval;
        let mut seen = vec![s.anim.frame];
        for _ in 0..5 {
            s.update(p.rect(), Facing::Right, interval);
            seen.push(s.anim.frame);
            assert!(s.is_attacking());
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
        s.update(p.rect(), Facing::Right, interval);
        assert_eq!(s.state, AttackState::Idle);
        assert_eq!(s.anim.frame, 0);
        assert!(s.attack());
    }

    // ── Player lifecycle ──

    #[test]
    fn knockback_overwrites_velocity() {
        let mut p = player();
        p.body.vx = 4.0;
        p.body.vy = 3.0;
        p.body.on_ground = true;
        p.apply_knockback(-1.0, 10.0, -8.0);
        assert_eq!((p.body.vx, p.body.vy), (-10.0, -8.0));
        assert!(!p.body.on_ground);
    }

    #[test]
    fn damage_clamps_at_zero() {
        let mut p = player();
        assert!(!p.take_damage(1));
        assert_eq!(p.health, 99);
        assert!(p.take_damage(500));
        assert_eq!(p.health, 0);
    }

    #[test]
    fn die_is_idempotent() {
        let mut p = player();
        assert!(p.die());
        p.respawn_timer = 7;
        assert!(!p.die());
        assert_eq!(p.respawn_timer, 7);
    }

    #[test]
    fn respawn_resets_to_spawn() {
        let mut p = player();
        p.body.rect.x = 900.0;
        p.body.rect.y = 300.0;
        p.body.vx = 4.0;
        p.body.vy = 12.0;
        p.take_damage(100);
        p.die();
        p.respawn();
        assert_eq!((p.body.rect.x, p.body.rect.y), (100.0, 50.0));
        assert_eq!((p.body.vx, p.body.vy), (0.0, 0.0));
        assert!(!p.dead);
        assert_eq!(p.health, p.max_health);
    }

    // ── Enemy ──

    #[test]
    fn enemy_touch_is_pure_overlap() {
        let cfg = GameConfig::default();
        let mut p = player();
        let e = Enemy::new(120.0, 60.0, 150.0, &cfg.enemy);
        assert!(e.touches(&p));
        p.body.rect.x = 400.0;
        assert!(!e.touches(&p));
        assert_eq!(e.body.rect.x, 120.0);
    }
}
