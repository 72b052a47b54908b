/// Player rules: what one frame of input does to the player.
///
/// ## Frame order
///
///   1. Dead players are frozen (the orchestrator owns respawn timing).
///   2. Horizontal velocity is exactly `-speed`, `+speed` or `0` from the
///      pressed actions (right wins over left). A knockback impulse
///      therefore lasts one frame.
///   3. Jump sets `vy = jump_speed` only when `on_ground` is already true.
///   4. Attack starts a sword swing if the sword is idle.
///   5. Kinematic step (gravity, horizontal pass, vertical pass).
///   6. Animation clock; on each tick while moving and grounded, a
///      footstep particle point is reported, plus a footstep cue when the
///      cadence allows one.
///   7. Sword follows the player and runs its swing.
///
/// The update never touches health; damage is external.

use super::entity::{Action, Controls, Facing, Footstep, MoveState, Player};
use super::tile::Tile;

/// Side effects of one player update, consumed by the orchestrator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerFrame {
    pub jumped: bool,
    pub swung: bool,
    /// Bottom-center of the body on a footstep animation tick.
    pub dust_at: Option<(f32, f32)>,
    pub footstep: Option<Footstep>,
}

impl Player {
    pub fn update(&mut self, controls: &dyn Controls, solids: &[Tile], dt_ms: f32) -> PlayerFrame {
        let mut frame = PlayerFrame::default();
        if self.dead {
            return frame;
        }

        self.read_movement(controls);

        if controls.is_pressed(Action::Jump) && self.body.on_ground {
            self.body.vy = self.jump_speed;
            frame.jumped = true;
        }

        if controls.is_pressed(Action::Attack) && self.sword.attack() {
            frame.swung = true;
        }

        self.body.step(solids);

        self.footsteps.elapse(dt_ms);
        if self.anim.advance(dt_ms)
            && self.move_state == MoveState::Moving
            && self.body.on_ground
        {
            let r = &self.body.rect;
            frame.dust_at = Some((r.center_x(), r.bottom()));
            frame.footstep = self.footsteps.try_step();
        }

        self.sword.update(&self.body.rect, self.facing, dt_ms);
        frame
    }

    /// Both directions held: right is read last and wins.
    fn read_movement(&mut self, controls: &dyn Controls) {
        self.body.vx = 0.0;
        self.move_state = MoveState::Idle;
        if controls.is_pressed(Action::MoveLeft) {
            self.body.vx = -self.speed;
            self.facing = Facing::Left;
            self.move_state = MoveState::Moving;
        }
        if controls.is_pressed(Action::MoveRight) {
            self.body.vx = self.speed;
            self.facing = Facing::Right;
            self.move_state = MoveState::Moving;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::{Action::*, AttackState, FrameInput};

    const DT: f32 = 1000.0 / 60.0;

    /// Floor of 20 tiles on row 4 (y = 128); player standing on it.
    fn grounded() -> (Player, Vec<Tile>) {
        let cfg = GameConfig::default();
        let tiles: Vec<Tile> = (0..20).map(|c| Tile::new(c as f32 * 32.0, 128.0, 32)).collect();
        let mut p = Player::new(100.0, 64.0, &cfg.player, &cfg.sword);
        p.update(&FrameInput::default(), &tiles, DT);
        assert!(p.body.on_ground);
        (p, tiles)
    }

    fn airborne() -> Player {
        let cfg = GameConfig::default();
        Player::new(100.0, 0.0, &cfg.player, &cfg.sword)
    }

    // ── Horizontal ──

    #[test]
    fn velocity_is_instantaneous() {
        let (mut p, tiles) = grounded();
        p.update(&FrameInput::pressing(&[MoveRight]), &tiles, DT);
        assert_eq!(p.body.vx, 4.0);
        assert_eq!(p.facing, Facing::Right);
        assert_eq!(p.move_state, MoveState::Moving);
        p.update(&FrameInput::pressing(&[MoveLeft]), &tiles, DT);
        assert_eq!(p.body.vx, -4.0);
        assert_eq!(p.facing, Facing::Left);
        p.update(&FrameInput::default(), &tiles, DT);
        assert_eq!(p.body.vx, 0.0);
        assert_eq!(p.move_state, MoveState::Idle);
    }

    #[test]
    fn right_wins_over_left() {
        let (mut p, tiles) = grounded();
        p.update(&FrameInput::pressing(&[MoveLeft, MoveRight]), &tiles, DT);
        assert_eq!(p.body.vx, 4.0);
        assert_eq!(p.facing, Facing::Right);
        assert_eq!(p.move_state, MoveState::Moving);
    }

    #[test]
    fn input_overrides_knockback_next_frame() {
        let (mut p, tiles) = grounded();
        p.apply_knockback(-1.0, 10.0, -8.0);
        p.update(&FrameInput::pressing(&[MoveRight]), &tiles, DT);
        assert_eq!(p.body.vx, 4.0);

        p.apply_knockback(1.0, 10.0, -8.0);
        p.update(&FrameInput::default(), &tiles, DT);
        assert_eq!(p.body.vx, 0.0);
    }

    // ── Jump ──

    #[test]
    fn jump_from_ground() {
        let (mut p, tiles) = grounded();
        let f = p.update(&FrameInput::pressing(&[Jump]), &tiles, DT);
        assert!(f.jumped);
        // Jump impulse plus one frame of gravity.
        assert_eq!(p.body.vy, -19.0);
        assert!(!p.body.on_ground);
    }

    #[test]
    fn jump_ignored_in_air() {
        let mut p = airborne();
        p.body.vy = 3.0;
        let f = p.update(&FrameInput::pressing(&[Jump]), &[], DT);
        assert!(!f.jumped);
        assert_eq!(p.body.vy, 4.0);
    }

    #[test]
    fn no_double_jump() {
        let (mut p, tiles) = grounded();
        p.update(&FrameInput::pressing(&[Jump]), &tiles, DT);
        let vy = p.body.vy;
        let f = p.update(&FrameInput::pressing(&[Jump]), &tiles, DT);
        assert!(!f.jumped);
        assert_eq!(p.body.vy, vy + 1.0);
    }

    // ── Attack ──

    #[test]
    fn attack_starts_once_per_swing() {
        let (mut p, tiles) = grounded();
        let f = p.update(&FrameInput::pressing(&[Attack]), &tiles, DT);
        assert!(f.swung);
        assert_eq!(p.sword.state, AttackState::Attacking);
        let f = p.update(&FrameInput::pressing(&[Attack]), &tiles, DT);
        assert!(!f.swung);
    }

    #[test]
    fn swing_finishes_then_can_restart() {
        let (mut p, tiles) = grounded();
        p.update(&FrameInput::pressing(&[Attack]), &tiles, DT);
        // 6 frames at 15 fps = 400 ms, plus slack.
        for _ in 0..40 {
            p.update(&FrameInput::default(), &tiles, DT);
        }
        assert_eq!(p.sword.state, AttackState::Idle);
        let f = p.update(&FrameInput::pressing(&[Attack]), &tiles, DT);
        assert!(f.swung);
    }

    // ── Footsteps ──

    #[test]
    fn footsteps_only_while_walking_on_ground() {
        let (mut p, tiles) = grounded();
        let mut dust = 0;
        let mut cues = 0;
        for _ in 0..120 {
            let f = p.update(&FrameInput::pressing(&[MoveRight]), &tiles, DT);
            if f.dust_at.is_some() { dust += 1; }
            if f.footstep.is_some() { cues += 1; }
        }
        // Two seconds at 6 fps animation.
        assert!(dust >= 10, "dust {dust}");
        assert!(cues >= 1 && cues <= dust);

        let (mut p, tiles) = grounded();
        for _ in 0..120 {
            let f = p.update(&FrameInput::default(), &tiles, DT);
            assert!(f.dust_at.is_none());
        }
    }

    #[test]
    fn dust_spawns_at_feet() {
        let (mut p, tiles) = grounded();
        let mut first = None;
        for _ in 0..60 {
            let f = p.update(&FrameInput::pressing(&[MoveRight]), &tiles, DT);
            if let Some(at) = f.dust_at {
                first = Some((at, p.rect().center_x(), p.rect().bottom()));
                break;
            }
        }
        let ((x, y), cx, bottom) = first.expect("a footstep within a second");
        assert_eq!((x, y), (cx, bottom));
    }

    // ── Lifecycle ──

    #[test]
    fn dead_player_is_frozen() {
        let mut p = airborne();
        p.die();
        let before = p.body.rect;
        let f = p.update(&FrameInput::pressing(&[MoveRight, Jump]), &[], DT);
        assert_eq!(f, PlayerFrame::default());
        assert_eq!(p.body.rect, before);
    }

    #[test]
    fn update_never_changes_health() {
        let (mut p, tiles) = grounded();
        p.health = 42;
        for _ in 0..30 {
            p.update(&FrameInput::pressing(&[MoveRight, Attack]), &tiles, DT);
        }
        assert_eq!(p.health, 42);
    }
}
