/// The step function: advances the world by one frame.
///
/// Processing order:
///   1. Player: respawn countdown while dead, otherwise input + physics
///   2. Death checks: death zones (not gated by invulnerability), then
///      falling below the level
///   3. Invulnerability timer countdown
///   4. Enemies: patrol AI, fallout despawn, contact with the player
///   5. Particles
///   6. Camera follows the player
///
/// A contact only hurts when the invulnerability timer is 0, and starts a
/// new window, so one touch costs exactly one hit however long the
/// bodies keep overlapping.

use crate::domain::entity::Controls;
use crate::domain::particle::Particle;
use super::event::{DeathCause, GameEvent};
use super::world::WorldState;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, controls: &dyn Controls, dt_ms: f32) -> Vec<GameEvent> {
    if world.paused { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    resolve_player(world, controls, dt_ms, &mut events);
    resolve_death_checks(world, &mut events);

    if world.invulnerable_timer > 0 {
        world.invulnerable_timer -= 1;
    }

    resolve_enemies(world, &mut events);

    world.particles.update();
    world.camera.update(world.player.rect());

    events
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player(
    world: &mut WorldState,
    controls: &dyn Controls,
    dt_ms: f32,
    events: &mut Vec<GameEvent>,
) {
    let player = &mut world.player;
    if player.dead {
        player.respawn_timer += 1;
        if player.respawn_timer >= world.respawn_delay {
            player.respawn();
            world.invulnerable_timer = 0;
            log::info!("player respawned at ({}, {})", player.spawn.0, player.spawn.1);
            events.push(GameEvent::PlayerRespawned);
        }
        return;
    }

    let frame = player.update(controls, &world.tiles, dt_ms);
    if frame.jumped {
        events.push(GameEvent::Jumped);
    }
    if frame.swung {
        events.push(GameEvent::SwordSwung);
    }
    if let Some(step) = frame.footstep {
        events.push(GameEvent::Footstep(step));
    }
    if let Some((x, y)) = frame.dust_at {
        let puff = Particle::dust(x, y, &mut world.rng);
        world.particles.spawn(puff);
    }
}

fn kill_player(world: &mut WorldState, cause: DeathCause, events: &mut Vec<GameEvent>) {
    if world.player.die() {
        log::info!("player died ({cause:?}) at tick {}", world.tick);
        events.push(GameEvent::PlayerKilled { cause });
    }
}

fn resolve_death_checks(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.player.dead { return; }

    let rect = *world.player.rect();
    if world.death_zones.iter().any(|z| z.overlaps(&rect)) {
        world.player.health = 0;
        kill_player(world, DeathCause::DeathZone, events);
        return;
    }

    if rect.top() > world.level_h as f32 {
        kill_player(world, DeathCause::FellOut, events);
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

fn resolve_enemies(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let tiles = &world.tiles;
    let fallout_y = world.fallout_y;
    world.enemies.retain_mut(|enemy| {
        let alive = enemy.update(tiles, fallout_y);
        if !alive {
            let r = enemy.rect();
            log::debug!("enemy fell out at ({:.0}, {:.0})", r.x, r.y);
            events.push(GameEvent::EnemyDespawned { x: r.x, y: r.y });
        }
        alive
    });

    for i in 0..world.enemies.len() {
        if world.player.dead || world.is_invulnerable() {
            break;
        }
        if !world.enemies[i].touches(&world.player) {
            continue;
        }
        let enemy_cx = world.enemies[i].rect().center_x();
        hit_player(world, enemy_cx, events);
    }
}

/// Knockback away from the enemy, open the invulnerability window,
/// take one hit.
fn hit_player(world: &mut WorldState, enemy_cx: f32, events: &mut Vec<GameEvent>) {
    let combat = &world.combat;
    let direction = if world.player.rect().center_x() > enemy_cx { 1.0 } else { -1.0 };
    world.player.apply_knockback(direction, combat.knockback_x, combat.knockback_y);
    world.invulnerable_timer = combat.invulnerable_frames;

    if world.player.take_damage(combat.contact_damage) {
        kill_player(world, DeathCause::Enemy, events);
    } else {
        events.push(GameEvent::PlayerHurt { health: world.player.health });
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
