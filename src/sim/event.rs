/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and logging.

use crate::domain::entity::Footstep;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeathCause {
    DeathZone,
    Enemy,
    FellOut,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Jumped,
    SwordSwung,
    Footstep(Footstep),
    PlayerHurt { health: i32 },
    PlayerKilled { cause: DeathCause },
    PlayerRespawned,
    EnemyDespawned { x: f32, y: f32 },
}
