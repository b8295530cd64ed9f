use serde::{Deserialize, Serialize};

/// Unique identifier for a participant in a battle.
pub type ParticipantId = u64;

/// Team identifier. In individual mode every participant still carries one,
/// it is simply ignored by scoring.
pub type TeamId = u32;

/// World-space position, only used for respawn bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A competing unit discovered at match setup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub team_id: TeamId,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>, team_id: TeamId) -> Self {
        Self {
            id,
            name: name.into(),
            team_id,
        }
    }
}

/// Point-in-time view of a participant's health source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub alive: bool,
    pub current_health: i32,
    pub death_count: u32,
    pub position: Position,
}

/// Handle returned by a death subscription; required to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionToken(pub u64);

/// A single alive→dead transition delivered to one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeathNotice {
    pub token: SubscriptionToken,
    pub participant_id: ParticipantId,
}

/// The external entity/health/weapon subsystem the battle engine talks to.
///
/// The engine only reads liveness, health, team and death counts, and only
/// writes the narrow set of commands below. Movement, rendering and weapon
/// internals stay behind this boundary.
pub trait EntityProvider: Send {
    /// Enumerate every participant present in the match.
    fn participants(&self) -> Vec<Participant>;

    /// Current health view, or `None` when the participant has no health source.
    fn snapshot(&self, id: ParticipantId) -> Option<HealthSnapshot>;

    fn reset_death_count(&mut self, id: ParticipantId);

    fn increment_death_count(&mut self, id: ParticipantId);

    /// Restore full health and revive the participant.
    fn reset_health(&mut self, id: ParticipantId);

    /// Drop every equipped weapon.
    fn reset_weapons(&mut self, id: ParticipantId);

    /// Move the participant back to `position`.
    fn respawn(&mut self, id: ParticipantId, position: Position);

    fn set_can_act(&mut self, id: ParticipantId, can_act: bool);

    /// Register for death notifications. Returns `None` when the participant
    /// has no health source to observe.
    fn subscribe_death(&mut self, id: ParticipantId) -> Option<SubscriptionToken>;

    fn unsubscribe_death(&mut self, token: SubscriptionToken);

    /// Take every death notice raised since the last call, in order.
    fn drain_deaths(&mut self) -> Vec<DeathNotice>;

    /// Advance the external simulation by one tick. Engine-backed providers
    /// leave this empty; headless hosts use it to drive entity behaviour.
    fn simulate(&mut self, _dt: f32) {}

    fn is_alive(&self, id: ParticipantId) -> bool {
        self.snapshot(id).is_some_and(|s| s.alive)
    }
}
