use std::collections::HashMap;

use crate::participant::{
    DeathNotice, EntityProvider, HealthSnapshot, Participant, ParticipantId, Position,
    SubscriptionToken,
};

/// Health every participant spawns with unless configured otherwise.
pub const DEFAULT_MAX_HEALTH: i32 = 100;

#[derive(Debug, Clone)]
struct HealthState {
    max_health: i32,
    current_health: i32,
    dead: bool,
    death_count: u32,
}

impl HealthState {
    fn new(max_health: i32) -> Self {
        let max_health = max_health.max(0);
        Self {
            max_health,
            current_health: max_health,
            dead: false,
            death_count: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct Entity {
    participant: Participant,
    position: Position,
    health: Option<HealthState>,
    can_act: bool,
    has_weapon: bool,
    respawns: u32,
    weapon_resets: u32,
}

/// In-memory entity provider.
///
/// Damage is clamped to remaining health and ignored while dead, healing is
/// clamped to max health, and a death notice is queued for every live
/// subscription exactly once per alive→dead transition.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorld {
    entities: Vec<Entity>,
    subscriptions: HashMap<SubscriptionToken, ParticipantId>,
    next_token: u64,
    pending_deaths: Vec<DeathNotice>,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant with a health source of `max_health`.
    pub fn spawn(&mut self, participant: Participant, position: Position, max_health: i32) {
        self.insert(participant, position, Some(HealthState::new(max_health)));
    }

    /// Add a participant that has no health source at all.
    pub fn spawn_without_health(&mut self, participant: Participant, position: Position) {
        self.insert(participant, position, None);
    }

    fn insert(&mut self, participant: Participant, position: Position, health: Option<HealthState>) {
        self.entities.retain(|e| e.participant.id != participant.id);
        self.entities.push(Entity {
            participant,
            position,
            health,
            can_act: true,
            has_weapon: false,
            respawns: 0,
            weapon_resets: 0,
        });
    }

    fn entity(&self, id: ParticipantId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.participant.id == id)
    }

    fn entity_mut(&mut self, id: ParticipantId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.participant.id == id)
    }

    /// Apply damage. Returns `true` if this hit killed the participant.
    pub fn apply_damage(&mut self, id: ParticipantId, amount: i32) -> bool {
        let Some(health) = self.entity_mut(id).and_then(|e| e.health.as_mut()) else {
            return false;
        };
        if health.dead {
            return false;
        }
        health.current_health -= amount.clamp(0, health.current_health.max(0));
        if health.current_health > 0 {
            return false;
        }
        health.dead = true;
        tracing::debug!(participant_id = id, "Participant died");

        let mut tokens: Vec<SubscriptionToken> = self
            .subscriptions
            .iter()
            .filter(|(_, pid)| **pid == id)
            .map(|(&token, _)| token)
            .collect();
        tokens.sort_by_key(|t| t.0);
        self.pending_deaths
            .extend(tokens.into_iter().map(|token| DeathNotice {
                token,
                participant_id: id,
            }));
        true
    }

    /// Kill outright, regardless of remaining health.
    pub fn kill(&mut self, id: ParticipantId) -> bool {
        let remaining = self
            .snapshot(id)
            .map(|s| s.current_health)
            .unwrap_or_default();
        self.apply_damage(id, remaining.max(1))
    }

    pub fn heal(&mut self, id: ParticipantId, amount: i32) {
        if let Some(health) = self.entity_mut(id).and_then(|e| e.health.as_mut())
            && !health.dead
        {
            health.current_health = health.current_health.saturating_add(amount).clamp(0, health.max_health);
        }
    }

    pub fn equip_weapon(&mut self, id: ParticipantId) {
        if let Some(entity) = self.entity_mut(id) {
            entity.has_weapon = true;
        }
    }

    pub fn move_to(&mut self, id: ParticipantId, position: Position) {
        if let Some(entity) = self.entity_mut(id) {
            entity.position = position;
        }
    }

    pub fn can_act(&self, id: ParticipantId) -> Option<bool> {
        self.entity(id).map(|e| e.can_act)
    }

    pub fn has_weapon(&self, id: ParticipantId) -> bool {
        self.entity(id).is_some_and(|e| e.has_weapon)
    }

    pub fn position(&self, id: ParticipantId) -> Option<Position> {
        self.entity(id).map(|e| e.position)
    }

    /// Number of respawn commands received for a participant.
    pub fn respawn_count(&self, id: ParticipantId) -> u32 {
        self.entity(id).map(|e| e.respawns).unwrap_or_default()
    }

    pub fn weapon_reset_count(&self, id: ParticipantId) -> u32 {
        self.entity(id).map(|e| e.weapon_resets).unwrap_or_default()
    }

    /// Live death subscriptions across all participants.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Participants (with a health source) that are currently alive.
    pub fn alive_ids(&self) -> Vec<ParticipantId> {
        self.entities
            .iter()
            .filter(|e| e.health.as_ref().is_some_and(|h| !h.dead))
            .map(|e| e.participant.id)
            .collect()
    }
}

impl EntityProvider for InMemoryWorld {
    fn participants(&self) -> Vec<Participant> {
        self.entities.iter().map(|e| e.participant.clone()).collect()
    }

    fn snapshot(&self, id: ParticipantId) -> Option<HealthSnapshot> {
        let entity = self.entity(id)?;
        let health = entity.health.as_ref()?;
        Some(HealthSnapshot {
            alive: !health.dead,
            current_health: health.current_health,
            death_count: health.death_count,
            position: entity.position,
        })
    }

    fn reset_death_count(&mut self, id: ParticipantId) {
        if let Some(health) = self.entity_mut(id).and_then(|e| e.health.as_mut()) {
            health.death_count = 0;
        }
    }

    fn increment_death_count(&mut self, id: ParticipantId) {
        if let Some(health) = self.entity_mut(id).and_then(|e| e.health.as_mut()) {
            health.death_count += 1;
        }
    }

    fn reset_health(&mut self, id: ParticipantId) {
        if let Some(health) = self.entity_mut(id).and_then(|e| e.health.as_mut()) {
            health.current_health = health.max_health;
            health.dead = false;
        }
    }

    fn reset_weapons(&mut self, id: ParticipantId) {
        if let Some(entity) = self.entity_mut(id) {
            entity.has_weapon = false;
            entity.weapon_resets += 1;
        }
    }

    fn respawn(&mut self, id: ParticipantId, position: Position) {
        if let Some(entity) = self.entity_mut(id) {
            entity.position = position;
            entity.respawns += 1;
        }
    }

    fn set_can_act(&mut self, id: ParticipantId, can_act: bool) {
        if let Some(entity) = self.entity_mut(id) {
            entity.can_act = can_act;
        }
    }

    fn subscribe_death(&mut self, id: ParticipantId) -> Option<SubscriptionToken> {
        self.entity(id)?.health.as_ref()?;
        self.next_token += 1;
        let token = SubscriptionToken(self.next_token);
        self.subscriptions.insert(token, id);
        Some(token)
    }

    fn unsubscribe_death(&mut self, token: SubscriptionToken) {
        self.subscriptions.remove(&token);
        self.pending_deaths.retain(|n| n.token != token);
    }

    fn drain_deaths(&mut self) -> Vec<DeathNotice> {
        std::mem::take(&mut self.pending_deaths)
    }
}
