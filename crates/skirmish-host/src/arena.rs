use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use skirmish_core::participant::{
    DeathNotice, EntityProvider, HealthSnapshot, Participant, ParticipantId, Position,
    SubscriptionToken, TeamId,
};
use skirmish_core::world::InMemoryWorld;

use crate::config::DemoConfig;

/// Radius of the ring participants spawn on.
const SPAWN_RADIUS: f32 = 12.0;

/// Headless stand-in for a real game world.
///
/// Every tick each participant that is alive and allowed to act may land a
/// hit on a random living opponent. Opponents are members of other teams
/// when more than one team is configured, anyone else otherwise.
pub struct DemoArena {
    world: InMemoryWorld,
    rng: StdRng,
    damage_per_hit: i32,
    hits_per_sec: f64,
    cross_team_only: bool,
}

impl DemoArena {
    pub fn new(config: &DemoConfig) -> Self {
        let mut world = InMemoryWorld::new();
        let count = config.participants;
        for i in 0..count {
            let team_id: TeamId = if config.teams == 0 {
                0
            } else {
                (i as u32 % config.teams) + 1
            };
            let angle = i as f32 / count.max(1) as f32 * std::f32::consts::TAU;
            world.spawn(
                Participant::new(i as ParticipantId + 1, format!("Fighter{}", i + 1), team_id),
                Position::new(angle.cos() * SPAWN_RADIUS, 0.0, angle.sin() * SPAWN_RADIUS),
                config.max_health,
            );
            world.equip_weapon(i as ParticipantId + 1);
        }
        Self {
            world,
            rng: StdRng::seed_from_u64(config.seed),
            damage_per_hit: config.damage_per_hit.max(0),
            hits_per_sec: config.hits_per_sec.max(0.0),
            cross_team_only: config.teams > 1,
        }
    }

    pub fn world(&self) -> &InMemoryWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut InMemoryWorld {
        &mut self.world
    }

    fn targets_for(&self, attacker: &Participant, roster: &[Participant]) -> Vec<ParticipantId> {
        roster
            .iter()
            .filter(|p| p.id != attacker.id && self.world.is_alive(p.id))
            .filter(|p| !self.cross_team_only || p.team_id != attacker.team_id)
            .map(|p| p.id)
            .collect()
    }
}

impl EntityProvider for DemoArena {
    fn participants(&self) -> Vec<Participant> {
        self.world.participants()
    }

    fn snapshot(&self, id: ParticipantId) -> Option<HealthSnapshot> {
        self.world.snapshot(id)
    }

    fn reset_death_count(&mut self, id: ParticipantId) {
        self.world.reset_death_count(id);
    }

    fn increment_death_count(&mut self, id: ParticipantId) {
        self.world.increment_death_count(id);
    }

    fn reset_health(&mut self, id: ParticipantId) {
        self.world.reset_health(id);
    }

    fn reset_weapons(&mut self, id: ParticipantId) {
        self.world.reset_weapons(id);
        // Respawned fighters pick a weapon straight back up.
        self.world.equip_weapon(id);
    }

    fn respawn(&mut self, id: ParticipantId, position: Position) {
        self.world.respawn(id, position);
    }

    fn set_can_act(&mut self, id: ParticipantId, can_act: bool) {
        self.world.set_can_act(id, can_act);
    }

    fn subscribe_death(&mut self, id: ParticipantId) -> Option<SubscriptionToken> {
        self.world.subscribe_death(id)
    }

    fn unsubscribe_death(&mut self, token: SubscriptionToken) {
        self.world.unsubscribe_death(token);
    }

    fn drain_deaths(&mut self) -> Vec<DeathNotice> {
        self.world.drain_deaths()
    }

    fn simulate(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let chance = (self.hits_per_sec * f64::from(dt)).clamp(0.0, 1.0);
        let roster = self.world.participants();
        for attacker in &roster {
            let ready = self.world.is_alive(attacker.id)
                && self.world.can_act(attacker.id) == Some(true)
                && self.world.has_weapon(attacker.id);
            if !ready || !self.rng.random_bool(chance) {
                continue;
            }
            let targets = self.targets_for(attacker, &roster);
            if targets.is_empty() {
                continue;
            }
            let target = targets[self.rng.random_range(0..targets.len())];
            if self.world.apply_damage(target, self.damage_per_hit) {
                tracing::debug!(
                    attacker = attacker.id,
                    target,
                    "Participant eliminated in arena"
                );
            }
        }
    }
}
