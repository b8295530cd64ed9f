use uuid::Uuid;

use skirmish_core::battle::{BattleEvent, BattleMode};
use skirmish_core::error::SetupError;
use skirmish_core::mode::ModeId;
use skirmish_core::participant::{EntityProvider, Participant};
use skirmish_core::phase::BattlePhase;

use crate::config::MatchConfig;
use crate::registry::ModeRegistry;

/// One battle bound to the world it runs in.
///
/// Owns the mode and the entity provider for the lifetime of the match and
/// performs the orchestration steps in order: discovery, mode creation,
/// initialization, disabling, activation, ticking and teardown.
pub struct BattleSession<W: EntityProvider> {
    match_id: Uuid,
    mode: Box<dyn BattleMode>,
    world: W,
    participants: Vec<Participant>,
    torn_down: bool,
}

impl<W: EntityProvider> BattleSession<W> {
    /// Discover participants, build the configured mode, initialize it and
    /// freeze everyone for the countdown.
    ///
    /// Configuration problems are reported before the world is touched.
    pub fn setup(registry: &ModeRegistry, config: &MatchConfig, mut world: W) -> Result<Self, SetupError> {
        let settings = config.mode_settings()?;
        let mode_id: ModeId = config.mode.parse()?;
        let participants = world.participants();
        if participants.is_empty() {
            return Err(SetupError::NoParticipants);
        }
        let mut mode = registry.create(mode_id, settings)?;

        let match_id = Uuid::new_v4();
        tracing::info!(
            %match_id,
            mode = %mode_id,
            participants = participants.len(),
            team_mode = settings.team_mode(),
            duration_secs = settings.duration_secs(),
            "Setting up battle"
        );

        mode.initialize(&participants, &mut world);
        for p in &participants {
            world.set_can_act(p.id, false);
        }

        Ok(Self {
            match_id,
            mode,
            world,
            participants,
            torn_down: false,
        })
    }

    /// Unfreeze every participant and start the battle clock.
    pub fn activate(&mut self) -> bool {
        for p in &self.participants {
            self.world.set_can_act(p.id, true);
        }
        self.mode.start()
    }

    /// Advance one tick: let the world move, score the deaths it raised,
    /// then update the mode.
    pub fn tick(&mut self, dt: f32) -> Vec<BattleEvent> {
        if self.mode.is_over() {
            return Vec::new();
        }
        self.world.simulate(dt);
        let mut events = Vec::new();
        for notice in self.world.drain_deaths() {
            events.extend(self.mode.handle_death(notice, &mut self.world));
        }
        events.extend(self.mode.update(dt, &mut self.world));
        events
    }

    /// Force the battle to resolve now.
    pub fn end(&mut self) -> Vec<BattleEvent> {
        self.mode.end_battle(&mut self.world)
    }

    /// Release every subscription and pending respawn. Safe to call twice.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.mode.teardown(&mut self.world);
        tracing::debug!(match_id = %self.match_id, "Battle torn down");
    }

    pub fn match_id(&self) -> Uuid {
        self.match_id
    }

    pub fn mode_id(&self) -> ModeId {
        self.mode.id()
    }

    pub fn phase(&self) -> BattlePhase {
        self.mode.phase()
    }

    pub fn is_over(&self) -> bool {
        self.mode.is_over()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn mode(&self) -> &dyn BattleMode {
        &*self.mode
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Tear down (if not already done) and hand the world back.
    pub fn into_world(mut self) -> W {
        self.teardown();
        self.world
    }
}
