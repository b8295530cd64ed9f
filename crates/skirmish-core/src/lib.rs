pub mod battle;
pub mod error;
pub mod leaderboard;
pub mod mode;
pub mod participant;
pub mod phase;
pub mod respawn;
pub mod result;
pub mod standings;
pub mod world;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::battle::{BattleEvent, BattleMode};
    use crate::leaderboard::LeaderboardEntry;
    use crate::mode::ModeSettings;
    use crate::participant::{EntityProvider, Participant, ParticipantId, Position, TeamId};
    use crate::phase::BattlePhase;
    use crate::result::BattleResult;
    use crate::world::{DEFAULT_MAX_HEALTH, InMemoryWorld};

    /// Create `n` participants with sequential IDs starting at 1, all on team 0.
    pub fn make_participants(n: usize) -> Vec<Participant> {
        (0..n)
            .map(|i| Participant::new(i as ParticipantId + 1, format!("Player{}", i + 1), 0))
            .collect()
    }

    /// Create `teams` blocks of `per_team` participants. Team ids start at 1;
    /// participant ids are sequential across teams (team 1 gets 1..=per_team).
    pub fn make_team_participants(teams: usize, per_team: usize) -> Vec<Participant> {
        (0..teams * per_team)
            .map(|i| {
                Participant::new(
                    i as ParticipantId + 1,
                    format!("Player{}", i + 1),
                    (i / per_team) as TeamId + 1,
                )
            })
            .collect()
    }

    /// In-memory world holding `participants` at distinct spawn points.
    pub fn make_world(participants: &[Participant]) -> InMemoryWorld {
        let mut world = InMemoryWorld::new();
        for (i, p) in participants.iter().enumerate() {
            world.spawn(
                p.clone(),
                Position::new(i as f32 * 2.0, 0.0, 0.0),
                DEFAULT_MAX_HEALTH,
            );
        }
        world
    }

    pub fn settings(duration_secs: f32, team_mode: bool) -> ModeSettings {
        ModeSettings::new(duration_secs, team_mode).expect("test settings must be valid")
    }

    /// Feed every queued death notice to the mode.
    pub fn deliver_deaths(mode: &mut dyn BattleMode, world: &mut InMemoryWorld) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        for notice in world.drain_deaths() {
            events.extend(mode.handle_death(notice, world));
        }
        events
    }

    /// Run N ticks the way the orchestrator does: deaths first, then update.
    pub fn run_ticks(
        mode: &mut dyn BattleMode,
        world: &mut InMemoryWorld,
        n: usize,
        dt: f32,
    ) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        for _ in 0..n {
            events.extend(deliver_deaths(mode, world));
            events.extend(mode.update(dt, world));
        }
        events
    }

    pub fn ended_results(events: &[BattleEvent]) -> Vec<&BattleResult> {
        events
            .iter()
            .filter_map(|e| match e {
                BattleEvent::Ended(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn last_leaderboard(events: &[BattleEvent]) -> Option<&[LeaderboardEntry]> {
        events.iter().rev().find_map(|e| match e {
            BattleEvent::LeaderboardUpdated(entries) => Some(entries.as_slice()),
            _ => None,
        })
    }

    /// Initialize + start a fresh mode against a new world of `n` participants.
    pub fn started(mode: &mut dyn BattleMode, n: usize) -> InMemoryWorld {
        let participants = make_participants(n);
        let mut world = make_world(&participants);
        mode.initialize(&participants, &mut world);
        assert!(mode.start(), "start() must succeed on a fresh mode");
        world
    }

    // ================================================================
    // Battle Mode Contract Tests
    // ================================================================
    // Every BattleMode implementation must pass these. Mode crates call
    // them from their own #[cfg(test)] modules with a fresh instance
    // configured for individual play and a duration of at most 10s.

    /// initialize() subscribes exactly once per participant with a health source.
    pub fn contract_initialize_subscribes_health_sources(mode: &mut dyn BattleMode) {
        let participants = make_participants(4);
        let mut world = make_world(&participants[..3]);
        world.spawn_without_health(participants[3].clone(), Position::default());

        mode.initialize(&participants, &mut world);
        assert_eq!(mode.phase(), BattlePhase::Countdown);
        assert_eq!(mode.subscription_count(), 3);
        assert_eq!(world.subscription_count(), 3);
        assert_eq!(mode.state().scored().len(), 3);
    }

    /// end_battle() raises one terminal event, the second call raises none.
    pub fn contract_end_battle_is_idempotent(mode: &mut dyn BattleMode) {
        let mut world = started(mode, 3);
        let first = mode.end_battle(&mut world);
        let second = mode.end_battle(&mut world);
        assert_eq!(ended_results(&first).len(), 1);
        assert!(second.is_empty(), "second end_battle must be a no-op");
        assert!(mode.is_over());
    }

    /// Once over, update() neither advances the clock nor raises events.
    pub fn contract_update_after_over_is_noop(mode: &mut dyn BattleMode) {
        let mut world = started(mode, 3);
        mode.end_battle(&mut world);
        let elapsed = mode.elapsed();
        let events = run_ticks(mode, &mut world, 5, 1.0);
        assert!(events.is_empty());
        assert_eq!(mode.elapsed(), elapsed);
    }

    /// Running past the configured duration ends the battle exactly once.
    pub fn contract_time_expiry_ends_battle_once(mode: &mut dyn BattleMode) {
        let mut world = started(mode, 3);
        let ticks = mode.settings().duration_secs().ceil() as usize + 3;
        let events = run_ticks(mode, &mut world, ticks, 1.0);
        assert!(mode.is_over(), "battle must be over after {ticks} ticks of 1s");
        assert_eq!(ended_results(&events).len(), 1);
    }

    /// No re-entry into Active once over.
    pub fn contract_start_rejected_after_over(mode: &mut dyn BattleMode) {
        let mut world = started(mode, 2);
        mode.end_battle(&mut world);
        assert!(!mode.start());
        assert_eq!(mode.phase(), BattlePhase::Over);
    }

    /// Deaths arriving after the battle is over are absorbed silently.
    pub fn contract_death_after_over_is_noop(mode: &mut dyn BattleMode) {
        let mut world = started(mode, 3);
        mode.end_battle(&mut world);
        world.kill(1);
        assert!(deliver_deaths(mode, &mut world).is_empty());
    }

    /// teardown() releases every death subscription held in the world.
    pub fn contract_teardown_releases_subscriptions(mode: &mut dyn BattleMode) {
        let mut world = started(mode, 3);
        mode.teardown(&mut world);
        assert_eq!(mode.subscription_count(), 0);
        assert_eq!(world.subscription_count(), 0);
        world.kill(2);
        assert!(world.drain_deaths().is_empty());
    }
}
