use std::collections::HashMap;

use skirmish_core::battle::{BattleEvent, BattleMode, BattleState};
use skirmish_core::leaderboard::{LeaderboardEntry, individual_leaderboard, team_leaderboard};
use skirmish_core::mode::{ModeId, ModeSettings};
use skirmish_core::participant::{
    DeathNotice, EntityProvider, Participant, ParticipantId, Position,
};
use skirmish_core::respawn::RespawnScheduler;
use skirmish_core::result::BattleResult;
use skirmish_core::standings::{collect_standings, keep_max_by, keep_min_by, team_standings};

/// Seconds between a death and the matching respawn.
pub const RESPAWN_DELAY_SECS: f32 = 3.0;

const NOBODY_SCORED: &str = "No participants were scored. No winner.";

/// Fewest deaths when the clock runs out wins.
///
/// Deaths never end the battle early. Each death bumps the participant's
/// death counter and schedules its own respawn, which restores health,
/// strips weapons and moves the participant back to where it spawned.
pub struct FewestDeaths {
    state: BattleState,
    spawn_points: HashMap<ParticipantId, Position>,
    respawns: RespawnScheduler,
}

impl FewestDeaths {
    pub fn new(settings: ModeSettings) -> Self {
        Self {
            state: BattleState::new(settings),
            spawn_points: HashMap::new(),
            respawns: RespawnScheduler::new(),
        }
    }

    /// Respawns still waiting for their delay to elapse.
    pub fn pending_respawns(&self) -> usize {
        self.respawns.pending()
    }

    pub fn spawn_point(&self, id: ParticipantId) -> Option<Position> {
        self.spawn_points.get(&id).copied()
    }

    fn respawn(&self, id: ParticipantId, world: &mut dyn EntityProvider) {
        world.reset_health(id);
        world.reset_weapons(id);
        let position = self.spawn_points.get(&id).copied().unwrap_or_default();
        world.respawn(id, position);
        tracing::debug!(participant_id = id, "Participant respawned");
    }

    pub fn leaderboard(&self, world: &dyn EntityProvider) -> Vec<LeaderboardEntry> {
        let standings = collect_standings(self.state.scored(), world);
        if self.state.settings().team_mode() {
            team_leaderboard(&team_standings(&standings))
        } else {
            individual_leaderboard(&standings)
        }
    }

    /// Fewest deaths, then highest health. Whatever survives both is a tie.
    fn determine_winner(&self, world: &dyn EntityProvider) -> BattleResult {
        let standings = collect_standings(self.state.scored(), world);
        if standings.is_empty() {
            return BattleResult::no_winner(Some(NOBODY_SCORED.to_string()));
        }

        if self.state.settings().team_mode() {
            let candidates = keep_min_by(team_standings(&standings), |t| t.total_deaths);
            let top = keep_max_by(candidates, |t| t.total_health);
            return BattleResult::from_teams(top.iter().map(|t| t.team_id).collect());
        }

        let candidates = keep_min_by(standings, |s| s.deaths);
        let top = keep_max_by(candidates, |s| s.health);
        BattleResult::from_participants(top.into_iter().map(|s| s.participant).collect())
    }
}

impl BattleMode for FewestDeaths {
    fn id(&self) -> ModeId {
        ModeId::FewestDeaths
    }

    fn state(&self) -> &BattleState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BattleState {
        &mut self.state
    }

    fn initialize(&mut self, participants: &[Participant], world: &mut dyn EntityProvider) {
        if !self.state.register(participants, world) {
            return;
        }
        for participant in self.state.scored() {
            world.reset_death_count(participant.id);
            if let Some(snapshot) = world.snapshot(participant.id) {
                self.spawn_points.insert(participant.id, snapshot.position);
            }
        }
    }

    fn update(&mut self, dt: f32, world: &mut dyn EntityProvider) -> Vec<BattleEvent> {
        if !self.state.tick(dt) {
            return Vec::new();
        }
        for task in self.respawns.advance(dt) {
            self.respawn(task.participant_id, world);
        }
        if self.state.expired() {
            return self.end_battle(world);
        }
        Vec::new()
    }

    fn handle_death(
        &mut self,
        notice: DeathNotice,
        world: &mut dyn EntityProvider,
    ) -> Vec<BattleEvent> {
        if !self.state.accepts(&notice) {
            return Vec::new();
        }
        let id = notice.participant_id;
        world.increment_death_count(id);
        let task = self.respawns.schedule(id, RESPAWN_DELAY_SECS);
        tracing::debug!(
            participant_id = id,
            task_id = task,
            deaths = ?world.snapshot(id).map(|s| s.death_count),
            "Participant died; respawn scheduled"
        );
        vec![BattleEvent::LeaderboardUpdated(self.leaderboard(world))]
    }

    fn end_battle(&mut self, world: &mut dyn EntityProvider) -> Vec<BattleEvent> {
        if self.is_over() {
            return Vec::new();
        }
        let result = self.determine_winner(world);
        let Some(ended) = self.state.finish(result) else {
            return Vec::new();
        };
        let cancelled = self.respawns.cancel_all();
        if cancelled > 0 {
            tracing::debug!(cancelled, "Dropped pending respawns at battle end");
        }
        vec![ended, BattleEvent::LeaderboardUpdated(self.leaderboard(world))]
    }

    fn teardown(&mut self, world: &mut dyn EntityProvider) {
        self.respawns.cancel_all();
        self.state.unsubscribe_all(world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use skirmish_core::test_helpers::{
        deliver_deaths, ended_results, last_leaderboard, make_participants,
        make_team_participants, make_world, run_ticks, settings, started,
    };
    use skirmish_core::world::InMemoryWorld;

    fn individual(duration: f32) -> FewestDeaths {
        FewestDeaths::new(settings(duration, false))
    }

    fn kill_and_deliver(
        mode: &mut FewestDeaths,
        world: &mut InMemoryWorld,
        id: ParticipantId,
    ) -> Vec<BattleEvent> {
        world.kill(id);
        deliver_deaths(mode, world)
    }

    // ================================================================
    // Contract tests
    // ================================================================

    #[test]
    fn contract_initialize_subscribes_health_sources() {
        skirmish_core::test_helpers::contract_initialize_subscribes_health_sources(
            &mut individual(10.0),
        );
    }

    #[test]
    fn contract_end_battle_is_idempotent() {
        skirmish_core::test_helpers::contract_end_battle_is_idempotent(&mut individual(10.0));
    }

    #[test]
    fn contract_update_after_over_is_noop() {
        skirmish_core::test_helpers::contract_update_after_over_is_noop(&mut individual(10.0));
    }

    #[test]
    fn contract_time_expiry_ends_battle_once() {
        skirmish_core::test_helpers::contract_time_expiry_ends_battle_once(&mut individual(5.0));
    }

    #[test]
    fn contract_start_rejected_after_over() {
        skirmish_core::test_helpers::contract_start_rejected_after_over(&mut individual(10.0));
    }

    #[test]
    fn contract_death_after_over_is_noop() {
        skirmish_core::test_helpers::contract_death_after_over_is_noop(&mut individual(10.0));
    }

    #[test]
    fn contract_teardown_releases_subscriptions() {
        skirmish_core::test_helpers::contract_teardown_releases_subscriptions(&mut individual(
            10.0,
        ));
    }

    // ================================================================
    // Initialization
    // ================================================================

    #[test]
    fn initialize_resets_death_counts_and_records_spawns() {
        let participants = make_participants(2);
        let mut world = make_world(&participants);
        world.increment_death_count(1);
        world.increment_death_count(1);
        let spawn = world.position(2).unwrap();

        let mut mode = individual(10.0);
        mode.initialize(&participants, &mut world);
        assert_eq!(world.snapshot(1).unwrap().death_count, 0);
        assert_eq!(mode.spawn_point(2), Some(spawn));
    }

    // ================================================================
    // Deaths and respawns
    // ================================================================

    #[test]
    fn deaths_do_not_end_battle_early() {
        let mut mode = individual(60.0);
        let mut world = started(&mut mode, 2);
        let mut events = kill_and_deliver(&mut mode, &mut world, 1);
        events.extend(kill_and_deliver(&mut mode, &mut world, 2));
        assert!(ended_results(&events).is_empty());
        assert!(!mode.is_over());
    }

    #[test]
    fn death_increments_counter_and_updates_leaderboard() {
        let mut mode = individual(60.0);
        let mut world = started(&mut mode, 3);
        let events = kill_and_deliver(&mut mode, &mut world, 2);

        assert_eq!(world.snapshot(2).unwrap().death_count, 1);
        let board = last_leaderboard(&events).unwrap();
        assert_eq!(board.len(), 3);
        assert_eq!(board[2].name, "Player2");
        assert_eq!(board[2].death_count, 1);
    }

    #[test]
    fn respawn_completes_after_fixed_delay() {
        let mut mode = individual(60.0);
        let mut world = started(&mut mode, 2);
        run_ticks(&mut mode, &mut world, 2, 1.0);

        world.equip_weapon(1);
        world.move_to(1, Position::new(40.0, 0.0, 40.0));
        world.kill(1);
        // The tick that scores the death ends at 2.5s; respawn is due at 5.5s.
        run_ticks(&mut mode, &mut world, 1, 0.5);
        assert_eq!(mode.pending_respawns(), 1);

        run_ticks(&mut mode, &mut world, 5, 0.5);
        assert_eq!(world.respawn_count(1), 0, "respawn must wait the full delay");
        assert!(!world.is_alive(1));

        run_ticks(&mut mode, &mut world, 1, 0.5);
        assert_eq!(world.respawn_count(1), 1);
        assert!(world.is_alive(1));
        assert_eq!(world.snapshot(1).unwrap().current_health, 100);
        assert!(!world.has_weapon(1));
        assert_eq!(world.position(1), mode.spawn_point(1));
        assert_eq!(mode.pending_respawns(), 0);

        run_ticks(&mut mode, &mut world, 10, 1.0);
        assert_eq!(world.respawn_count(1), 1, "exactly one respawn per death");
    }

    #[test]
    fn respawns_for_different_participants_are_independent() {
        let mut mode = individual(60.0);
        let mut world = started(&mut mode, 3);

        kill_and_deliver(&mut mode, &mut world, 1);
        run_ticks(&mut mode, &mut world, 1, 1.0);
        kill_and_deliver(&mut mode, &mut world, 2);
        assert_eq!(mode.pending_respawns(), 2);

        run_ticks(&mut mode, &mut world, 3, 1.0);
        assert_eq!(world.respawn_count(1), 1);
        assert_eq!(world.respawn_count(2), 0);

        run_ticks(&mut mode, &mut world, 1, 1.0);
        assert_eq!(world.respawn_count(2), 1);
        assert_eq!(world.respawn_count(3), 0);
    }

    #[test]
    fn each_death_gets_its_own_respawn() {
        let mut mode = individual(60.0);
        let mut world = started(&mut mode, 2);

        kill_and_deliver(&mut mode, &mut world, 1);
        run_ticks(&mut mode, &mut world, 3, 1.0);
        assert!(!world.is_alive(1));
        run_ticks(&mut mode, &mut world, 1, 1.0);
        assert!(world.is_alive(1));

        kill_and_deliver(&mut mode, &mut world, 1);
        run_ticks(&mut mode, &mut world, 4, 1.0);

        assert_eq!(world.respawn_count(1), 2);
        assert_eq!(world.snapshot(1).unwrap().death_count, 2);
    }

    // ================================================================
    // Resolution
    // ================================================================

    #[test]
    fn zero_death_participant_wins() {
        let mut mode = individual(10.0);
        let mut world = started(&mut mode, 3);
        kill_and_deliver(&mut mode, &mut world, 1);
        run_ticks(&mut mode, &mut world, 4, 1.0);
        kill_and_deliver(&mut mode, &mut world, 1);
        kill_and_deliver(&mut mode, &mut world, 2);

        let events = run_ticks(&mut mode, &mut world, 10, 1.0);
        let results = ended_results(&events);
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_tie());
        assert_eq!(results[0].winning_participants().unwrap()[0].id, 3);
    }

    #[test]
    fn zero_death_tie_broken_by_health() {
        let mut mode = individual(10.0);
        let mut world = started(&mut mode, 4);
        kill_and_deliver(&mut mode, &mut world, 1);
        world.apply_damage(3, 25);
        world.apply_damage(4, 10);

        let events = run_ticks(&mut mode, &mut world, 10, 1.0);
        let result = ended_results(&events)[0];
        assert!(!result.is_tie());
        assert_eq!(result.winning_participants().unwrap()[0].id, 2);
    }

    #[test]
    fn persisting_tie_lists_all_candidates() {
        let mut mode = individual(10.0);
        let mut world = started(&mut mode, 4);
        kill_and_deliver(&mut mode, &mut world, 4);
        world.apply_damage(1, 10);
        world.apply_damage(2, 20);
        world.apply_damage(3, 10);

        let events = run_ticks(&mut mode, &mut world, 10, 1.0);
        let result = ended_results(&events)[0];
        assert!(result.is_tie());
        let ids: Vec<u64> = result
            .winning_participants()
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn final_leaderboard_follows_result() {
        let mut mode = individual(5.0);
        let mut world = started(&mut mode, 3);
        kill_and_deliver(&mut mode, &mut world, 1);
        kill_and_deliver(&mut mode, &mut world, 2);
        run_ticks(&mut mode, &mut world, 4, 1.0);
        kill_and_deliver(&mut mode, &mut world, 1);

        let events = run_ticks(&mut mode, &mut world, 5, 1.0);
        assert!(matches!(events.first(), Some(BattleEvent::Ended(_))));
        let board = last_leaderboard(&events).unwrap();
        let rows: Vec<(&str, u32)> = board
            .iter()
            .map(|e| (e.name.as_str(), e.death_count))
            .collect();
        assert_eq!(rows, vec![("Player3", 0), ("Player2", 1), ("Player1", 2)]);
    }

    #[test]
    fn battle_end_cancels_pending_respawns() {
        let mut mode = individual(2.0);
        let mut world = started(&mut mode, 2);
        run_ticks(&mut mode, &mut world, 1, 1.0);
        kill_and_deliver(&mut mode, &mut world, 1);
        run_ticks(&mut mode, &mut world, 5, 1.0);
        assert!(mode.is_over());
        assert_eq!(mode.pending_respawns(), 0);
        assert_eq!(world.respawn_count(1), 0);
    }

    #[test]
    fn teardown_mid_battle_cancels_respawns() {
        let mut mode = individual(60.0);
        let mut world = started(&mut mode, 2);
        kill_and_deliver(&mut mode, &mut world, 1);
        mode.teardown(&mut world);
        assert_eq!(mode.pending_respawns(), 0);
        assert_eq!(world.subscription_count(), 0);
    }

    // ================================================================
    // Team mode
    // ================================================================

    fn teams_started(teams: usize, per_team: usize, duration: f32) -> (FewestDeaths, InMemoryWorld) {
        let mut mode = FewestDeaths::new(settings(duration, true));
        let participants = make_team_participants(teams, per_team);
        let mut world = make_world(&participants);
        mode.initialize(&participants, &mut world);
        mode.start();
        (mode, world)
    }

    #[test]
    fn team_with_fewest_summed_deaths_wins() {
        let (mut mode, mut world) = teams_started(2, 2, 5.0);
        // Team 1: 1 death; team 2: 2 deaths
        kill_and_deliver(&mut mode, &mut world, 1);
        kill_and_deliver(&mut mode, &mut world, 3);
        kill_and_deliver(&mut mode, &mut world, 4);

        let events = run_ticks(&mut mode, &mut world, 5, 1.0);
        let result = ended_results(&events)[0];
        assert!(!result.is_tie());
        assert_eq!(result.winning_teams(), Some(&[1][..]));

        let board = last_leaderboard(&events).unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].name, "Team 1");
        assert_eq!(board[0].death_count, 1);
        assert_eq!(board[1].death_count, 2);
    }

    #[test]
    fn team_death_tie_broken_by_summed_health() {
        let (mut mode, mut world) = teams_started(2, 2, 10.0);
        world.apply_damage(1, 30);
        world.apply_damage(4, 10);

        let result = ended_results(&mode.end_battle(&mut world))[0].clone();
        assert_eq!(result.winning_teams(), Some(&[2][..]));
        assert!(!result.is_tie());
    }

    #[test]
    fn team_full_tie_lists_all_teams() {
        let (mut mode, mut world) = teams_started(3, 1, 10.0);
        let events = mode.end_battle(&mut world);
        let result = ended_results(&events)[0];
        assert!(result.is_tie());
        assert_eq!(result.winning_teams(), Some(&[1, 2, 3][..]));
    }

    proptest! {
        #[test]
        fn winner_has_minimum_deaths(deaths in prop::collection::vec(0u32..4, 2..6)) {
            let mut mode = individual(1000.0);
            let mut world = started(&mut mode, deaths.len());
            for (i, &d) in deaths.iter().enumerate() {
                for _ in 0..d {
                    kill_and_deliver(&mut mode, &mut world, i as u64 + 1);
                    run_ticks(&mut mode, &mut world, 2, RESPAWN_DELAY_SECS);
                }
            }
            let events = mode.end_battle(&mut world);
            let result = ended_results(&events)[0];
            let min = *deaths.iter().min().unwrap();
            for winner in result.winning_participants().unwrap() {
                prop_assert_eq!(deaths[winner.id as usize - 1], min);
            }
            let board = last_leaderboard(&events).unwrap();
            prop_assert_eq!(board.len(), deaths.len());
            prop_assert!(board.windows(2).all(|w| w[0].death_count <= w[1].death_count));
        }
    }
}
