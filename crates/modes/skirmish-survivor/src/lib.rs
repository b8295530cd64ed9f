use smallvec::SmallVec;

use skirmish_core::battle::{BattleEvent, BattleMode, BattleState};
use skirmish_core::mode::{ModeId, ModeSettings};
use skirmish_core::participant::{DeathNotice, EntityProvider, Participant, TeamId};
use skirmish_core::result::BattleResult;
use skirmish_core::standings::{collect_standings, keep_max_by, team_standings};

const ALL_PARTICIPANTS_ELIMINATED: &str = "All participants have been eliminated. No winner.";
const ALL_TEAMS_ELIMINATED: &str = "All teams have been eliminated. No winner.";
const NO_PARTICIPANTS_LEFT: &str = "No participants are left alive. No winner.";
const NO_TEAMS_LEFT: &str = "No teams are left alive. No winner.";

/// Last participant (or team) standing wins.
///
/// The win condition is re-checked on every death and every tick. If the
/// clock runs out first, the living participant with the most health wins;
/// in team mode the living team with the highest summed health of its
/// living members wins.
pub struct LastSurvivor {
    state: BattleState,
}

impl LastSurvivor {
    pub fn new(settings: ModeSettings) -> Self {
        Self {
            state: BattleState::new(settings),
        }
    }

    /// Early result: exactly one unit alive wins, none alive is a tie.
    fn check_victory(&self, world: &dyn EntityProvider) -> Option<BattleResult> {
        let standings = collect_standings(self.state.scored(), world);

        if self.state.settings().team_mode() {
            let alive_teams: SmallVec<[TeamId; 8]> = team_standings(&standings)
                .iter()
                .filter(|t| t.is_alive())
                .map(|t| t.team_id)
                .collect();
            return match alive_teams.len() {
                0 => Some(BattleResult::no_winner(Some(ALL_TEAMS_ELIMINATED.to_string()))),
                1 => Some(BattleResult::from_teams(alive_teams.to_vec())),
                _ => None,
            };
        }

        let alive: SmallVec<[&Participant; 8]> = standings
            .iter()
            .filter(|s| s.alive)
            .map(|s| &s.participant)
            .collect();
        match alive.len() {
            0 => Some(BattleResult::no_winner(Some(
                ALL_PARTICIPANTS_ELIMINATED.to_string(),
            ))),
            1 => Some(BattleResult::from_participants(vec![alive[0].clone()])),
            _ => None,
        }
    }

    /// Time-expiry result by remaining health.
    fn resolve_by_health(&self, world: &dyn EntityProvider) -> BattleResult {
        let standings = collect_standings(self.state.scored(), world);

        if self.state.settings().team_mode() {
            let living: Vec<_> = team_standings(&standings)
                .into_iter()
                .filter(|t| t.is_alive())
                .collect();
            if living.is_empty() {
                return BattleResult::no_winner(Some(NO_TEAMS_LEFT.to_string()));
            }
            let top = keep_max_by(living, |t| t.alive_health);
            return BattleResult::from_teams(top.iter().map(|t| t.team_id).collect());
        }

        let living: Vec<_> = standings.into_iter().filter(|s| s.alive).collect();
        if living.is_empty() {
            return BattleResult::no_winner(Some(NO_PARTICIPANTS_LEFT.to_string()));
        }
        let top = keep_max_by(living, |s| s.health);
        BattleResult::from_participants(top.into_iter().map(|s| s.participant).collect())
    }

    fn finish(&mut self, result: BattleResult) -> Vec<BattleEvent> {
        self.state.finish(result).into_iter().collect()
    }
}

impl BattleMode for LastSurvivor {
    fn id(&self) -> ModeId {
        ModeId::LastSurvivor
    }

    fn state(&self) -> &BattleState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BattleState {
        &mut self.state
    }

    fn initialize(&mut self, participants: &[Participant], world: &mut dyn EntityProvider) {
        self.state.register(participants, world);
    }

    fn update(&mut self, dt: f32, world: &mut dyn EntityProvider) -> Vec<BattleEvent> {
        if !self.state.tick(dt) {
            return Vec::new();
        }
        if let Some(result) = self.check_victory(world) {
            return self.finish(result);
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
        tracing::debug!(participant_id = notice.participant_id, "Participant eliminated");
        match self.check_victory(world) {
            Some(result) => self.finish(result),
            None => Vec::new(),
        }
    }

    fn end_battle(&mut self, world: &mut dyn EntityProvider) -> Vec<BattleEvent> {
        if self.is_over() {
            return Vec::new();
        }
        let result = self.resolve_by_health(world);
        self.finish(result)
    }
}
