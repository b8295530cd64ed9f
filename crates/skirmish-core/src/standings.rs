//! Scoring views over the roster and the tie-break narrowing used by every
//! battle mode.

use crate::participant::{EntityProvider, Participant, TeamId};

/// A scored participant as seen at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantStanding {
    pub participant: Participant,
    pub alive: bool,
    pub health: i32,
    pub deaths: u32,
}

/// Per-team aggregate, in order of the team's first appearance in the roster.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamStanding {
    pub team_id: TeamId,
    pub alive_members: usize,
    /// Summed health of living members only.
    pub alive_health: i32,
    /// Summed health of every member.
    pub total_health: i32,
    pub total_deaths: u32,
}

impl TeamStanding {
    pub fn is_alive(&self) -> bool {
        self.alive_members > 0
    }
}

/// Read the current standing of every roster member that still has a
/// health source. Members without one are skipped.
pub fn collect_standings(
    roster: &[Participant],
    world: &dyn EntityProvider,
) -> Vec<ParticipantStanding> {
    roster
        .iter()
        .filter_map(|p| {
            world.snapshot(p.id).map(|s| ParticipantStanding {
                participant: p.clone(),
                alive: s.alive,
                health: s.current_health,
                deaths: s.death_count,
            })
        })
        .collect()
}

/// Group standings by team, preserving first-appearance order.
pub fn team_standings(standings: &[ParticipantStanding]) -> Vec<TeamStanding> {
    let mut teams: Vec<TeamStanding> = Vec::new();
    for s in standings {
        let idx = match teams
            .iter()
            .position(|t| t.team_id == s.participant.team_id)
        {
            Some(idx) => idx,
            None => {
                teams.push(TeamStanding {
                    team_id: s.participant.team_id,
                    alive_members: 0,
                    alive_health: 0,
                    total_health: 0,
                    total_deaths: 0,
                });
                teams.len() - 1
            },
        };
        let team = &mut teams[idx];
        if s.alive {
            team.alive_members += 1;
            team.alive_health += s.health;
        }
        team.total_health += s.health;
        team.total_deaths += s.deaths;
    }
    teams
}

/// Keep only the candidates that share the maximum `key`.
pub fn keep_max_by<T, K: Ord>(candidates: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let Some(best) = candidates.iter().map(&key).max() else {
        return candidates;
    };
    candidates.into_iter().filter(|c| key(c) == best).collect()
}

/// Keep only the candidates that share the minimum `key`.
pub fn keep_min_by<T, K: Ord>(candidates: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let Some(best) = candidates.iter().map(&key).min() else {
        return candidates;
    };
    candidates.into_iter().filter(|c| key(c) == best).collect()
}
