use std::fmt;

use serde::{Deserialize, Serialize};

use crate::participant::TeamId;
use crate::standings::{ParticipantStanding, TeamStanding};

/// One named row on the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub death_count: u32,
}

impl fmt::Display for LeaderboardEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: deaths - {}", self.name, self.death_count)
    }
}

/// Label used for a team row.
pub fn team_label(team_id: TeamId) -> String {
    format!("Team {team_id}")
}

/// Sort ascending by deaths. The sort is stable, so equal counts keep
/// discovery order.
pub fn rank(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries.sort_by_key(|e| e.death_count);
    entries
}

/// One row per participant, labelled by name.
pub fn individual_leaderboard(standings: &[ParticipantStanding]) -> Vec<LeaderboardEntry> {
    rank(
        standings
            .iter()
            .map(|s| LeaderboardEntry {
                name: s.participant.name.clone(),
                death_count: s.deaths,
            })
            .collect(),
    )
}

/// One row per team with summed deaths.
pub fn team_leaderboard(teams: &[TeamStanding]) -> Vec<LeaderboardEntry> {
    rank(
        teams
            .iter()
            .map(|t| LeaderboardEntry {
                name: team_label(t.team_id),
                death_count: t.total_deaths,
            })
            .collect(),
    )
}
