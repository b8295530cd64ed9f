use std::fmt;

use serde::{Deserialize, Serialize};

use crate::leaderboard::team_label;
use crate::participant::{Participant, TeamId};

/// Who (if anyone) a battle was decided for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winners {
    None,
    Participants(Vec<Participant>),
    Teams(Vec<TeamId>),
}

/// Terminal outcome of one battle. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleResult {
    is_tie: bool,
    winners: Winners,
    message: Option<String>,
}

impl BattleResult {
    /// Result from the participants left after all tie-breaks: one is an
    /// outright win, several are a tie listing all of them, none is a tie
    /// with no winner.
    pub fn from_participants(mut participants: Vec<Participant>) -> Self {
        participants.dedup_by_key(|p| p.id);
        match participants.len() {
            0 => Self::no_winner(None),
            n => Self {
                is_tie: n > 1,
                winners: Winners::Participants(participants),
                message: None,
            },
        }
    }

    /// Team equivalent of [`BattleResult::from_participants`].
    pub fn from_teams(mut teams: Vec<TeamId>) -> Self {
        teams.dedup();
        match teams.len() {
            0 => Self::no_winner(None),
            n => Self {
                is_tie: n > 1,
                winners: Winners::Teams(teams),
                message: None,
            },
        }
    }

    /// A tie with nobody left to declare.
    pub fn no_winner(message: Option<String>) -> Self {
        Self {
            is_tie: true,
            winners: Winners::None,
            message,
        }
    }

    pub fn is_tie(&self) -> bool {
        self.is_tie
    }

    pub fn winners(&self) -> &Winners {
        &self.winners
    }

    pub fn winning_participants(&self) -> Option<&[Participant]> {
        match &self.winners {
            Winners::Participants(p) => Some(p),
            _ => None,
        }
    }

    pub fn winning_teams(&self) -> Option<&[TeamId]> {
        match &self.winners {
            Winners::Teams(t) => Some(t),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for BattleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.winners, self.is_tie) {
            (Winners::None, _) => f.write_str("The battle ended in a tie with no winner.")?,
            (Winners::Participants(p), true) => {
                let names: Vec<&str> = p.iter().map(|p| p.name.as_str()).collect();
                write!(f, "The battle ended in a tie between {}.", names.join(", "))?;
            },
            (Winners::Teams(t), true) => {
                let teams: Vec<String> = t.iter().map(|&t| team_label(t)).collect();
                write!(f, "The battle ended in a tie between {}.", teams.join(", "))?;
            },
            (Winners::Participants(p), false) => {
                let names: Vec<&str> = p.iter().map(|p| p.name.as_str()).collect();
                write!(f, "{} won the battle.", names.join(", "))?;
            },
            (Winners::Teams(t), false) => {
                let teams: Vec<String> = t.iter().map(|&t| team_label(t)).collect();
                write!(f, "{} won the battle.", teams.join(", "))?;
            },
        }
        if let Some(message) = &self.message {
            write!(f, " {message}")?;
        }
        Ok(())
    }
}
