use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SetupError};

/// Selector for a battle mode variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeId {
    /// Last participant (or team) standing wins.
    LastSurvivor,
    /// Fewest deaths when the clock runs out wins; participants respawn.
    FewestDeaths,
}

impl ModeId {
    pub const ALL: [ModeId; 2] = [ModeId::LastSurvivor, ModeId::FewestDeaths];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LastSurvivor => "last_survivor",
            Self::FewestDeaths => "fewest_deaths",
        }
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeId {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "last_survivor" | "free_for_all" | "ffa" => Ok(Self::LastSurvivor),
            "fewest_deaths" | "least_deaths" => Ok(Self::FewestDeaths),
            _ => Err(SetupError::UnknownMode(s.to_string())),
        }
    }
}

/// Per-battle configuration, immutable once the mode is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeSettings {
    duration_secs: f32,
    team_mode: bool,
}

impl ModeSettings {
    pub fn new(duration_secs: f32, team_mode: bool) -> Result<Self, ConfigError> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(ConfigError::InvalidDuration(duration_secs));
        }
        Ok(Self {
            duration_secs,
            team_mode,
        })
    }

    pub fn duration_secs(&self) -> f32 {
        self.duration_secs
    }

    pub fn team_mode(&self) -> bool {
        self.team_mode
    }
}
