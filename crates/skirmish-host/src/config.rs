use serde::Deserialize;

use skirmish_core::error::ConfigError;
use skirmish_core::mode::ModeSettings;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/skirmish.toml";

/// Top-level match configuration, loaded from `config/skirmish.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Battle mode selector (`last_survivor`, `fewest_deaths`).
    pub mode: String,
    pub duration_secs: f32,
    pub team_mode: bool,
    /// Whole seconds of countdown before the battle becomes active.
    pub countdown_secs: u32,
    /// Simulation ticks per second.
    pub tick_rate: f32,
    pub demo: DemoConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            mode: "last_survivor".to_string(),
            duration_secs: 60.0,
            team_mode: false,
            countdown_secs: 5,
            tick_rate: 20.0,
            demo: DemoConfig::default(),
        }
    }
}

/// Headless arena used by the `skirmish` binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub participants: usize,
    /// Number of teams participants are dealt into (round-robin).
    pub teams: u32,
    pub max_health: i32,
    pub damage_per_hit: i32,
    /// Chance per second that an acting participant lands a hit.
    pub hits_per_sec: f64,
    pub seed: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            participants: 4,
            teams: 2,
            max_health: 100,
            damage_per_hit: 15,
            hits_per_sec: 0.6,
            seed: 7,
        }
    }
}

impl MatchConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from `SKIRMISH_CONFIG` or `config/skirmish.toml`, falling back
    /// to defaults, then apply environment overrides.
    pub fn load() -> Self {
        let path = std::env::var("SKIRMISH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(cfg) => {
                    tracing::info!(path = %path, "Loaded match configuration");
                    cfg
                },
                Err(e) => {
                    tracing::warn!(path = %path, "Failed to parse config: {e}, using defaults");
                    Self::default()
                },
            },
            Err(_) => {
                tracing::info!(path = %path, "No config file found, using defaults");
                Self::default()
            },
        };
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(mode) = std::env::var("SKIRMISH_MODE")
            && !mode.is_empty()
        {
            self.mode = mode;
        }
        if let Ok(val) = std::env::var("SKIRMISH_DURATION")
            && let Ok(secs) = val.parse::<f32>()
        {
            self.duration_secs = secs;
        }
        if let Ok(val) = std::env::var("SKIRMISH_TEAM_MODE")
            && let Ok(team_mode) = val.parse::<bool>()
        {
            self.team_mode = team_mode;
        }
        if let Ok(val) = std::env::var("SKIRMISH_COUNTDOWN")
            && let Ok(secs) = val.parse::<u32>()
        {
            self.countdown_secs = secs;
        }
    }

    /// Reject values that would make a match meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mode_settings()?;
        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return Err(ConfigError::InvalidTickRate(self.tick_rate));
        }
        if self.demo.max_health <= 0 {
            return Err(ConfigError::InvalidMaxHealth(self.demo.max_health));
        }
        if self.demo.teams == 0 {
            tracing::warn!("demo.teams is 0; every participant will share team 0");
        }
        Ok(())
    }

    pub fn mode_settings(&self) -> Result<ModeSettings, ConfigError> {
        ModeSettings::new(self.duration_secs, self.team_mode)
    }
}
