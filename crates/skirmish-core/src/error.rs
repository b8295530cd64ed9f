/// Invalid battle or match configuration values.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidDuration(f32),
    InvalidTickRate(f32),
    InvalidMaxHealth(i32),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDuration(d) => {
                write!(f, "battle duration must be a positive number of seconds, got {d}")
            },
            Self::InvalidTickRate(r) => write!(f, "tick rate must be positive, got {r}"),
            Self::InvalidMaxHealth(h) => write!(f, "max health must be positive, got {h}"),
            Self::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors that abort match setup before any participant state is touched.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupError {
    UnknownMode(String),
    InvalidConfig(ConfigError),
    /// Discovery found nobody to fight.
    NoParticipants,
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownMode(selector) => write!(f, "unknown battle mode: {selector:?}"),
            Self::InvalidConfig(e) => write!(f, "invalid match configuration: {e}"),
            Self::NoParticipants => write!(f, "no participants found in the arena"),
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidConfig(e) => Some(e),
            Self::UnknownMode(_) | Self::NoParticipants => None,
        }
    }
}

impl From<ConfigError> for SetupError {
    fn from(e: ConfigError) -> Self {
        Self::InvalidConfig(e)
    }
}
