use serde::{Deserialize, Serialize};

/// Lifecycle of a single battle. Transitions only move forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattlePhase {
    #[default]
    Uninitialized,
    Countdown,
    Active,
    Over,
}

impl BattlePhase {
    /// Whether `self → next` is a legal transition.
    ///
    /// `Active → Active` is allowed and restarts the clock. Nothing leaves
    /// `Over`.
    pub fn can_transition_to(self, next: BattlePhase) -> bool {
        use BattlePhase::*;
        matches!(
            (self, next),
            (Uninitialized, Countdown)
                | (Uninitialized | Countdown | Active, Active)
                | (Uninitialized | Countdown | Active, Over)
        )
    }

    /// Whether death notifications are still scored in this phase.
    pub fn accepts_deaths(self) -> bool {
        matches!(self, BattlePhase::Countdown | BattlePhase::Active)
    }
}
