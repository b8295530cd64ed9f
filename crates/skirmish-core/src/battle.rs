use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::leaderboard::LeaderboardEntry;
use crate::mode::{ModeId, ModeSettings};
use crate::participant::{
    DeathNotice, EntityProvider, Participant, ParticipantId, SubscriptionToken,
};
use crate::phase::BattlePhase;
use crate::result::BattleResult;

/// Events raised by a battle mode, delivered synchronously on the call that
/// produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// Terminal result. Raised exactly once per battle.
    Ended(BattleResult),
    /// Full leaderboard, sorted ascending by deaths. The latest one wins.
    LeaderboardUpdated(Vec<LeaderboardEntry>),
}

/// Contract every battle mode implements.
///
/// The orchestrator owns the entity provider and lends it to each call; a
/// mode never holds on to entities between calls.
pub trait BattleMode: Send {
    fn id(&self) -> ModeId;

    /// Shared lifecycle state (phase, clock, roster, subscriptions).
    fn state(&self) -> &BattleState;

    fn state_mut(&mut self) -> &mut BattleState;

    /// Store the roster and subscribe to each participant's death
    /// notifications. Participants without a health source are excluded.
    fn initialize(&mut self, participants: &[Participant], world: &mut dyn EntityProvider);

    /// Advance the battle clock and re-evaluate the win condition.
    fn update(&mut self, dt: f32, world: &mut dyn EntityProvider) -> Vec<BattleEvent>;

    /// React to one death notification. Stale or late notices are ignored.
    fn handle_death(
        &mut self,
        notice: DeathNotice,
        world: &mut dyn EntityProvider,
    ) -> Vec<BattleEvent>;

    /// Resolve the battle as if the clock had run out. No-op once over.
    fn end_battle(&mut self, world: &mut dyn EntityProvider) -> Vec<BattleEvent>;

    /// Enter `Active` and reset the clock. Calling it again while active
    /// restarts the clock; it is rejected once the battle is over.
    fn start(&mut self) -> bool {
        self.state_mut().start()
    }

    /// Release every subscription and pending scheduled work.
    fn teardown(&mut self, world: &mut dyn EntityProvider) {
        self.state_mut().unsubscribe_all(world);
    }

    fn settings(&self) -> ModeSettings {
        self.state().settings()
    }

    fn phase(&self) -> BattlePhase {
        self.state().phase()
    }

    fn is_over(&self) -> bool {
        self.phase() == BattlePhase::Over
    }

    fn elapsed(&self) -> f32 {
        self.state().elapsed()
    }

    fn subscription_count(&self) -> usize {
        self.state().subscription_count()
    }
}

/// Lifecycle state shared by every mode: the phase machine, the clock, the
/// roster and the per-participant death subscriptions.
#[derive(Debug)]
pub struct BattleState {
    settings: ModeSettings,
    phase: BattlePhase,
    elapsed: f32,
    scored: Vec<Participant>,
    subscriptions: HashMap<ParticipantId, SubscriptionToken>,
}

impl BattleState {
    pub fn new(settings: ModeSettings) -> Self {
        Self {
            settings,
            phase: BattlePhase::Uninitialized,
            elapsed: 0.0,
            scored: Vec::new(),
            subscriptions: HashMap::new(),
        }
    }

    /// Single transition function for the phase machine.
    pub fn transition(&mut self, next: BattlePhase) -> bool {
        if !self.phase.can_transition_to(next) {
            tracing::debug!(from = ?self.phase, to = ?next, "Rejected battle phase transition");
            return false;
        }
        tracing::debug!(from = ?self.phase, to = ?next, "Battle phase transition");
        self.phase = next;
        true
    }

    /// Subscribe to every health source and enter
    /// `Countdown`. Returns `false` if the battle was already initialized.
    pub fn register(&mut self, participants: &[Participant], world: &mut dyn EntityProvider) -> bool {
        if !self.transition(BattlePhase::Countdown) {
            tracing::warn!("Battle already initialized; ignoring roster");
            return false;
        }
        for participant in participants {
            match world.subscribe_death(participant.id) {
                Some(token) => {
                    self.subscriptions.insert(participant.id, token);
                    self.scored.push(participant.clone());
                },
                None => tracing::warn!(
                    participant_id = participant.id,
                    name = %participant.name,
                    "Participant has no health source; excluded from scoring"
                ),
            }
        }
        true
    }

    pub fn start(&mut self) -> bool {
        if !self.transition(BattlePhase::Active) {
            return false;
        }
        self.elapsed = 0.0;
        tracing::info!(
            participants = self.scored.len(),
            duration_secs = self.settings.duration_secs(),
            team_mode = self.settings.team_mode(),
            "Battle started"
        );
        true
    }

    /// Accumulate `dt` while active. Returns `false` when the clock is not
    /// running, in which case the caller must do nothing.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.phase != BattlePhase::Active {
            return false;
        }
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
        true
    }

    pub fn expired(&self) -> bool {
        self.elapsed >= self.settings.duration_secs()
    }

    /// Whether a death notice belongs to a live subscription of this battle.
    pub fn accepts(&self, notice: &DeathNotice) -> bool {
        self.phase.accepts_deaths()
            && self.subscriptions.get(&notice.participant_id) == Some(&notice.token)
    }

    /// Move to `Over` and produce the terminal event. Returns `None` when
    /// the battle had already ended, so a result can never be raised twice.
    pub fn finish(&mut self, result: BattleResult) -> Option<BattleEvent> {
        if !self.transition(BattlePhase::Over) {
            return None;
        }
        tracing::info!(
            elapsed_secs = self.elapsed,
            is_tie = result.is_tie(),
            "Battle ended: {result}"
        );
        Some(BattleEvent::Ended(result))
    }

    pub fn unsubscribe_all(&mut self, world: &mut dyn EntityProvider) {
        for (participant_id, token) in self.subscriptions.drain() {
            tracing::trace!(participant_id, "Unsubscribed from death notifications");
            world.unsubscribe_death(token);
        }
    }

    pub fn settings(&self) -> ModeSettings {
        self.settings
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Roster members with a health source, in discovery order.
    pub fn scored(&self) -> &[Participant] {
        &self.scored
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::Position;
    use crate::world::InMemoryWorld;
    use proptest::prelude::*;

    fn settings() -> ModeSettings {
        ModeSettings::new(10.0, false).unwrap()
    }

    fn world(with_health: &[bool]) -> (InMemoryWorld, Vec<Participant>) {
        let mut world = InMemoryWorld::new();
        for (i, &has_health) in with_health.iter().enumerate() {
            let p = Participant::new(i as u64 + 1, format!("Player{}", i + 1), 0);
            if has_health {
                world.spawn(p, Position::default(), 100);
            } else {
                world.spawn_without_health(p, Position::default());
            }
        }
        let participants = world.participants();
        (world, participants)
    }

    #[test]
    fn register_enters_countdown_once() {
        let (mut w, ps) = world(&[true, true]);
        let mut state = BattleState::new(settings());
        assert!(state.register(&ps, &mut w));
        assert_eq!(state.phase(), BattlePhase::Countdown);
        assert!(!state.register(&ps, &mut w));
        assert_eq!(w.subscription_count(), 2);
    }

    #[test]
    fn tick_only_runs_while_active() {
        let mut state = BattleState::new(settings());
        assert!(!state.tick(1.0));
        assert_eq!(state.elapsed(), 0.0);
        state.start();
        assert!(state.tick(1.0));
        assert!(state.tick(f32::NAN));
        assert_eq!(state.elapsed(), 1.0);
    }

    #[test]
    fn restart_resets_clock() {
        let mut state = BattleState::new(settings());
        state.start();
        state.tick(4.0);
        assert!(state.start());
        assert_eq!(state.elapsed(), 0.0);
    }

    #[test]
    fn finish_only_once_and_blocks_restart() {
        let mut state = BattleState::new(settings());
        state.start();
        assert!(state.finish(BattleResult::no_winner(None)).is_some());
        assert!(state.finish(BattleResult::no_winner(None)).is_none());
        assert!(!state.start());
        assert!(!state.tick(1.0));
    }

    #[test]
    fn stale_tokens_are_not_accepted() {
        let (mut w, ps) = world(&[true]);
        let mut state = BattleState::new(settings());
        state.register(&ps, &mut w);
        let notice = DeathNotice {
            token: SubscriptionToken(999),
            participant_id: 1,
        };
        assert!(!state.accepts(&notice));

        w.kill(1);
        let real = w.drain_deaths()[0];
        assert!(state.accepts(&real));

        state.finish(BattleResult::no_winner(None));
        assert!(!state.accepts(&real));
    }

    #[test]
    fn unsubscribe_all_releases_world_subscriptions() {
        let (mut w, ps) = world(&[true, true, false]);
        let mut state = BattleState::new(settings());
        state.register(&ps, &mut w);
        state.unsubscribe_all(&mut w);
        assert_eq!(state.subscription_count(), 0);
        assert_eq!(w.subscription_count(), 0);
        assert_eq!(state.scored().len(), 2);
    }

    proptest! {
        #[test]
        fn subscriptions_match_health_sources(flags in prop::collection::vec(any::<bool>(), 0..12)) {
            let (mut w, ps) = world(&flags);
            let mut state = BattleState::new(settings());
            state.register(&ps, &mut w);
            let expected = flags.iter().filter(|&&f| f).count();
            prop_assert_eq!(state.subscription_count(), expected);
            prop_assert_eq!(w.subscription_count(), expected);
        }
    }
}
