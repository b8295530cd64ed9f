use serde::Serialize;
use tokio::sync::mpsc;

use skirmish_core::leaderboard::LeaderboardEntry;
use skirmish_core::result::BattleResult;

use crate::match_loop::MatchBroadcast;

/// What the presentation layer saw by the time a match finished.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchSummary {
    pub result: Option<BattleResult>,
    /// Last leaderboard received; later updates replace earlier ones.
    pub leaderboard: Vec<LeaderboardEntry>,
    pub leaderboard_updates: usize,
    pub aborted: bool,
}

/// Logs broadcasts as they arrive and keeps the authoritative state.
#[derive(Debug, Default)]
pub struct Presenter {
    summary: MatchSummary,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one broadcast. Returns `false` once the match has finished.
    pub fn present(&mut self, broadcast: MatchBroadcast) -> bool {
        match broadcast {
            MatchBroadcast::Countdown { remaining } => {
                tracing::info!(remaining, "Battle starts in {remaining}...");
            },
            MatchBroadcast::Started => tracing::info!("Fight!"),
            MatchBroadcast::LeaderboardUpdated(entries) => {
                for (rank, entry) in entries.iter().enumerate() {
                    tracing::info!(rank = rank + 1, "{entry}");
                }
                self.summary.leaderboard = entries;
                self.summary.leaderboard_updates += 1;
            },
            MatchBroadcast::BattleEnded(result) => {
                tracing::info!("{result}");
                self.summary.result = Some(result);
            },
            MatchBroadcast::Aborted => {
                tracing::warn!("Match aborted before a result was reached");
                self.summary.aborted = true;
            },
            MatchBroadcast::Finished => return false,
        }
        true
    }

    /// Drain `rx` until the match finishes or the loop goes away.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<MatchBroadcast>) -> MatchSummary {
        while let Some(broadcast) = rx.recv().await {
            if !self.present(broadcast) {
                break;
            }
        }
        self.summary
    }

    pub fn summary(&self) -> &MatchSummary {
        &self.summary
    }
}
