use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use skirmish_core::battle::BattleEvent;
use skirmish_core::error::SetupError;
use skirmish_core::leaderboard::LeaderboardEntry;
use skirmish_core::participant::EntityProvider;
use skirmish_core::result::{BattleResult, Winners};

use crate::config::MatchConfig;
use crate::registry::ModeRegistry;
use crate::session::BattleSession;

/// Commands sent from the host to a running match.
#[derive(Debug)]
pub enum MatchCommand {
    /// Tear the match down wherever it is.
    Stop,
    /// Resolve the battle now, as if the clock had run out.
    End,
}

/// Broadcasts sent from the match loop to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchBroadcast {
    /// One countdown second, counting down to 1.
    Countdown { remaining: u32 },
    /// Participants can act and the battle clock is running.
    Started,
    LeaderboardUpdated(Vec<LeaderboardEntry>),
    /// Raised once per match, on the tick the battle was decided.
    BattleEnded(BattleResult),
    /// The match was stopped before a result was reached.
    Aborted,
    /// The loop has exited and the world has been released.
    Finished,
}

/// Set up a battle and spawn its tick loop as a tokio task.
///
/// Setup failures are returned here, before countdown and without any
/// participant having been frozen. The task hands the world back once the
/// battle has been torn down.
pub fn spawn_match<W>(
    registry: &ModeRegistry,
    config: &MatchConfig,
    world: W,
) -> Result<
    (
        mpsc::UnboundedSender<MatchCommand>,
        mpsc::UnboundedReceiver<MatchBroadcast>,
        JoinHandle<W>,
    ),
    SetupError,
>
where
    W: EntityProvider + 'static,
{
    config.validate()?;
    let session = BattleSession::setup(registry, config, world)?;
    let span = tracing::info_span!("match", match_id = %session.match_id(), mode = %session.mode_id());

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();
    let countdown_secs = config.countdown_secs;
    let tick_rate = config.tick_rate;

    let handle = tokio::spawn(
        run_match(session, countdown_secs, tick_rate, cmd_rx, broadcast_tx).instrument(span),
    );

    Ok((cmd_tx, broadcast_rx, handle))
}

/// Countdown, then tick until the battle is decided or a command ends it.
async fn run_match<W: EntityProvider>(
    mut session: BattleSession<W>,
    countdown_secs: u32,
    tick_rate: f32,
    mut cmd_rx: mpsc::UnboundedReceiver<MatchCommand>,
    broadcast_tx: mpsc::UnboundedSender<MatchBroadcast>,
) -> W {
    for remaining in (1..=countdown_secs).rev() {
        tracing::debug!(remaining, "Countdown");
        let _ = broadcast_tx.send(MatchBroadcast::Countdown { remaining });
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(MatchCommand::End) => {
                        tracing::info!("Match ended during countdown");
                        forward(session.end(), &broadcast_tx);
                        return finish(session, &broadcast_tx);
                    },
                    Some(MatchCommand::Stop) | None => {
                        tracing::info!("Match stopped during countdown");
                        return abort(session, &broadcast_tx);
                    },
                }
            }
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
        }
    }

    session.activate();
    let _ = broadcast_tx.send(MatchBroadcast::Started);

    let dt = 1.0 / tick_rate;
    let mut interval = tokio::time::interval(Duration::from_secs_f32(dt));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let ended = forward(session.tick(dt), &broadcast_tx);
                if ended || session.is_over() {
                    break;
                }
            }
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(MatchCommand::End) => {
                        tracing::info!(elapsed = session.mode().elapsed(), "Match ended by command");
                        forward(session.end(), &broadcast_tx);
                        break;
                    },
                    Some(MatchCommand::Stop) | None => {
                        tracing::info!(elapsed = session.mode().elapsed(), "Match stopped mid-battle");
                        return abort(session, &broadcast_tx);
                    },
                }
            }
        }
    }

    finish(session, &broadcast_tx)
}

/// Send battle events on as broadcasts. Returns whether the battle ended.
fn forward(events: Vec<BattleEvent>, broadcast_tx: &mpsc::UnboundedSender<MatchBroadcast>) -> bool {
    let mut ended = false;
    for event in events {
        match event {
            BattleEvent::LeaderboardUpdated(entries) => {
                let _ = broadcast_tx.send(MatchBroadcast::LeaderboardUpdated(entries));
            },
            BattleEvent::Ended(result) => {
                log_result(&result);
                let _ = broadcast_tx.send(MatchBroadcast::BattleEnded(result));
                ended = true;
            },
        }
    }
    ended
}

fn finish<W: EntityProvider>(
    mut session: BattleSession<W>,
    broadcast_tx: &mpsc::UnboundedSender<MatchBroadcast>,
) -> W {
    session.teardown();
    let _ = broadcast_tx.send(MatchBroadcast::Finished);
    session.into_world()
}

fn abort<W: EntityProvider>(
    mut session: BattleSession<W>,
    broadcast_tx: &mpsc::UnboundedSender<MatchBroadcast>,
) -> W {
    session.teardown();
    let _ = broadcast_tx.send(MatchBroadcast::Aborted);
    let _ = broadcast_tx.send(MatchBroadcast::Finished);
    session.into_world()
}

/// Log the outcome in the categories the result can take.
pub fn log_result(result: &BattleResult) {
    match result.winners() {
        Winners::Participants(players) if result.is_tie() => {
            let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
            tracing::info!(players = ?names, "Battle ended in a tie between players");
        },
        Winners::Teams(teams) if result.is_tie() => {
            tracing::info!(teams = ?teams, "Battle ended in a tie between teams");
        },
        Winners::Participants(players) => {
            for p in players {
                tracing::info!(participant_id = p.id, name = %p.name, "Participant won the battle");
            }
        },
        Winners::Teams(teams) => {
            for team_id in teams {
                tracing::info!(team_id, "Team won the battle");
            }
        },
        Winners::None => tracing::info!("Battle ended with no winner"),
    }
    if let Some(message) = result.message() {
        tracing::info!(result_message = message, "Battle result");
    }
}
