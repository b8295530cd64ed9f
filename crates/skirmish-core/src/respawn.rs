use crate::participant::ParticipantId;

/// Handle identifying one scheduled respawn.
pub type RespawnTaskId = u64;

/// Slack when comparing the clock against a due time, so float steps that
/// land a hair short of the deadline still fire on that tick.
const DUE_EPSILON: f64 = 1e-4;

/// A delayed respawn for one death.
#[derive(Debug, Clone, PartialEq)]
pub struct RespawnTask {
    pub id: RespawnTaskId,
    pub participant_id: ParticipantId,
    pub delay: f32,
    /// Clock time the task fires at. `None` until the tick that scored the
    /// death has been counted.
    pub due_at: Option<f64>,
}

/// Independent per-death respawn timers on an absolute clock.
///
/// Every death gets a fresh task; tasks for the same participant never merge
/// and a new death never cancels an earlier pending one. A task is anchored
/// at the end of the tick its death was scored in, so that tick never counts
/// towards the delay.
#[derive(Debug, Default)]
pub struct RespawnScheduler {
    tasks: Vec<RespawnTask>,
    next_id: RespawnTaskId,
    clock: f64,
}

impl RespawnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, participant_id: ParticipantId, delay: f32) -> RespawnTaskId {
        self.next_id += 1;
        self.tasks.push(RespawnTask {
            id: self.next_id,
            participant_id,
            delay,
            due_at: None,
        });
        self.next_id
    }

    /// Move the clock forward by `dt`, anchor newly scheduled tasks at the
    /// new time and return the tasks that came due, in scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<RespawnTask> {
        if dt.is_finite() && dt > 0.0 {
            self.clock += f64::from(dt);
        }
        let now = self.clock;
        let mut due = Vec::new();
        self.tasks.retain_mut(|task| {
            let due_at = *task.due_at.get_or_insert(now + f64::from(task.delay));
            if now + DUE_EPSILON >= due_at {
                due.push(task.clone());
                false
            } else {
                true
            }
        });
        due
    }

    /// Drop every pending task. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.tasks.len();
        self.tasks.clear();
        cancelled
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Time accumulated through [`RespawnScheduler::advance`].
    pub fn clock(&self) -> f64 {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(tasks: &[RespawnTask]) -> Vec<RespawnTaskId> {
        tasks.iter().map(|t| t.id).collect()
    }

    /// Ticks from the one that scores the death to the one that respawns.
    fn ticks_to_respawn(dt: f32, delay: f32) -> usize {
        let mut s = RespawnScheduler::new();
        s.advance(dt);
        s.schedule(1, delay);
        // The scoring tick itself anchors the task.
        assert!(s.advance(dt).is_empty());
        let mut ticks = 0;
        loop {
            ticks += 1;
            if !s.advance(dt).is_empty() {
                return ticks;
            }
            assert!(ticks < 10_000, "task never fired");
        }
    }

    #[test]
    fn task_fires_once_after_delay() {
        let mut s = RespawnScheduler::new();
        s.schedule(1, 3.0);
        assert!(s.advance(1.0).is_empty());
        assert!(s.advance(1.0).is_empty());
        assert!(s.advance(1.0).is_empty());
        let due = s.advance(1.0);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].participant_id, 1);
        assert_eq!(due[0].due_at, Some(4.0));
        assert!(s.advance(10.0).is_empty());
    }

    #[test]
    fn delay_is_a_whole_number_of_ticks_at_common_rates() {
        for hz in [10.0f32, 20.0, 30.0, 60.0, 64.0, 7.0] {
            let dt = 1.0 / hz;
            let expected = (3.0 * hz).round() as usize;
            assert_eq!(ticks_to_respawn(dt, 3.0), expected, "{hz} Hz");
        }
    }

    #[test]
    fn delay_holds_late_in_a_long_battle() {
        let mut s = RespawnScheduler::new();
        let dt = 1.0 / 20.0;
        for _ in 0..20 * 600 {
            s.advance(dt);
        }
        s.schedule(7, 3.0);
        s.advance(dt);
        let anchored = s.clock();
        let mut ticks = 0;
        while s.advance(dt).is_empty() {
            ticks += 1;
        }
        assert_eq!(ticks + 1, 60);
        assert!((s.clock() - anchored - 3.0).abs() < 1e-3);
    }

    #[test]
    fn overlapping_tasks_for_same_participant_stay_independent() {
        let mut s = RespawnScheduler::new();
        let first = s.schedule(1, 3.0);
        s.advance(1.0);
        let second = s.schedule(1, 3.0);
        assert_ne!(first, second);
        assert_eq!(s.pending(), 2);

        assert!(s.advance(1.0).is_empty());
        assert!(s.advance(1.0).is_empty());
        assert_eq!(ids(&s.advance(1.0)), vec![first]);
        assert_eq!(ids(&s.advance(1.0)), vec![second]);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn non_finite_step_does_not_move_the_clock() {
        let mut s = RespawnScheduler::new();
        s.schedule(1, 1.0);
        s.advance(f32::NAN);
        s.advance(-2.0);
        assert_eq!(s.clock(), 0.0);
        assert!(s.advance(0.5).is_empty());
        assert_eq!(s.advance(0.5).len(), 1);
    }

    #[test]
    fn cancel_all_drops_everything() {
        let mut s = RespawnScheduler::new();
        s.schedule(1, 3.0);
        s.schedule(2, 3.0);
        assert_eq!(s.cancel_all(), 2);
        assert_eq!(s.pending(), 0);
        assert!(s.advance(5.0).is_empty());
    }
}
