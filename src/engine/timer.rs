use std::time::Duration;

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Stimulus display is over; answers are accepted.
    Reveal,
    /// Feedback is over; move to the next round or finish.
    Advance,
    /// Mismatched cards turn face down again.
    HideCards,
    /// Recording hit its length limit.
    RecordingLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    id: TimerId,
    deadline: Duration,
    kind: TimerKind,
}

/// Deadlines owned by one session, polled from the host's tick.
///
/// Once closed nothing fires and nothing new can be scheduled.
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Vec<Scheduled>,
    next_id: u64,
    closed: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Duration, kind: TimerKind) -> Option<TimerId> {
        if self.closed {
            return None;
        }
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled { id, deadline, kind });
        Some(id)
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|t| t.id != id);
    }

    pub fn cancel_kind(&mut self, kind: TimerKind) {
        self.pending.retain(|t| t.kind != kind);
    }

    /// Cancels everything and refuses further scheduling.
    pub fn close(&mut self) {
        self.pending.clear();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|t| t.kind == kind)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|t| t.deadline).min()
    }

    /// Removes and returns the timers due at `now`, earliest first.
    pub fn take_due(&mut self, now: Duration) -> Vec<(TimerKind, Duration)> {
        if self.closed {
            return Vec::new();
        }
        let (mut due, rest): (Vec<Scheduled>, Vec<Scheduled>) =
            self.pending.drain(..).partition(|t| t.deadline <= now);
        self.pending = rest;
        due.sort_by_key(|t| (t.deadline, t.id.0));
        due.into_iter().map(|t| (t.kind, t.deadline)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fires_only_when_due() {
        let mut timers = Scheduler::new();
        timers.schedule(ms(1000), TimerKind::Advance);
        assert!(timers.take_due(ms(999)).is_empty());
        assert_eq!(timers.take_due(ms(1000)), vec![(TimerKind::Advance, ms(1000))]);
        assert!(timers.take_due(ms(5000)).is_empty());
    }

    #[test]
    fn due_timers_come_out_in_deadline_order() {
        let mut timers = Scheduler::new();
        timers.schedule(ms(300), TimerKind::Advance);
        timers.schedule(ms(100), TimerKind::Reveal);
        timers.schedule(ms(900), TimerKind::HideCards);
        let due: Vec<TimerKind> = timers.take_due(ms(500)).into_iter().map(|d| d.0).collect();
        assert_eq!(due, vec![TimerKind::Reveal, TimerKind::Advance]);
        assert_eq!(timers.next_deadline(), Some(ms(900)));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timers = Scheduler::new();
        let id = timers.schedule(ms(100), TimerKind::RecordingLimit).unwrap();
        timers.cancel(id);
        assert!(timers.take_due(ms(1000)).is_empty());
    }

    #[test]
    fn cancel_by_kind() {
        let mut timers = Scheduler::new();
        timers.schedule(ms(100), TimerKind::RecordingLimit);
        timers.schedule(ms(100), TimerKind::Advance);
        timers.cancel_kind(TimerKind::RecordingLimit);
        assert!(!timers.is_pending(TimerKind::RecordingLimit));
        assert!(timers.is_pending(TimerKind::Advance));
    }

    #[test]
    fn closed_scheduler_is_inert() {
        let mut timers = Scheduler::new();
        timers.schedule(ms(100), TimerKind::Advance);
        timers.close();
        assert!(timers.is_closed());
        assert!(timers.take_due(ms(1000)).is_empty());
        assert!(timers.schedule(ms(2000), TimerKind::Advance).is_none());
        assert_eq!(timers.next_deadline(), None);
    }
}
