use std::time::{Duration, Instant};

/// Tracks a quiet period: every `trigger` pushes the deadline back, and the
/// debounced action is due once the deadline passes without another trigger
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    /// Set while an action is pending
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay_ms: u64) -> Self {
        Self::with_delay(Duration::from_millis(delay_ms))
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Register an event, restarting the quiet period
    pub fn trigger(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// True exactly once per quiet period, when the deadline has passed.
    /// Consumes the pending action.
    pub fn should_execute(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Time left until the action is due; `None` when nothing is pending
    pub fn time_remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Cancel the pending action
    pub fn reset(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}
