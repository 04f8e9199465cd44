use std::time::{Duration, Instant};

/// A one-shot deadline owned by the component that armed it.
///
/// Nothing runs in the background: the host passes `now` into `poll`, which
/// reports the expiry exactly once and disarms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancellableTimer {
    deadline: Option<Instant>,
}

impl CancellableTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for `now + delay`, replacing any earlier deadline
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the deadline has passed, without consuming it
    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }

    /// True once when the deadline has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_deadline() {
        let t0 = Instant::now();
        let mut timer = CancellableTimer::new();
        timer.arm(t0, Duration::from_millis(800));

        assert!(!timer.poll(t0 + Duration::from_millis(799)));
        assert!(timer.poll(t0 + Duration::from_millis(800)));
        assert!(!timer.poll(t0 + Duration::from_millis(900)));
        assert!(!timer.is_armed());
    }

    #[test]
    fn cancel_prevents_firing() {
        let t0 = Instant::now();
        let mut timer = CancellableTimer::new();
        timer.arm(t0, Duration::from_millis(10));
        timer.cancel();
        assert!(!timer.poll(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn rearm_replaces_deadline() {
        let t0 = Instant::now();
        let mut timer = CancellableTimer::new();
        timer.arm(t0, Duration::from_millis(10));
        timer.arm(t0 + Duration::from_millis(5), Duration::from_millis(100));
        assert!(!timer.poll(t0 + Duration::from_millis(50)));
        assert_eq!(
            timer.remaining(t0 + Duration::from_millis(50)),
            Some(Duration::from_millis(55))
        );
    }
}
