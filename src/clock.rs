/// Length of a session in seconds
pub const SESSION_SECS: u32 = 60;
/// Countdown resolution
pub const TICK_MS: u64 = 1000;

/// Countdown clock driving a session.
///
/// The clock itself holds no timer; the session schedules one
/// [`crate::timer::Task::ClockTick`] per second while it is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clock {
    total: u32,
    remaining: u32,
    running: bool,
}

impl Clock {
    pub fn new(total_secs: u32) -> Self {
        Self {
            total: total_secs,
            remaining: total_secs,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.remaining = self.total;
        self.running = self.total > 0;
    }

    /// Safe to call when already stopped
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advances one second. Returns the new remaining time, or `None` when
    /// the clock is not running. Stops itself on reaching zero.
    pub fn tick(&mut self) -> Option<u32> {
        if !self.running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
        }
        Some(self.remaining)
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn elapsed(&self) -> u32 {
        self.total - self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(SESSION_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_does_nothing_until_started() {
        let mut clock = Clock::default();
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.remaining(), SESSION_SECS);
    }

    #[test]
    fn counts_down_and_stops_at_zero() {
        let mut clock = Clock::new(3);
        clock.start();
        assert_eq!(clock.tick(), Some(2));
        assert_eq!(clock.elapsed(), 1);
        assert_eq!(clock.tick(), Some(1));
        assert_eq!(clock.tick(), Some(0));
        assert!(!clock.is_running());
        assert!(clock.is_expired());
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.remaining(), 0);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut clock = Clock::default();
        clock.start();
        clock.stop();
        clock.stop();
        assert!(!clock.is_running());
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn start_resets_remaining() {
        let mut clock = Clock::new(5);
        clock.start();
        clock.tick();
        clock.tick();
        clock.start();
        assert_eq!(clock.remaining(), 5);
        assert!(clock.is_running());
    }
}
