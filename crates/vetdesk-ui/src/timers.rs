// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::{Duration, Instant};

/// Trailing-edge debounce driven by explicit clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Restarts the countdown.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once, on the first tick at or after the deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Debounce;
    use std::time::{Duration, Instant};

    #[test]
    fn fires_once_after_the_last_trigger() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(150));
        assert!(!debounce.fire(start));

        debounce.trigger(start);
        debounce.trigger(start + Duration::from_millis(100));
        assert!(!debounce.fire(start + Duration::from_millis(200)));
        assert!(debounce.fire(start + Duration::from_millis(250)));
        assert!(!debounce.fire(start + Duration::from_millis(400)));
        assert!(!debounce.is_pending());
    }
}
