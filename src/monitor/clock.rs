use std::time::{Duration, Instant};

/// Whole seconds since the session started, shifted by a fixed offset to line
/// up with the emulator's own clock.
#[derive(Debug, Clone, Copy)]
pub struct EmulationClock {
    started: Option<Instant>,
    offset_s: u64,
}

impl EmulationClock {
    /// A clock for a session that has not started. It always reads zero.
    pub fn idle(offset_s: u64) -> Self {
        Self {
            started: None,
            offset_s,
        }
    }

    pub fn start(offset_s: u64) -> Self {
        Self {
            started: Some(Instant::now()),
            offset_s,
        }
    }

    pub fn now(&self) -> u64 {
        match self.started {
            Some(started) => self.at(started.elapsed()),
            None => 0,
        }
    }

    pub fn at(&self, elapsed: Duration) -> u64 {
        elapsed.as_secs() + self.offset_s
    }
}
