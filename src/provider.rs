//! Injectable sources of randomness and time.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

/// Source of the random bytes placed in a stamp's nonce field.
pub trait RandomSource: Send + Sync + Debug {
    fn fill(&self, buf: &mut [u8]);
}

/// Operating-system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandomSource;

impl RandomSource for OsRandomSource {
    fn fill(&self, buf: &mut [u8]) {
        OsRng.fill_bytes(buf);
    }
}

/// Repeats a fixed byte pattern. Only meant for reproducible tests and benchmarks.
#[derive(Debug, Clone, Default)]
pub struct FixedRandomSource {
    pattern: Vec<u8>,
}

impl FixedRandomSource {
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl RandomSource for FixedRandomSource {
    fn fill(&self, buf: &mut [u8]) {
        if self.pattern.is_empty() {
            buf.fill(0);
            return;
        }
        for (dst, src) in buf.iter_mut().zip(self.pattern.iter().cycle()) {
            *dst = *src;
        }
    }
}

/// Abstraction to allow testing/time injection.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
