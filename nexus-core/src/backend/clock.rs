//! Time and identifier sources for generated records

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Local, NaiveDateTime};

const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Source of "now" for mock data
pub trait Clock: Send + Sync {
    /// Current local wall-clock time
    fn now(&self) -> NaiveDateTime;
}

/// Reads the system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Source of booking references and ticket suffixes
pub trait IdSource: Send + Sync {
    /// Six characters from `[A-Z0-9]`
    fn booking_reference(&self) -> String;

    /// Six uppercase hex characters
    fn ticket_suffix(&self) -> String;
}

/// Random ids: fastrand for references, uuid v4 for ticket suffixes
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn booking_reference(&self) -> String {
        (0..6)
            .map(|_| REFERENCE_ALPHABET[fastrand::usize(..REFERENCE_ALPHABET.len())] as char)
            .collect()
    }

    fn ticket_suffix(&self) -> String {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        hex[..6].to_uppercase()
    }
}

/// Counting ids, `000001`, `000002`, ... shared by both kinds
#[derive(Debug, Default)]
pub struct SequenceIds {
    next: AtomicU64,
}

impl SequenceIds {
    /// Start counting after `start`
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    fn bump(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{:06X}", n & 0xFF_FFFF)
    }
}

impl IdSource for SequenceIds {
    fn booking_reference(&self) -> String {
        self.bump()
    }

    fn ticket_suffix(&self) -> String {
        self.bump()
    }
}
