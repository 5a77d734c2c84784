// src/ids.rs

//! Activity ID allocation.
//!
//! Activity IDs are the human-facing task identifiers `A1010`, `A1020`, ...
//! The allocator is an explicit value: whoever owns the server or seeding
//! context constructs one and hands `&mut` access to task creation.

use tracing::{debug, warn};

const FIRST_ACTIVITY_NUMBER: u64 = 1010;
const ACTIVITY_STEP: u64 = 10;
const ACTIVITY_PREFIX: char = 'A';

/// Monotonic sequence of activity IDs.
#[derive(Debug, Clone)]
pub struct ActivityIdAllocator {
    next: u64,
}

impl ActivityIdAllocator {
    pub fn new() -> Self {
        Self {
            next: FIRST_ACTIVITY_NUMBER,
        }
    }

    /// Hand out the next ID. Values are never reused.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> String {
        let n = self.next;
        self.next += ACTIVITY_STEP;
        debug!(activity_id = n, "allocated activity id");
        format_activity_id(n)
    }

    /// The ID the next call to [`next`](Self::next) will return.
    pub fn peek(&self) -> String {
        format_activity_id(self.next)
    }

    /// Move the sequence past an ID that was issued earlier, e.g. by a
    /// previous process whose project was loaded from storage.
    ///
    /// IDs that do not parse are ignored with a warning.
    pub fn resume_after(&mut self, activity_id: &str) {
        match parse_activity_number(activity_id) {
            Some(n) if n >= self.next => {
                self.next = n + ACTIVITY_STEP;
                debug!(activity_id, next = self.next, "activity sequence resumed");
            }
            Some(_) => {}
            None => warn!(activity_id, "ignoring unparseable activity id"),
        }
    }
}

impl Default for ActivityIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

fn format_activity_id(n: u64) -> String {
    format!("{ACTIVITY_PREFIX}{n}")
}

/// Numeric part of an activity ID such as `"A1030"`.
pub fn parse_activity_number(activity_id: &str) -> Option<u64> {
    activity_id
        .strip_prefix(ACTIVITY_PREFIX)
        .and_then(|digits| digits.parse::<u64>().ok())
}
