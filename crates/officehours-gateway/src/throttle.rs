// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trailing-edge throttle keyed by (queue, change kind).
//!
//! The first signal for a key opens a window. Signals that arrive while the
//! window is open are absorbed. When the window closes the key is released
//! and a single delivery runs, so the payload is always built from the state
//! at the end of the burst.

use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use officehours_core::{ChangeKind, QueueId};

pub type ThrottleKey = (QueueId, ChangeKind);

#[derive(Debug)]
pub struct Throttle {
    window: Duration,
    open: DashMap<ThrottleKey, u32>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            open: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a signal. Returns true when this signal opened a new window and
    /// the caller must schedule the trailing delivery.
    pub fn arm(&self, key: ThrottleKey) -> bool {
        match self.open.entry(key) {
            Entry::Occupied(mut absorbed) => {
                *absorbed.get_mut() += 1;
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(0);
                true
            }
        }
    }

    /// Close the window for `key`. Returns how many signals it absorbed.
    pub fn release(&self, key: &ThrottleKey) -> u32 {
        self.open.remove(key).map(|(_, n)| n).unwrap_or(0)
    }

    pub fn is_open(&self, key: &ThrottleKey) -> bool {
        self.open.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: ThrottleKey = (QueueId(1), ChangeKind::Questions);

    #[test]
    fn only_the_first_signal_opens_a_window() {
        let throttle = Throttle::new(Duration::from_millis(1000));
        assert!(throttle.arm(KEY));
        assert!(!throttle.arm(KEY));
        assert!(!throttle.arm(KEY));
        assert!(throttle.is_open(&KEY));

        assert_eq!(throttle.release(&KEY), 2);
        assert!(!throttle.is_open(&KEY));
        assert!(throttle.arm(KEY), "a released key opens a fresh window");
    }

    #[test]
    fn kinds_and_queues_have_separate_windows() {
        let throttle = Throttle::new(Duration::from_millis(1000));
        assert!(throttle.arm(KEY));
        assert!(throttle.arm((QueueId(1), ChangeKind::QueueMeta)));
        assert!(throttle.arm((QueueId(2), ChangeKind::Questions)));
        assert_eq!(throttle.release(&(QueueId(9), ChangeKind::Questions)), 0);
    }
}
