// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reclamation for officehours.
//!
//! Cron loops sweep unstaffed queues and force staff checkout at the end of
//! the day. A leave prompt asks students in an unstaffed queue whether they
//! still want help, and a named timer removes those who do not answer.

pub mod cron;
pub mod scheduler;
pub mod timers;

pub use cron::{next_delay, parse_schedule, run_cron};
pub use scheduler::{Reclaimer, SweepReport, spawn_cron_jobs};
pub use timers::{TimerKey, TimerKind, TimerRegistry};
