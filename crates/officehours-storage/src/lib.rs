// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for officehours.
//!
//! WAL-mode SQLite with embedded refinery migrations, a single writer thread
//! via `tokio-rusqlite`, typed query modules, and [`SqliteStore`], the
//! [`officehours_core::QueueStore`] implementation the services run on.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
