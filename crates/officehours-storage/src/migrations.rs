// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations, applied on every open.

use officehours_core::OfficeHoursError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply pending migrations. Refinery records progress in
/// `refinery_schema_history`, so this is a no-op on an up-to-date file.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), OfficeHoursError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| OfficeHoursError::Storage {
            source: Box::new(e),
        })?;
    for migration in report.applied_migrations() {
        tracing::info!(version = migration.version(), name = migration.name(), "applied migration");
    }
    Ok(())
}
