//! Ordered, numbered schema migrations
//!
//! Each migration runs at most once; the applied version is tracked in the
//! database's `user_version` pragma.

use crate::error::Result;
use rusqlite::Connection;

/// Schema version the application expects
pub const SCHEMA_VERSION: i32 = 2;

/// Migrations in apply order. Entries must stay append-only.
const MIGRATIONS: &[(i32, &str)] = &[
    (
        1,
        r#"
        CREATE TABLE IF NOT EXISTS vehicles (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            manufacturer  TEXT NOT NULL,
            model         TEXT NOT NULL,
            odometer      INTEGER NOT NULL DEFAULT 0,
            registration  TEXT NOT NULL,
            photo_path    TEXT
        );

        CREATE TABLE IF NOT EXISTS charge_events (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            odometer             INTEGER NOT NULL,
            start_time           TEXT NOT NULL,
            end_time             TEXT,
            battery_start_pct    INTEGER NOT NULL,
            battery_end_pct      INTEGER,
            battery_start_range  INTEGER NOT NULL,
            battery_end_range    INTEGER,
            vehicle_id           INTEGER NOT NULL,
            kilowatt_rate        REAL NOT NULL,
            cost_per_kwh         REAL NOT NULL DEFAULT 0.0,
            total_cost           REAL
        );

        CREATE INDEX IF NOT EXISTS idx_charge_events_vehicle
            ON charge_events(vehicle_id);
        CREATE INDEX IF NOT EXISTS idx_charge_events_start
            ON charge_events(start_time);

        CREATE TABLE IF NOT EXISTS settings (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            key         TEXT NOT NULL,
            str_value   TEXT,
            int_value   INTEGER,
            long_value  INTEGER
        );
        "#,
    ),
    // Replace the floating-point cost column with an exact minor-units one,
    // backfilled as round(cost_per_kwh * 100). The old column stays in place
    // for databases written by earlier versions.
    (
        2,
        r#"
        ALTER TABLE charge_events
            ADD COLUMN cost_per_kwh_pence INTEGER NOT NULL DEFAULT 0;

        UPDATE charge_events
            SET cost_per_kwh_pence = CAST(ROUND(cost_per_kwh * 100) AS INTEGER);
        "#,
    ),
];

/// Apply all migrations newer than the database's current version
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    let current: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (version, sql) in MIGRATIONS {
        if *version > current {
            conn.execute_batch(sql)?;
            conn.pragma_update(None, "user_version", version)?;
        }
    }

    Ok(())
}
