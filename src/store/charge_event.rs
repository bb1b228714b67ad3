//! Charge-event records and their gateway operations
//!
//! A charge event with a null end time is "in progress". The gateway keeps
//! at most one in-progress event per vehicle; this is an application-level
//! check, not a database constraint.

use super::Store;
use crate::error::{ChargelogError, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};

/// One charging session record, from plug-in to unplug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeEvent {
    /// Row ID, assigned on insert
    pub id: i64,

    /// Odometer reading at plug-in
    pub odometer: i64,

    /// Start time of the session
    pub start_time: DateTime<Utc>,

    /// End time of the session (if completed)
    pub end_time: Option<DateTime<Utc>>,

    /// Battery percentage at start
    pub battery_start_pct: i32,

    /// Battery percentage at end (if completed)
    pub battery_end_pct: Option<i32>,

    /// Indicated range in miles at start
    pub battery_start_range: i32,

    /// Indicated range in miles at end (if completed)
    pub battery_end_range: Option<i32>,

    /// Owning vehicle
    pub vehicle_id: i64,

    /// Charger output in kilowatts
    pub kilowatt_rate: f64,

    /// Cost of one kWh in pence
    pub pence_per_kwh: i64,

    /// Total session cost (if completed)
    pub total_cost: Option<f64>,
}

impl ChargeEvent {
    /// Whether the event has not been completed yet
    pub fn in_progress(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Fields recorded when a session starts
#[derive(Debug, Clone)]
pub struct NewChargeEvent {
    pub vehicle_id: i64,
    pub odometer: i64,
    pub start_time: DateTime<Utc>,
    pub battery_start_pct: i32,
    pub battery_start_range: i32,
    pub kilowatt_rate: f64,
    pub pence_per_kwh: i64,
}

/// Fields recorded when a session stops
#[derive(Debug, Clone)]
pub struct ChargeCompletion {
    pub end_time: DateTime<Utc>,
    pub battery_end_pct: i32,
    pub battery_end_range: i32,
    pub total_cost: f64,
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_charge_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChargeEvent> {
    let start_raw: String = row.get("start_time")?;
    let end_raw: Option<String> = row.get("end_time")?;
    let end_time = match end_raw {
        Some(raw) => Some(parse_timestamp(3, &raw)?),
        None => None,
    };

    Ok(ChargeEvent {
        id: row.get("id")?,
        odometer: row.get("odometer")?,
        start_time: parse_timestamp(2, &start_raw)?,
        end_time,
        battery_start_pct: row.get("battery_start_pct")?,
        battery_end_pct: row.get("battery_end_pct")?,
        battery_start_range: row.get("battery_start_range")?,
        battery_end_range: row.get("battery_end_range")?,
        vehicle_id: row.get("vehicle_id")?,
        kilowatt_rate: row.get("kilowatt_rate")?,
        pence_per_kwh: row.get("cost_per_kwh_pence")?,
        total_cost: row.get("total_cost")?,
    })
}

impl Store {
    /// Insert an in-progress charge event for a session start
    ///
    /// Refused when the vehicle already has an event with no end time.
    pub async fn start_charge_event(&self, event: NewChargeEvent) -> Result<i64> {
        let vehicle_id = event.vehicle_id;
        let id = self
            .call(move |conn| {
                let active: Option<i64> = conn
                    .prepare_cached(
                        "SELECT id FROM charge_events
                         WHERE vehicle_id = ?1 AND end_time IS NULL",
                    )?
                    .query_row([event.vehicle_id], |row| row.get(0))
                    .optional()?;
                if let Some(active_id) = active {
                    return Err(ChargelogError::session(format!(
                        "Vehicle {} already has charge event {} in progress",
                        event.vehicle_id, active_id
                    )));
                }

                conn.execute(
                    "INSERT INTO charge_events
                         (odometer, start_time, battery_start_pct, battery_start_range,
                          vehicle_id, kilowatt_rate, cost_per_kwh, cost_per_kwh_pence)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        event.odometer,
                        event.start_time.to_rfc3339(),
                        event.battery_start_pct,
                        event.battery_start_range,
                        event.vehicle_id,
                        event.kilowatt_rate,
                        event.pence_per_kwh as f64 / 100.0,
                        event.pence_per_kwh,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        self.logger().debug(&format!(
            "Started charge event {} for vehicle {}",
            id, vehicle_id
        ));
        Ok(id)
    }

    /// Complete an in-progress charge event with its end readings
    pub async fn complete_charge_event(&self, id: i64, end: ChargeCompletion) -> Result<()> {
        let updated = self
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE charge_events
                     SET end_time = ?1, battery_end_pct = ?2,
                         battery_end_range = ?3, total_cost = ?4
                     WHERE id = ?5 AND end_time IS NULL",
                    params![
                        end.end_time.to_rfc3339(),
                        end.battery_end_pct,
                        end.battery_end_range,
                        end.total_cost,
                        id,
                    ],
                )?)
            })
            .await?;
        if updated == 0 {
            return Err(ChargelogError::session(format!(
                "No in-progress charge event with id {}",
                id
            )));
        }
        self.logger()
            .debug(&format!("Completed charge event {}", id));
        Ok(())
    }

    /// Fetch a charge event by ID
    pub async fn charge_event(&self, id: i64) -> Result<Option<ChargeEvent>> {
        self.call(move |conn| {
            let mut stmt = conn.prepare_cached("SELECT * FROM charge_events WHERE id = ?1")?;
            Ok(stmt.query_row([id], row_to_charge_event).optional()?)
        })
        .await
    }

    /// The vehicle's in-progress charge event, if any
    pub async fn active_charge_event(&self, vehicle_id: i64) -> Result<Option<ChargeEvent>> {
        self.call(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT * FROM charge_events
                 WHERE vehicle_id = ?1 AND end_time IS NULL",
            )?;
            Ok(stmt
                .query_row([vehicle_id], row_to_charge_event)
                .optional()?)
        })
        .await
    }

    /// Charge history for a vehicle, newest first
    pub async fn charge_events_for_vehicle(&self, vehicle_id: i64) -> Result<Vec<ChargeEvent>> {
        self.call(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT * FROM charge_events
                 WHERE vehicle_id = ?1
                 ORDER BY start_time DESC",
            )?;
            let rows = stmt.query_map([vehicle_id], row_to_charge_event)?;
            let mut events = Vec::new();
            for row in rows {
                events.push(row?);
            }
            Ok(events)
        })
        .await
    }

    /// Delete a charge event, returning the number of rows removed
    pub async fn delete_charge_event(&self, id: i64) -> Result<usize> {
        let deleted = self
            .call(move |conn| Ok(conn.execute("DELETE FROM charge_events WHERE id = ?1", [id])?))
            .await?;
        self.logger()
            .debug(&format!("Deleted charge event {} ({} rows)", id, deleted));
        Ok(deleted)
    }
}
