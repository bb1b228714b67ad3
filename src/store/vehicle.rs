//! Vehicle records and their gateway operations

use super::Store;
use crate::error::{ChargelogError, Result};
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};

/// One registered vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Row ID, assigned on insert
    pub id: i64,

    /// Manufacturer name
    pub manufacturer: String,

    /// Model name
    pub model: String,

    /// Current odometer reading in miles
    pub odometer: i64,

    /// Registration plate
    pub registration: String,

    /// Optional photo reference
    pub photo_path: Option<String>,
}

/// Fields for registering a new vehicle
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub manufacturer: String,
    pub model: String,
    pub odometer: i64,
    pub registration: String,
    pub photo_path: Option<String>,
}

fn row_to_vehicle(row: &rusqlite::Row<'_>) -> rusqlite::Result<Vehicle> {
    Ok(Vehicle {
        id: row.get("id")?,
        manufacturer: row.get("manufacturer")?,
        model: row.get("model")?,
        odometer: row.get("odometer")?,
        registration: row.get("registration")?,
        photo_path: row.get("photo_path")?,
    })
}

impl Store {
    /// Register a new vehicle, returning its assigned ID
    pub async fn add_vehicle(&self, vehicle: NewVehicle) -> Result<i64> {
        let id = self
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO vehicles (manufacturer, model, odometer, registration, photo_path)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        vehicle.manufacturer,
                        vehicle.model,
                        vehicle.odometer,
                        vehicle.registration,
                        vehicle.photo_path,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        self.logger().debug(&format!("Registered vehicle {}", id));
        Ok(id)
    }

    /// Fetch a vehicle by ID
    pub async fn vehicle(&self, id: i64) -> Result<Option<Vehicle>> {
        self.call(move |conn| {
            let mut stmt = conn.prepare_cached("SELECT * FROM vehicles WHERE id = ?1")?;
            Ok(stmt.query_row([id], row_to_vehicle).optional()?)
        })
        .await
    }

    /// List all vehicles, oldest registration first
    pub async fn vehicles(&self) -> Result<Vec<Vehicle>> {
        self.call(|conn| {
            let mut stmt = conn.prepare_cached("SELECT * FROM vehicles ORDER BY id")?;
            let rows = stmt.query_map([], row_to_vehicle)?;
            let mut vehicles = Vec::new();
            for row in rows {
                vehicles.push(row?);
            }
            Ok(vehicles)
        })
        .await
    }

    /// Update all mutable fields of a vehicle
    pub async fn update_vehicle(&self, vehicle: Vehicle) -> Result<()> {
        let id = vehicle.id;
        let updated = self
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE vehicles
                     SET manufacturer = ?1, model = ?2, odometer = ?3,
                         registration = ?4, photo_path = ?5
                     WHERE id = ?6",
                    params![
                        vehicle.manufacturer,
                        vehicle.model,
                        vehicle.odometer,
                        vehicle.registration,
                        vehicle.photo_path,
                        vehicle.id,
                    ],
                )?)
            })
            .await?;
        if updated == 0 {
            return Err(ChargelogError::database(format!("No vehicle with id {}", id)));
        }
        Ok(())
    }

    /// Delete a vehicle, returning the number of rows removed
    pub async fn delete_vehicle(&self, id: i64) -> Result<usize> {
        let deleted = self
            .call(move |conn| Ok(conn.execute("DELETE FROM vehicles WHERE id = ?1", [id])?))
            .await?;
        self.logger()
            .debug(&format!("Deleted vehicle {} ({} rows)", id, deleted));
        Ok(deleted)
    }
}
