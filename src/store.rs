//! Persistence gateway for Chargelog
//!
//! This module owns the local SQLite database holding vehicles, charge
//! events, and settings. Blocking database calls are dispatched to the
//! runtime's blocking pool one at a time per call site; serialization
//! relies on the single shared connection.

mod charge_event;
mod migrate;
mod setting;
mod vehicle;

pub use charge_event::{ChargeCompletion, ChargeEvent, NewChargeEvent};
pub use migrate::{SCHEMA_VERSION, run_pending_migrations};
pub use setting::{Setting, SettingKey, SettingValue};
pub use vehicle::{NewVehicle, Vehicle};

use crate::error::{ChargelogError, Result};
use crate::logging::get_logger;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Handle to the local database
///
/// Cloning is cheap; all clones share one connection.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    logger: crate::logging::StructuredLogger,
}

impl Store {
    /// Open (or create) the database at the given path and apply pending
    /// migrations
    pub async fn open(path: &str) -> Result<Self> {
        let path = path.to_string();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection> {
            let conn = Connection::open(&path)?;
            run_pending_migrations(&conn)?;
            Ok(conn)
        })
        .await
        .map_err(|e| ChargelogError::database(format!("Blocking task failed: {}", e)))??;

        let logger = get_logger("store");
        logger.info("Opened charge database");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            logger,
        })
    }

    /// Open an in-memory database, mainly for tests
    pub async fn open_in_memory() -> Result<Self> {
        let conn = tokio::task::spawn_blocking(|| -> Result<Connection> {
            let conn = Connection::open_in_memory()?;
            run_pending_migrations(&conn)?;
            Ok(conn)
        })
        .await
        .map_err(|e| ChargelogError::database(format!("Blocking task failed: {}", e)))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            logger: get_logger("store"),
        })
    }

    /// Current schema version of the open database
    pub async fn schema_version(&self) -> Result<i32> {
        self.call(|conn| {
            let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
            Ok(version)
        })
        .await
    }

    /// Run a closure against the connection on the blocking pool
    pub(crate) async fn call<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| ChargelogError::database("Connection mutex poisoned"))?;
            f(&guard)
        })
        .await
        .map_err(|e| ChargelogError::database(format!("Blocking task failed: {}", e)))?
    }

    pub(crate) fn logger(&self) -> &crate::logging::StructuredLogger {
        &self.logger
    }
}
