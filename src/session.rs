//! Charging session management for Chargelog
//!
//! This module ties the charging status machine, the elapsed-time engine,
//! the persistence gateway and the notification surface together: a user
//! action becomes a status transition, the timer starts or pauses, and on
//! stop a completed charge-event record is handed to the gateway.

use crate::error::{ChargelogError, Result};
use crate::logging::get_logger;
use crate::notify::NotificationSink;
use crate::status::ChargingStatus;
use crate::store::{ChargeCompletion, ChargeEvent, NewChargeEvent, Store};
use crate::timer::ElapsedTimer;
use chrono::Utc;
use tokio::sync::watch;
use tokio::time::Duration;
use uuid::Uuid;

/// Readings captured when the user plugs in
#[derive(Debug, Clone)]
pub struct StartReadings {
    /// Odometer reading in miles
    pub odometer: i64,

    /// Battery percentage
    pub battery_pct: i32,

    /// Indicated range in miles
    pub battery_range: i32,

    /// Charger output in kilowatts
    pub kilowatt_rate: f64,

    /// Cost of one kWh in pence
    pub pence_per_kwh: i64,
}

/// Readings captured when the user unplugs
#[derive(Debug, Clone)]
pub struct EndReadings {
    /// Battery percentage
    pub battery_pct: i32,

    /// Indicated range in miles
    pub battery_range: i32,
}

/// Session manager for tracking charging sessions
pub struct ChargingSessionManager {
    /// Status of the current session instance
    status: ChargingStatus,

    /// Elapsed-time engine
    timer: ElapsedTimer,

    /// Persistence gateway
    store: Store,

    /// Notification surface
    notifier: Box<dyn NotificationSink>,

    /// In-progress charge event row, if any
    active_event_id: Option<i64>,

    /// Vehicle the current session belongs to
    active_vehicle_id: Option<i64>,

    /// Correlation ID of the current session instance
    session_id: Option<Uuid>,

    /// Logger
    logger: crate::logging::StructuredLogger,
}

impl ChargingSessionManager {
    /// Create a new session manager
    pub fn new(store: Store, notifier: Box<dyn NotificationSink>, tick_interval: Duration) -> Self {
        Self {
            status: ChargingStatus::NotStarted,
            timer: ElapsedTimer::new(tick_interval),
            store,
            notifier,
            active_event_id: None,
            active_vehicle_id: None,
            session_id: None,
            logger: get_logger("session"),
        }
    }

    /// Current charging status
    pub fn status(&self) -> ChargingStatus {
        self.status
    }

    /// Current elapsed time in whole seconds
    pub fn elapsed_seconds(&self) -> u64 {
        self.timer.elapsed_seconds()
    }

    /// Subscribe to elapsed-value updates
    pub fn subscribe_elapsed(&self) -> watch::Receiver<u64> {
        self.timer.subscribe()
    }

    /// Row ID of the in-progress charge event, if any
    pub fn active_event_id(&self) -> Option<i64> {
        self.active_event_id
    }

    /// Correlation ID of the current session instance, if any
    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    /// Start a new charging session for a vehicle
    pub async fn start(&mut self, vehicle_id: i64, readings: StartReadings) -> Result<i64> {
        let next = self.status.started()?;

        let vehicle = self
            .store
            .vehicle(vehicle_id)
            .await?
            .ok_or_else(|| ChargelogError::session(format!("No vehicle with id {}", vehicle_id)))?;

        let event_id = self
            .store
            .start_charge_event(NewChargeEvent {
                vehicle_id,
                odometer: readings.odometer,
                start_time: Utc::now(),
                battery_start_pct: readings.battery_pct,
                battery_start_range: readings.battery_range,
                kilowatt_rate: readings.kilowatt_rate,
                pence_per_kwh: readings.pence_per_kwh,
            })
            .await?;

        let session_id = Uuid::new_v4();
        self.timer.start(Duration::ZERO);
        self.status = next;
        self.active_event_id = Some(event_id);
        self.active_vehicle_id = Some(vehicle_id);
        self.session_id = Some(session_id);

        let label = format!("{} {}", vehicle.manufacturer, vehicle.model);
        if let Err(e) = self.notifier.show_charging(&label, session_id).await {
            self.logger
                .warn(&format!("Failed to show charging notification: {}", e));
        }

        self.logger.info(&format!(
            "Started charging session {} (event {}) for vehicle {}",
            session_id, event_id, vehicle_id
        ));
        Ok(event_id)
    }

    /// Re-enter a session left in progress by a previous run
    ///
    /// The timer offset is re-based from the stored start time, so elapsed
    /// time spans the restart.
    pub async fn resume_active(&mut self, vehicle_id: i64) -> Result<Option<i64>> {
        if !self.status.can_start() {
            return Err(ChargelogError::session(format!(
                "Cannot resume a session while {:?}",
                self.status
            )));
        }

        let Some(event) = self.store.active_charge_event(vehicle_id).await? else {
            return Ok(None);
        };

        let offset_secs = (Utc::now() - event.start_time).num_seconds().max(0) as u64;
        let session_id = Uuid::new_v4();

        self.status = self.status.started()?;
        self.timer.start(Duration::from_secs(offset_secs));
        self.active_event_id = Some(event.id);
        self.active_vehicle_id = Some(vehicle_id);
        self.session_id = Some(session_id);

        let label = match self.store.vehicle(vehicle_id).await? {
            Some(v) => format!("{} {}", v.manufacturer, v.model),
            None => format!("vehicle {}", vehicle_id),
        };
        if let Err(e) = self.notifier.show_charging(&label, session_id).await {
            self.logger
                .warn(&format!("Failed to show charging notification: {}", e));
        }

        self.logger.info(&format!(
            "Resumed in-progress charge event {} at offset {}s",
            event.id, offset_secs
        ));
        Ok(Some(event.id))
    }

    /// Pause the charging timer
    pub fn pause_timer(&mut self) -> Result<()> {
        if !self.status.permits_timer() {
            return Err(ChargelogError::session(format!(
                "Timer cannot run while {:?}",
                self.status
            )));
        }
        self.timer.pause();
        Ok(())
    }

    /// Resume the charging timer from its paused offset
    pub fn resume_timer(&mut self) -> Result<()> {
        if !self.status.permits_timer() {
            return Err(ChargelogError::session(format!(
                "Timer cannot run while {:?}",
                self.status
            )));
        }
        self.timer.resume();
        Ok(())
    }

    /// Stop the session normally, completing the stored charge event
    pub async fn stop(&mut self, readings: EndReadings) -> Result<ChargeEvent> {
        let next = self.status.finished()?;
        let event_id = self
            .active_event_id
            .ok_or_else(|| ChargelogError::session("No active charge event to stop"))?;

        let event = self
            .store
            .charge_event(event_id)
            .await?
            .ok_or_else(|| ChargelogError::session(format!("Charge event {} vanished", event_id)))?;

        let elapsed = self.timer.elapsed();
        let total_cost = session_cost(event.kilowatt_rate, event.pence_per_kwh, elapsed);

        self.store
            .complete_charge_event(
                event_id,
                ChargeCompletion {
                    end_time: Utc::now(),
                    battery_end_pct: readings.battery_pct,
                    battery_end_range: readings.battery_range,
                    total_cost,
                },
            )
            .await?;

        self.timer.stop();
        self.status = next;
        self.active_event_id = None;
        self.active_vehicle_id = None;

        if let Err(e) = self.notifier.dismiss().await {
            self.logger
                .warn(&format!("Failed to dismiss charging notification: {}", e));
        }

        self.logger.info(&format!(
            "Finished charging session after {}s, cost {:.2}",
            elapsed.as_secs(),
            total_cost
        ));

        self.store
            .charge_event(event_id)
            .await?
            .ok_or_else(|| ChargelogError::session(format!("Charge event {} vanished", event_id)))
    }

    /// Abort the session, discarding the in-progress charge event
    pub async fn cancel(&mut self) -> Result<()> {
        let next = self.status.cancelled()?;
        let event_id = self
            .active_event_id
            .ok_or_else(|| ChargelogError::session("No active charge event to cancel"))?;

        self.store.delete_charge_event(event_id).await?;
        self.timer.stop();
        self.status = next;
        self.active_event_id = None;
        self.active_vehicle_id = None;

        if let Err(e) = self.notifier.dismiss().await {
            self.logger
                .warn(&format!("Failed to dismiss charging notification: {}", e));
        }

        self.logger
            .info(&format!("Cancelled charging session (event {})", event_id));
        Ok(())
    }

    /// Prepare the manager for a new session after a terminal status
    pub fn reset(&mut self) -> Result<()> {
        match self.status {
            ChargingStatus::NotStarted => Ok(()),
            s if s.is_terminal() => {
                self.status = ChargingStatus::NotStarted;
                self.session_id = None;
                Ok(())
            }
            other => Err(ChargelogError::session(format!(
                "Cannot reset while {:?}",
                other
            ))),
        }
    }

    /// Session statistics for observers
    pub fn get_session_stats(&self) -> serde_json::Value {
        let mut stats = serde_json::Map::new();
        stats.insert(
            "session_active".to_string(),
            self.status.permits_timer().into(),
        );
        stats.insert("status".to_string(), self.status.to_string().into());
        stats.insert("elapsed_seconds".to_string(), self.elapsed_seconds().into());

        match self.active_event_id {
            Some(id) => stats.insert("event_id".to_string(), id.into()),
            None => stats.insert("event_id".to_string(), serde_json::Value::Null),
        };
        match self.active_vehicle_id {
            Some(id) => stats.insert("vehicle_id".to_string(), id.into()),
            None => stats.insert("vehicle_id".to_string(), serde_json::Value::Null),
        };

        serde_json::Value::Object(stats)
    }
}

/// Total cost of a session at the given charger output and unit price
///
/// Energy is `kilowatt_rate * elapsed_hours`; the result is in major
/// currency units rounded to two decimal places.
pub fn session_cost(kilowatt_rate: f64, pence_per_kwh: i64, elapsed: Duration) -> f64 {
    let hours = elapsed.as_secs_f64() / 3600.0;
    let energy_kwh = kilowatt_rate * hours;
    let pence = energy_kwh * pence_per_kwh as f64;
    pence.round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_for_one_hour() {
        // 7.4 kW for one hour at 30p/kWh
        let cost = session_cost(7.4, 30, Duration::from_secs(3600));
        assert!((cost - 2.22).abs() < 1e-9);
    }

    #[test]
    fn cost_is_zero_for_zero_elapsed() {
        assert_eq!(session_cost(7.4, 30, Duration::ZERO), 0.0);
    }
}
