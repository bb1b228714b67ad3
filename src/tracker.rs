//! Core tracker runtime for Chargelog
//!
//! This module contains the main runtime loop that coordinates the session
//! manager, the persistence gateway and external commands.

use crate::config::Config;
use crate::error::Result;
use crate::logging::get_logger;
use crate::notify::{LogNotifier, NotificationSink, NullNotifier};
use crate::session::{ChargingSessionManager, EndReadings, StartReadings};
use crate::store::{SettingKey, SettingValue, Store};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Duration;

/// Main tracker state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    /// Tracker is initializing
    Initializing,
    /// Tracker is running normally
    Running,
    /// Tracker is shutting down
    ShuttingDown,
}

/// Commands accepted by the tracker from external components (UI, tests)
#[derive(Debug, Clone)]
pub enum TrackerCommand {
    StartCharging {
        vehicle_id: i64,
        readings: StartReadings,
    },
    StopCharging {
        readings: EndReadings,
    },
    CancelCharging,
    PauseTimer,
    ResumeTimer,
    /// Reset a finished or cancelled session instance
    NewSession,
}

/// Main tracker for Chargelog
pub struct ChargeTracker {
    /// Configuration
    config: Config,

    /// Current tracker state
    state: watch::Sender<TrackerState>,

    /// Session manager
    sessions: ChargingSessionManager,

    /// Persistence gateway
    store: Store,

    /// Logger with context
    logger: crate::logging::StructuredLogger,

    /// Shutdown signal
    shutdown_tx: mpsc::UnboundedSender<()>,

    /// Shutdown receiver
    shutdown_rx: mpsc::UnboundedReceiver<()>,

    /// Command receiver for external control
    commands_rx: mpsc::UnboundedReceiver<TrackerCommand>,

    /// Broadcast channel for streaming live status updates
    status_tx: broadcast::Sender<String>,
}

impl ChargeTracker {
    /// Create a new tracker instance
    pub async fn new(commands_rx: mpsc::UnboundedReceiver<TrackerCommand>) -> Result<Self> {
        let config = Config::load().map_err(|e| {
            eprintln!("Failed to load configuration: {}", e);
            e
        })?;
        Self::with_config(config, commands_rx).await
    }

    /// Create a new tracker instance from an explicit configuration
    pub async fn with_config(
        config: Config,
        commands_rx: mpsc::UnboundedReceiver<TrackerCommand>,
    ) -> Result<Self> {
        config.validate()?;

        // Initialize logging
        crate::logging::init_logging(&config.logging)?;

        let logger = get_logger("tracker");
        logger.info("Initializing charging session tracker");

        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(TrackerState::Initializing);

        let store = Store::open(&config.database.path).await?;

        let notifier: Box<dyn NotificationSink> = if config.notifications.enabled {
            Box::new(LogNotifier::new())
        } else {
            Box::new(NullNotifier)
        };
        let sessions = ChargingSessionManager::new(
            store.clone(),
            notifier,
            Duration::from_millis(config.timer.tick_interval_ms),
        );

        // Create status broadcast channel
        let (status_tx, _status_rx) = broadcast::channel::<String>(100);

        Ok(Self {
            config,
            state: state_tx,
            sessions,
            store,
            logger,
            shutdown_tx,
            shutdown_rx,
            commands_rx,
            status_tx,
        })
    }

    /// Run the tracker main loop
    pub async fn run(&mut self) -> Result<()> {
        self.logger.info("Starting charging tracker main loop");

        // Pick up a session left in progress by a previous run
        self.restore_session().await;

        self.state.send(TrackerState::Running).ok();

        let mut elapsed_rx = self.sessions.subscribe_elapsed();

        loop {
            tokio::select! {
                changed = elapsed_rx.changed() => {
                    if changed.is_ok() {
                        self.publish_status();
                    }
                }
                Some(cmd) = self.commands_rx.recv() => {
                    self.handle_command(cmd).await;
                    self.publish_status();
                }
                _ = self.shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }

        self.state.send(TrackerState::ShuttingDown).ok();
        self.logger.info("Tracker shutdown complete");
        Ok(())
    }

    /// Re-enter an in-progress session for the last active vehicle
    async fn restore_session(&mut self) {
        let active_vehicle = match self.store.setting(SettingKey::ActiveVehicle).await {
            Ok(Some(setting)) => setting.long_value,
            Ok(None) => None,
            Err(e) => {
                self.logger
                    .warn(&format!("Failed to read active vehicle setting: {}", e));
                None
            }
        };

        if let Some(vehicle_id) = active_vehicle {
            match self.sessions.resume_active(vehicle_id).await {
                Ok(Some(event_id)) => self
                    .logger
                    .info(&format!("Resumed charge event {}", event_id)),
                Ok(None) => {}
                Err(e) => self
                    .logger
                    .warn(&format!("Failed to resume in-progress session: {}", e)),
            }
        }
    }

    /// Handle external command
    async fn handle_command(&mut self, cmd: TrackerCommand) {
        let result = match cmd {
            TrackerCommand::StartCharging {
                vehicle_id,
                readings,
            } => self.start_charging(vehicle_id, readings).await,
            TrackerCommand::StopCharging { readings } => {
                self.sessions.stop(readings).await.map(|_| ())
            }
            TrackerCommand::CancelCharging => self.sessions.cancel().await,
            TrackerCommand::PauseTimer => self.sessions.pause_timer(),
            TrackerCommand::ResumeTimer => self.sessions.resume_timer(),
            TrackerCommand::NewSession => self.sessions.reset(),
        };

        if let Err(e) = result {
            self.logger.error(&format!("Command failed: {}", e));
        }
    }

    async fn start_charging(&mut self, vehicle_id: i64, readings: StartReadings) -> Result<()> {
        self.sessions.start(vehicle_id, readings).await?;

        // Remember the vehicle so an interrupted session can be resumed
        if let Err(e) = self
            .store
            .update_setting(SettingKey::ActiveVehicle, SettingValue::Long(vehicle_id))
            .await
        {
            self.logger
                .warn(&format!("Failed to persist active vehicle: {}", e));
        }
        Ok(())
    }

    /// Start readings prefilled from stored defaults
    ///
    /// The kilowatt rate and unit price come from the settings store when
    /// present, falling back to the configured pricing defaults.
    pub async fn prefill_readings(
        &self,
        odometer: i64,
        battery_pct: i32,
        battery_range: i32,
    ) -> Result<StartReadings> {
        let pence_per_kwh = match self.store.setting(SettingKey::DefaultPencePerKwh).await? {
            Some(setting) => setting
                .int_value
                .unwrap_or(self.config.pricing.default_pence_per_kwh),
            None => self.config.pricing.default_pence_per_kwh,
        };

        let kilowatt_rate = match self.store.setting(SettingKey::DefaultKilowattRate).await? {
            Some(setting) => setting
                .str_value
                .as_deref()
                .and_then(|s| s.parse::<f64>().ok())
                .unwrap_or(self.config.pricing.default_kilowatt_rate),
            None => self.config.pricing.default_kilowatt_rate,
        };

        Ok(StartReadings {
            odometer,
            battery_pct,
            battery_range,
            kilowatt_rate,
            pence_per_kwh,
        })
    }

    /// Publish a status snapshot for observers
    fn publish_status(&self) {
        let mut status_obj = self.sessions.get_session_stats();
        if let Some(obj) = status_obj.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::json!(chrono::Utc::now().to_rfc3339()),
            );
            obj.insert(
                "currency_symbol".to_string(),
                serde_json::json!(self.config.pricing.currency_symbol),
            );
        }
        let _ = self.status_tx.send(status_obj.to_string());
    }

    /// Get current tracker state
    pub fn get_state(&self) -> TrackerState {
        self.state.borrow().clone()
    }

    /// Request shutdown
    pub fn request_shutdown(&self) {
        self.shutdown_tx.send(()).ok();
    }

    /// Handle for requesting shutdown from another task
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<()> {
        self.shutdown_tx.clone()
    }

    /// Get configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Session manager accessor
    pub fn sessions(&self) -> &ChargingSessionManager {
        &self.sessions
    }

    /// Persistence gateway accessor
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Subscribe to status updates
    pub fn subscribe_status(&self) -> broadcast::Receiver<String> {
        self.status_tx.subscribe()
    }
}
