use chargelog::ChargingStatus;
use chargelog::error::Result;
use chargelog::notify::NotificationSink;
use chargelog::session::{ChargingSessionManager, EndReadings, StartReadings};
use chargelog::store::{NewVehicle, Store};
use std::sync::{Arc, Mutex};
use tokio::time::Duration;
use uuid::Uuid;

/// Notification sink that records calls instead of displaying anything
#[derive(Clone, Default)]
struct RecordingNotifier {
    shown: Arc<Mutex<Vec<String>>>,
    dismissed: Arc<Mutex<u32>>,
}

#[async_trait::async_trait]
impl NotificationSink for RecordingNotifier {
    async fn show_charging(&self, vehicle_label: &str, _session_id: Uuid) -> Result<()> {
        self.shown.lock().unwrap().push(vehicle_label.to_string());
        Ok(())
    }

    async fn dismiss(&self) -> Result<()> {
        *self.dismissed.lock().unwrap() += 1;
        Ok(())
    }
}

async fn manager_with_vehicle() -> (ChargingSessionManager, Store, RecordingNotifier, i64) {
    let store = Store::open_in_memory().await.unwrap();
    let vehicle_id = store
        .add_vehicle(NewVehicle {
            manufacturer: "Renault".to_string(),
            model: "Zoe".to_string(),
            odometer: 20_000,
            registration: "ZO21 EVC".to_string(),
            photo_path: None,
        })
        .await
        .unwrap();
    let notifier = RecordingNotifier::default();
    let manager = ChargingSessionManager::new(
        store.clone(),
        Box::new(notifier.clone()),
        Duration::from_secs(1),
    );
    (manager, store, notifier, vehicle_id)
}

fn start_readings() -> StartReadings {
    StartReadings {
        odometer: 20_000,
        battery_pct: 30,
        battery_range: 55,
        kilowatt_rate: 7.4,
        pence_per_kwh: 30,
    }
}

#[tokio::test]
async fn start_then_stop_completes_the_event() {
    let (mut manager, store, notifier, vehicle_id) = manager_with_vehicle().await;

    let event_id = manager.start(vehicle_id, start_readings()).await.unwrap();
    assert_eq!(manager.status(), ChargingStatus::Charging);
    assert_eq!(manager.active_event_id(), Some(event_id));
    assert!(manager.session_id().is_some());

    let completed = manager
        .stop(EndReadings {
            battery_pct: 85,
            battery_range: 150,
        })
        .await
        .unwrap();
    assert_eq!(manager.status(), ChargingStatus::Finished);
    assert!(!completed.in_progress());
    assert_eq!(completed.battery_end_pct, Some(85));
    assert_eq!(completed.battery_end_range, Some(150));
    assert!(completed.total_cost.is_some());

    // Record handed to the gateway, timer reset, notification lifecycle done
    assert!(store.active_charge_event(vehicle_id).await.unwrap().is_none());
    assert_eq!(manager.elapsed_seconds(), 0);
    assert_eq!(notifier.shown.lock().unwrap().as_slice(), ["Renault Zoe"]);
    assert_eq!(*notifier.dismissed.lock().unwrap(), 1);
}

#[tokio::test]
async fn start_while_charging_is_rejected() {
    let (mut manager, store, _notifier, vehicle_id) = manager_with_vehicle().await;

    manager.start(vehicle_id, start_readings()).await.unwrap();
    let err = manager.start(vehicle_id, start_readings()).await.unwrap_err();
    assert!(matches!(err, chargelog::ChargelogError::Session { .. }));

    // Status and stored state are untouched
    assert_eq!(manager.status(), ChargingStatus::Charging);
    assert_eq!(store.charge_events_for_vehicle(vehicle_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn cancel_discards_the_event() {
    let (mut manager, store, notifier, vehicle_id) = manager_with_vehicle().await;

    let event_id = manager.start(vehicle_id, start_readings()).await.unwrap();
    manager.cancel().await.unwrap();

    assert_eq!(manager.status(), ChargingStatus::Cancelled);
    assert!(store.charge_event(event_id).await.unwrap().is_none());
    assert_eq!(manager.elapsed_seconds(), 0);
    assert_eq!(*notifier.dismissed.lock().unwrap(), 1);
}

#[tokio::test]
async fn stop_and_cancel_require_a_running_session() {
    let (mut manager, _store, _notifier, _vehicle_id) = manager_with_vehicle().await;

    let readings = EndReadings {
        battery_pct: 50,
        battery_range: 90,
    };
    assert!(manager.stop(readings).await.is_err());
    assert!(manager.cancel().await.is_err());
    assert_eq!(manager.status(), ChargingStatus::NotStarted);
}

#[tokio::test]
async fn timer_control_is_gated_on_charging() {
    let (mut manager, _store, _notifier, vehicle_id) = manager_with_vehicle().await;

    assert!(manager.pause_timer().is_err());
    assert!(manager.resume_timer().is_err());

    manager.start(vehicle_id, start_readings()).await.unwrap();
    manager.pause_timer().unwrap();
    manager.resume_timer().unwrap();
}

#[tokio::test]
async fn reset_allows_a_new_session_after_terminal_state() {
    let (mut manager, _store, notifier, vehicle_id) = manager_with_vehicle().await;

    manager.start(vehicle_id, start_readings()).await.unwrap();
    manager.cancel().await.unwrap();

    // Terminal states refuse another start until reset
    assert!(manager.start(vehicle_id, start_readings()).await.is_err());
    manager.reset().unwrap();
    assert_eq!(manager.status(), ChargingStatus::NotStarted);

    manager.start(vehicle_id, start_readings()).await.unwrap();
    assert_eq!(manager.status(), ChargingStatus::Charging);
    assert_eq!(notifier.shown.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn starting_for_an_unknown_vehicle_fails() {
    let (mut manager, _store, notifier, _vehicle_id) = manager_with_vehicle().await;

    assert!(manager.start(404, start_readings()).await.is_err());
    assert_eq!(manager.status(), ChargingStatus::NotStarted);
    assert!(notifier.shown.lock().unwrap().is_empty());
}

#[tokio::test]
async fn session_stats_reflect_the_lifecycle() {
    let (mut manager, _store, _notifier, vehicle_id) = manager_with_vehicle().await;

    let stats = manager.get_session_stats();
    assert_eq!(stats.get("session_active").and_then(|v| v.as_bool()), Some(false));

    manager.start(vehicle_id, start_readings()).await.unwrap();
    let stats = manager.get_session_stats();
    assert_eq!(stats.get("session_active").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(stats.get("status").and_then(|v| v.as_str()), Some("charging"));
    assert!(stats.get("event_id").and_then(|v| v.as_i64()).is_some());
}
