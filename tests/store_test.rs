use chargelog::store::{ChargeCompletion, NewChargeEvent, NewVehicle, Store};
use chrono::{Duration as ChronoDuration, Utc};

fn sample_vehicle() -> NewVehicle {
    NewVehicle {
        manufacturer: "Nissan".to_string(),
        model: "Leaf".to_string(),
        odometer: 12_400,
        registration: "AB12 CDE".to_string(),
        photo_path: None,
    }
}

fn sample_event(vehicle_id: i64) -> NewChargeEvent {
    NewChargeEvent {
        vehicle_id,
        odometer: 12_400,
        start_time: Utc::now(),
        battery_start_pct: 35,
        battery_start_range: 60,
        kilowatt_rate: 7.4,
        pence_per_kwh: 30,
    }
}

#[tokio::test]
async fn vehicle_crud_round_trip() {
    let store = Store::open_in_memory().await.unwrap();

    let id = store.add_vehicle(sample_vehicle()).await.unwrap();
    let mut vehicle = store.vehicle(id).await.unwrap().unwrap();
    assert_eq!(vehicle.manufacturer, "Nissan");
    assert_eq!(vehicle.odometer, 12_400);
    assert!(vehicle.photo_path.is_none());

    vehicle.odometer = 12_650;
    vehicle.photo_path = Some("photos/leaf.jpg".to_string());
    store.update_vehicle(vehicle.clone()).await.unwrap();
    let reloaded = store.vehicle(id).await.unwrap().unwrap();
    assert_eq!(reloaded, vehicle);

    assert_eq!(store.vehicles().await.unwrap().len(), 1);
    assert_eq!(store.delete_vehicle(id).await.unwrap(), 1);
    assert!(store.vehicle(id).await.unwrap().is_none());
}

#[tokio::test]
async fn update_unknown_vehicle_is_an_error() {
    let store = Store::open_in_memory().await.unwrap();
    let mut vehicle = {
        let id = store.add_vehicle(sample_vehicle()).await.unwrap();
        store.vehicle(id).await.unwrap().unwrap()
    };
    vehicle.id = 9999;
    assert!(store.update_vehicle(vehicle).await.is_err());
}

#[tokio::test]
async fn charge_event_lifecycle() {
    let store = Store::open_in_memory().await.unwrap();
    let vehicle_id = store.add_vehicle(sample_vehicle()).await.unwrap();

    let event_id = store.start_charge_event(sample_event(vehicle_id)).await.unwrap();

    let event = store.charge_event(event_id).await.unwrap().unwrap();
    assert!(event.in_progress());
    assert_eq!(event.battery_start_pct, 35);
    assert_eq!(event.pence_per_kwh, 30);
    assert!(event.total_cost.is_none());

    let active = store.active_charge_event(vehicle_id).await.unwrap().unwrap();
    assert_eq!(active.id, event_id);

    store
        .complete_charge_event(
            event_id,
            ChargeCompletion {
                end_time: Utc::now(),
                battery_end_pct: 80,
                battery_end_range: 140,
                total_cost: 4.51,
            },
        )
        .await
        .unwrap();

    let completed = store.charge_event(event_id).await.unwrap().unwrap();
    assert!(!completed.in_progress());
    assert_eq!(completed.battery_end_pct, Some(80));
    assert_eq!(completed.total_cost, Some(4.51));
    assert!(store.active_charge_event(vehicle_id).await.unwrap().is_none());
}

#[tokio::test]
async fn second_in_progress_event_is_refused() {
    let store = Store::open_in_memory().await.unwrap();
    let vehicle_id = store.add_vehicle(sample_vehicle()).await.unwrap();

    store.start_charge_event(sample_event(vehicle_id)).await.unwrap();
    let err = store.start_charge_event(sample_event(vehicle_id)).await.unwrap_err();
    assert!(matches!(err, chargelog::ChargelogError::Session { .. }));

    // A different vehicle is unaffected
    let other = store
        .add_vehicle(NewVehicle {
            registration: "XY99 ZZZ".to_string(),
            ..sample_vehicle()
        })
        .await
        .unwrap();
    store.start_charge_event(sample_event(other)).await.unwrap();
}

#[tokio::test]
async fn completing_twice_is_an_error() {
    let store = Store::open_in_memory().await.unwrap();
    let vehicle_id = store.add_vehicle(sample_vehicle()).await.unwrap();
    let event_id = store.start_charge_event(sample_event(vehicle_id)).await.unwrap();

    let completion = ChargeCompletion {
        end_time: Utc::now(),
        battery_end_pct: 90,
        battery_end_range: 160,
        total_cost: 2.00,
    };
    store
        .complete_charge_event(event_id, completion.clone())
        .await
        .unwrap();
    assert!(store.complete_charge_event(event_id, completion).await.is_err());
}

#[tokio::test]
async fn history_is_newest_first() {
    let store = Store::open_in_memory().await.unwrap();
    let vehicle_id = store.add_vehicle(sample_vehicle()).await.unwrap();

    for days_ago in [3i64, 1, 2] {
        let mut event = sample_event(vehicle_id);
        event.start_time = Utc::now() - ChronoDuration::days(days_ago);
        let id = store.start_charge_event(event).await.unwrap();
        store
            .complete_charge_event(
                id,
                ChargeCompletion {
                    end_time: Utc::now() - ChronoDuration::days(days_ago),
                    battery_end_pct: 100,
                    battery_end_range: 180,
                    total_cost: 1.0,
                },
            )
            .await
            .unwrap();
    }

    let history = store.charge_events_for_vehicle(vehicle_id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history[0].start_time > history[1].start_time);
    assert!(history[1].start_time > history[2].start_time);
}
