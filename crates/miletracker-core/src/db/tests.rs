//! Database tests

use chrono::Utc;

use super::*;
use crate::models::*;

fn sample_trip() -> NewTrip {
    NewTrip {
        date: "WED 27".to_string(),
        start_time: "3:20 PM".to_string(),
        end_time: "4:05 PM".to_string(),
        start_location: "Home".to_string(),
        end_location: "Work".to_string(),
        distance: 2.5,
        potential: 1.34,
        trip_type: TripType::Business,
        notes: String::new(),
    }
}

fn sample_receipt(id: &str, trip_id: Option<i64>) -> NewReceipt {
    NewReceipt {
        id: id.to_string(),
        url: format!("/uploads/receipts/{}.jpg", id),
        name: "lunch.jpg".to_string(),
        date: Utc::now(),
        trip_id,
        file_size: 1024,
        mime_type: "image/jpeg".to_string(),
    }
}

#[test]
fn test_trip_round_trip() {
    let db = Database::in_memory().unwrap();

    let created = db.create_trip(&sample_trip()).unwrap();
    assert!(created.id > 0);

    let fetched = db.get_trip(created.id).unwrap().unwrap();
    assert_eq!(fetched.date, "WED 27");
    assert_eq!(fetched.start_time, "3:20 PM");
    assert_eq!(fetched.end_time, "4:05 PM");
    assert_eq!(fetched.start_location, "Home");
    assert_eq!(fetched.end_location, "Work");
    assert_eq!(fetched.distance, 2.5);
    assert_eq!(fetched.potential, 1.34);
    assert_eq!(fetched.trip_type, TripType::Business);
    assert_eq!(fetched.notes, "");
}

#[test]
fn test_list_trips_newest_first() {
    let db = Database::in_memory().unwrap();

    let first = db.create_trip(&sample_trip()).unwrap();
    let second = db.create_trip(&sample_trip()).unwrap();

    let trips = db.list_trips().unwrap();
    assert_eq!(trips.len(), 2);
    assert_eq!(trips[0].id, second.id);
    assert_eq!(trips[1].id, first.id);
}

#[test]
fn test_update_trip_patch() {
    let db = Database::in_memory().unwrap();
    let trip = db.create_trip(&sample_trip()).unwrap();

    let patch = TripPatch {
        trip_type: Some(TripType::Personal),
        notes: Some("client visit".to_string()),
    };
    let updated = db.update_trip(trip.id, &patch).unwrap().unwrap();
    assert_eq!(updated.trip_type, TripType::Personal);
    assert_eq!(updated.notes, "client visit");

    // Immutable fields stay put
    assert_eq!(updated.distance, 2.5);
    assert_eq!(updated.start_location, "Home");

    // Empty patch is a no-op read
    let unchanged = db.update_trip(trip.id, &TripPatch::default()).unwrap().unwrap();
    assert_eq!(unchanged.notes, "client visit");
}

#[test]
fn test_update_missing_trip() {
    let db = Database::in_memory().unwrap();
    let patch = TripPatch {
        trip_type: None,
        notes: Some("nope".to_string()),
    };
    assert!(db.update_trip(9999, &patch).unwrap().is_none());
}

#[test]
fn test_delete_trip_cascades() {
    let db = Database::in_memory().unwrap();
    let trip = db.create_trip(&sample_trip()).unwrap();

    db.add_route_points(
        trip.id,
        &[
            NewRoutePoint {
                latitude: 28.32,
                longitude: -81.49,
                timestamp_ms: None,
            },
            NewRoutePoint {
                latitude: 28.33,
                longitude: -81.50,
                timestamp_ms: Some(1_700_000_000_000),
            },
        ],
    )
    .unwrap();

    db.create_receipt(&sample_receipt("r1", Some(trip.id))).unwrap();

    assert!(db.delete_trip(trip.id).unwrap());
    assert!(!db.delete_trip(trip.id).unwrap());

    // Route points are gone with the trip
    assert!(db.trip_route(trip.id).unwrap().is_empty());

    // The receipt survives with its trip reference cleared
    let receipt = db.get_receipt("r1").unwrap().unwrap();
    assert_eq!(receipt.trip_id, None);
}

#[test]
fn test_stats_consistency_after_mutations() {
    let db = Database::in_memory().unwrap();

    let trip = db.create_trip(&sample_trip()).unwrap();
    db.recompute_trip_stats().unwrap();

    let mut personal = sample_trip();
    personal.trip_type = TripType::Personal;
    personal.distance = 4.0;
    personal.potential = 2.0;
    db.create_trip(&personal).unwrap();
    let stats = db.recompute_trip_stats().unwrap();

    assert_eq!(stats.total_drives, 2);
    assert_eq!(stats.total_miles, 6.5);
    assert_eq!(stats.total_logged, 3.34);
    assert_eq!(stats.business_miles, 2.5);
    assert_eq!(stats.personal_miles, 4.0);

    db.delete_trip(trip.id).unwrap();
    let stats = db.recompute_trip_stats().unwrap();
    assert_eq!(stats.total_drives, 1);
    assert_eq!(stats.total_miles, 4.0);

    // Cached read matches the recompute
    let cached = db.trip_stats().unwrap();
    assert_eq!(cached.total_drives, stats.total_drives);
    assert_eq!(cached.total_miles, stats.total_miles);
}

#[test]
fn test_stats_cold_read_computes_and_caches() {
    let db = Database::in_memory().unwrap();
    db.create_trip(&sample_trip()).unwrap();

    // No recompute has run yet; the cold read falls back to the aggregate
    let stats = db.trip_stats().unwrap();
    assert_eq!(stats.total_drives, 1);
    assert_eq!(stats.total_miles, 2.5);

    // And the cache row now exists
    let conn = db.conn().unwrap();
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM trip_stats", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn test_receipt_crud_and_tagging() {
    let db = Database::in_memory().unwrap();
    let trip = db.create_trip(&sample_trip()).unwrap();

    let receipt = db.create_receipt(&sample_receipt("r1", None)).unwrap();
    assert_eq!(receipt.id, "r1");
    assert_eq!(receipt.trip_id, None);
    assert_eq!(receipt.file_size, Some(1024));
    assert_eq!(receipt.mime_type.as_deref(), Some("image/jpeg"));

    let tagged = db.tag_receipt("r1", Some(trip.id)).unwrap().unwrap();
    assert_eq!(tagged.trip_id, Some(trip.id));

    let for_trip = db.receipts_for_trip(trip.id).unwrap();
    assert_eq!(for_trip.len(), 1);

    let untagged = db.tag_receipt("r1", None).unwrap().unwrap();
    assert_eq!(untagged.trip_id, None);
    assert!(db.receipts_for_trip(trip.id).unwrap().is_empty());

    assert!(db.tag_receipt("missing", None).unwrap().is_none());

    assert!(db.delete_receipt("r1").unwrap());
    assert!(!db.delete_receipt("r1").unwrap());
}

#[test]
fn test_locations_append_and_recent() {
    let db = Database::in_memory().unwrap();

    for i in 0..15 {
        db.add_location(&NewLocationPing {
            latitude: 28.0 + i as f64 * 0.01,
            longitude: -81.0,
            timestamp_ms: 1_700_000_000_000 + i,
            accuracy: Some(5.0),
            altitude: None,
            speed: None,
        })
        .unwrap();
    }

    let recent = db.recent_locations(10).unwrap();
    assert_eq!(recent.len(), 10);
    // Newest sample first
    assert_eq!(recent[0].timestamp_ms, 1_700_000_000_014);
    assert_eq!(recent[9].timestamp_ms, 1_700_000_000_005);
}

#[test]
fn test_route_sequence_continues_across_appends() {
    let db = Database::in_memory().unwrap();
    let trip = db.create_trip(&sample_trip()).unwrap();

    let batch = vec![
        NewRoutePoint {
            latitude: 28.32,
            longitude: -81.49,
            timestamp_ms: None,
        },
        NewRoutePoint {
            latitude: 28.33,
            longitude: -81.50,
            timestamp_ms: None,
        },
    ];
    db.add_route_points(trip.id, &batch).unwrap();
    db.add_route_points(trip.id, &batch).unwrap();

    let route = db.trip_route(trip.id).unwrap();
    assert_eq!(route.len(), 4);
    let orders: Vec<i64> = route.iter().map(|p| p.sequence_order).collect();
    assert_eq!(orders, vec![0, 1, 2, 3]);
}

fn sample_linked_account(account_id: &str) -> NewPlaidAccount {
    NewPlaidAccount {
        user_id: 1,
        access_token: "access-sandbox-1".to_string(),
        item_id: "item-1".to_string(),
        account_id: account_id.to_string(),
        account_name: Some("Plaid Checking".to_string()),
        institution_name: Some("First Platypus Bank".to_string()),
        account_type: Some("depository".to_string()),
        account_subtype: Some("checking".to_string()),
        mask: Some("0000".to_string()),
    }
}

#[test]
fn test_linked_account_upsert_idempotent() {
    let db = Database::in_memory().unwrap();

    let id = db.upsert_plaid_account(&sample_linked_account("acct-1")).unwrap();

    // Re-linking the same triple updates in place
    let mut relinked = sample_linked_account("acct-1");
    relinked.access_token = "access-sandbox-2".to_string();
    let id2 = db.upsert_plaid_account(&relinked).unwrap();
    assert_eq!(id, id2);

    let accounts = db.list_plaid_accounts(1).unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].access_token, "access-sandbox-2");

    // A different account id under the same item is a new row
    db.upsert_plaid_account(&sample_linked_account("acct-2")).unwrap();
    assert_eq!(db.list_plaid_accounts(1).unwrap().len(), 2);
}

#[test]
fn test_linked_account_soft_delete_and_relink() {
    let db = Database::in_memory().unwrap();

    db.upsert_plaid_account(&sample_linked_account("acct-1")).unwrap();
    assert!(db.deactivate_plaid_account(1, "item-1").unwrap());
    assert!(!db.deactivate_plaid_account(1, "item-1").unwrap());

    // Absent from the active listing but the row still exists
    assert!(db.list_plaid_accounts(1).unwrap().is_empty());
    assert!(db.get_plaid_account_by_item(1, "item-1").unwrap().is_none());
    let conn = db.conn().unwrap();
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM plaid_accounts", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
    drop(conn);

    // Re-linking reactivates the same row
    let id = db.upsert_plaid_account(&sample_linked_account("acct-1")).unwrap();
    let accounts = db.list_plaid_accounts(1).unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].id, id);
    assert!(accounts[0].is_active);
}

#[test]
fn test_seed_sample_data_once() {
    let db = Database::in_memory().unwrap();

    assert!(db.seed_sample_data().unwrap());
    assert!(!db.seed_sample_data().unwrap());

    let trips = db.list_trips().unwrap();
    assert_eq!(trips.len(), 2);

    // Each sample trip gets the demo route
    let route = db.trip_route(trips[0].id).unwrap();
    assert_eq!(route.len(), 11);

    // Seeded headline stats
    let stats = db.trip_stats().unwrap();
    assert_eq!(stats.total_drives, 89);
}

#[test]
fn test_table_counts() {
    let db = Database::in_memory().unwrap();
    db.create_trip(&sample_trip()).unwrap();

    let counts = db.table_counts().unwrap();
    let trips = counts.iter().find(|t| t.name == "trips").unwrap();
    assert_eq!(trips.count, 1);
    assert!(counts.iter().any(|t| t.name == "plaid_accounts"));
}
