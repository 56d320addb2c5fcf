//! Descriptors and field tables generated by `#[derive(Model)]`.

use datarepo::core::model::{MapKeys, Model, Row};
use datarepo::core::value::{Json, Value};
use serde_json::json;

use crate::common::{Booking, Contact, Event, Profile, Review, User};

#[test]
fn descriptor_lists_stored_columns_in_order() {
    let descriptor = Booking::descriptor();
    assert_eq!(descriptor.table_name, "bookings");
    assert_eq!(descriptor.primary_key, "booking_id");
    assert_eq!(
        descriptor.fields_of(),
        ["booking_id", "event_id", "user_id", "status", "created_at"]
    );

    // skipped and join fields are not stored
    assert!(User::descriptor().column_info("session").is_none());
    assert!(Booking::descriptor().column_info("event").is_none());
    // serialize-only fields are not stored either
    assert!(Event::descriptor().column_info("attendee_count").is_none());
}

#[test]
fn renamed_column() {
    let descriptor = Profile::descriptor();
    let contact = descriptor.column_info("contact").expect("contact is stored");
    assert_eq!(contact.column, "contact_info");
    assert!(descriptor.has_column("contact_info"));
    assert!(!descriptor.has_column("contact"));
}

#[test]
fn foreign_keys_resolve_to_target_descriptors() {
    let booking = Booking::descriptor();

    let to_user = booking.foreign_key_for(User::descriptor()).expect("booking -> user");
    assert_eq!(to_user.property, "user_id");
    assert_eq!(to_user.join_result_name(), "user");
    assert_eq!(to_user.target().map(|t| t.table_name), Some("users"));

    let to_event = booking.foreign_key_for(Event::descriptor()).expect("booking -> event");
    assert_eq!(to_event.column, "event_id");
    assert_eq!(to_event.join_result_name(), "event");

    assert!(User::descriptor().foreign_key_for(Booking::descriptor()).is_none());
    assert!(Booking::descriptor().foreign_key_for(Profile::descriptor()).is_none());
}

#[test]
fn from_row_coerces_loose_storage_types() {
    let mut row = Row::new();
    row.insert("review_id".into(), Value::Integer(3));
    row.insert("dj_id".into(), Value::Text("7".into()));
    row.insert("event_id".into(), Value::Integer(2));
    row.insert("author_id".into(), Value::Integer(9));
    row.insert("rating".into(), Value::Integer(5));
    row.insert("comment".into(), Value::Null);
    row.insert("recommended".into(), Value::Integer(1));

    let review = Review::from_row(&row).unwrap();
    assert_eq!(review.review_id, Some(3));
    assert_eq!(review.dj_id, 7);
    assert_eq!(review.comment, None);
    assert!(review.recommended);
}

#[test]
fn json_columns_decode_from_text() {
    let mut row = Row::new();
    row.insert("profile_id".into(), Value::Integer(1));
    row.insert(
        "contact_info".into(),
        Value::Text(r#"{"phone":"555-0100","instagram":null}"#.into()),
    );

    let profile = Profile::from_row(&row).unwrap();
    assert_eq!(
        profile.contact,
        Some(Json(Contact {
            phone: Some("555-0100".into()),
            instagram: None,
        }))
    );
}

#[test]
fn from_json_ignores_unknown_and_skipped_properties() {
    let user = User::from_json(&json!({
        "user_id": 4,
        "username": "dj_ana",
        "email": "ana@example.com",
        "session": "abc",
        "is_admin": true,
    }))
    .unwrap();
    assert_eq!(user.user_id, Some(4));
    assert_eq!(user.username, "dj_ana");
    assert_eq!(user.session, None);
}

#[test]
fn from_json_reports_the_failing_field() {
    let err = Review::from_json(&json!({"rating": "five"})).unwrap_err();
    assert!(err.to_string().contains("rating"), "{err}");
}

#[test]
fn serialize_only_fields_round_trip_through_json() {
    let mut event = Event::from_json(&json!({
        "event_id": 1,
        "name": "Warehouse Night",
        "attendee_count": 120,
    }))
    .unwrap();
    assert_eq!(event.attendee_count, 120);

    event.organizer = Some(User::new("dj_ana", "ana@example.com"));
    let out = event.to_json();
    assert_eq!(out["attendee_count"], 120);
    assert_eq!(out["organizer"]["username"], "dj_ana");
    assert!(out.get("organizer_id").is_none());
}

#[test]
fn to_map_keys() {
    let profile = Profile {
        profile_id: Some(2),
        bio: Some("Techno".into()),
        contact: Some(Json(Contact {
            phone: None,
            instagram: Some("@ana".into()),
        })),
        ..Default::default()
    };

    let by_column: Vec<_> = profile
        .to_map(MapKeys::Column)
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(by_column, ["profile_id", "bio", "contact_info"]);

    let by_property: Vec<_> = profile
        .to_map(MapKeys::Property)
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(by_property, ["profile_id", "bio", "contact"]);
}

#[test]
fn ids() {
    let mut booking = Booking::new(1, 2, "pending");
    assert!(booking.id().is_null());
    booking.set_id(Value::Integer(10)).unwrap();
    assert_eq!(booking.booking_id, Some(10));
    assert_eq!(booking.id(), Value::Integer(10));
}
