use serde_json::json;

use crate::model::field::FieldState;
use crate::model::story::{Story, StoryType};
use crate::wire::WireValue;

/// A full server response in the modern JSON shape.
fn fetched_story() -> Story {
    let payload = json!({
        "id": 1234,
        "url": "https://tracker.example/story/show/1234",
        "number": 3,
        "story_type": "feature",
        "current_state": "started",
        "name": "Implement login",
        "description": "As a user, I can log in",
        "estimate": 2,
        "requested_by": "Alice",
        "owned_by": "Bob",
        "created_at": "2021/03/04 10:00:00 UTC",
        "deadline": "2021/03/11 10:00:00 UTC",
        "labels": [{ "name": "auth" }, { "name": "frontend" }]
    });
    Story::from_wire(&payload).unwrap()
}

#[test]
fn ingestion_populates_every_field() {
    let story = fetched_story();
    assert_eq!(story.id().value(), Some(&1234));
    assert_eq!(
        story.url().value().map(String::as_str),
        Some("https://tracker.example/story/show/1234")
    );
    assert_eq!(story.iteration_number().value(), Some(&3));
    assert_eq!(story.story_type().value(), Some(&StoryType::Feature));
    assert_eq!(story.current_state().value().map(String::as_str), Some("started"));
    assert_eq!(story.name().value().map(String::as_str), Some("Implement login"));
    assert_eq!(story.estimate().value(), Some(&2));
    assert_eq!(story.requested_by().value().map(String::as_str), Some("Alice"));
    assert_eq!(story.owned_by().value().map(String::as_str), Some("Bob"));
    assert_eq!(story.created_at().value(), Some(&1614852000));
    assert_eq!(story.deadline().value(), Some(&(1614852000 + 7 * 86400)));
    assert_eq!(story.labels().unwrap().len(), 2);
}

#[test]
fn fresh_record_serializes_to_nothing() {
    let story = Story::new();
    let payload = story.to_wire().unwrap();
    assert!(payload.is_empty());
    assert_eq!(payload.to_json(), json!({}));
}

#[test]
fn untouched_fields_never_appear_in_the_payload() {
    let mut story = Story::new();
    story.set_current_state("finished");

    let payload = story.to_wire().unwrap();
    assert_eq!(payload.len(), 1);
    assert_eq!(
        payload.get("current_state"),
        Some(&WireValue::Str("finished".to_string()))
    );
    assert!(payload.get("labels").is_none());
    assert!(payload.get("id").is_none());
}

#[test]
fn label_array_ingestion_sorts_on_emission() {
    let payload = json!({ "labels": [{ "name": "b" }, { "name": "a" }] });
    let story = Story::from_wire(&payload).unwrap();
    assert_eq!(story.labels_as_sorted_string().as_deref(), Some("a,b"));
}

#[test]
fn label_string_ingestion_matches_the_array_shape() {
    let from_string = Story::from_wire(&json!({ "labels": "a, b,c" })).unwrap();
    let from_array = Story::from_wire(&json!({
        "labels": [{ "name": "a" }, { "name": "b" }, { "name": "c" }]
    }))
    .unwrap();
    assert_eq!(from_string.labels(), from_array.labels());
    assert_eq!(from_string.labels_as_sorted_string().as_deref(), Some("a,b,c"));
}

#[test]
fn label_names_are_trimmed() {
    let story = Story::from_wire(&json!({ "labels": [{ "name": "  padded  " }] })).unwrap();
    assert_eq!(story.labels_as_sorted_string().as_deref(), Some("padded"));
}

#[test]
fn add_label_is_idempotent() {
    let mut story = Story::new();
    story.add_label("x");
    story.add_label("x");
    assert_eq!(story.labels().unwrap().len(), 1);
}

#[test]
fn removing_an_absent_label_is_a_no_op() {
    let mut story = fetched_story();
    let before = story.labels().cloned();
    story.remove_label("never-added");
    assert_eq!(story.labels().cloned(), before);

    // Also safe on a record whose labels were never touched.
    let mut fresh = Story::new();
    fresh.remove_label("never-added");
}

#[test]
fn untouched_labels_report_none() {
    let story = Story::new();
    assert!(story.labels().is_none());
    assert!(story.labels_as_sorted_string().is_none());
}

#[test]
fn label_mutation_replaces_the_whole_set_on_the_wire() {
    let mut story = fetched_story();
    story.remove_label("frontend");
    story.add_label("backend");

    let payload = story.to_wire().unwrap();
    assert_eq!(
        payload.get("labels"),
        Some(&WireValue::Str("auth,backend".to_string()))
    );
}

#[test]
fn deadline_round_trips_bit_exact() {
    let story = Story::from_wire(&json!({ "deadline": "2021/03/04 10:00:00 UTC" })).unwrap();
    assert_eq!(story.deadline().value(), Some(&1614852000));

    let mut update = Story::new();
    update.set_deadline(1614852000);
    let payload = update.to_wire().unwrap();
    assert_eq!(
        payload.get("deadline"),
        Some(&WireValue::Datetime("2021/03/04 10:00:00 UTC".to_string()))
    );
}

#[test]
fn legacy_iso_like_datetimes_are_accepted() {
    let story = Story::from_wire(&json!({ "created_at": "2013-04-20T12:00:00 GMT" })).unwrap();
    assert_eq!(story.created_at().value(), Some(&1366459200));
}

#[test]
fn malformed_datetime_fails_the_whole_ingestion() {
    let payload = json!({ "name": "ok", "created_at": "04/03/2021 10:00" });
    assert!(Story::from_wire(&payload).is_err());
}

#[test]
fn unknown_story_type_fails_the_whole_ingestion() {
    let payload = json!({ "name": "ok", "story_type": "epic" });
    assert!(Story::from_wire(&payload).is_err());
}

#[test]
fn story_type_assignment_is_fail_fast() {
    let err = "epic".parse::<StoryType>().unwrap_err();
    assert!(matches!(
        err,
        crate::error::TrackerError::InvalidField { field: "story_type", .. }
    ));

    let mut story = Story::new();
    story.set_story_type("bug".parse().unwrap());
    let payload = story.to_wire().unwrap();
    assert_eq!(
        payload.get("story_type"),
        Some(&WireValue::Str("bug".to_string()))
    );
    assert_eq!(payload.to_json()["story_type"], json!("bug"));
}

#[test]
fn non_object_payload_is_rejected() {
    assert!(Story::from_wire(&json!([1, 2, 3])).is_err());
    assert!(Story::from_wire(&json!("story")).is_err());
}

#[test]
fn empty_members_stay_distinct_from_missing_ones() {
    let story = Story::from_wire(&json!({ "description": "", "owned_by": null })).unwrap();
    assert!(story.description().is_empty());
    assert!(story.owned_by().is_empty());
    assert!(story.name().is_absent());

    // Empty fields are emitted with empty content; absent ones are omitted.
    let payload = story.to_wire().unwrap();
    assert_eq!(payload.get("description"), Some(&WireValue::Str(String::new())));
    assert_eq!(payload.get("owned_by"), Some(&WireValue::Str(String::new())));
    assert!(payload.get("name").is_none());
}

#[test]
fn empty_string_setter_stores_the_empty_state() {
    let mut story = Story::new();
    story.set_description("");
    assert!(story.description().is_empty());
    assert_eq!(
        story.to_wire().unwrap().get("description"),
        Some(&WireValue::Str(String::new()))
    );
}

#[test]
fn zero_estimate_is_a_value() {
    let story = Story::from_wire(&json!({ "estimate": 0 })).unwrap();
    assert_eq!(story.estimate().value(), Some(&0));
    assert_eq!(story.to_wire().unwrap().get("estimate"), Some(&WireValue::Int(0)));
}

#[test]
fn null_labels_member_counts_as_touched_but_empty() {
    let story = Story::from_wire(&json!({ "labels": null })).unwrap();
    assert!(story.labels().is_some());
    assert!(story.labels().unwrap().is_empty());
    // An empty set is not emitted; the wire cannot express "clear all".
    assert!(story.to_wire().unwrap().get("labels").is_none());
}

#[test]
fn emission_order_is_stable() {
    let story = fetched_story();
    let keys: Vec<&str> = story
        .to_wire()
        .unwrap()
        .fields()
        .iter()
        .map(|(key, _)| *key)
        .collect();
    assert_eq!(
        keys,
        [
            "story_type",
            "current_state",
            "name",
            "description",
            "estimate",
            "requested_by",
            "owned_by",
            "labels",
            "deadline"
        ]
    );
}

#[test]
fn server_assigned_fields_are_never_emitted() {
    let payload = fetched_story().to_wire().unwrap();
    for key in ["id", "url", "created_at", "number"] {
        assert!(payload.get(key).is_none(), "{key} must not be emitted");
    }
}

#[test]
fn xml_and_json_select_the_same_fields() {
    let mut story = Story::new();
    story.set_name("A <tricky> & name");
    story.set_deadline(1614852000);

    let payload = story.to_wire().unwrap();
    assert_eq!(
        payload.to_xml(),
        "<story><name>A &lt;tricky&gt; &amp; name</name>\
         <deadline type=\"datetime\">2021/03/04 10:00:00 UTC</deadline></story>"
    );
    assert_eq!(
        payload.to_json(),
        json!({
            "name": "A <tricky> & name",
            "deadline": "2021/03/04 10:00:00 UTC"
        })
    );
}

#[test]
fn ingested_snapshot_round_trips_through_an_update_payload() {
    let story = fetched_story();
    let json = story.to_wire().unwrap().to_json();
    assert_eq!(json["story_type"], json!("feature"));
    assert_eq!(json["current_state"], json!("started"));
    assert_eq!(json["estimate"], json!(2));
    assert_eq!(json["labels"], json!("auth,frontend"));
    assert_eq!(json["deadline"], json!("2021/03/11 10:00:00 UTC"));
}

#[test]
fn field_state_defaults_to_absent() {
    assert!(FieldState::<String>::default().is_absent());
}
