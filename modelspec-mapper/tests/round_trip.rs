//! Serialize then deserialize returns the original value.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use indexmap::IndexMap;
use modelspec::{ClassId, EntityStore, PropertyOptions, PropertyType};
use modelspec_mapper::{DeserializeOptions, Instance, JsonMapper, Value};
use proptest::prelude::*;
use serde_json::json;

struct Fixture {
    mapper: JsonMapper,
    user: ClassId,
    event: ClassId,
}

fn fixture() -> Fixture {
    let mut store = EntityStore::new();
    let user = store
        .define("User")
        .property("name", PropertyOptions::new().string().required())
        .build()
        .unwrap();
    let event = store
        .define("Event")
        .property("title", PropertyOptions::new().string())
        .property("score", PropertyOptions::new().number())
        .property("active", PropertyOptions::new().boolean())
        .property("at", PropertyOptions::new().date())
        .property("tags", PropertyOptions::new().array_of(PropertyType::String))
        .property("owner", PropertyOptions::new().model(user))
        .property(
            "display_name",
            PropertyOptions::new().string().alias("displayName"),
        )
        .property("labels", PropertyOptions::new().map_of(PropertyType::String))
        .property(
            "guests",
            PropertyOptions::new().array_of(PropertyType::Model(user)),
        )
        .build()
        .unwrap();

    Fixture {
        mapper: JsonMapper::new(Arc::new(store)),
        user,
        event,
    }
}

#[test]
fn test_date_round_trip() {
    let Fixture { mapper, event, .. } = fixture();
    let at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let value = Value::Object(Instance::new(event).with("at", at));

    let json = mapper.serialize(&value, event).unwrap();
    assert_eq!(json, json!({"at": "2020-01-01T00:00:00.000Z"}));

    let restored = mapper
        .deserialize(&json, event, &DeserializeOptions::new())
        .unwrap();
    assert_eq!(restored, value);
}

#[test]
fn test_nested_model_round_trip() {
    let Fixture { mapper, user, event } = fixture();
    let value = Value::Object(
        Instance::new(event)
            .with("title", "launch")
            .with("tags", vec![Value::from("a"), Value::from("b")])
            .with("owner", Instance::new(user).with("name", "Ada")),
    );

    let json = mapper.serialize(&value, event).unwrap();
    assert_eq!(
        json,
        json!({"title": "launch", "tags": ["a", "b"], "owner": {"name": "Ada"}})
    );
    assert_eq!(
        mapper.deserialize(&json, event, &DeserializeOptions::new()).unwrap(),
        value
    );
}

#[test]
fn test_alias_map_and_model_array_round_trip() {
    let Fixture { mapper, user, event } = fixture();
    let at = Utc.timestamp_opt(1_577_836_800, 123_456_789).unwrap();
    let mut labels = IndexMap::new();
    labels.insert("tier".to_string(), Value::from("gold"));
    let value = Value::Object(
        Instance::new(event)
            .with("at", at)
            .with("display_name", "Launch Day")
            .with("labels", labels)
            .with(
                "guests",
                vec![Value::from(Instance::new(user).with("name", "Grace"))],
            ),
    );

    let json = mapper.serialize(&value, event).unwrap();
    assert_eq!(
        json,
        json!({
            "at": "2020-01-01T00:00:00.123456789Z",
            "displayName": "Launch Day",
            "labels": {"tier": "gold"},
            "guests": [{"name": "Grace"}]
        })
    );
    assert_eq!(
        mapper.deserialize(&json, event, &DeserializeOptions::new()).unwrap(),
        value
    );
}

proptest! {
    #[test]
    fn prop_round_trip_preserves_value(
        title in "[a-zA-Z ]{0,16}",
        quarters in -4000i64..4000,
        active in any::<bool>(),
        secs in 0i64..4_000_000_000,
        nanos in 0u32..1_000_000_000,
        tags in prop::collection::vec("[a-z]{1,8}", 0..5),
        owner in "[A-Z][a-z]{0,10}",
        display_name in "[a-z]{0,12}",
        labels in prop::collection::vec(("[a-z]{1,6}", "[a-z0-9]{0,6}"), 0..4),
        guests in prop::collection::vec("[A-Z][a-z]{0,8}", 0..4),
    ) {
        let Fixture { mapper, user, event } = fixture();
        let at = Utc.timestamp_opt(secs, nanos).unwrap();
        let labels: IndexMap<String, Value> = labels
            .into_iter()
            .map(|(key, label)| (key, Value::from(label)))
            .collect();
        let guests: Vec<Value> = guests
            .into_iter()
            .map(|name| Value::from(Instance::new(user).with("name", name)))
            .collect();
        let value = Value::Object(
            Instance::new(event)
                .with("title", title)
                .with("score", Value::Float(quarters as f64 / 4.0))
                .with("active", active)
                .with("at", at)
                .with("tags", tags.into_iter().map(Value::from).collect::<Vec<_>>())
                .with("owner", Instance::new(user).with("name", owner))
                .with("display_name", display_name)
                .with("labels", labels)
                .with("guests", guests),
        );

        let json = mapper.serialize(&value, event).unwrap();
        prop_assert!(json.get("displayName").is_some());
        let restored = mapper
            .deserialize(&json, event, &DeserializeOptions::new().with_validate(true))
            .unwrap();
        prop_assert_eq!(restored, value);
    }
}
