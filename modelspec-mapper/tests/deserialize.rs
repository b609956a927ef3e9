//! Deserialization behavior over declared models.

use std::sync::Arc;

use indexmap::IndexMap;
use modelspec::{
    CollectionKind, EntityStore, PropertyOptions, PropertyType, TypeDescriptor,
};
use modelspec_mapper::{
    AdditionalPropertiesPolicy, DeserializeOptions, Instance, JsonMapper, MapperError,
    SerializeOptions, Value,
};
use serde_json::json;

fn lenient() -> DeserializeOptions {
    DeserializeOptions::new()
}

fn strict() -> DeserializeOptions {
    DeserializeOptions::new().with_strict(true)
}

// ============================================================================
// Shapes and coercion
// ============================================================================

#[test]
fn test_scalar_wrapped_into_array() {
    let mut store = EntityStore::new();
    let post = store
        .define("Post")
        .property("tags", PropertyOptions::new().array_of(PropertyType::String))
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));

    let value = mapper.deserialize(&json!({"tags": "rust"}), post, &lenient()).unwrap();
    assert_eq!(
        value,
        Value::Object(Instance::new(post).with("tags", vec![Value::from("rust")]))
    );

    let err = mapper.deserialize(&json!({"tags": "rust"}), post, &strict()).unwrap_err();
    assert_eq!(err, MapperError::shape("tags", "array", "string"));
}

#[test]
fn test_map_requires_object() {
    let mut store = EntityStore::new();
    let config = store
        .define("Config")
        .property("env", PropertyOptions::new().map_of(PropertyType::String))
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));

    let value = mapper
        .deserialize(&json!({"env": {"MODE": "dev"}}), config, &lenient())
        .unwrap();
    let mut env = IndexMap::new();
    env.insert("MODE".to_string(), Value::from("dev"));
    assert_eq!(value, Value::Object(Instance::new(config).with("env", env)));

    let err = mapper
        .deserialize(&json!({"env": ["dev"]}), config, &lenient())
        .unwrap_err();
    assert_eq!(err, MapperError::shape("env", "object", "array"));
}

#[test]
fn test_cast_errors() {
    let mut store = EntityStore::new();
    let person = store
        .define("Person")
        .property("age", PropertyOptions::new().number())
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));

    let err = mapper.deserialize(&json!({"age": "abc"}), person, &lenient()).unwrap_err();
    assert_eq!(err, MapperError::cast("age", "Number", "\"abc\""));

    let coerced = mapper.deserialize(&json!({"age": "12"}), person, &lenient()).unwrap();
    assert_eq!(coerced, Value::Object(Instance::new(person).with("age", 12)));
    assert!(mapper.deserialize(&json!({"age": "12"}), person, &strict()).is_err());
}

#[test]
fn test_model_requires_object() {
    let mut store = EntityStore::new();
    let person = store.define("Person").build().unwrap();
    let mapper = JsonMapper::new(Arc::new(store));

    let err = mapper.deserialize(&json!("Ada"), person, &strict()).unwrap_err();
    assert_eq!(err, MapperError::shape("$", "object", "string"));
    assert!(matches!(
        mapper.deserialize(&json!("Ada"), person, &lenient()),
        Err(MapperError::Cast { .. })
    ));
}

#[test]
fn test_null_passes_through() {
    let mut store = EntityStore::new();
    let person = store
        .define("Person")
        .property("nick", PropertyOptions::new().string())
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));

    let value = mapper.deserialize(&json!({"nick": null}), person, &lenient()).unwrap();
    assert_eq!(value, Value::Object(Instance::new(person).with("nick", Value::Null)));
}

#[test]
fn test_set_descriptor_drops_duplicates() {
    let mapper = JsonMapper::new(Arc::new(EntityStore::new()));
    let descriptor = TypeDescriptor {
        ty: PropertyType::String,
        collection: Some(CollectionKind::Set),
    };

    let value = mapper
        .deserialize_with(&json!(["a", "b", "a"]), &descriptor, &lenient())
        .unwrap();
    assert_eq!(value, Value::Set(vec![Value::from("a"), Value::from("b")]));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_nested_validation_error_path() {
    let mut store = EntityStore::new();
    let address = store
        .define("Address")
        .property(
            "lines",
            PropertyOptions::new().array_of(PropertyType::String).min_length(1),
        )
        .build()
        .unwrap();
    let person = store
        .define("Person")
        .property("address", PropertyOptions::new().model(address))
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));

    let input = json!({"address": {"lines": ["1 Main St", "Apt 2", ""]}});
    let err = mapper
        .deserialize(&input, person, &lenient().with_validate(true))
        .unwrap_err();
    assert!(matches!(err, MapperError::Validation { .. }));
    assert_eq!(err.path(), Some("address.lines[2]"));

    assert!(mapper.deserialize(&input, person, &lenient()).is_ok());
}

#[test]
fn test_required_properties() {
    let mut store = EntityStore::new();
    let person = store
        .define("Person")
        .property("name", PropertyOptions::new().string().required())
        .property("nick", PropertyOptions::new().string().required().nullable())
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));
    let options = lenient().with_validate(true);

    let err = mapper.deserialize(&json!({"nick": null}), person, &options).unwrap_err();
    assert_eq!(err, MapperError::validation("name", "required property is missing"));

    let err = mapper
        .deserialize(&json!({"name": null, "nick": null}), person, &options)
        .unwrap_err();
    assert_eq!(err.path(), Some("name"));

    assert!(mapper
        .deserialize(&json!({"name": "Ada", "nick": null}), person, &options)
        .is_ok());
}

#[test]
fn test_constraints_checked_only_when_validating() {
    let mut store = EntityStore::new();
    let user = store
        .define("User")
        .property(
            "email",
            PropertyOptions::new().string().pattern("^[^@]+@[^@]+$"),
        )
        .property(
            "role",
            PropertyOptions::new().string().enum_values(["admin", "user"]),
        )
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));
    let options = lenient().with_validate(true);

    assert!(mapper
        .deserialize(&json!({"email": "a@b", "role": "user"}), user, &options)
        .is_ok());

    let err = mapper.deserialize(&json!({"email": "nope"}), user, &options).unwrap_err();
    assert_eq!(err.path(), Some("email"));

    let err = mapper.deserialize(&json!({"role": "root"}), user, &options).unwrap_err();
    assert_eq!(err.path(), Some("role"));

    assert!(mapper.deserialize(&json!({"role": "root"}), user, &lenient()).is_ok());
}

// ============================================================================
// Property options
// ============================================================================

#[test]
fn test_alias_on_both_directions() {
    let mut store = EntityStore::new();
    let person = store
        .define("Person")
        .property("firstName", PropertyOptions::new().string().alias("first_name"))
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));
    let expected = Value::Object(Instance::new(person).with("firstName", "Ada"));

    let value = mapper.deserialize(&json!({"first_name": "Ada"}), person, &lenient()).unwrap();
    assert_eq!(value, expected);
    assert_eq!(mapper.serialize(&value, person).unwrap(), json!({"first_name": "Ada"}));

    let plain = lenient().with_use_alias(false);
    assert_eq!(
        mapper.deserialize(&json!({"firstName": "Ada"}), person, &plain).unwrap(),
        expected
    );
    let json = mapper
        .serialize_with(
            &value,
            &TypeDescriptor::model(person),
            &SerializeOptions::new().with_use_alias(false),
        )
        .unwrap();
    assert_eq!(json, json!({"firstName": "Ada"}));
}

#[test]
fn test_read_only_and_write_only() {
    let mut store = EntityStore::new();
    let account = store
        .define("Account")
        .property("id", PropertyOptions::new().string().read_only())
        .property("password", PropertyOptions::new().string().write_only())
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));

    let value = mapper
        .deserialize(&json!({"id": "1", "password": "secret"}), account, &lenient())
        .unwrap();
    assert_eq!(
        value,
        Value::Object(Instance::new(account).with("password", "secret"))
    );

    let full = Value::Object(
        Instance::new(account)
            .with("id", "1")
            .with("password", "secret"),
    );
    assert_eq!(mapper.serialize(&full, account).unwrap(), json!({"id": "1"}));
}

#[test]
fn test_ignored_property_never_mapped() {
    let mut store = EntityStore::new();
    let doc = store
        .define("Doc")
        .property("title", PropertyOptions::new().string())
        .property("cache", PropertyOptions::new().string().ignore())
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));

    let value = mapper
        .deserialize(&json!({"title": "t", "cache": "c"}), doc, &lenient())
        .unwrap();
    assert_eq!(value, Value::Object(Instance::new(doc).with("title", "t")));

    let full = Value::Object(Instance::new(doc).with("title", "t").with("cache", "c"));
    assert_eq!(mapper.serialize(&full, doc).unwrap(), json!({"title": "t"}));
}

#[test]
fn test_defaults_fill_absent_values() {
    let mut store = EntityStore::new();
    let user = store
        .define("User")
        .property("role", PropertyOptions::new().string().default_value("user"))
        .property("tags", PropertyOptions::new().array_of(PropertyType::String).default_value(json!([])))
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));

    let value = mapper.deserialize(&json!({}), user, &lenient()).unwrap();
    assert_eq!(
        value,
        Value::Object(
            Instance::new(user)
                .with("role", "user")
                .with("tags", Vec::<Value>::new())
        )
    );

    let value = mapper.deserialize(&json!({"role": "admin"}), user, &lenient()).unwrap();
    assert_eq!(value.as_instance().unwrap().get("role"), Some(&Value::from("admin")));
}

#[test]
fn test_groups_filter_properties() {
    let mut store = EntityStore::new();
    let user = store
        .define("User")
        .property("name", PropertyOptions::new().string())
        .property("password", PropertyOptions::new().string().groups(["creation"]))
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));
    let input = json!({"name": "Ada", "password": "secret"});

    let value = mapper.deserialize(&input, user, &lenient()).unwrap();
    assert_eq!(value, Value::Object(Instance::new(user).with("name", "Ada")));

    let value = mapper
        .deserialize(&input, user, &lenient().with_groups(["creation"]))
        .unwrap();
    assert_eq!(
        value,
        Value::Object(Instance::new(user).with("name", "Ada").with("password", "secret"))
    );

    assert_eq!(mapper.serialize(&value, user).unwrap(), json!({"name": "Ada"}));
    let json = mapper
        .serialize_with(
            &value,
            &TypeDescriptor::model(user),
            &SerializeOptions::new().with_groups(["creation"]),
        )
        .unwrap();
    assert_eq!(json, input);
}

#[test]
fn test_keep_undefined_emits_null() {
    let mut store = EntityStore::new();
    let person = store
        .define("Person")
        .property("name", PropertyOptions::new().string())
        .property("nick", PropertyOptions::new().string())
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));
    let value = Value::Object(Instance::new(person).with("name", "Ada"));

    assert_eq!(mapper.serialize(&value, person).unwrap(), json!({"name": "Ada"}));
    let json = mapper
        .serialize_with(
            &value,
            &TypeDescriptor::model(person),
            &SerializeOptions::new().with_keep_undefined(true),
        )
        .unwrap();
    assert_eq!(json, json!({"name": "Ada", "nick": null}));
}

// ============================================================================
// Unknown keys
// ============================================================================

#[test]
fn test_additional_properties_policies() {
    let mut store = EntityStore::new();
    let person = store
        .define("Person")
        .property("name", PropertyOptions::new().string())
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));
    let input = json!({"name": "Ada", "extra": 1});

    let ignored = mapper.deserialize(&input, person, &lenient()).unwrap();
    assert_eq!(ignored, Value::Object(Instance::new(person).with("name", "Ada")));

    let accepted = mapper
        .deserialize(
            &input,
            person,
            &lenient().with_additional_properties(AdditionalPropertiesPolicy::Accept),
        )
        .unwrap();
    assert_eq!(
        accepted,
        Value::Object(Instance::new(person).with("name", "Ada").with("extra", 1))
    );

    let err = mapper
        .deserialize(
            &input,
            person,
            &lenient().with_additional_properties(AdditionalPropertiesPolicy::Error),
        )
        .unwrap_err();
    assert_eq!(
        err,
        MapperError::UnknownProperty {
            path: "$".into(),
            property: "extra".into(),
        }
    );
}

#[test]
fn test_open_class_keeps_unknown_keys() {
    let mut store = EntityStore::new();
    let bag = store
        .define("Bag")
        .additional_properties(true)
        .property("id", PropertyOptions::new().string())
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));
    let input = json!({"id": "1", "color": "red"});

    let value = mapper
        .deserialize(
            &input,
            bag,
            &lenient().with_additional_properties(AdditionalPropertiesPolicy::Error),
        )
        .unwrap();
    assert_eq!(
        value,
        Value::Object(Instance::new(bag).with("id", "1").with("color", "red"))
    );
    assert_eq!(mapper.serialize(&value, bag).unwrap(), input);
}

// ============================================================================
// Polymorphism
// ============================================================================

#[test]
fn test_discriminator_dispatch() {
    let mut store = EntityStore::new();
    let animal = store
        .define("Animal")
        .discriminator_key("kind")
        .property("kind", PropertyOptions::new().string())
        .build()
        .unwrap();
    let dog = store
        .define("Dog")
        .extends(animal)
        .discriminator_value("dog")
        .property("bark", PropertyOptions::new().boolean())
        .build()
        .unwrap();
    let cat = store
        .define("Cat")
        .extends(animal)
        .discriminator_value("cat")
        .build()
        .unwrap();
    let zoo = store
        .define("Zoo")
        .property(
            "animals",
            PropertyOptions::new()
                .discriminated(animal)
                .collection(CollectionKind::Array),
        )
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));

    let input = json!({"animals": [{"kind": "dog", "bark": true}, {"kind": "cat"}]});
    let value = mapper.deserialize(&input, zoo, &lenient()).unwrap();
    assert_eq!(
        value,
        Value::Object(Instance::new(zoo).with(
            "animals",
            vec![
                Value::Object(Instance::new(dog).with("kind", "dog").with("bark", true)),
                Value::Object(Instance::new(cat).with("kind", "cat")),
            ]
        ))
    );
    assert_eq!(mapper.serialize(&value, zoo).unwrap(), input);

    let unknown = json!({"animals": [{"kind": "bird"}]});
    let value = mapper.deserialize(&unknown, zoo, &lenient()).unwrap();
    let animals = value.as_instance().unwrap().get("animals").unwrap();
    assert_eq!(
        animals,
        &Value::Array(vec![Value::Object(Instance::new(animal).with("kind", "bird"))])
    );

    let err = mapper.deserialize(&unknown, zoo, &strict()).unwrap_err();
    assert!(matches!(err, MapperError::ShapeMismatch { .. }));
    assert_eq!(err.path(), Some("animals[0].kind"));
}

#[test]
fn test_serialize_writes_discriminator_value() {
    let mut store = EntityStore::new();
    let animal = store
        .define("Animal")
        .discriminator_key("kind")
        .property("kind", PropertyOptions::new().string())
        .build()
        .unwrap();
    let dog = store
        .define("Dog")
        .extends(animal)
        .discriminator_value("dog")
        .property("bark", PropertyOptions::new().boolean())
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));

    let value = Value::Object(Instance::new(dog).with("bark", true));
    assert_eq!(
        mapper.serialize(&value, animal).unwrap(),
        json!({"bark": true, "kind": "dog"})
    );
}

#[test]
fn test_all_of_merges_models() {
    let mut store = EntityStore::new();
    let named = store
        .define("Named")
        .property("name", PropertyOptions::new().string())
        .build()
        .unwrap();
    let aged = store
        .define("Aged")
        .property("age", PropertyOptions::new().integer())
        .build()
        .unwrap();
    let payload = store
        .define("Payload")
        .property(
            "data",
            PropertyOptions::new().all_of([PropertyType::Model(named), PropertyType::Model(aged)]),
        )
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));

    let value = mapper
        .deserialize(&json!({"data": {"name": "Ada", "age": 36}}), payload, &lenient())
        .unwrap();
    let data = value.as_instance().unwrap().get("data").unwrap();
    assert_eq!(
        data,
        &Value::Object(Instance::new(named).with("name", "Ada").with("age", 36))
    );
}

#[test]
fn test_any_of_takes_first_match() {
    let mut store = EntityStore::new();
    let holder = store
        .define("Holder")
        .property(
            "value",
            PropertyOptions::new().any_of([PropertyType::Number, PropertyType::String]),
        )
        .build()
        .unwrap();
    let mapper = JsonMapper::new(Arc::new(store));

    let value = mapper.deserialize(&json!({"value": "abc"}), holder, &lenient()).unwrap();
    assert_eq!(value, Value::Object(Instance::new(holder).with("value", "abc")));

    let value = mapper.deserialize(&json!({"value": 2}), holder, &lenient()).unwrap();
    assert_eq!(value, Value::Object(Instance::new(holder).with("value", 2)));

    let err = mapper
        .deserialize(&json!({"value": {}}), holder, &lenient())
        .unwrap_err();
    assert_eq!(err, MapperError::cast("value", "Number | String", "{}"));
}
