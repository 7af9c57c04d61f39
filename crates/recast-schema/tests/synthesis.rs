use proptest::prelude::*;
use recast_core::{
    accessor::{AccessorRequest, AccessorSynthesizer},
    value::{Value, ValueType},
};
use recast_schema::prelude::*;
use serde_json::json;

#[test]
fn descriptor_serializes_to_a_stable_shape() {
    let desc = TypeDescriptor::builder("Person")
        .property(PropertyDescriptor::new("Name", ValueType::Text).required())
        .property(
            PropertyDescriptor::new("Age", ValueType::Int32)
                .nullable()
                .optional(Value::Null),
        )
        .attribute(AttributeDescriptor::new("Table").arg("people"))
        .build()
        .unwrap();

    let value = serde_json::to_value(&desc).unwrap();

    assert_eq!(
        value,
        json!({
            "name": "Person",
            "fields": [],
            "properties": [
                {
                    "name": "Name",
                    "ty": "Text",
                    "nullable": false,
                    "get": "Public",
                    "set": "Public",
                    "ctor": "Required"
                },
                {
                    "name": "Age",
                    "ty": "Int32",
                    "nullable": true,
                    "get": "Public",
                    "set": "Public",
                    "ctor": { "Optional": "Null" }
                }
            ],
            "attributes": [
                { "name": "Table", "args": [{ "Text": "people" }] }
            ]
        })
    );
}

#[test]
fn synthesized_members_round_trip_through_accessors() {
    let desc = TypeDescriptor::builder("Reading")
        .property(PropertyDescriptor::new("Sensor", ValueType::Text))
        .property(PropertyDescriptor::new("Celsius", ValueType::Float64).nullable())
        .field(FieldDescriptor::new("Sequence", ValueType::Uint64))
        .build()
        .unwrap();
    let ty = SynthesisEngine::global().synthesize(&desc).unwrap();
    let synth = AccessorSynthesizer::new();

    for (name, value) in [
        ("Sensor", Value::from("north")),
        ("Celsius", Value::Float64(21.5)),
        ("Celsius", Value::Null),
        ("Sequence", Value::Uint64(42)),
    ] {
        let member = ty.find_member(name).unwrap();
        let obj = Value::Object(ty.instantiate());

        synth
            .setter(&member, &AccessorRequest::typed())
            .unwrap()
            .invoke(&[obj.clone(), value.clone()])
            .unwrap();
        let read = synth
            .getter(&member, &AccessorRequest::typed())
            .unwrap()
            .invoke(&[obj])
            .unwrap();

        assert_eq!(read, value);
    }
}

fn member_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[A-Z][a-z]{1,6}", 1..6)
        .prop_map(|names| names.into_iter().collect())
}

proptest! {
    #[test]
    fn synthesis_is_idempotent_per_signature(names in member_names()) {
        let engine = SynthesisEngine::new();
        let desc = names
            .iter()
            .fold(TypeDescriptor::builder("Generated"), |b, name| {
                b.property(PropertyDescriptor::new(name.as_str(), ValueType::Int64))
            })
            .build()
            .unwrap();

        let first = engine.synthesize(&desc).unwrap();
        let again = engine.synthesize(&desc).unwrap();

        prop_assert!(first.ptr_eq(&again));
        prop_assert_eq!(engine.module_len(), 1);
        prop_assert_eq!(first.members().len(), names.len());
    }
}
