use crate::{
    build::{SynthesisEngine, SynthesisOptions, TypeSignature},
    node::{AttributeDescriptor, FieldDescriptor, PropertyDescriptor, TypeDescriptor, Visibility},
};
use recast_core::{
    accessor::{AccessorRequest, AccessorSynthesizer},
    error::{ErrorClass, ErrorOrigin},
    model::{CtorBody, PropertySpec, TypeModel, TypeOrigin},
    value::{Value, ValueType},
};

fn person(extra: Option<&str>) -> TypeDescriptor {
    let mut builder = TypeDescriptor::builder("Person")
        .property(PropertyDescriptor::new("Name", ValueType::Text).required())
        .property(PropertyDescriptor::new("Age", ValueType::Int32).optional(18));
    if let Some(name) = extra {
        builder = builder.property(PropertyDescriptor::new(name, ValueType::Bool));
    }

    builder.build().unwrap()
}

#[test]
fn identical_signature_returns_the_same_handle() {
    let engine = SynthesisEngine::new();

    let a = engine.synthesize(&person(None)).unwrap();
    let b = engine.synthesize(&person(None)).unwrap();

    assert!(a.ptr_eq(&b));
    assert_eq!(engine.module_len(), 1);
    assert_eq!(a.origin(), TypeOrigin::Synthesized);
}

#[test]
fn changed_signature_resynthesizes() {
    let engine = SynthesisEngine::new();

    let first = engine.synthesize(&person(None)).unwrap();
    let second = engine.synthesize(&person(Some("Active"))).unwrap();

    assert!(!first.ptr_eq(&second));
    assert_ne!(first.id(), second.id());
    assert!(engine.lookup("Person").unwrap().ptr_eq(&second));
    assert_eq!(engine.module_len(), 2);

    // the replaced definition stays usable
    assert!(first.find_member("Name").is_some());
    assert!(first.find_member("Active").is_none());

    let stats = engine.stats();
    assert_eq!(stats.registered, 1);
    assert_eq!(stats.emitted, 2);
}

#[test]
fn resynthesis_can_be_disabled() {
    let engine = SynthesisEngine::with_options(SynthesisOptions {
        allow_resynthesis: false,
        ..SynthesisOptions::default()
    });

    let first = engine.synthesize(&person(None)).unwrap();
    let err = engine.synthesize(&person(Some("Active"))).unwrap_err();

    assert_eq!(err.class, ErrorClass::DescriptorInvalid);
    assert_eq!(err.origin, ErrorOrigin::Synthesis);
    assert!(engine.lookup("Person").unwrap().ptr_eq(&first));
    assert_eq!(engine.module_len(), 1);
}

#[test]
fn engine_limits_are_checked_before_emission() {
    let engine = SynthesisEngine::with_options(SynthesisOptions {
        max_members: 1,
        ..SynthesisOptions::default()
    });

    let err = engine.synthesize(&person(None)).unwrap_err();

    assert_eq!(err.class, ErrorClass::DescriptorInvalid);
    assert!(engine.lookup("Person").is_none());
    assert_eq!(engine.module_len(), 0);
}

#[test]
fn constructor_parameters_follow_binding_order() {
    let desc = TypeDescriptor::builder("Order")
        .property(PropertyDescriptor::new("Note", ValueType::Text).optional("none"))
        .property(PropertyDescriptor::new("Total", ValueType::Int64).required())
        .field(FieldDescriptor::new("Priority", ValueType::Int32).optional(1))
        .field(FieldDescriptor::new("OrderId", ValueType::Uint64).required())
        .property(PropertyDescriptor::new("Open", ValueType::Bool))
        .build()
        .unwrap();

    let names: Vec<_> = desc.ctor_params().into_iter().map(|p| p.name).collect();
    assert_eq!(names, ["orderId", "total", "priority", "note"]);

    let ty = SynthesisEngine::new().synthesize(&desc).unwrap();
    let ctors = ty.constructor_refs();
    assert_eq!(ctors.len(), 2);
    assert!(ctors[0].model().is_parameterless());

    let params: Vec<_> = ctors[1]
        .model()
        .params
        .iter()
        .map(|p| (p.name.clone(), p.is_optional()))
        .collect();
    assert_eq!(
        params,
        [
            ("orderId".to_string(), false),
            ("total".to_string(), false),
            ("priority".to_string(), true),
            ("note".to_string(), true),
        ]
    );

    let obj = ctors[1]
        .construct(&[
            Value::Uint64(7),
            Value::Int64(120),
            Value::Int32(1),
            Value::from("none"),
        ])
        .unwrap();
    assert_eq!(obj.get("OrderId").unwrap(), Value::Uint64(7));
    assert_eq!(obj.get("Total").unwrap(), Value::Int64(120));
    assert_eq!(obj.get("Open").unwrap(), Value::Bool(false));

    // members are written in declaration order: fields, then properties
    let CtorBody::Assign(steps) = &ctors[1].model().body else {
        panic!("synthesized constructor should assign members");
    };
    let order: Vec<_> = steps.iter().map(|s| s.param).collect();
    assert_eq!(order, [2, 0, 3, 1]);
}

#[test]
fn unbound_types_only_get_the_parameterless_constructor() {
    let desc = TypeDescriptor::builder("Flags")
        .property(PropertyDescriptor::new("On", ValueType::Bool))
        .build()
        .unwrap();

    let ty = SynthesisEngine::new().synthesize(&desc).unwrap();

    assert_eq!(ty.constructor_refs().len(), 1);
    assert!(ty.default_constructor().is_some());
}

#[test]
fn optional_defaults_are_converted_to_the_member_type() {
    let desc = TypeDescriptor::builder("Counter")
        .property(PropertyDescriptor::new("Count", ValueType::Int64).optional(5))
        .build()
        .unwrap();

    let params = desc.ctor_params();
    assert_eq!(params[0].default, Some(Value::Int64(5)));

    let ty = SynthesisEngine::new().synthesize(&desc).unwrap();
    let ctor = &ty.constructor_refs()[1];
    assert_eq!(ctor.model().params[0].default, Some(Value::Int64(5)));
}

#[test]
fn visibility_controls_generated_accessors() {
    let desc = TypeDescriptor::builder("Account")
        .property(
            PropertyDescriptor::new("Balance", ValueType::Int64)
                .read_only()
                .required(),
        )
        .property(PropertyDescriptor::new("Secret", ValueType::Text).get(Visibility::Private))
        .field(
            FieldDescriptor::new("Id", ValueType::Uint64)
                .init_only()
                .visibility(Visibility::Protected),
        )
        .build()
        .unwrap();
    let ty = SynthesisEngine::new().synthesize(&desc).unwrap();

    let balance = ty.find_property("Balance").unwrap();
    assert!(balance.getter().is_some());
    assert!(balance.setter().is_none());

    let synth = AccessorSynthesizer::new();
    let err = synth
        .property_setter(&balance, &AccessorRequest::typed())
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::InvalidOperation);

    let secret = ty.find_property("Secret").unwrap();
    assert_eq!(secret.model().get, Visibility::Private);

    let id = ty.find_field("Id").unwrap();
    assert!(id.model().init_only);
    assert_eq!(id.model().visibility, Visibility::Protected);

    // the constructor still assigns the read-only property
    let obj = ty.constructor_refs()[1].construct(&[Value::Int64(50)]).unwrap();
    assert_eq!(obj.get("Balance").unwrap(), Value::Int64(50));
}

#[test]
fn attributes_interfaces_and_base_are_applied() {
    let base = TypeModel::builder("Entity")
        .property(PropertySpec::new("Id", ValueType::Uint64))
        .build()
        .unwrap();
    let desc = TypeDescriptor::builder("Customer")
        .base(&base)
        .interface("Auditable")
        .attribute(
            AttributeDescriptor::new("Table")
                .arg("customers")
                .named("Schema", "sales"),
        )
        .property(PropertyDescriptor::new("Name", ValueType::Text).required())
        .build()
        .unwrap();

    let ty = SynthesisEngine::new().synthesize(&desc).unwrap();

    assert!(ty.is_subtype_of(&base));
    assert!(ty.implements("Auditable"));
    let table = ty.attribute("Table").unwrap();
    assert_eq!(table.args, vec![Value::from("customers")]);
    assert_eq!(table.named_value("Schema"), Some(&Value::from("sales")));

    let obj = ty.constructor_refs()[1]
        .construct(&[Value::from("Grace")])
        .unwrap();
    assert_eq!(obj.get("Id").unwrap(), Value::Uint64(0));
    assert_eq!(obj.get("Name").unwrap(), Value::from("Grace"));
}

#[test]
fn concurrent_synthesis_emits_once() {
    let engine = SynthesisEngine::new();
    let desc = person(None);

    let handles: Vec<_> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| engine.synthesize(&desc).unwrap()))
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    assert!(handles.iter().all(|h| h.ptr_eq(&handles[0])));
    assert_eq!(engine.module_len(), 1);
}

#[test]
fn signature_ignores_constructor_binding() {
    let plain = TypeDescriptor::builder("Point")
        .property(PropertyDescriptor::new("X", ValueType::Int32))
        .build()
        .unwrap();
    let bound = TypeDescriptor::builder("Point")
        .property(PropertyDescriptor::new("X", ValueType::Int32).required())
        .build()
        .unwrap();
    let nullable = TypeDescriptor::builder("Point")
        .property(PropertyDescriptor::new("X", ValueType::Int32).nullable())
        .build()
        .unwrap();

    assert_eq!(TypeSignature::of(&plain), TypeSignature::of(&bound));
    assert_ne!(TypeSignature::of(&plain), TypeSignature::of(&nullable));
    assert_eq!(
        TypeSignature::of(&nullable).to_string(),
        "Point { Property X: int32? }"
    );
    assert_eq!(
        TypeSignature::of(&plain).fingerprint(),
        TypeSignature::of(&bound).fingerprint()
    );
}
