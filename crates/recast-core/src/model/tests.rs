use crate::{
    error::ErrorClass,
    model::{
        AttributeModel, ConstructorSpec, FieldSpec, MemberRef, MethodSpec, ParamModel,
        PropertySpec, TypeModel, TypeOrigin, Visibility, native_method,
    },
    value::{Value, ValueType},
};

fn person() -> crate::model::TypeHandle {
    TypeModel::builder("Person")
        .property(PropertySpec::new("Name", ValueType::Text))
        .property(PropertySpec::new("Age", ValueType::Int32))
        .field(FieldSpec::new("Id", ValueType::Uint64).init_only())
        .constructor(ConstructorSpec::parameterless())
        .constructor(ConstructorSpec::assigning(vec![
            (ParamModel::required("name", ValueType::Text), "Name"),
            (ParamModel::optional("age", ValueType::Int32, 18), "Age"),
        ]))
        .build()
        .unwrap()
}

#[test]
fn slots_are_laid_out_in_declaration_order() {
    let ty = person();

    assert_eq!(
        ty.slot_types(),
        &[ValueType::Uint64, ValueType::Text, ValueType::Int32]
    );
    assert_eq!(ty.origin(), TypeOrigin::Declared);
}

#[test]
fn slot_properties_get_generated_accessors() {
    let ty = person();
    let name = ty.find_property("Name").unwrap();

    assert_eq!(name.getter().unwrap().name(), "get_Name");
    assert_eq!(name.setter().unwrap().name(), "set_Name");

    let obj = ty.instantiate();
    name.setter()
        .unwrap()
        .invoke(Some(&obj), &[Value::from("Ada")])
        .unwrap();

    assert_eq!(obj.get("Name").unwrap(), Value::from("Ada"));
    assert_eq!(obj.get("Age").unwrap(), Value::Int32(0));
}

#[test]
fn constructor_assigns_parameters_to_slots() {
    let ty = person();
    let ctor = &ty.constructor_refs()[1];

    let obj = ctor
        .construct(&[Value::from("Grace"), Value::Int32(85)])
        .unwrap();

    assert_eq!(obj.get("Name").unwrap(), Value::from("Grace"));
    assert_eq!(obj.get("Age").unwrap(), Value::Int32(85));
    assert_eq!(ctor.model().required_params().count(), 1);
}

#[test]
fn constructor_rejects_wrong_arity() {
    let ty = person();
    let err = ty.constructor_refs()[1].construct(&[]).unwrap_err();

    assert_eq!(err.class, ErrorClass::Internal);
}

#[test]
fn implicit_parameterless_constructor_is_added() {
    let ty = TypeModel::builder("Empty").build().unwrap();

    assert_eq!(ty.constructors().len(), 1);
    assert!(ty.default_constructor().is_some());
}

#[test]
fn duplicate_member_names_are_rejected() {
    let err = TypeModel::builder("Dup")
        .field(FieldSpec::new("X", ValueType::Int32))
        .property(PropertySpec::new("X", ValueType::Int32))
        .build()
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::DescriptorInvalid);
}

#[test]
fn constructor_assignment_must_be_convertible() {
    let err = TypeModel::builder("Bad")
        .property(PropertySpec::new("Age", ValueType::Int32))
        .constructor(ConstructorSpec::assigning(vec![(
            ParamModel::required("age", ValueType::Text),
            "Age",
        )]))
        .build()
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::IncompatibleType);
}

#[test]
fn derived_types_inherit_base_slots_and_members() {
    let base = person();
    let derived = TypeModel::builder("Employee")
        .base(&base)
        .interface("IStaff")
        .property(PropertySpec::new("Title", ValueType::Text))
        .constructor(ConstructorSpec::assigning(vec![
            (ParamModel::required("name", ValueType::Text), "Name"),
            (ParamModel::required("title", ValueType::Text), "Title"),
        ]))
        .build()
        .unwrap();

    assert_eq!(derived.slot_count(), 4);
    assert!(derived.is_subtype_of(&base));
    assert!(!base.is_subtype_of(&derived));
    assert!(derived.implements("IStaff"));

    let names: Vec<_> = derived
        .members()
        .iter()
        .map(|m| m.name().to_string())
        .collect();
    assert_eq!(names, ["Title", "Name", "Age", "Id"]);

    let obj = derived.constructor_refs()[0]
        .construct(&[Value::from("Lin"), Value::from("CTO")])
        .unwrap();
    assert_eq!(obj.get("Name").unwrap(), Value::from("Lin"));
    assert_eq!(obj.get("Title").unwrap(), Value::from("CTO"));
}

#[test]
fn computed_property_has_no_setter() {
    let ty = TypeModel::builder("Adult")
        .property(PropertySpec::new("Age", ValueType::Int32))
        .property(
            PropertySpec::new("IsAdult", ValueType::Bool).computed(native_method(|this, _| {
                let age = this.map(|o| o.get("Age")).transpose()?;
                Ok(Value::Bool(matches!(age, Some(Value::Int32(a)) if a >= 18)))
            })),
        )
        .build()
        .unwrap();

    let prop = ty.find_property("IsAdult").unwrap();
    assert!(prop.setter().is_none());
    assert_eq!(prop.model().set, Visibility::None);

    let obj = ty.instantiate();
    ty.find_property("Age")
        .unwrap()
        .setter()
        .unwrap()
        .invoke(Some(&obj), &[Value::Int32(30)])
        .unwrap();
    assert_eq!(obj.get("IsAdult").unwrap(), Value::Bool(true));

    let member = MemberRef::from(prop);
    assert_eq!(member.backing_slot(), None);
}

#[test]
fn static_members_live_on_the_type() {
    let ty = TypeModel::builder("Counter")
        .property(PropertySpec::new("Total", ValueType::Int64).as_static())
        .build()
        .unwrap();
    let total = ty.find_property("Total").unwrap();

    assert_eq!(ty.slot_count(), 0);
    total
        .setter()
        .unwrap()
        .invoke(None, &[Value::Int64(5)])
        .unwrap();
    assert_eq!(total.getter().unwrap().invoke(None, &[]).unwrap(), Value::Int64(5));
}

#[test]
fn instance_method_without_instance_fails_as_cast() {
    let ty = person();
    let getter = ty.find_property("Name").unwrap().getter().unwrap();

    let err = getter.invoke(None, &[]).unwrap_err();
    assert_eq!(err.class, ErrorClass::InvalidCast);
}

#[test]
fn native_methods_are_found_by_arity() {
    let ty = TypeModel::builder("Greeter")
        .property(PropertySpec::new("Name", ValueType::Text))
        .method(
            MethodSpec::new(
                "Greet",
                native_method(|this, args| {
                    let name = this.map(|o| o.get("Name")).transpose()?;
                    let greeting = args.first().and_then(Value::as_text).unwrap_or("Hello");
                    Ok(Value::Text(format!(
                        "{greeting}, {}",
                        name.as_ref().and_then(Value::as_text).unwrap_or("?")
                    )))
                }),
            )
            .param(ParamModel::required("greeting", ValueType::Text))
            .returns(ValueType::Text),
        )
        .build()
        .unwrap();

    assert!(ty.find_method("Greet", 0).is_none());
    let greet = ty.find_method("Greet", 1).unwrap();

    let obj = ty.instantiate();
    obj.get("Name").unwrap();
    let out = greet.invoke(Some(&obj), &[Value::from("Hi")]).unwrap();
    assert_eq!(out, Value::from("Hi, ?"));
}

#[test]
fn attributes_are_queryable() {
    let ty = TypeModel::builder("Tagged")
        .attribute(AttributeModel::new("Table").arg("people").named("Schema", "hr"))
        .build()
        .unwrap();

    let attr = ty.attribute("Table").unwrap();
    assert_eq!(attr.args, vec![Value::from("people")]);
    assert_eq!(attr.named_value("Schema"), Some(&Value::from("hr")));
}

#[test]
fn handles_compare_by_definition_not_name() {
    let a = TypeModel::builder("Same").build().unwrap();
    let b = TypeModel::builder("Same").build().unwrap();

    assert_ne!(a, b);
    assert_eq!(a, a.clone());
    assert_ne!(a.value_type(), b.value_type());
}

#[test]
fn objects_compare_structurally() {
    let ty = person();
    let a = ty.instantiate();
    let b = ty.instantiate();
    assert_eq!(a, b);

    a.set_slot(1, Value::from("x")).unwrap();
    assert_ne!(a, b);
}

#[test]
fn cyclic_graphs_compare_and_print_without_recursing_forever() {
    let node = TypeModel::builder("Node")
        .property(PropertySpec::new("Next", ValueType::Any))
        .build()
        .unwrap();

    let a = node.instantiate();
    a.set_slot(0, Value::Object(a.clone())).unwrap();
    let b = node.instantiate();
    b.set_slot(0, Value::Object(b.clone())).unwrap();
    let open = node.instantiate();

    assert_eq!(a, b);
    assert_ne!(a, open);
    assert!(format!("{a:?}").contains("Node { <cycle> }"));
}
