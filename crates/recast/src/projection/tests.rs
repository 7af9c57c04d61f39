use crate::projection::{
    CtorParamTarget, ExactMatchStrategy, MemberTarget, ProjectionCompiler,
    ProjectionConfiguration, ProjectionSource, ProjectionTarget, UnmappedPolicy, ValueMap,
};
use recast_core::{
    error::ErrorClass,
    ir::{BinaryOp, Expr, Lambda, ParamDecl},
    model::{
        ConstructorSpec, FieldSpec, ParamModel, PropertySpec, TypeHandle, TypeModel, Visibility,
    },
    value::{Value, ValueType},
};
use recast_schema::node::{PropertyDescriptor, TypeDescriptor};
use std::sync::Arc;

// Source: Person { FirstName, Age, Code }
fn person_type() -> TypeHandle {
    TypeModel::builder("Person")
        .property(PropertySpec::new("FirstName", ValueType::Text))
        .property(PropertySpec::new("Age", ValueType::Int32))
        .property(PropertySpec::new("Code", ValueType::Int32))
        .build()
        .unwrap()
}

fn person(ty: &TypeHandle, first: &str, age: i32, code: i32) -> Value {
    let obj = ty.instantiate();
    obj.set_slot(0, Value::from(first)).unwrap();
    obj.set_slot(1, Value::Int32(age)).unwrap();
    obj.set_slot(2, Value::Int32(code)).unwrap();

    Value::Object(obj)
}

fn get(value: &Value, name: &str) -> Value {
    value.as_object().unwrap().get(name).unwrap()
}

// Target with one constructor taking a required name and an optional age.
fn card_type() -> TypeHandle {
    TypeModel::builder("Card")
        .property(PropertySpec::new("Name", ValueType::Text))
        .property(PropertySpec::new("Age", ValueType::Int32))
        .property(PropertySpec::new("Label", ValueType::Text))
        .constructor(ConstructorSpec::assigning(vec![
            (ParamModel::required("name", ValueType::Text), "Name"),
            (ParamModel::optional("age", ValueType::Int32, 18), "Age"),
        ]))
        .build()
        .unwrap()
}

fn is_adult(source: &TypeHandle) -> Lambda {
    let params = vec![ParamDecl::new("p", source.value_type())];
    let age = source.find_member("Age").unwrap();
    let read = recast_core::accessor::AccessorSynthesizer::new()
        .read_member(Some(Lambda::param_expr(&params, 0).unwrap()), &age)
        .unwrap();
    let body = Expr::binary(BinaryOp::Ge, read, Expr::constant(18)).unwrap();

    Lambda::new(params, body).unwrap()
}

#[test]
fn synthesized_target_projects_paths_and_lambdas() {
    let source = person_type();
    let compiler = ProjectionCompiler::new();
    let config = ProjectionConfiguration::builder(&source)
        .synthesize_as("PersonView")
        .member("DisplayName", ProjectionSource::path("FirstName"))
        .member("IsAdult", ProjectionSource::Lambda(is_adult(&source)))
        .build();

    let compiled = config.compiled(&compiler).unwrap();
    let out = compiled.apply(&person(&source, "Ada", 31, 0)).unwrap();

    assert_eq!(compiled.target().name(), "PersonView");
    assert_eq!(get(&out, "DisplayName"), Value::from("Ada"));
    assert_eq!(get(&out, "IsAdult"), Value::Bool(true));

    let minor = compiled.apply(&person(&source, "Tom", 12, 0)).unwrap();
    assert_eq!(get(&minor, "IsAdult"), Value::Bool(false));
    assert!(compiler.engine().lookup("PersonView").unwrap().ptr_eq(compiled.target()));
}

#[test]
fn value_map_takes_the_first_matching_key() {
    let source = person_type();
    let compiler = ProjectionCompiler::new();
    let codes = ValueMap::new().entry(1, "a").entry(2, "b");

    let project = |map: ValueMap, code: i32| {
        let config = ProjectionConfiguration::builder(&source)
            .synthesize_as("Coded")
            .member_with(
                MemberTarget::new("Label")
                    .source(ProjectionSource::path("Code"))
                    .value_map(map),
            )
            .build();
        let out = config
            .compiled(&compiler)
            .unwrap()
            .apply(&person(&source, "Ada", 31, code))
            .unwrap();

        get(&out, "Label")
    };

    assert_eq!(project(codes.clone(), 2), Value::from("b"));
    assert_eq!(project(codes.clone(), 7), Value::Null);
    assert_eq!(
        project(codes.unmapped(UnmappedPolicy::Constant(Value::from("z"))), 7),
        Value::from("z")
    );
}

#[test]
fn value_map_on_value_type_falls_back_to_zero() {
    let source = person_type();
    let config = ProjectionConfiguration::builder(&source)
        .synthesize_as("Ranked")
        .member_with(
            MemberTarget::new("Rank")
                .source(ProjectionSource::path("Code"))
                .value_map(ValueMap::new().entry(1, 100i64).entry(2, 200i64)),
        )
        .build();

    let compiled = config.compiled(&ProjectionCompiler::new()).unwrap();

    assert_eq!(
        get(&compiled.apply(&person(&source, "Ada", 31, 2)).unwrap(), "Rank"),
        Value::Int64(200)
    );
    assert_eq!(
        get(&compiled.apply(&person(&source, "Ada", 31, 5)).unwrap(), "Rank"),
        Value::Int64(0)
    );
}

#[test]
fn required_constructor_parameter_must_be_bound() {
    let source = person_type();
    let target = card_type();
    let compiler = ProjectionCompiler::new();

    let unbound = ProjectionConfiguration::builder(&source)
        .target(&target)
        .member("Label", ProjectionSource::constant("guest"))
        .build();
    let err = unbound.compiled(&compiler).unwrap_err();
    assert_eq!(err.class, ErrorClass::UnboundRequiredParameter);
    assert!(err.message.contains("'name'"), "{err}");

    let bound = ProjectionConfiguration::builder(&source)
        .target(&target)
        .member("Label", ProjectionSource::constant("guest"))
        .member("Name", ProjectionSource::path("FirstName"))
        .build();
    let compiled = bound.compiled(&compiler).unwrap();
    assert_eq!(compiled.ctor_params().collect::<Vec<_>>(), ["name", "age"]);

    let out = compiled.apply(&person(&source, "Ada", 31, 0)).unwrap();
    assert_eq!(get(&out, "Name"), Value::from("Ada"));
    assert_eq!(get(&out, "Age"), Value::Int32(18));
    assert_eq!(get(&out, "Label"), Value::from("guest"));
}

#[test]
fn column_subset_falls_back_to_constructor_defaults() {
    let source = person_type();
    let target = card_type();
    let config = ProjectionConfiguration::builder(&source)
        .target(&target)
        .member("Name", ProjectionSource::path("FirstName"))
        .member("Age", ProjectionSource::Inferred)
        .member("Label", ProjectionSource::constant("vip"))
        .build();
    let compiled = config.compiled(&ProjectionCompiler::new()).unwrap();
    let row = person(&source, "Ada", 31, 0);

    let full = compiled.project(None).unwrap().apply(&row).unwrap();
    assert_eq!(get(&full, "Age"), Value::Int32(31));
    assert_eq!(get(&full, "Label"), Value::from("vip"));

    let reduced = compiled.project(Some(&["Name"][..])).unwrap().apply(&row).unwrap();
    assert_eq!(get(&reduced, "Name"), Value::from("Ada"));
    assert_eq!(get(&reduced, "Age"), Value::Int32(18));
    assert_eq!(get(&reduced, "Label"), Value::Null);
}

#[test]
fn column_subset_keeps_required_constructor_sources() {
    let source = person_type();
    let target = card_type();
    let config = ProjectionConfiguration::builder(&source)
        .target(&target)
        .member("Name", ProjectionSource::path("FirstName"))
        .member("Label", ProjectionSource::constant("vip"))
        .build();
    let compiled = config.compiled(&ProjectionCompiler::new()).unwrap();

    let out = compiled
        .project(Some(&["Label"][..]))
        .unwrap()
        .apply(&person(&source, "Ada", 31, 0))
        .unwrap();

    assert_eq!(get(&out, "Name"), Value::from("Ada"));
    assert_eq!(get(&out, "Label"), Value::from("vip"));
}

#[test]
fn unknown_column_is_rejected() {
    let source = person_type();
    let config = ProjectionConfiguration::builder(&source)
        .member("Name", ProjectionSource::path("FirstName"))
        .build();
    let compiled = config.compiled(&ProjectionCompiler::new()).unwrap();

    let err = compiled.project(Some(&["Salary"][..])).unwrap_err();
    assert_eq!(err.class, ErrorClass::MemberResolutionFailed);
}

#[test]
fn inference_must_be_unambiguous() {
    let source = TypeModel::builder("Contact")
        .property(PropertySpec::new("Name", ValueType::Text))
        .property(PropertySpec::new("name", ValueType::Text))
        .build()
        .unwrap();

    let config = ProjectionConfiguration::builder(&source)
        .member("Name", ProjectionSource::Inferred)
        .build();
    let err = config.compiled(&ProjectionCompiler::new()).unwrap_err();
    assert_eq!(err.class, ErrorClass::MemberResolutionFailed);
    assert!(err.message.contains("several"), "{err}");

    let exact = ProjectionConfiguration::builder(&source)
        .member("Name", ProjectionSource::Inferred)
        .strategy(Arc::new(ExactMatchStrategy))
        .build();
    assert!(exact.compiled(&ProjectionCompiler::new()).is_ok());
}

#[test]
fn unknown_path_segment_fails_at_compile_time() {
    let source = person_type();
    let config = ProjectionConfiguration::builder(&source)
        .member("Name", ProjectionSource::path("FirstName.Length"))
        .build();

    let err = config.compiled(&ProjectionCompiler::new()).unwrap_err();
    assert_eq!(err.class, ErrorClass::MemberResolutionFailed);
}

#[test]
fn equally_good_constructors_are_ambiguous() {
    let source = person_type();
    let target = TypeModel::builder("Tag")
        .property(PropertySpec::new("Name", ValueType::Text))
        .property(PropertySpec::new("Label", ValueType::Text))
        .constructor(ConstructorSpec::assigning(vec![(
            ParamModel::required("name", ValueType::Text),
            "Name",
        )]))
        .constructor(ConstructorSpec::assigning(vec![(
            ParamModel::required("label", ValueType::Text),
            "Label",
        )]))
        .build()
        .unwrap();

    let both = ProjectionConfiguration::builder(&source)
        .target(&target)
        .member("Name", ProjectionSource::path("FirstName"))
        .member("Label", ProjectionSource::constant("x"))
        .build();
    let err = both.compiled(&ProjectionCompiler::new()).unwrap_err();
    assert_eq!(err.class, ErrorClass::ConstructorResolutionFailed);

    let neither = ProjectionConfiguration::builder(&source)
        .target(&target)
        .build();
    let err = neither.compiled(&ProjectionCompiler::new()).unwrap_err();
    assert_eq!(err.class, ErrorClass::ConstructorResolutionFailed);
    assert!(err.message.contains("(name: text)"), "{err}");

    // pinning one member to initialisation resolves the tie
    let pinned = ProjectionConfiguration::builder(&source)
        .target(&target)
        .member("Name", ProjectionSource::path("FirstName"))
        .member_with(
            MemberTarget::new("Label")
                .source(ProjectionSource::constant("x"))
                .target(ProjectionTarget::Member),
        )
        .build();
    let compiled = pinned.compiled(&ProjectionCompiler::new()).unwrap();
    assert_eq!(compiled.ctor_params().collect::<Vec<_>>(), ["name"]);
}

#[test]
fn explicit_constructor_parameters() {
    let source = person_type();
    let target = card_type();
    let config = ProjectionConfiguration::builder(&source)
        .target(&target)
        .ctor_param(CtorParamTarget::positional(0, ProjectionSource::path("FirstName")))
        .ctor_param(CtorParamTarget::named("age", ProjectionSource::Inferred))
        .build();

    let out = config
        .compiled(&ProjectionCompiler::new())
        .unwrap()
        .apply(&person(&source, "Ada", 44, 0))
        .unwrap();

    assert_eq!(get(&out, "Name"), Value::from("Ada"));
    assert_eq!(get(&out, "Age"), Value::Int32(44));
}

#[test]
fn explicit_constructor_must_belong_to_the_target() {
    let source = person_type();
    let target = card_type();
    let foreign = source.default_constructor().unwrap();

    let config = ProjectionConfiguration::builder(&source)
        .target(&target)
        .constructor(&foreign)
        .member("Name", ProjectionSource::path("FirstName"))
        .build();

    let err = config.compiled(&ProjectionCompiler::new()).unwrap_err();
    assert_eq!(err.class, ErrorClass::ConstructorResolutionFailed);
}

#[test]
fn synthesized_target_rejects_constructor_bindings() {
    let source = person_type();
    let config = ProjectionConfiguration::builder(&source)
        .member_with(
            MemberTarget::new("Name")
                .source(ProjectionSource::path("FirstName"))
                .ctor_param("name"),
        )
        .build();

    let err = config.compiled(&ProjectionCompiler::new()).unwrap_err();
    assert_eq!(err.class, ErrorClass::ConstructorResolutionFailed);
}

#[test]
fn write_once_target_fields_use_the_write_primitive() {
    let source = person_type();
    let target = TypeModel::builder("Ticket")
        .field(FieldSpec::new("Holder", ValueType::Text).init_only())
        .build()
        .unwrap();
    let compiler = ProjectionCompiler::new();
    let config = ProjectionConfiguration::builder(&source)
        .target(&target)
        .member("Holder", ProjectionSource::path("FirstName"))
        .build();

    let out = config
        .compiled(&compiler)
        .unwrap()
        .apply(&person(&source, "Ada", 31, 0))
        .unwrap();

    assert_eq!(get(&out, "Holder"), Value::from("Ada"));
    assert_eq!(compiler.accessors().stats().write_primitives, 1);
}

#[test]
fn nested_paths_propagate_null() {
    let customer = TypeModel::builder("Customer")
        .property(PropertySpec::new("Name", ValueType::Text))
        .build()
        .unwrap();
    let order = TypeModel::builder("Order")
        .property(PropertySpec::new("Customer", ValueType::object(&customer)))
        .property(PropertySpec::new("Total", ValueType::Int64))
        .build()
        .unwrap();
    let config = ProjectionConfiguration::builder(&order)
        .member("CustomerName", ProjectionSource::path("Customer.Name"))
        .member("Total", ProjectionSource::Inferred)
        .build();
    let compiled = config.compiled(&ProjectionCompiler::new()).unwrap();

    let anonymous = order.instantiate();
    anonymous.set_slot(1, Value::Int64(90)).unwrap();
    let out = compiled.apply(&Value::Object(anonymous)).unwrap();
    assert_eq!(get(&out, "CustomerName"), Value::Null);
    assert_eq!(get(&out, "Total"), Value::Int64(90));

    let buyer = customer.instantiate();
    buyer.set_slot(0, Value::from("Grace")).unwrap();
    let named = order.instantiate();
    named.set_slot(0, Value::Object(buyer)).unwrap();
    let out = compiled.apply(&Value::Object(named)).unwrap();
    assert_eq!(get(&out, "CustomerName"), Value::from("Grace"));
}

#[test]
fn expression_sources_are_rebound_to_the_source_parameter() {
    let source = person_type();
    let age = source.find_member("Age").unwrap();
    let read = recast_core::accessor::AccessorSynthesizer::new()
        .read_member(Some(Expr::param(0, source.value_type())), &age)
        .unwrap();
    let doubled = Expr::binary(BinaryOp::Add, read.clone(), read).unwrap();

    let config = ProjectionConfiguration::builder(&source)
        .member("Twice", ProjectionSource::Expression(doubled))
        .build();
    let out = config
        .compiled(&ProjectionCompiler::new())
        .unwrap()
        .apply(&person(&source, "Ada", 21, 0))
        .unwrap();

    assert_eq!(get(&out, "Twice"), Value::Int32(42));
}

#[test]
fn lambda_sources_take_exactly_one_parameter() {
    let source = person_type();
    let params = vec![
        ParamDecl::new("a", source.value_type()),
        ParamDecl::new("b", ValueType::Int32),
    ];
    let lambda = Lambda::new(params, Expr::constant(true)).unwrap();

    let config = ProjectionConfiguration::builder(&source)
        .member("Flag", ProjectionSource::Lambda(lambda))
        .build();
    let err = config.compiled(&ProjectionCompiler::new()).unwrap_err();

    assert_eq!(err.class, ErrorClass::InvalidOperation);
}

#[test]
fn incompatible_source_is_rejected_when_compiling() {
    let source = person_type();
    let target = card_type();
    let config = ProjectionConfiguration::builder(&source)
        .target(&target)
        .member("Name", ProjectionSource::path("Age"))
        .build();

    let err = config.compiled(&ProjectionCompiler::new()).unwrap_err();
    assert_eq!(err.class, ErrorClass::IncompatibleType);
}

#[test]
fn null_source_projects_to_null() {
    let source = person_type();
    let config = ProjectionConfiguration::builder(&source)
        .member("Name", ProjectionSource::path("FirstName"))
        .build();

    let compiled = config.compiled(&ProjectionCompiler::new()).unwrap();
    assert_eq!(compiled.apply(&Value::Null).unwrap(), Value::Null);

    let err = compiled.apply(&Value::Int32(3)).unwrap_err();
    assert_eq!(err.class, ErrorClass::InvalidCast);
}

#[test]
fn compilation_is_memoized_per_configuration() {
    let source = person_type();
    let compiler = ProjectionCompiler::new();
    let config = ProjectionConfiguration::builder(&source)
        .member("Name", ProjectionSource::path("FirstName"))
        .build();

    let compiled: Vec<_> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| config.compiled(&compiler).unwrap()))
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    assert!(compiled.iter().all(|c| Arc::ptr_eq(c, &compiled[0])));
    assert_eq!(compiler.engine().module_len(), 1);

    let failing = ProjectionConfiguration::builder(&source)
        .member("Name", ProjectionSource::path("Missing"))
        .build();
    let first = failing.compiled(&compiler).unwrap_err();
    assert!(failing.is_compiled());
    assert_eq!(failing.compiled(&compiler).unwrap_err(), first);
}

#[test]
fn later_member_entries_replace_earlier_ones() {
    let source = person_type();
    let config = ProjectionConfiguration::builder(&source)
        .member("Name", ProjectionSource::constant("draft"))
        .member("Name", ProjectionSource::path("FirstName"))
        .build();

    assert_eq!(config.members().len(), 1);
    let out = config
        .compiled(&ProjectionCompiler::new())
        .unwrap()
        .apply(&person(&source, "Ada", 31, 0))
        .unwrap();
    assert_eq!(get(&out, "Name"), Value::from("Ada"));
}

#[test]
fn constant_sources_follow_the_constant_conversion_table() {
    let source = person_type();
    let target = TypeModel::builder("Tally")
        .property(PropertySpec::new("Label", ValueType::Text))
        .property(PropertySpec::new("Count", ValueType::Uint32))
        .property(PropertySpec::new("Ratio", ValueType::Float32))
        .build()
        .unwrap();
    let compiler = ProjectionCompiler::new();

    let config = ProjectionConfiguration::builder(&source)
        .target(&target)
        .member("Label", ProjectionSource::constant(Value::Null))
        .member("Count", ProjectionSource::constant(5))
        .member("Ratio", ProjectionSource::constant(1))
        .build();
    let out = config
        .compiled(&compiler)
        .unwrap()
        .apply(&person(&source, "Ada", 31, 0))
        .unwrap();

    assert_eq!(get(&out, "Label"), Value::Null);
    assert_eq!(get(&out, "Count"), Value::Uint32(5));
    assert_eq!(get(&out, "Ratio"), Value::Float32(1.0));

    // out of range literals are still type errors
    let negative = ProjectionConfiguration::builder(&source)
        .target(&target)
        .member("Count", ProjectionSource::constant(-1))
        .build();
    let err = negative.compiled(&compiler).unwrap_err();
    assert_eq!(err.class, ErrorClass::IncompatibleType);
    assert!(err.message.starts_with("member 'Count'"), "{err}");
}

#[test]
fn constant_constructor_arguments_follow_the_constant_conversion_table() {
    let source = person_type();
    let target = TypeModel::builder("Quota")
        .property(PropertySpec::new("Limit", ValueType::Uint32))
        .constructor(ConstructorSpec::assigning(vec![(
            ParamModel::required("limit", ValueType::Uint32),
            "Limit",
        )]))
        .build()
        .unwrap();

    let config = ProjectionConfiguration::builder(&source)
        .target(&target)
        .ctor_param(CtorParamTarget::named("limit", ProjectionSource::constant(7)))
        .build();
    let out = config
        .compiled(&ProjectionCompiler::new())
        .unwrap()
        .apply(&person(&source, "Ada", 31, 0))
        .unwrap();

    assert_eq!(get(&out, "Limit"), Value::Uint32(7));
}

#[test]
fn value_map_keys_are_converted_to_the_source_type() {
    let source = TypeModel::builder("Ticket")
        .property(PropertySpec::new("Code", ValueType::Uint32))
        .build()
        .unwrap();
    let ticket = source.instantiate();
    ticket.set_slot(0, Value::Uint32(2)).unwrap();
    let compiler = ProjectionCompiler::new();

    let mapped = |map: ValueMap| {
        ProjectionConfiguration::builder(&source)
            .synthesize_as("TicketView")
            .member_with(
                MemberTarget::new("Label")
                    .source(ProjectionSource::path("Code"))
                    .value_map(map),
            )
            .build()
    };

    let out = mapped(ValueMap::new().entry(1, "a").entry(2, "b"))
        .compiled(&compiler)
        .unwrap()
        .apply(&Value::Object(ticket))
        .unwrap();
    assert_eq!(get(&out, "Label"), Value::from("b"));

    let err = mapped(ValueMap::new().entry(-1, "neg"))
        .compiled(&compiler)
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::IncompatibleType);
    assert!(err.message.contains("value map key Int32(-1)"), "{err}");
}

#[test]
fn read_only_members_need_a_constructor_parameter() {
    let source = person_type();
    let compiler = ProjectionCompiler::new();
    let frozen = compiler
        .engine()
        .synthesize(
            &TypeDescriptor::builder("Frozen")
                .property(PropertyDescriptor::new("Name", ValueType::Text).read_only().required())
                .property(PropertyDescriptor::new("Age", ValueType::Int32).read_only().required())
                .build()
                .unwrap(),
        )
        .unwrap();

    let partial = ProjectionConfiguration::builder(&source)
        .target(&frozen)
        .member("Name", ProjectionSource::path("FirstName"))
        .build();
    let err = partial.compiled(&compiler).unwrap_err();
    assert_eq!(err.class, ErrorClass::UnboundRequiredParameter);
    assert!(err.message.contains("'age'"), "{err}");

    let complete = ProjectionConfiguration::builder(&source)
        .target(&frozen)
        .member("Name", ProjectionSource::path("FirstName"))
        .member("Age", ProjectionSource::Inferred)
        .build();
    let out = complete
        .compiled(&compiler)
        .unwrap()
        .apply(&person(&source, "Ada", 31, 0))
        .unwrap();
    assert_eq!(get(&out, "Name"), Value::from("Ada"));
    assert_eq!(get(&out, "Age"), Value::Int32(31));

    // a lone parameterless constructor cannot reach a read-only member
    let sealed = TypeModel::builder("Sealed")
        .property(PropertySpec::new("Name", ValueType::Text).set(Visibility::None))
        .build()
        .unwrap();
    let config = ProjectionConfiguration::builder(&source)
        .target(&sealed)
        .member("Name", ProjectionSource::path("FirstName"))
        .build();
    let err = config.compiled(&compiler).unwrap_err();
    assert_eq!(err.class, ErrorClass::UnboundRequiredParameter);
}
