use proptest::prelude::*;
use recast::{
    ErrorClass,
    config::RecastConfig,
    core::{
        accessor::AccessorSynthesizer,
        ir::{BinaryOp, Expr, Lambda, ParamDecl},
    },
    prelude::*,
    projection::ProjectionSource,
    schema::build::SynthesisEngine,
};

fn person_source(engine: &SynthesisEngine) -> TypeHandle {
    let desc = TypeDescriptor::builder("Person")
        .property(PropertyDescriptor::new("FirstName", ValueType::Text).required())
        .property(PropertyDescriptor::new("Age", ValueType::Int32).required())
        .build()
        .unwrap();

    engine.synthesize(&desc).unwrap()
}

fn person(ty: &TypeHandle, first: &str, age: i32) -> Value {
    let ctor = &ty.constructor_refs()[1];

    Value::Object(ctor.construct(&[Value::from(first), Value::Int32(age)]).unwrap())
}

fn adult_test(source: &TypeHandle) -> Lambda {
    let params = vec![ParamDecl::new("person", source.value_type())];
    let age = source.find_member("Age").unwrap();
    let read = AccessorSynthesizer::global()
        .read_member(Some(Lambda::param_expr(&params, 0).unwrap()), &age)
        .unwrap();
    let body = Expr::binary(BinaryOp::Ge, read, Expr::constant(18)).unwrap();

    Lambda::new(params, body).unwrap()
}

fn field(value: &Value, name: &str) -> Value {
    value.as_object().unwrap().get(name).unwrap()
}

#[test]
fn ada_projects_to_display_name_and_adulthood() {
    let compiler = ProjectionCompiler::new();
    let source = person_source(compiler.engine());
    let target = compiler
        .engine()
        .synthesize(
            &TypeDescriptor::builder("PersonSummary")
                .property(PropertyDescriptor::new("DisplayName", ValueType::Text))
                .property(PropertyDescriptor::new("IsAdult", ValueType::Bool))
                .build()
                .unwrap(),
        )
        .unwrap();

    let config = ProjectionConfiguration::builder(&source)
        .target(&target)
        .member("DisplayName", ProjectionSource::path("FirstName"))
        .member("IsAdult", ProjectionSource::Lambda(adult_test(&source)))
        .build();

    let out = config
        .compiled(&compiler)
        .unwrap()
        .apply(&person(&source, "Ada", 31))
        .unwrap();

    assert_eq!(field(&out, "DisplayName"), Value::from("Ada"));
    assert_eq!(field(&out, "IsAdult"), Value::Bool(true));
    assert!(out.as_object().unwrap().type_handle().ptr_eq(&target));
}

#[test]
fn query_projects_rows_lazily() {
    let compiler = ProjectionCompiler::new();
    let source = person_source(compiler.engine());
    let config = ProjectionConfiguration::builder(&source)
        .synthesize_as("Badge")
        .member("Name", ProjectionSource::path("FirstName"))
        .member("Age", ProjectionSource::Inferred)
        .build();

    let rows = vec![person(&source, "Ada", 31), Value::Null, person(&source, "Alan", 41)];
    let mut query = build_query(&config, &compiler, rows, None).unwrap();

    assert_eq!(query.len(), 3);
    let first = query.next().unwrap().unwrap();
    assert_eq!(field(&first, "Name"), Value::from("Ada"));
    assert_eq!(query.next().unwrap().unwrap(), Value::Null);
    assert_eq!(field(&query.next().unwrap().unwrap(), "Age"), Value::Int32(41));
    assert!(query.next().is_none());

    // the configuration compiled once for both queries
    let names: Vec<_> = vec![person(&source, "Grace", 85)]
        .into_iter()
        .project_with(&config, &compiler, Some(&["Name"][..]))
        .unwrap()
        .map(|row| row.map(|v| (field(&v, "Name"), field(&v, "Age"))))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names, [(Value::from("Grace"), Value::Int32(0))]);
    assert_eq!(compiler.engine().module_len(), 2);
}

#[test]
fn query_surfaces_binding_failures_before_iterating() {
    let compiler = ProjectionCompiler::new();
    let source = person_source(compiler.engine());
    let config = ProjectionConfiguration::builder(&source)
        .member("Surname", ProjectionSource::Inferred)
        .build();

    let err = build_query(&config, &compiler, Vec::new(), None).unwrap_err();

    assert_eq!(err.class, ErrorClass::MemberResolutionFailed);
}

#[test]
fn query_rejects_repeated_columns() {
    let compiler = ProjectionCompiler::new();
    let source = person_source(compiler.engine());
    let config = ProjectionConfiguration::builder(&source)
        .member("Name", ProjectionSource::path("FirstName"))
        .build();

    let err = build_query(&config, &compiler, Vec::new(), Some(&["Name", "Name"][..])).unwrap_err();

    assert_eq!(err.class, ErrorClass::InvalidOperation);
    assert_eq!(err.origin, recast::ErrorOrigin::Query);
    assert!(!config.is_compiled());
}

#[test]
fn configured_compiler_uses_exact_matching() {
    let config = RecastConfig::from_toml_str("[projection]\nmatch_strategy = \"exact\"\n").unwrap();
    let compiler = ProjectionCompiler::with_config(&config);
    let source = person_source(compiler.engine());

    let loose = ProjectionConfiguration::builder(&source)
        .member("firstName", ProjectionSource::Inferred)
        .build();
    let err = loose.compiled(&compiler).unwrap_err();
    assert_eq!(err.class, ErrorClass::MemberResolutionFailed);

    let camel = ProjectionCompiler::new();
    let again = ProjectionConfiguration::builder(&person_source(camel.engine()))
        .member("firstName", ProjectionSource::Inferred)
        .build();
    assert!(again.compiled(&camel).is_ok());
}

#[test]
fn resynthesis_can_be_disabled_through_config() {
    let config = RecastConfig::from_toml_str("[synthesis]\nallow_resynthesis = false\n").unwrap();
    let compiler = ProjectionCompiler::with_config(&config);
    let source = person_source(compiler.engine());

    let first = ProjectionConfiguration::builder(&source)
        .synthesize_as("Card")
        .member("Name", ProjectionSource::path("FirstName"))
        .build();
    let second = ProjectionConfiguration::builder(&source)
        .synthesize_as("Card")
        .member("Years", ProjectionSource::path("Age"))
        .build();

    assert!(first.compiled(&compiler).is_ok());
    let err = second.compiled(&compiler).unwrap_err();
    assert_eq!(err.class, ErrorClass::DescriptorInvalid);
}

#[test]
fn global_compiler_is_shared() {
    assert!(std::ptr::eq(ProjectionCompiler::global(), ProjectionCompiler::global()));
}

proptest! {
    #[test]
    fn every_row_is_projected_in_order(ages in prop::collection::vec(0i32..120, 0..16)) {
        let compiler = ProjectionCompiler::new();
        let source = person_source(compiler.engine());
        let config = ProjectionConfiguration::builder(&source)
            .member("Adult", ProjectionSource::Lambda(adult_test(&source)))
            .build();

        let rows: Vec<_> = ages.iter().map(|age| person(&source, "p", *age)).collect();
        let flags: Vec<_> = build_query(&config, &compiler, rows, None)
            .unwrap()
            .map(|row| field(&row.unwrap(), "Adult"))
            .collect();

        let expected: Vec<_> = ages.iter().map(|age| Value::Bool(*age >= 18)).collect();
        prop_assert_eq!(flags, expected);
    }
}
