use crate::node::{CtorParam, TypeDescriptor};
use recast_core::{
    error::Error,
    model::{
        ConstructorSpec, CtorInit, FieldSpec, ParamModel, PropertySpec, TypeHandle, TypeModel,
        TypeOrigin, Visibility,
    },
};

/// Lower a validated descriptor onto the model builder: one slot per member,
/// slot-backed accessors per property, the parameterless constructor and,
/// when any member is constructor-bound, one assigning constructor. The
/// assigning constructor takes parameters in binding order but writes
/// members in declaration order.
pub(super) fn emit(desc: &TypeDescriptor) -> Result<TypeHandle, Error> {
    let mut builder = TypeModel::builder(desc.name()).origin(TypeOrigin::Synthesized);

    if let Some(base) = desc.base() {
        builder = builder.base(base);
    }
    for interface in desc.interfaces() {
        builder = builder.interface(interface.clone());
    }
    for attribute in desc.attributes() {
        builder = builder.attribute(attribute.to_model());
    }

    for field in desc.fields() {
        let mut spec = FieldSpec::new(&field.name, field.value_type()).visibility(field.visibility);
        if field.init_only {
            spec = spec.init_only();
        }
        builder = builder.field(spec);
    }
    for property in desc.properties() {
        builder = builder.property(
            PropertySpec::new(&property.name, property.value_type())
                .get(property.get)
                .set(property.set),
        );
    }

    builder = builder.constructor(ConstructorSpec::parameterless());
    let params = desc.ctor_params();
    if !params.is_empty() {
        let steps = desc
            .members()
            .filter_map(|m| {
                let index = params.iter().position(|p| p.member == m.name())?;
                Some((index, m.name().to_string()))
            })
            .collect();

        builder = builder.constructor(ConstructorSpec {
            params: params.iter().map(param_model).collect(),
            visibility: Visibility::Public,
            init: CtorInit::Assign(steps),
        });
    }

    builder.build()
}

fn param_model(param: &CtorParam) -> ParamModel {
    match &param.default {
        Some(default) => ParamModel::optional(&param.name, param.ty.clone(), default.clone()),
        None => ParamModel::required(&param.name, param.ty.clone()),
    }
}
