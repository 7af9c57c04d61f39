use crate::{
    error::{Error, ErrorOrigin},
    model::{
        AttributeModel, ConstructorModel, CtorBody, FieldModel, MethodBody, MethodModel,
        NativeCtor, NativeMethod, ParamModel, PropertyModel, SlotInit, TypeHandle, TypeId,
        TypeModel, TypeOrigin, Visibility,
    },
    value::{ConversionKind, ValueType, classify},
};
use std::{
    collections::BTreeSet,
    sync::{Arc, RwLock},
};

///
/// FieldSpec
///

#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub name: String,
    pub ty: ValueType,
    pub visibility: Visibility,
    pub is_static: bool,
    pub init_only: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility: Visibility::Public,
            is_static: false,
            init_only: false,
        }
    }

    #[must_use]
    pub const fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub const fn init_only(mut self) -> Self {
        self.init_only = true;
        self
    }

    #[must_use]
    pub const fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }
}

///
/// PropertyBacking
///

#[derive(Clone)]
pub enum PropertyBacking {
    /// Private backing slot with generated load/store accessors.
    Slot,
    /// Host accessors; either may be absent.
    Native {
        get: Option<NativeMethod>,
        set: Option<NativeMethod>,
    },
}

///
/// PropertySpec
///

#[derive(Clone)]
pub struct PropertySpec {
    pub name: String,
    pub ty: ValueType,
    pub get: Visibility,
    pub set: Visibility,
    pub is_static: bool,
    pub backing: PropertyBacking,
}

impl PropertySpec {
    /// Public get/set property backed by a slot.
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            get: Visibility::Public,
            set: Visibility::Public,
            is_static: false,
            backing: PropertyBacking::Slot,
        }
    }

    #[must_use]
    pub const fn get(mut self, visibility: Visibility) -> Self {
        self.get = visibility;
        self
    }

    #[must_use]
    pub const fn set(mut self, visibility: Visibility) -> Self {
        self.set = visibility;
        self
    }

    #[must_use]
    pub const fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[must_use]
    pub fn computed(mut self, get: NativeMethod) -> Self {
        self.set = Visibility::None;
        self.backing = PropertyBacking::Native {
            get: Some(get),
            set: None,
        };
        self
    }
}

///
/// MethodSpec
///

#[derive(Clone)]
pub struct MethodSpec {
    pub name: String,
    pub params: Vec<ParamModel>,
    pub ret: Option<ValueType>,
    pub is_static: bool,
    pub visibility: Visibility,
    pub body: NativeMethod,
}

impl MethodSpec {
    pub fn new(name: impl Into<String>, body: NativeMethod) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            ret: None,
            is_static: false,
            visibility: Visibility::Public,
            body,
        }
    }

    #[must_use]
    pub fn param(mut self, param: ParamModel) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn returns(mut self, ty: ValueType) -> Self {
        self.ret = Some(ty);
        self
    }

    #[must_use]
    pub const fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }
}

///
/// CtorInit
///

#[derive(Clone)]
pub enum CtorInit {
    /// `(parameter index, member name)` pairs, run in order.
    Assign(Vec<(usize, String)>),
    Native(NativeCtor),
}

///
/// ConstructorSpec
///

#[derive(Clone)]
pub struct ConstructorSpec {
    pub params: Vec<ParamModel>,
    pub visibility: Visibility,
    pub init: CtorInit,
}

impl ConstructorSpec {
    /// Constructor whose parameters are assigned, in order, to the members
    /// they name.
    #[must_use]
    pub fn assigning(params: Vec<(ParamModel, &str)>) -> Self {
        let mut steps = Vec::with_capacity(params.len());
        let mut out = Vec::with_capacity(params.len());

        for (index, (param, member)) in params.into_iter().enumerate() {
            steps.push((index, member.to_string()));
            out.push(param);
        }

        Self {
            params: out,
            visibility: Visibility::Public,
            init: CtorInit::Assign(steps),
        }
    }

    #[must_use]
    pub const fn native(params: Vec<ParamModel>, body: NativeCtor) -> Self {
        Self {
            params,
            visibility: Visibility::Public,
            init: CtorInit::Native(body),
        }
    }

    #[must_use]
    pub const fn parameterless() -> Self {
        Self {
            params: Vec::new(),
            visibility: Visibility::Public,
            init: CtorInit::Assign(Vec::new()),
        }
    }
}

///
/// TypeModelBuilder
///
/// Declares a record type. Used directly for host types and as the emission
/// surface of the synthesis engine.
///

pub struct TypeModelBuilder {
    name: String,
    origin: TypeOrigin,
    base: Option<TypeHandle>,
    interfaces: BTreeSet<String>,
    attributes: Vec<AttributeModel>,
    fields: Vec<FieldSpec>,
    properties: Vec<PropertySpec>,
    methods: Vec<MethodSpec>,
    constructors: Vec<ConstructorSpec>,
}

impl TypeModel {
    pub fn builder(name: impl Into<String>) -> TypeModelBuilder {
        TypeModelBuilder::new(name)
    }
}

impl TypeModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: TypeOrigin::Declared,
            base: None,
            interfaces: BTreeSet::new(),
            attributes: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    #[must_use]
    pub const fn origin(mut self, origin: TypeOrigin) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn base(mut self, base: &TypeHandle) -> Self {
        self.base = Some(base.clone());
        self
    }

    #[must_use]
    pub fn interface(mut self, name: impl Into<String>) -> Self {
        self.interfaces.insert(name.into());
        self
    }

    #[must_use]
    pub fn attribute(mut self, attribute: AttributeModel) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    #[must_use]
    pub fn property(mut self, spec: PropertySpec) -> Self {
        self.properties.push(spec);
        self
    }

    #[must_use]
    pub fn method(mut self, spec: MethodSpec) -> Self {
        self.methods.push(spec);
        self
    }

    #[must_use]
    pub fn constructor(mut self, spec: ConstructorSpec) -> Self {
        self.constructors.push(spec);
        self
    }

    /// Lay out slots, generate accessor methods and resolve constructor
    /// bodies. Adds the implicit parameterless constructor when none was
    /// declared.
    pub fn build(self) -> Result<TypeHandle, Error> {
        if self.name.is_empty() {
            return Err(invalid("type name is empty"));
        }
        self.check_member_names()?;

        let mut slot_types = self
            .base
            .as_ref()
            .map(|b| b.slot_types().to_vec())
            .unwrap_or_default();
        let mut statics = Vec::new();
        let mut fields = Vec::with_capacity(self.fields.len());
        let mut properties = Vec::with_capacity(self.properties.len());
        let mut methods = Vec::new();

        for spec in &self.fields {
            let slot = push_slot(&mut slot_types, &mut statics, spec.is_static, &spec.ty);
            fields.push(FieldModel {
                name: spec.name.clone(),
                ty: spec.ty.clone(),
                visibility: spec.visibility,
                is_static: spec.is_static,
                init_only: spec.init_only,
                slot,
            });
        }

        for spec in &self.properties {
            properties.push(build_property(
                spec,
                &mut slot_types,
                &mut statics,
                &mut methods,
            ));
        }

        for spec in &self.methods {
            methods.push(MethodModel {
                name: spec.name.clone(),
                params: spec.params.clone(),
                ret: spec.ret.clone(),
                is_static: spec.is_static,
                visibility: spec.visibility,
                body: MethodBody::Native(spec.body.clone()),
            });
        }

        let mut specs = self.constructors;
        if specs.is_empty() {
            specs.push(ConstructorSpec::parameterless());
        }

        let mut constructors = Vec::with_capacity(specs.len());
        for spec in specs {
            constructors.push(build_constructor(
                spec,
                &self.name,
                &fields,
                &properties,
                self.base.as_ref(),
            )?);
        }

        let model = TypeModel {
            id: TypeId::next(),
            name: self.name,
            origin: self.origin,
            base: self.base,
            interfaces: self.interfaces,
            attributes: self.attributes,
            fields,
            properties,
            methods,
            constructors,
            slot_types,
            statics: RwLock::new(statics),
        };

        Ok(TypeHandle::new(Arc::new(model)))
    }

    fn check_member_names(&self) -> Result<(), Error> {
        let mut seen = BTreeSet::new();
        let names = self
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.properties.iter().map(|p| p.name.as_str()));

        for name in names {
            if name.is_empty() {
                return Err(invalid(format!("type '{}' has an unnamed member", self.name)));
            }
            if !seen.insert(name) {
                return Err(invalid(format!(
                    "type '{}' declares member '{name}' more than once",
                    self.name
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::descriptor_invalid(ErrorOrigin::Model, message)
}

fn push_slot(
    slot_types: &mut Vec<ValueType>,
    statics: &mut Vec<crate::value::Value>,
    is_static: bool,
    ty: &ValueType,
) -> usize {
    if is_static {
        statics.push(ty.default_value());
        statics.len() - 1
    } else {
        slot_types.push(ty.clone());
        slot_types.len() - 1
    }
}

fn build_property(
    spec: &PropertySpec,
    slot_types: &mut Vec<ValueType>,
    statics: &mut Vec<crate::value::Value>,
    methods: &mut Vec<MethodModel>,
) -> PropertyModel {
    let accessor = |name: String, params: Vec<ParamModel>, ret, visibility, body| MethodModel {
        name,
        params,
        ret,
        is_static: spec.is_static,
        visibility,
        body,
    };

    let (backing, get_body, set_body) = match &spec.backing {
        PropertyBacking::Slot => {
            let slot = push_slot(slot_types, statics, spec.is_static, &spec.ty);
            let (load, store) = if spec.is_static {
                (MethodBody::LoadStatic(slot), MethodBody::StoreStatic(slot))
            } else {
                (MethodBody::LoadSlot(slot), MethodBody::StoreSlot(slot))
            };
            (Some(slot), Some(load), Some(store))
        }
        PropertyBacking::Native { get, set } => (
            None,
            get.clone().map(MethodBody::Native),
            set.clone().map(MethodBody::Native),
        ),
    };

    let getter = match get_body {
        Some(body) if spec.get.exists() => {
            methods.push(accessor(
                format!("get_{}", spec.name),
                Vec::new(),
                Some(spec.ty.clone()),
                spec.get,
                body,
            ));
            Some(methods.len() - 1)
        }
        _ => None,
    };

    let setter = match set_body {
        Some(body) if spec.set.exists() => {
            methods.push(accessor(
                format!("set_{}", spec.name),
                vec![ParamModel::required("value", spec.ty.clone())],
                None,
                spec.set,
                body,
            ));
            Some(methods.len() - 1)
        }
        _ => None,
    };

    PropertyModel {
        name: spec.name.clone(),
        ty: spec.ty.clone(),
        get: if getter.is_some() { spec.get } else { Visibility::None },
        set: if setter.is_some() { spec.set } else { Visibility::None },
        is_static: spec.is_static,
        backing,
        getter,
        setter,
    }
}

fn build_constructor(
    spec: ConstructorSpec,
    type_name: &str,
    fields: &[FieldModel],
    properties: &[PropertyModel],
    base: Option<&TypeHandle>,
) -> Result<ConstructorModel, Error> {
    let mut names = BTreeSet::new();
    for param in &spec.params {
        if !names.insert(param.name.as_str()) {
            return Err(invalid(format!(
                "constructor of '{type_name}' declares parameter '{}' more than once",
                param.name
            )));
        }
        if let Some(default) = &param.default
            && !param.ty.conforms(default)
        {
            return Err(invalid(format!(
                "default {default:?} of parameter '{}' is not a {}",
                param.name, param.ty
            )));
        }
    }

    let body = match spec.init {
        CtorInit::Native(f) => CtorBody::Native(f),
        CtorInit::Assign(steps) => {
            let mut out = Vec::with_capacity(steps.len());
            for (param, member) in steps {
                let declared = spec.params.get(param).ok_or_else(|| {
                    invalid(format!(
                        "constructor of '{type_name}' assigns missing parameter #{param}"
                    ))
                })?;
                let (slot, ty) = resolve_slot(&member, fields, properties, base).ok_or_else(
                    || {
                        invalid(format!(
                            "constructor of '{type_name}' assigns '{member}', which has no instance slot"
                        ))
                    },
                )?;
                if classify(&declared.ty, &ty, ConversionKind::Implicit).is_none() {
                    return Err(Error::incompatible_type(
                        ErrorOrigin::Model,
                        format!(
                            "constructor parameter '{}' ({}) cannot initialise '{member}' ({ty})",
                            declared.name, declared.ty
                        ),
                    ));
                }
                out.push(SlotInit { param, slot });
            }
            CtorBody::Assign(out)
        }
    };

    Ok(ConstructorModel {
        params: spec.params,
        visibility: spec.visibility,
        body,
    })
}

// Instance slot of a field or slot-backed property, own members before base.
fn resolve_slot(
    member: &str,
    fields: &[FieldModel],
    properties: &[PropertyModel],
    base: Option<&TypeHandle>,
) -> Option<(usize, ValueType)> {
    let own = fields
        .iter()
        .find(|f| f.name == member && !f.is_static)
        .map(|f| (f.slot, f.ty.clone()))
        .or_else(|| {
            properties
                .iter()
                .find(|p| p.name == member && !p.is_static)
                .and_then(|p| p.backing.map(|slot| (slot, p.ty.clone())))
        });

    own.or_else(|| {
        base.and_then(|b| b.find_member(member))
            .and_then(|m| m.backing_slot().map(|slot| (slot, m.ty().clone())))
    })
}
