use crate::{
    err,
    error::ErrorTree,
    node::{ValidateNode, VisitableNode, Visibility},
    validate::naming::validate_ident,
};
use convert_case::{Case, Casing};
use recast_core::{
    model::MemberKind,
    value::{Value, ValueType, convert_constant},
};
use serde::Serialize;

///
/// CtorBinding
///
/// How a member takes part in the synthesized constructor.
///

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[remain::sorted]
pub enum CtorBinding {
    #[default]
    None,
    Optional(Value),
    Required,
}

impl CtorBinding {
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        !matches!(self, Self::None)
    }

    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        match self {
            Self::Optional(value) => Some(value),
            _ => None,
        }
    }
}

///
/// PropertyDescriptor
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: ValueType,
    pub nullable: bool,
    pub get: Visibility,
    pub set: Visibility,

    #[serde(skip_serializing_if = "is_unbound")]
    pub ctor: CtorBinding,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctor_param: Option<String>,
}

impl PropertyDescriptor {
    /// Public get/set property, not constructor-bound.
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            get: Visibility::Public,
            set: Visibility::Public,
            ctor: CtorBinding::None,
            ctor_param: None,
        }
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
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

    /// No setter; only the constructor can assign it.
    #[must_use]
    pub const fn read_only(self) -> Self {
        self.set(Visibility::None)
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.ctor = CtorBinding::Required;
        self
    }

    #[must_use]
    pub fn optional(mut self, default: impl Into<Value>) -> Self {
        self.ctor = CtorBinding::Optional(default.into());
        self
    }

    #[must_use]
    pub fn ctor_param(mut self, name: impl Into<String>) -> Self {
        self.ctor_param = Some(name.into());
        self
    }

    /// Declared type with the nullable flag applied.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        effective_type(&self.ty, self.nullable)
    }
}

impl ValidateNode for PropertyDescriptor {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        errs.add_result(validate_ident(&self.name));
        validate_binding(
            &mut errs,
            &self.ctor,
            self.ctor_param.as_deref(),
            &self.value_type(),
            self.nullable,
        );

        errs.result()
    }
}

impl VisitableNode for PropertyDescriptor {
    fn route_key(&self) -> String {
        self.name.clone()
    }
}

///
/// FieldDescriptor
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: ValueType,
    pub nullable: bool,
    pub visibility: Visibility,
    pub init_only: bool,

    #[serde(skip_serializing_if = "is_unbound")]
    pub ctor: CtorBinding,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctor_param: Option<String>,
}

impl FieldDescriptor {
    /// Public, writable field, not constructor-bound.
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            visibility: Visibility::Public,
            init_only: false,
            ctor: CtorBinding::None,
            ctor_param: None,
        }
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub const fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Write-once field: assignable by the constructor and by synthesized
    /// write primitives only.
    #[must_use]
    pub const fn init_only(mut self) -> Self {
        self.init_only = true;
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.ctor = CtorBinding::Required;
        self
    }

    #[must_use]
    pub fn optional(mut self, default: impl Into<Value>) -> Self {
        self.ctor = CtorBinding::Optional(default.into());
        self
    }

    #[must_use]
    pub fn ctor_param(mut self, name: impl Into<String>) -> Self {
        self.ctor_param = Some(name.into());
        self
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        effective_type(&self.ty, self.nullable)
    }
}

impl ValidateNode for FieldDescriptor {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        errs.add_result(validate_ident(&self.name));
        if !self.visibility.exists() {
            err!(errs, "field visibility cannot be None");
        }
        validate_binding(
            &mut errs,
            &self.ctor,
            self.ctor_param.as_deref(),
            &self.value_type(),
            self.nullable,
        );

        errs.result()
    }
}

impl VisitableNode for FieldDescriptor {
    fn route_key(&self) -> String {
        self.name.clone()
    }
}

///
/// MemberDescriptor
///
/// Borrowed view over either member kind.
///

#[derive(Clone, Copy, Debug)]
pub enum MemberDescriptor<'a> {
    Field(&'a FieldDescriptor),
    Property(&'a PropertyDescriptor),
}

impl<'a> MemberDescriptor<'a> {
    #[must_use]
    pub const fn kind(&self) -> MemberKind {
        match self {
            Self::Field(_) => MemberKind::Field,
            Self::Property(_) => MemberKind::Property,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'a str {
        match *self {
            Self::Field(f) => &f.name,
            Self::Property(p) => &p.name,
        }
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Field(f) => f.value_type(),
            Self::Property(p) => p.value_type(),
        }
    }

    #[must_use]
    pub const fn ctor(&self) -> &'a CtorBinding {
        match *self {
            Self::Field(f) => &f.ctor,
            Self::Property(p) => &p.ctor,
        }
    }

    /// Constructor parameter name: the explicit one, or the camel-case
    /// form of the member name.
    #[must_use]
    pub fn ctor_param_name(&self) -> String {
        let explicit = match self {
            Self::Field(f) => f.ctor_param.as_ref(),
            Self::Property(p) => p.ctor_param.as_ref(),
        };

        explicit
            .cloned()
            .unwrap_or_else(|| self.name().to_case(Case::Camel))
    }
}

fn effective_type(ty: &ValueType, nullable: bool) -> ValueType {
    if nullable {
        ty.clone().nullable()
    } else {
        ty.clone()
    }
}

// A null default needs the nullable flag, reference types included.
fn validate_binding(
    errs: &mut ErrorTree,
    binding: &CtorBinding,
    ctor_param: Option<&str>,
    ty: &ValueType,
    nullable: bool,
) {
    if let CtorBinding::Optional(default) = binding {
        if default.is_null() && !nullable {
            err!(errs, "null default on a member that is not nullable");
        } else if let Err(e) = convert_constant(default, ty) {
            err!(errs, "default value is not assignable: {}", e.message);
        }
    }

    if let Some(param) = ctor_param {
        if binding.is_bound() {
            errs.add_result(validate_ident(param));
        } else {
            err!(errs, "ctor parameter '{param}' set on a member that is not constructor-bound");
        }
    }
}

const fn is_unbound(binding: &CtorBinding) -> bool {
    !binding.is_bound()
}
