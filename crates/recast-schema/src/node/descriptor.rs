use crate::{
    build::{BuildError, SynthesisOptions},
    err,
    error::ErrorTree,
    node::{
        AttributeDescriptor, CtorBinding, FieldDescriptor, MemberDescriptor, PropertyDescriptor,
        ValidateNode, VisitableNode,
    },
    validate::{naming::validate_ident, validate_descriptor},
    visit::Visitor,
};
use recast_core::{
    error::Error,
    model::TypeHandle,
    value::{Value, ValueType, convert_constant},
};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

///
/// TypeDescriptor
///
/// Description of one record type to synthesize. Only obtainable through
/// the builder, so a descriptor in hand has passed validation against the
/// default limits.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypeDescriptor {
    name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    base: Option<TypeHandle>,

    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    interfaces: BTreeSet<String>,

    fields: Vec<FieldDescriptor>,
    properties: Vec<PropertyDescriptor>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    attributes: Vec<AttributeDescriptor>,
}

impl TypeDescriptor {
    pub fn builder(name: impl Into<String>) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn base(&self) -> Option<&TypeHandle> {
        self.base.as_ref()
    }

    #[must_use]
    pub const fn interfaces(&self) -> &BTreeSet<String> {
        &self.interfaces
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    #[must_use]
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    /// Fields then properties, each in declaration order.
    pub fn members(&self) -> impl Iterator<Item = MemberDescriptor<'_>> {
        self.fields
            .iter()
            .map(MemberDescriptor::Field)
            .chain(self.properties.iter().map(MemberDescriptor::Property))
    }

    #[must_use]
    pub fn member(&self, name: &str) -> Option<MemberDescriptor<'_>> {
        self.members().find(|m| m.name() == name)
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.fields.len() + self.properties.len()
    }

    /// Parameters of the synthesized constructor: required fields, required
    /// properties, then optional fields and optional properties.
    #[must_use]
    pub fn ctor_params(&self) -> Vec<CtorParam> {
        let required = self
            .members()
            .filter(|m| matches!(m.ctor(), CtorBinding::Required));
        let optional = self
            .members()
            .filter(|m| matches!(m.ctor(), CtorBinding::Optional(_)));

        required.chain(optional).map(CtorParam::from_member).collect()
    }
}

impl ValidateNode for TypeDescriptor {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        errs.add_result(validate_ident(&self.name));
        if self.member_count() == 0 {
            err!(errs, "type declares no members");
        }

        let mut seen = HashSet::new();
        for member in self.members() {
            if !seen.insert(member.name()) {
                err!(errs, "duplicate member name '{}'", member.name());
            }
        }

        for interface in &self.interfaces {
            errs.add_result(validate_ident(interface));
        }

        errs.result()
    }
}

impl VisitableNode for TypeDescriptor {
    fn route_key(&self) -> String {
        self.name.clone()
    }

    fn drive<V: Visitor>(&self, v: &mut V) {
        for node in &self.fields {
            node.accept(v);
        }
        for node in &self.properties {
            node.accept(v);
        }
        for node in &self.attributes {
            node.accept(v);
        }
    }
}

///
/// CtorParam
///
/// One parameter of the synthesized constructor and the member it assigns.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CtorParam {
    pub name: String,
    pub member: String,
    pub ty: ValueType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl CtorParam {
    // Defaults are stored converted to the parameter type.
    fn from_member(member: MemberDescriptor<'_>) -> Self {
        let ty = member.value_type();
        let default = member
            .ctor()
            .default_value()
            .map(|v| convert_constant(v, &ty).unwrap_or_else(|_| v.clone()));

        Self {
            name: member.ctor_param_name(),
            member: member.name().to_string(),
            ty,
            default,
        }
    }

    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

///
/// TypeDescriptorBuilder
///

#[derive(Clone, Debug)]
pub struct TypeDescriptorBuilder {
    inner: TypeDescriptor,
}

impl TypeDescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: TypeDescriptor {
                name: name.into(),
                base: None,
                interfaces: BTreeSet::new(),
                fields: Vec::new(),
                properties: Vec::new(),
                attributes: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn base(mut self, base: &TypeHandle) -> Self {
        self.inner.base = Some(base.clone());
        self
    }

    #[must_use]
    pub fn interface(mut self, name: impl Into<String>) -> Self {
        self.inner.interfaces.insert(name.into());
        self
    }

    #[must_use]
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.inner.properties.push(property);
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.inner.fields.push(field);
        self
    }

    #[must_use]
    pub fn attribute(mut self, attribute: AttributeDescriptor) -> Self {
        self.inner.attributes.push(attribute);
        self
    }

    /// Validate against the default limits.
    pub fn build(self) -> Result<TypeDescriptor, Error> {
        self.build_with(&SynthesisOptions::default())
    }

    pub fn build_with(self, options: &SynthesisOptions) -> Result<TypeDescriptor, Error> {
        validate_descriptor(&self.inner, options).map_err(|tree| BuildError::Validation {
            name: self.inner.name.clone(),
            tree,
        })?;

        Ok(self.inner)
    }
}
