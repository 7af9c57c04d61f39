use crate::{
    error::{Error, ErrorOrigin},
    model::{
        AttributeModel, ConstructorModel, CtorRef, FieldModel, FieldRef, MemberRef, MethodModel,
        MethodRef, Object, ObjectRef, PropertyModel, PropertyRef, TypeId, TypeOrigin,
    },
    value::{Value, ValueType},
};
use derive_more::Deref;
use serde::{Serialize, Serializer};
use std::{
    collections::BTreeSet,
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, RwLock},
};

///
/// TypeModel
///
/// Reflective description of one record type. Immutable once built, apart
/// from the values held in static slots.
///

pub struct TypeModel {
    pub(crate) id: TypeId,
    pub(crate) name: String,
    pub(crate) origin: TypeOrigin,
    pub(crate) base: Option<TypeHandle>,
    pub(crate) interfaces: BTreeSet<String>,
    pub(crate) attributes: Vec<AttributeModel>,
    pub(crate) fields: Vec<FieldModel>,
    pub(crate) properties: Vec<PropertyModel>,
    pub(crate) methods: Vec<MethodModel>,
    pub(crate) constructors: Vec<ConstructorModel>,

    /// Instance slot layout, base slots first.
    pub(crate) slot_types: Vec<ValueType>,
    pub(crate) statics: RwLock<Vec<Value>>,
}

impl TypeModel {
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn origin(&self) -> TypeOrigin {
        self.origin
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
    pub fn attributes(&self) -> &[AttributeModel] {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeModel> {
        self.attributes.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldModel] {
        &self.fields
    }

    #[must_use]
    pub fn properties(&self) -> &[PropertyModel] {
        &self.properties
    }

    #[must_use]
    pub fn methods(&self) -> &[MethodModel] {
        &self.methods
    }

    #[must_use]
    pub fn constructors(&self) -> &[ConstructorModel] {
        &self.constructors
    }

    #[must_use]
    pub fn slot_types(&self) -> &[ValueType] {
        &self.slot_types
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slot_types.len()
    }

    pub(crate) fn static_value(&self, slot: usize) -> Result<Value, Error> {
        let statics = self
            .statics
            .read()
            .expect("static slot RwLock poisoned while acquiring read lock");

        statics.get(slot).cloned().ok_or_else(|| {
            Error::internal(
                ErrorOrigin::Model,
                format!("static slot {slot} out of range on '{}'", self.name),
            )
        })
    }

    pub(crate) fn set_static_value(&self, slot: usize, value: Value) -> Result<(), Error> {
        let mut statics = self
            .statics
            .write()
            .expect("static slot RwLock poisoned while acquiring write lock");

        let target = statics.get_mut(slot).ok_or_else(|| {
            Error::internal(
                ErrorOrigin::Model,
                format!("static slot {slot} out of range on '{}'", self.name),
            )
        })?;
        *target = value;

        Ok(())
    }
}

impl fmt::Debug for TypeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeModel")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("base", &self.base.as_ref().map(|b| b.name().to_string()))
            .field("fields", &self.fields)
            .field("properties", &self.properties)
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors)
            .finish_non_exhaustive()
    }
}

///
/// TypeHandle
///
/// Shared handle to a type definition. Equality and hashing use the
/// definition's `TypeId`, never its name.
///

#[derive(Clone, Deref)]
pub struct TypeHandle(Arc<TypeModel>);

impl TypeHandle {
    pub(crate) const fn new(model: Arc<TypeModel>) -> Self {
        Self(model)
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        ValueType::Object(self.clone())
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Iterate this type followed by its base chain.
    pub fn lineage(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |t| t.base.as_ref())
    }

    /// True when `self` is `other` or derives from it.
    #[must_use]
    pub fn is_subtype_of(&self, other: &Self) -> bool {
        self.lineage().any(|t| t.id == other.id)
    }

    /// True when this type or any base declares the interface.
    #[must_use]
    pub fn implements(&self, interface: &str) -> bool {
        self.lineage().any(|t| t.interfaces.contains(interface))
    }

    /// Allocate an instance with every slot at its type default.
    /// No constructor runs.
    #[must_use]
    pub fn instantiate(&self) -> ObjectRef {
        ObjectRef::new(Object::new(self.clone()))
    }

    // --- member lookup (derived members shadow base members) --------------

    #[must_use]
    pub fn find_field(&self, name: &str) -> Option<FieldRef> {
        self.lineage().find_map(|t| {
            t.fields
                .iter()
                .position(|f| f.name == name)
                .map(|index| FieldRef::new(t.clone(), index))
        })
    }

    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<PropertyRef> {
        self.lineage().find_map(|t| {
            t.properties
                .iter()
                .position(|p| p.name == name)
                .map(|index| PropertyRef::new(t.clone(), index))
        })
    }

    /// Field or property named `name`, searching each level of the base
    /// chain for both kinds before moving up.
    #[must_use]
    pub fn find_member(&self, name: &str) -> Option<MemberRef> {
        self.lineage().find_map(|t| {
            if let Some(index) = t.properties.iter().position(|p| p.name == name) {
                return Some(MemberRef::Property(PropertyRef::new(t.clone(), index)));
            }
            t.fields
                .iter()
                .position(|f| f.name == name)
                .map(|index| MemberRef::Field(FieldRef::new(t.clone(), index)))
        })
    }

    /// Every field and property visible on this type, derived first.
    #[must_use]
    pub fn members(&self) -> Vec<MemberRef> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();

        for t in self.lineage() {
            for index in 0..t.properties.len() {
                if seen.insert(t.properties[index].name.clone()) {
                    out.push(MemberRef::Property(PropertyRef::new(t.clone(), index)));
                }
            }
            for index in 0..t.fields.len() {
                if seen.insert(t.fields[index].name.clone()) {
                    out.push(MemberRef::Field(FieldRef::new(t.clone(), index)));
                }
            }
        }

        out
    }

    /// Every method overload named `name`, derived first.
    #[must_use]
    pub fn find_methods(&self, name: &str) -> Vec<MethodRef> {
        self.lineage()
            .flat_map(|t| {
                t.methods
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| m.name == name)
                    .map(|(index, _)| MethodRef::new(t.clone(), index))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// The single overload of `name` taking `arity` parameters.
    #[must_use]
    pub fn find_method(&self, name: &str, arity: usize) -> Option<MethodRef> {
        self.find_methods(name)
            .into_iter()
            .find(|m| m.model().params.len() == arity)
    }

    /// Constructors declared on this type (constructors are not inherited).
    #[must_use]
    pub fn constructor_refs(&self) -> Vec<CtorRef> {
        (0..self.constructors.len())
            .map(|index| CtorRef::new(self.clone(), index))
            .collect()
    }

    #[must_use]
    pub fn default_constructor(&self) -> Option<CtorRef> {
        self.constructors
            .iter()
            .position(ConstructorModel::is_parameterless)
            .map(|index| CtorRef::new(self.clone(), index))
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({}#{})", self.0.name, self.0.id)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl Serialize for TypeHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.name)
    }
}
