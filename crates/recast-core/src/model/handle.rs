use crate::{
    error::{Error, ErrorOrigin},
    model::{
        ConstructorModel, CtorBody, FieldModel, MemberId, MemberKind, MethodBody, MethodModel,
        ObjectRef, PropertyModel, TypeHandle,
    },
    value::{Value, ValueType, cast_value},
};
use std::fmt;

// Shared shape of the member handles: declaring type + index into its table.
macro_rules! member_handle {
    ($name:ident, $model:ty, $table:ident, $kind:expr) => {
        #[derive(Clone, Eq, Hash, PartialEq)]
        pub struct $name {
            owner: TypeHandle,
            index: usize,
        }

        impl $name {
            pub(crate) const fn new(owner: TypeHandle, index: usize) -> Self {
                Self { owner, index }
            }

            /// Declaring type.
            #[must_use]
            pub const fn owner(&self) -> &TypeHandle {
                &self.owner
            }

            #[must_use]
            pub const fn index(&self) -> usize {
                self.index
            }

            #[must_use]
            pub fn model(&self) -> &$model {
                &self.owner.$table[self.index]
            }

            #[must_use]
            pub fn id(&self) -> MemberId {
                MemberId {
                    owner: self.owner.id(),
                    kind: $kind,
                    index: self.index,
                }
            }
        }
    };
}

member_handle!(FieldRef, FieldModel, fields, MemberKind::Field);
member_handle!(PropertyRef, PropertyModel, properties, MemberKind::Property);
member_handle!(MethodRef, MethodModel, methods, MemberKind::Method);
member_handle!(CtorRef, ConstructorModel, constructors, MemberKind::Constructor);

///
/// FieldRef
///

impl FieldRef {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.model().name
    }

    #[must_use]
    pub fn ty(&self) -> &ValueType {
        &self.model().ty
    }

    pub(crate) fn load(&self, instance: Option<&ObjectRef>) -> Result<Value, Error> {
        let model = self.model();
        if model.is_static {
            self.owner.static_value(model.slot)
        } else {
            require_instance(instance, self.name())?.slot(model.slot)
        }
    }

    /// Raw store; write-once checks are the caller's responsibility.
    pub(crate) fn store(&self, instance: Option<&ObjectRef>, value: Value) -> Result<(), Error> {
        let model = self.model();
        let value = cast_value(value, &model.ty)?;
        if model.is_static {
            self.owner.set_static_value(model.slot, value)
        } else {
            require_instance(instance, self.name())?.set_slot(model.slot, value)
        }
    }
}

impl fmt::Debug for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner.name(), self.name())
    }
}

///
/// PropertyRef
///

impl PropertyRef {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.model().name
    }

    #[must_use]
    pub fn ty(&self) -> &ValueType {
        &self.model().ty
    }

    #[must_use]
    pub fn getter(&self) -> Option<MethodRef> {
        self.model()
            .getter
            .map(|index| MethodRef::new(self.owner.clone(), index))
    }

    #[must_use]
    pub fn setter(&self) -> Option<MethodRef> {
        self.model()
            .setter
            .map(|index| MethodRef::new(self.owner.clone(), index))
    }
}

impl fmt::Debug for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner.name(), self.name())
    }
}

///
/// MethodRef
///

impl MethodRef {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.model().name
    }

    /// Execute the method body. Arguments must already match the declared
    /// parameter types; the IR layer inserts the conversions.
    pub fn invoke(&self, instance: Option<&ObjectRef>, args: &[Value]) -> Result<Value, Error> {
        let model = self.model();
        let instance = if model.is_static {
            None
        } else {
            Some(require_instance(instance, &model.name)?)
        };

        match &model.body {
            MethodBody::LoadSlot(slot) => require_instance(instance, &model.name)?.slot(*slot),
            MethodBody::LoadStatic(slot) => self.owner.static_value(*slot),
            MethodBody::StoreSlot(slot) => {
                let value = single_arg(args, &model.name)?;
                require_instance(instance, &model.name)?.set_slot(*slot, value)?;
                Ok(Value::Null)
            }
            MethodBody::StoreStatic(slot) => {
                let value = single_arg(args, &model.name)?;
                self.owner.set_static_value(*slot, value)?;
                Ok(Value::Null)
            }
            MethodBody::Native(f) => f(instance, args),
        }
    }
}

impl fmt::Debug for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owner.name(), self.name())
    }
}

///
/// CtorRef
///

impl CtorRef {
    /// Allocate a fresh instance of the owner and run this constructor.
    pub fn construct(&self, args: &[Value]) -> Result<ObjectRef, Error> {
        let model = self.model();
        if args.len() != model.params.len() {
            return Err(Error::internal(
                ErrorOrigin::Model,
                format!(
                    "constructor {}{} called with {} arguments",
                    self.owner.name(),
                    model.signature(),
                    args.len()
                ),
            ));
        }

        let object = self.owner.instantiate();
        match &model.body {
            CtorBody::Assign(steps) => {
                for step in steps {
                    object.set_slot(step.slot, args[step.param].clone())?;
                }
            }
            CtorBody::Native(f) => f(&object, args)?,
        }

        Ok(object)
    }
}

impl fmt::Debug for CtorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.owner.name(), self.model().signature())
    }
}

///
/// MemberRef
///
/// A data member: anything a projection can read from or assign to.
///

#[derive(Clone, Eq, Hash, PartialEq)]
pub enum MemberRef {
    Field(FieldRef),
    Property(PropertyRef),
}

impl MemberRef {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Field(f) => f.name(),
            Self::Property(p) => p.name(),
        }
    }

    #[must_use]
    pub fn ty(&self) -> &ValueType {
        match self {
            Self::Field(f) => f.ty(),
            Self::Property(p) => p.ty(),
        }
    }

    #[must_use]
    pub const fn owner(&self) -> &TypeHandle {
        match self {
            Self::Field(f) => f.owner(),
            Self::Property(p) => p.owner(),
        }
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        match self {
            Self::Field(f) => f.model().is_static,
            Self::Property(p) => p.model().is_static,
        }
    }

    #[must_use]
    pub fn is_readable(&self) -> bool {
        match self {
            Self::Field(_) => true,
            Self::Property(p) => p.model().is_readable(),
        }
    }

    /// Whether generated IR can write the member after construction.
    /// Write-once fields count; properties need a setter.
    #[must_use]
    pub fn is_assignable(&self) -> bool {
        match self {
            Self::Field(_) => true,
            Self::Property(p) => p.setter().is_some(),
        }
    }

    #[must_use]
    pub fn id(&self) -> MemberId {
        match self {
            Self::Field(f) => f.id(),
            Self::Property(p) => p.id(),
        }
    }

    /// Instance slot holding the member's value, when it has one.
    #[must_use]
    pub fn backing_slot(&self) -> Option<usize> {
        match self {
            Self::Field(f) => (!f.model().is_static).then_some(f.model().slot),
            Self::Property(p) => {
                let model = p.model();
                if model.is_static { None } else { model.backing }
            }
        }
    }

    /// Read the member from an instance (or statically).
    pub fn load(&self, instance: Option<&ObjectRef>) -> Result<Value, Error> {
        match self {
            Self::Field(f) => f.load(instance),
            Self::Property(p) => {
                let getter = p.getter().ok_or_else(|| {
                    Error::invalid_operation(
                        ErrorOrigin::Model,
                        format!("property '{}' has no getter", p.name()),
                    )
                })?;
                getter.invoke(instance, &[])
            }
        }
    }
}

impl fmt::Debug for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => fmt::Debug::fmt(field, f),
            Self::Property(property) => fmt::Debug::fmt(property, f),
        }
    }
}

impl From<FieldRef> for MemberRef {
    fn from(f: FieldRef) -> Self {
        Self::Field(f)
    }
}

impl From<PropertyRef> for MemberRef {
    fn from(p: PropertyRef) -> Self {
        Self::Property(p)
    }
}

fn require_instance<'a>(
    instance: Option<&'a ObjectRef>,
    member: &str,
) -> Result<&'a ObjectRef, Error> {
    instance.ok_or_else(|| {
        Error::invalid_cast(format!(
            "null reference while accessing instance member '{member}'"
        ))
    })
}

fn single_arg(args: &[Value], member: &str) -> Result<Value, Error> {
    match args {
        [value] => Ok(value.clone()),
        _ => Err(Error::internal(
            ErrorOrigin::Model,
            format!("setter '{member}' expects exactly one argument, got {}", args.len()),
        )),
    }
}
