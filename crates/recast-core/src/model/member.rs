use crate::{
    error::Error,
    model::{ObjectRef, Visibility},
    value::{Value, ValueType},
};
use std::{fmt, sync::Arc};

/// Host implementation of a method: `(instance, args) -> result`.
pub type NativeMethod =
    Arc<dyn Fn(Option<&ObjectRef>, &[Value]) -> Result<Value, Error> + Send + Sync>;

/// Host implementation of a constructor body, run on a freshly allocated object.
pub type NativeCtor = Arc<dyn Fn(&ObjectRef, &[Value]) -> Result<(), Error> + Send + Sync>;

/// Wrap a closure as a [`NativeMethod`].
pub fn native_method<F>(f: F) -> NativeMethod
where
    F: Fn(Option<&ObjectRef>, &[Value]) -> Result<Value, Error> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`NativeCtor`].
pub fn native_ctor<F>(f: F) -> NativeCtor
where
    F: Fn(&ObjectRef, &[Value]) -> Result<(), Error> + Send + Sync + 'static,
{
    Arc::new(f)
}

///
/// FieldModel
///

#[derive(Clone, Debug)]
pub struct FieldModel {
    pub name: String,
    pub ty: ValueType,
    pub visibility: Visibility,
    pub is_static: bool,
    /// Write-once: only constructors may assign it directly.
    pub init_only: bool,
    /// Instance slot, or static slot when `is_static`.
    pub slot: usize,
}

///
/// PropertyModel
///

#[derive(Clone, Debug)]
pub struct PropertyModel {
    pub name: String,
    pub ty: ValueType,
    pub get: Visibility,
    pub set: Visibility,
    pub is_static: bool,
    /// Backing slot for slot-backed properties.
    pub backing: Option<usize>,
    /// Index of the getter in the owner's method table.
    pub getter: Option<usize>,
    /// Index of the setter in the owner's method table.
    pub setter: Option<usize>,
}

impl PropertyModel {
    #[must_use]
    pub const fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    #[must_use]
    pub const fn is_settable(&self) -> bool {
        self.setter.is_some()
    }
}

///
/// ParamModel
///

#[derive(Clone, Debug, PartialEq)]
pub struct ParamModel {
    pub name: String,
    pub ty: ValueType,
    /// Present for optional parameters.
    pub default: Option<Value>,
}

impl ParamModel {
    pub fn required(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, ty: ValueType, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            ty,
            default: Some(default.into()),
        }
    }

    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

///
/// MethodBody
///

#[derive(Clone)]
pub enum MethodBody {
    LoadSlot(usize),
    LoadStatic(usize),
    Native(NativeMethod),
    StoreSlot(usize),
    StoreStatic(usize),
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadSlot(slot) => write!(f, "LoadSlot({slot})"),
            Self::LoadStatic(slot) => write!(f, "LoadStatic({slot})"),
            Self::Native(_) => f.write_str("Native(..)"),
            Self::StoreSlot(slot) => write!(f, "StoreSlot({slot})"),
            Self::StoreStatic(slot) => write!(f, "StoreStatic({slot})"),
        }
    }
}

///
/// MethodModel
///

#[derive(Clone, Debug)]
pub struct MethodModel {
    pub name: String,
    pub params: Vec<ParamModel>,
    /// `None` for methods that return nothing.
    pub ret: Option<ValueType>,
    pub is_static: bool,
    pub visibility: Visibility,
    pub body: MethodBody,
}

impl MethodModel {
    /// Type of a call expression; void calls evaluate to `Null` typed `any`.
    #[must_use]
    pub fn result_type(&self) -> ValueType {
        self.ret.clone().unwrap_or(ValueType::Any)
    }

    #[must_use]
    pub fn required_arity(&self) -> usize {
        self.params.iter().filter(|p| !p.is_optional()).count()
    }
}

///
/// SlotInit
///
/// Constructor step: copy parameter `param` into instance slot `slot`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SlotInit {
    pub param: usize,
    pub slot: usize,
}

///
/// CtorBody
///

#[derive(Clone)]
pub enum CtorBody {
    Assign(Vec<SlotInit>),
    Native(NativeCtor),
}

impl fmt::Debug for CtorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assign(steps) => f.debug_tuple("Assign").field(steps).finish(),
            Self::Native(_) => f.write_str("Native(..)"),
        }
    }
}

///
/// ConstructorModel
///

#[derive(Clone, Debug)]
pub struct ConstructorModel {
    pub params: Vec<ParamModel>,
    pub visibility: Visibility,
    pub body: CtorBody,
}

impl ConstructorModel {
    #[must_use]
    pub fn required_params(&self) -> impl Iterator<Item = &ParamModel> {
        self.params.iter().filter(|p| !p.is_optional())
    }

    #[must_use]
    pub fn is_parameterless(&self) -> bool {
        self.params.is_empty()
    }

    /// Short signature used in diagnostics, e.g. `(name: text, age: int32 = 0)`.
    #[must_use]
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| match &p.default {
                Some(default) => format!("{}: {} = {default:?}", p.name, p.ty),
                None => format!("{}: {}", p.name, p.ty),
            })
            .collect::<Vec<_>>();

        format!("({})", params.join(", "))
    }
}
