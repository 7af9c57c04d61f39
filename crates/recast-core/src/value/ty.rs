use crate::{model::TypeHandle, value::Value};
use serde::Serialize;
use std::fmt;

///
/// ValueType
///
/// Static type of a slot, parameter or IR node.
///
/// Value types (`Bool` and the numerics) never hold `Null` unless wrapped
/// in `Nullable`; reference types (`Any`, `Blob`, `List`, `Object`, `Text`)
/// always accept `Null`.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum ValueType {
    Any,
    Blob,
    Bool,
    Float32,
    Float64,
    Int32,
    Int64,
    List(Box<Self>),
    Nullable(Box<Self>),
    Object(TypeHandle),
    Text,
    Uint32,
    Uint64,
}

impl ValueType {
    #[must_use]
    pub fn list(elem: Self) -> Self {
        Self::List(Box::new(elem))
    }

    #[must_use]
    pub fn object(handle: &TypeHandle) -> Self {
        Self::Object(handle.clone())
    }

    #[must_use]
    pub const fn is_value_type(&self) -> bool {
        matches!(
            self,
            Self::Bool
                | Self::Float32
                | Self::Float64
                | Self::Int32
                | Self::Int64
                | Self::Uint32
                | Self::Uint64
        )
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Int32 | Self::Int64 | Self::Uint32 | Self::Uint64)
    }

    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_))
    }

    /// Whether `Null` is a legal value of this type.
    #[must_use]
    pub const fn accepts_null(&self) -> bool {
        !self.is_value_type()
    }

    /// Wrap value types in `Nullable`; reference types and already-nullable
    /// types are returned unchanged.
    #[must_use]
    pub fn nullable(self) -> Self {
        if self.is_value_type() {
            Self::Nullable(Box::new(self))
        } else {
            self
        }
    }

    /// Strip one `Nullable` layer, if any.
    #[must_use]
    pub fn underlying(&self) -> &Self {
        match self {
            Self::Nullable(inner) => inner,
            other => other,
        }
    }

    #[must_use]
    pub const fn object_type(&self) -> Option<&TypeHandle> {
        match self {
            Self::Object(handle) => Some(handle),
            _ => None,
        }
    }

    /// Zero value used for unassigned slots and `default(T)` in IR.
    #[must_use]
    pub const fn default_value(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Float32 => Value::Float32(0.0),
            Self::Float64 => Value::Float64(0.0),
            Self::Int32 => Value::Int32(0),
            Self::Int64 => Value::Int64(0),
            Self::Uint32 => Value::Uint32(0),
            Self::Uint64 => Value::Uint64(0),
            _ => Value::Null,
        }
    }

    /// Check a runtime value against this type.
    ///
    /// Objects conform to their own type and every base type.
    #[must_use]
    pub fn conforms(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Any, _) => true,
            (ty, Value::Null) => ty.accepts_null(),
            (Self::Nullable(inner), v) => inner.conforms(v),
            (Self::Blob, Value::Blob(_))
            | (Self::Bool, Value::Bool(_))
            | (Self::Float32, Value::Float32(_))
            | (Self::Float64, Value::Float64(_))
            | (Self::Int32, Value::Int32(_))
            | (Self::Int64, Value::Int64(_))
            | (Self::Text, Value::Text(_))
            | (Self::Uint32, Value::Uint32(_))
            | (Self::Uint64, Value::Uint64(_)) => true,
            (Self::List(elem), Value::List(items)) => items.iter().all(|item| elem.conforms(item)),
            (Self::Object(expected), Value::Object(obj)) => {
                obj.type_handle().is_subtype_of(expected)
            }
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Blob => f.write_str("blob"),
            Self::Bool => f.write_str("bool"),
            Self::Float32 => f.write_str("float32"),
            Self::Float64 => f.write_str("float64"),
            Self::Int32 => f.write_str("int32"),
            Self::Int64 => f.write_str("int64"),
            Self::List(elem) => write!(f, "List<{elem}>"),
            Self::Nullable(inner) => write!(f, "{inner}?"),
            Self::Object(handle) => write!(f, "{}", handle.name()),
            Self::Text => f.write_str("text"),
            Self::Uint32 => f.write_str("uint32"),
            Self::Uint64 => f.write_str("uint64"),
        }
    }
}
