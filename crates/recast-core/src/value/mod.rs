mod convert;
mod ty;


use crate::model::ObjectRef;
use serde::Serialize;

// re-exports
pub use convert::{ConversionKind, ConversionRule, cast_value, classify, convert_constant};
pub use ty::ValueType;

///
/// Value
///
/// Runtime value carried through compiled accessors and projections.
///
/// Null        → absent reference or empty nullable.
/// Object      → shared handle to a slot-backed record instance.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[remain::sorted]
pub enum Value {
    Blob(Vec<u8>),
    Bool(bool),
    Float32(f32),
    Float64(f64),
    Int32(i32),
    Int64(i64),
    List(Vec<Self>),
    Null,
    Object(ObjectRef),
    Text(String),
    Uint32(u32),
    Uint64(u64),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Float32(_)
                | Self::Float64(_)
                | Self::Int32(_)
                | Self::Int64(_)
                | Self::Uint32(_)
                | Self::Uint64(_)
        )
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&Vec<Self>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Stable human-readable value kind label for diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Blob(_) => "Blob",
            Self::Bool(_) => "Bool",
            Self::Float32(_) => "Float32",
            Self::Float64(_) => "Float64",
            Self::Int32(_) => "Int32",
            Self::Int64(_) => "Int64",
            Self::List(_) => "List",
            Self::Null => "Null",
            Self::Object(_) => "Object",
            Self::Text(_) => "Text",
            Self::Uint32(_) => "Uint32",
            Self::Uint64(_) => "Uint64",
        }
    }

    /// The type a literal of this value infers to.
    ///
    /// `Null` has no natural type; lists infer from their first element and
    /// fall back to `List<any>` when empty or heterogeneous.
    #[must_use]
    pub fn natural_type(&self) -> Option<ValueType> {
        let ty = match self {
            Self::Blob(_) => ValueType::Blob,
            Self::Bool(_) => ValueType::Bool,
            Self::Float32(_) => ValueType::Float32,
            Self::Float64(_) => ValueType::Float64,
            Self::Int32(_) => ValueType::Int32,
            Self::Int64(_) => ValueType::Int64,
            Self::List(items) => {
                let first = items.first().and_then(Self::natural_type);
                let elem = match first {
                    Some(ty) if items.iter().all(|item| ty.conforms(item)) => ty,
                    _ => ValueType::Any,
                };

                ValueType::List(Box::new(elem))
            }
            Self::Null => return None,
            Self::Object(o) => ValueType::Object(o.type_handle().clone()),
            Self::Text(_) => ValueType::Text,
            Self::Uint32(_) => ValueType::Uint32,
            Self::Uint64(_) => ValueType::Uint64,
        };

        Some(ty)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Uint32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::List(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Self::Object(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
