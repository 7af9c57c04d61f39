//! Conversion rules between value types.
//!
//! Every conversion reachable from generated IR is declared here. Implicit
//! rules never lose information; explicit rules are checked at runtime and
//! fail instead of truncating. Pairs without a rule are rejected when the IR
//! is built.

use crate::{
    error::{Error, ErrorOrigin},
    value::{Value, ValueType},
};

/// Largest integer magnitude every `f64` represents exactly.
const F64_EXACT_INT: i128 = 1i128 << 53;

/// Largest integer magnitude every `f32` represents exactly.
const F32_EXACT_INT: i128 = 1i128 << 24;

///
/// ConversionKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConversionKind {
    Implicit,
    Explicit,
}

///
/// ConversionRule
///
/// Why a conversion between two types is legal.
/// Only `Downcast`, `Narrow`, `NullableUnwrap`, `ToFloat` and `Unbox`
/// can fail at runtime.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum ConversionRule {
    Box,
    Downcast,
    Identity,
    Lift,
    Narrow,
    NullableUnwrap,
    NullableWrap,
    ToFloat,
    Unbox,
    Upcast,
    Widen,
}

impl ConversionRule {
    #[must_use]
    pub const fn is_checked(self) -> bool {
        matches!(
            self,
            Self::Downcast | Self::Narrow | Self::NullableUnwrap | Self::ToFloat | Self::Unbox
        )
    }
}

/// Classify a conversion under the given kind; `None` means illegal.
#[must_use]
pub fn classify(from: &ValueType, to: &ValueType, kind: ConversionKind) -> Option<ConversionRule> {
    match kind {
        ConversionKind::Implicit => implicit_rule(from, to),
        ConversionKind::Explicit => explicit_rule(from, to),
    }
}

fn implicit_rule(from: &ValueType, to: &ValueType) -> Option<ConversionRule> {
    if from == to {
        return Some(ConversionRule::Identity);
    }

    match (from, to) {
        (_, ValueType::Any) => Some(ConversionRule::Box),
        (ValueType::Nullable(a), ValueType::Nullable(b)) => {
            implicit_rule(a, b).map(|_| ConversionRule::Lift)
        }
        (f, ValueType::Nullable(b)) if f.is_value_type() => {
            implicit_rule(f, b).map(|_| ConversionRule::NullableWrap)
        }
        (ValueType::Object(derived), ValueType::Object(base)) if derived.is_subtype_of(base) => {
            Some(ConversionRule::Upcast)
        }
        (f, t) if is_widening(f, t) => Some(ConversionRule::Widen),
        _ => None,
    }
}

fn explicit_rule(from: &ValueType, to: &ValueType) -> Option<ConversionRule> {
    if let Some(rule) = implicit_rule(from, to) {
        return Some(rule);
    }

    match (from, to) {
        (ValueType::Any, _) => Some(ConversionRule::Unbox),
        (ValueType::Nullable(a), ValueType::Nullable(b)) => {
            explicit_rule(a, b).map(|_| ConversionRule::Lift)
        }
        (ValueType::Nullable(a), t) => explicit_rule(a, t).map(|_| ConversionRule::NullableUnwrap),
        (f, ValueType::Nullable(b)) if f.is_value_type() => {
            explicit_rule(f, b).map(|_| ConversionRule::NullableWrap)
        }
        (ValueType::Object(base), ValueType::Object(derived)) if derived.is_subtype_of(base) => {
            Some(ConversionRule::Downcast)
        }
        (f, t) if f.is_integer() && t.is_integer() => Some(ConversionRule::Narrow),
        (f, t) if f.is_integer() && t.is_float() => Some(ConversionRule::ToFloat),
        (ValueType::Float64, ValueType::Float32) => Some(ConversionRule::Narrow),
        _ => None,
    }
}

const fn is_widening(from: &ValueType, to: &ValueType) -> bool {
    matches!(
        (from, to),
        (ValueType::Int32, ValueType::Int64 | ValueType::Float64)
            | (
                ValueType::Uint32,
                ValueType::Uint64 | ValueType::Int64 | ValueType::Float64
            )
            | (ValueType::Float32, ValueType::Float64)
    )
}

/// Convert a runtime value to `to`, failing rather than truncating.
///
/// Callers are expected to have checked the conversion with [`classify`];
/// this function is total over legal pairs and rejects everything else.
pub fn cast_value(value: Value, to: &ValueType) -> Result<Value, Error> {
    match (value, to) {
        (v, ValueType::Any) => Ok(v),
        (Value::Null, t) => {
            if t.accepts_null() {
                Ok(Value::Null)
            } else {
                Err(Error::invalid_cast(format!("cannot convert null to {t}")))
            }
        }
        (v, ValueType::Nullable(inner)) => cast_value(v, inner),
        (Value::Object(obj), ValueType::Object(expected)) => {
            if obj.type_handle().is_subtype_of(expected) {
                Ok(Value::Object(obj))
            } else {
                Err(Error::invalid_cast(format!(
                    "object of type '{}' is not a '{}'",
                    obj.type_handle().name(),
                    expected.name()
                )))
            }
        }
        (Value::List(items), ValueType::List(elem)) => items
            .into_iter()
            .map(|item| cast_value(item, elem))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        (v, t) if v.is_numeric() && t.is_numeric() => cast_numeric(v, t),
        (v @ Value::Blob(_), ValueType::Blob)
        | (v @ Value::Bool(_), ValueType::Bool)
        | (v @ Value::Text(_), ValueType::Text) => Ok(v),
        (v, t) => Err(Error::invalid_cast(format!(
            "cannot convert {} to {t}",
            v.label()
        ))),
    }
}

/// Convert a literal at compile time; failures are type errors, not casts.
pub fn convert_constant(value: &Value, to: &ValueType) -> Result<Value, Error> {
    cast_value(value.clone(), to).map_err(|err| {
        Error::incompatible_type(
            ErrorOrigin::Ir,
            format!("constant {value:?} is not assignable to {to}: {}", err.message),
        )
    })
}

#[derive(Clone, Copy)]
enum Numeric {
    Int(i128),
    Float(f64),
}

fn numeric_of(value: &Value) -> Option<Numeric> {
    match value {
        Value::Int32(v) => Some(Numeric::Int(i128::from(*v))),
        Value::Int64(v) => Some(Numeric::Int(i128::from(*v))),
        Value::Uint32(v) => Some(Numeric::Int(i128::from(*v))),
        Value::Uint64(v) => Some(Numeric::Int(i128::from(*v))),
        Value::Float32(v) => Some(Numeric::Float(f64::from(*v))),
        Value::Float64(v) => Some(Numeric::Float(*v)),
        _ => None,
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn cast_numeric(value: Value, to: &ValueType) -> Result<Value, Error> {
    let overflow = |value: &Value| {
        Error::invalid_cast(format!("{value:?} does not fit in {to} without loss"))
    };
    let Some(numeric) = numeric_of(&value) else {
        return Err(overflow(&value));
    };

    let out = match (numeric, to) {
        (Numeric::Int(n), ValueType::Int32) => i32::try_from(n).ok().map(Value::Int32),
        (Numeric::Int(n), ValueType::Int64) => i64::try_from(n).ok().map(Value::Int64),
        (Numeric::Int(n), ValueType::Uint32) => u32::try_from(n).ok().map(Value::Uint32),
        (Numeric::Int(n), ValueType::Uint64) => u64::try_from(n).ok().map(Value::Uint64),
        (Numeric::Int(n), ValueType::Float32) => {
            (n.abs() <= F32_EXACT_INT).then(|| Value::Float32(n as f32))
        }
        (Numeric::Int(n), ValueType::Float64) => {
            (n.abs() <= F64_EXACT_INT).then(|| Value::Float64(n as f64))
        }
        (Numeric::Float(x), ValueType::Float64) => Some(Value::Float64(x)),
        (Numeric::Float(x), ValueType::Float32) => {
            let narrowed = x as f32;
            (f64::from(narrowed) == x || x.is_nan()).then_some(Value::Float32(narrowed))
        }
        // float to integer has no rule
        _ => None,
    };

    out.ok_or_else(|| overflow(&value))
}
