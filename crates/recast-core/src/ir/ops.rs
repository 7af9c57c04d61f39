use crate::{
    error::{Error, ErrorOrigin},
    value::{ConversionKind, Value, ValueType, classify},
};
use derive_more::Display;
use std::cmp::Ordering;

///
/// BinaryOp
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum BinaryOp {
    #[display("+")]
    Add,
    #[display("&&")]
    And,
    #[display("/")]
    Div,
    #[display("==")]
    Eq,
    #[display(">=")]
    Ge,
    #[display(">")]
    Gt,
    #[display("<=")]
    Le,
    #[display("<")]
    Lt,
    #[display("*")]
    Mul,
    #[display("!=")]
    Ne,
    #[display("||")]
    Or,
    #[display("-")]
    Sub,
}

impl BinaryOp {
    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    #[must_use]
    pub const fn is_equality(self) -> bool {
        matches!(self, Self::Eq | Self::Ne)
    }

    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Ge | Self::Gt | Self::Le | Self::Lt)
    }

    #[must_use]
    pub const fn is_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Div | Self::Mul | Self::Sub)
    }
}

///
/// BinarySignature
///
/// Resolved typing of one binary node: both operands are converted to
/// `operand` before the operator runs.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct BinarySignature {
    pub(crate) operand: ValueType,
    pub(crate) result: ValueType,
}

/// Type a binary operator over the given operand types.
pub(crate) fn resolve(
    op: BinaryOp,
    lhs: &ValueType,
    rhs: &ValueType,
) -> Result<BinarySignature, Error> {
    if op.is_logical() {
        if *lhs == ValueType::Bool && *rhs == ValueType::Bool {
            return Ok(BinarySignature {
                operand: ValueType::Bool,
                result: ValueType::Bool,
            });
        }
        return Err(mismatch(op, lhs, rhs));
    }

    let operand = unify(lhs, rhs).ok_or_else(|| mismatch(op, lhs, rhs))?;
    let plain = operand.underlying();

    let result = if op.is_equality() {
        ValueType::Bool
    } else if op.is_ordering() {
        if !(plain.is_numeric() || *plain == ValueType::Text) {
            return Err(mismatch(op, lhs, rhs));
        }
        ValueType::Bool
    } else {
        let concat = op == BinaryOp::Add && *plain == ValueType::Text;
        if !(plain.is_numeric() || concat) {
            return Err(mismatch(op, lhs, rhs));
        }
        operand.clone()
    };

    Ok(BinarySignature { operand, result })
}

/// Smallest type both operands convert to implicitly. Nullability of
/// either side is carried onto the result.
pub(crate) fn unify(a: &ValueType, b: &ValueType) -> Option<ValueType> {
    if a == b {
        return Some(a.clone());
    }

    let (pa, pb) = (a.underlying(), b.underlying());
    let plain = if pa == pb {
        pa.clone()
    } else if classify(pa, pb, ConversionKind::Implicit).is_some() {
        pb.clone()
    } else if classify(pb, pa, ConversionKind::Implicit).is_some() {
        pa.clone()
    } else {
        return None;
    };

    if a.is_nullable() || b.is_nullable() {
        Some(plain.nullable())
    } else {
        Some(plain)
    }
}

fn mismatch(op: BinaryOp, lhs: &ValueType, rhs: &ValueType) -> Error {
    Error::incompatible_type(
        ErrorOrigin::Ir,
        format!("operator '{op}' is not defined for {lhs} and {rhs}"),
    )
}

/// Evaluate a non-logical operator over operands already converted to the
/// signature's operand type.
///
/// Comparisons involving `Null` are false (`==` treats two nulls as
/// equal); arithmetic over `Null` yields `Null`.
pub(crate) fn apply(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, Error> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinaryOp::Ne => Ok(Value::Bool(lhs != rhs)),
        BinaryOp::Ge | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Lt => {
            let ord = compare(&lhs, &rhs);
            let hit = match op {
                BinaryOp::Ge => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
                BinaryOp::Gt => matches!(ord, Some(Ordering::Greater)),
                BinaryOp::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
                _ => matches!(ord, Some(Ordering::Less)),
            };
            Ok(Value::Bool(hit))
        }
        BinaryOp::Add | BinaryOp::Div | BinaryOp::Mul | BinaryOp::Sub => {
            if lhs.is_null() || rhs.is_null() {
                return Ok(Value::Null);
            }
            arithmetic(op, lhs, rhs)
        }
        BinaryOp::And | BinaryOp::Or => Err(Error::internal(
            ErrorOrigin::Ir,
            format!("logical operator '{op}' must be short-circuited by the caller"),
        )),
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
        (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
        (Value::Uint32(a), Value::Uint32(b)) => Some(a.cmp(b)),
        (Value::Uint64(a), Value::Uint64(b)) => Some(a.cmp(b)),
        (Value::Float32(a), Value::Float32(b)) => a.partial_cmp(b),
        (Value::Float64(a), Value::Float64(b)) => a.partial_cmp(b),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

macro_rules! checked_int {
    ($op:expr, $a:expr, $b:expr, $variant:path) => {{
        let out = match $op {
            BinaryOp::Add => $a.checked_add($b),
            BinaryOp::Sub => $a.checked_sub($b),
            BinaryOp::Mul => $a.checked_mul($b),
            _ => $a.checked_div($b),
        };
        out.map($variant)
    }};
}

fn arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, Error> {
    let out = match (&lhs, &rhs) {
        (Value::Int32(a), Value::Int32(b)) => checked_int!(op, *a, *b, Value::Int32),
        (Value::Int64(a), Value::Int64(b)) => checked_int!(op, *a, *b, Value::Int64),
        (Value::Uint32(a), Value::Uint32(b)) => checked_int!(op, *a, *b, Value::Uint32),
        (Value::Uint64(a), Value::Uint64(b)) => checked_int!(op, *a, *b, Value::Uint64),
        (Value::Float32(a), Value::Float32(b)) => Some(Value::Float32(float_op(op, *a, *b))),
        (Value::Float64(a), Value::Float64(b)) => Some(Value::Float64(float_op(op, *a, *b))),
        (Value::Text(a), Value::Text(b)) if op == BinaryOp::Add => {
            Some(Value::Text(format!("{a}{b}")))
        }
        _ => {
            return Err(Error::internal(
                ErrorOrigin::Ir,
                format!(
                    "operator '{op}' applied to {} and {}",
                    lhs.label(),
                    rhs.label()
                ),
            ));
        }
    };

    out.ok_or_else(|| {
        Error::invalid_operation(
            ErrorOrigin::Ir,
            format!("{lhs:?} {op} {rhs:?} overflows or divides by zero"),
        )
    })
}

fn float_op<T>(op: BinaryOp, a: T, b: T) -> T
where
    T: std::ops::Add<Output = T>
        + std::ops::Sub<Output = T>
        + std::ops::Mul<Output = T>
        + std::ops::Div<Output = T>,
{
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        _ => a / b,
    }
}
