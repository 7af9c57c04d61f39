//! Typed intermediate representation.
//!
//! Every `Expr` is built through a checked constructor, so a tree that
//! exists is well typed: operand types agree, conversions are legal and
//! static/instance usage matches the member. Trees are wrapped in a
//! [`Lambda`] and lowered to a [`CompiledLambda`] closure tree once.

mod compile;
mod expr;
mod lambda;
mod ops;
mod rebind;


pub use compile::CompiledLambda;
pub use expr::{AssignTarget, Expr, ExprKind, MemberBinding};
pub use lambda::{Lambda, ParamDecl};
pub use ops::BinaryOp;

use crate::{
    error::Error,
    model::{FieldRef, ObjectRef},
    value::Value,
};
use derive_more::Display;
use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

static NEXT_LOCAL_ID: AtomicU32 = AtomicU32::new(1);

///
/// LocalId
///
/// Process-unique identity of a `Let` binding. Trees spliced together from
/// different lambdas can never capture each other's locals.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("${_0}")]
pub struct LocalId(u32);

impl LocalId {
    pub(crate) fn fresh() -> Self {
        Self(NEXT_LOCAL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

///
/// WritePrimitive
///
/// Low-level store into a write-once field. Generated IR cannot assign
/// such a field directly; it calls the primitive instead. One primitive
/// exists per field per accessor cache.
///

pub struct WritePrimitive {
    field: FieldRef,
}

impl WritePrimitive {
    pub(crate) const fn new(field: FieldRef) -> Self {
        Self { field }
    }

    #[must_use]
    pub const fn field(&self) -> &FieldRef {
        &self.field
    }

    /// Store `value` into the field of `instance`, bypassing the
    /// write-once restriction.
    pub fn write(&self, instance: Option<&ObjectRef>, value: Value) -> Result<(), Error> {
        self.field.store(instance, value)
    }
}

impl fmt::Debug for WritePrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "write_primitive({:?})", self.field)
    }
}
