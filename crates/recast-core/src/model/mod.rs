//! Runtime type metadata.
//!
//! A `TypeModel` is the reflective description of one record type: its slot
//! layout, members and constructors. Hand-declared host types and synthesized
//! types share this representation; only `TypeOrigin` tells them apart.

mod attribute;
mod builder;
mod handle;
mod member;
mod object;
mod ty;

#[cfg(test)]
mod tests;

pub use attribute::AttributeModel;
pub use builder::{
    ConstructorSpec, CtorInit, FieldSpec, MethodSpec, PropertyBacking, PropertySpec,
    TypeModelBuilder,
};
pub use handle::{CtorRef, FieldRef, MemberRef, MethodRef, PropertyRef};
pub use member::{
    ConstructorModel, CtorBody, FieldModel, MethodBody, MethodModel, NativeCtor, NativeMethod,
    ParamModel, PropertyModel, SlotInit, native_ctor, native_method,
};
pub use object::{Object, ObjectRef};
pub use ty::{TypeHandle, TypeModel};

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

///
/// TypeId
///
/// Process-unique identity of one type definition. Two definitions that
/// share a name (re-synthesis) always get distinct ids.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TypeId(u64);

impl TypeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

///
/// TypeOrigin
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum TypeOrigin {
    Declared,
    Synthesized,
}

///
/// Visibility
///
/// Member visibility. `None` means the accessor does not exist at all
/// (a property without a setter, for example).
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Visibility {
    None,
    Private,
    Protected,
    #[default]
    Public,
}

impl Visibility {
    #[must_use]
    pub const fn exists(self) -> bool {
        !matches!(self, Self::None)
    }
}

///
/// MemberKind
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum MemberKind {
    Constructor,
    Field,
    Method,
    Property,
}

///
/// MemberId
///
/// Stable identity of one member of one type definition; used as the
/// member component of accessor cache keys.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display("{owner}:{kind}#{index}")]
pub struct MemberId {
    pub owner: TypeId,
    pub kind: MemberKind,
    pub index: usize,
}
