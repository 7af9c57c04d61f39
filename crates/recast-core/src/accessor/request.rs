use crate::{model::MemberId, value::ValueType};
use derive_more::Display;
use std::fmt;

///
/// InvocationShape
///
/// Generic accessors take the instance as `any` and arguments as a
/// `List<any>` and cast internally; typed accessors declare concrete
/// parameter types and cast nothing at the boundary.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum InvocationShape {
    Generic,
    #[default]
    Typed,
}

///
/// Binding
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Binding {
    Instance,
    Static,
}

///
/// AccessorKind
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum AccessorKind {
    Construct,
    Get,
    Invoke,
    Set,
}

///
/// AccessorRequest
///
/// Overrides for one accessor. Unset types default to the member's own
/// types; a set `binding` must agree with the member or the request fails.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccessorRequest {
    pub shape: InvocationShape,
    pub instance_ty: Option<ValueType>,
    pub value_ty: Option<ValueType>,
    pub param_tys: Option<Vec<ValueType>>,
    pub binding: Option<Binding>,
}

impl AccessorRequest {
    #[must_use]
    pub fn typed() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn generic() -> Self {
        Self {
            shape: InvocationShape::Generic,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn instance_ty(mut self, ty: ValueType) -> Self {
        self.instance_ty = Some(ty);
        self
    }

    #[must_use]
    pub fn value_ty(mut self, ty: ValueType) -> Self {
        self.value_ty = Some(ty);
        self
    }

    #[must_use]
    pub fn param_tys(mut self, tys: Vec<ValueType>) -> Self {
        self.param_tys = Some(tys);
        self
    }

    #[must_use]
    pub const fn binding(mut self, binding: Binding) -> Self {
        self.binding = Some(binding);
        self
    }
}

///
/// AccessorKey
///
/// Cache identity: member, operation, shape and the effective boundary
/// types after defaults are applied. Two requests that resolve to the same
/// boundary share one accessor.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct AccessorKey {
    pub member: MemberId,
    pub kind: AccessorKind,
    pub shape: InvocationShape,
    /// `None` when the accessor takes no instance (static members and
    /// constructors in the typed shape).
    pub instance_ty: Option<ValueType>,
    pub value_ty: ValueType,
    pub param_tys: Vec<ValueType>,
}

impl fmt::Display for AccessorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} (", self.member, self.kind, self.shape)?;
        let mut first = true;
        for ty in self.instance_ty.iter().chain(&self.param_tys) {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{ty}")?;
        }
        write!(f, ") -> {}", self.value_ty)
    }
}
