use crate::node::TypeDescriptor;
use recast_core::{
    model::{MemberKind, TypeId},
    value::ValueType,
};
use derive_more::Display;
use std::fmt::{self, Write};
use xxhash_rust::xxh3::xxh3_64;

///
/// TypeSignature
///
/// Member names and types of a descriptor plus its base. Two descriptors
/// with equal signatures synthesize interchangeable types.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TypeSignature {
    name: String,
    base: Option<(String, TypeId)>,
    members: Vec<SignatureMember>,
}

///
/// SignatureMember
///

#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
#[display("{kind} {name}: {ty}")]
pub struct SignatureMember {
    pub kind: MemberKind,
    pub name: String,
    pub ty: ValueType,
}

impl TypeSignature {
    #[must_use]
    pub fn of(desc: &TypeDescriptor) -> Self {
        Self {
            name: desc.name().to_string(),
            base: desc.base().map(|b| (b.name().to_string(), b.id())),
            members: desc
                .members()
                .map(|m| SignatureMember {
                    kind: m.kind(),
                    name: m.name().to_string(),
                    ty: m.value_type(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn members(&self) -> &[SignatureMember] {
        &self.members
    }

    /// Stable 64-bit fingerprint of the canonical rendering, for logs and
    /// diagnostics. Equality always compares the full signature.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        xxh3_64(self.to_string().as_bytes())
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.name.clone();
        if let Some((base, id)) = &self.base {
            write!(out, " : {base}#{id}")?;
        }
        out.push_str(" {");
        for (i, member) in self.members.iter().enumerate() {
            let sep = if i == 0 { " " } else { "; " };
            write!(out, "{sep}{member}")?;
        }
        out.push_str(" }");

        f.write_str(&out)
    }
}
