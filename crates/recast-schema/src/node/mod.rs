//! Type descriptor nodes.
//!
//! A `TypeDescriptor` is the immutable, validated description of one record
//! type to synthesize. Nodes validate their local invariants; schema-wide
//! checks that need limits or the base type live in `validate`.

mod attribute;
mod descriptor;
mod member;

pub use attribute::AttributeDescriptor;
pub use descriptor::{CtorParam, TypeDescriptor, TypeDescriptorBuilder};
pub use member::{CtorBinding, FieldDescriptor, MemberDescriptor, PropertyDescriptor};
pub use recast_core::model::Visibility;

use crate::{
    error::ErrorTree,
    visit::{Event, Visitor},
};

///
/// ValidateNode
///
/// Local invariants of one node. Children are validated by the visitor.
///

pub trait ValidateNode {
    fn validate(&self) -> Result<(), ErrorTree> {
        Ok(())
    }
}

///
/// VisitableNode
///

pub trait VisitableNode: ValidateNode {
    /// Route segment used when reporting errors; empty keeps the parent's.
    fn route_key(&self) -> String {
        String::new()
    }

    fn accept<V: Visitor>(&self, v: &mut V) {
        let key = self.route_key();
        let routed = !key.is_empty();

        if routed {
            v.push(&key);
        }
        v.visit(self, Event::Enter);
        self.drive(v);
        v.visit(self, Event::Exit);
        if routed {
            v.pop();
        }
    }

    fn drive<V: Visitor>(&self, _: &mut V) {}
}
