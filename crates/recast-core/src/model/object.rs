use crate::{
    error::{Error, ErrorOrigin},
    model::TypeHandle,
    value::{Value, cast_value},
};
use derive_more::Deref;
use serde::{Serialize, Serializer, ser::Error as _, ser::SerializeStruct};
use std::{
    cell::RefCell,
    fmt,
    sync::{Arc, RwLock},
};

thread_local! {
    static ACTIVE: RefCell<Vec<Visit>> = const { RefCell::new(Vec::new()) };
}

///
/// Visit
///
/// One object (or pair of objects) being walked on this thread. Object
/// graphs may be cyclic, so recursive walks stop when they meet a visit
/// that is already active.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Visit {
    Compare(usize, usize),
    Print(usize),
    Serialize(usize),
}

///
/// VisitGuard
///

struct VisitGuard(Visit);

impl VisitGuard {
    // None when the visit is already active further up the stack.
    fn enter(visit: Visit) -> Option<Self> {
        ACTIVE.with_borrow_mut(|active| {
            if active.contains(&visit) {
                None
            } else {
                active.push(visit);
                Some(Self(visit))
            }
        })
    }
}

impl Drop for VisitGuard {
    fn drop(&mut self) {
        ACTIVE.with_borrow_mut(|active| {
            if let Some(pos) = active.iter().rposition(|v| *v == self.0) {
                active.remove(pos);
            }
        });
    }
}

///
/// Object
///
/// Slot-backed instance of a `TypeModel`. The slot vector is guarded by a
/// narrow lock so instances can be shared across threads.
///

pub struct Object {
    ty: TypeHandle,
    slots: RwLock<Vec<Value>>,
}

impl Object {
    pub(crate) fn new(ty: TypeHandle) -> Self {
        let slots = ty.slot_types().iter().map(|t| t.default_value()).collect();

        Self {
            ty,
            slots: RwLock::new(slots),
        }
    }

    #[must_use]
    pub const fn type_handle(&self) -> &TypeHandle {
        &self.ty
    }

    /// Read one slot.
    pub fn slot(&self, slot: usize) -> Result<Value, Error> {
        let slots = self
            .slots
            .read()
            .expect("object slot RwLock poisoned while acquiring read lock");

        slots
            .get(slot)
            .cloned()
            .ok_or_else(|| self.slot_out_of_range(slot))
    }

    /// Write one slot, converting the value to the slot's declared type.
    pub fn set_slot(&self, slot: usize, value: Value) -> Result<(), Error> {
        let ty = self
            .ty
            .slot_types()
            .get(slot)
            .ok_or_else(|| self.slot_out_of_range(slot))?;
        let value = cast_value(value, ty)?;

        let mut slots = self
            .slots
            .write()
            .expect("object slot RwLock poisoned while acquiring write lock");
        slots[slot] = value;

        Ok(())
    }

    /// Copy of every slot, base slots first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Value> {
        self.slots
            .read()
            .expect("object slot RwLock poisoned while acquiring read lock")
            .clone()
    }

    fn slot_out_of_range(&self, slot: usize) -> Error {
        Error::internal(
            ErrorOrigin::Model,
            format!("slot {slot} out of range on '{}'", self.ty.name()),
        )
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.ty.name());
        let snapshot = self.snapshot();

        for member in self.ty.members() {
            let value = member.backing_slot().and_then(|slot| snapshot.get(slot));
            match value {
                Some(v) => s.field(member.name(), &v),
                None => s.field(member.name(), &"<computed>"),
            };
        }

        s.finish()
    }
}

///
/// ObjectRef
///
/// Shared reference to an `Object`. Equality is structural: same type
/// definition and equal slots. A pair met again while it is still being
/// compared counts as equal, so cyclic graphs compare by shape.
///

#[derive(Clone, Deref)]
pub struct ObjectRef(Arc<Object>);

impl ObjectRef {
    pub(crate) fn new(object: Object) -> Self {
        Self(Arc::new(object))
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).addr()
    }

    /// Read a field or property by name through its declared accessor.
    pub fn get(&self, name: &str) -> Result<Value, Error> {
        let member = self.ty.find_member(name).ok_or_else(|| {
            Error::member_resolution(
                ErrorOrigin::Model,
                format!("type '{}' has no member '{name}'", self.ty.name()),
            )
        })?;

        member.load(Some(self))
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }

        if self.ty != other.ty {
            return false;
        }
        let Some(_guard) = VisitGuard::enter(Visit::Compare(self.addr(), other.addr())) else {
            return true;
        };

        self.snapshot() == other.snapshot()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(_guard) = VisitGuard::enter(Visit::Print(self.addr())) else {
            return write!(f, "{} {{ <cycle> }}", self.ty.name());
        };

        fmt::Debug::fmt(&*self.0, f)
    }
}

impl Serialize for ObjectRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(_guard) = VisitGuard::enter(Visit::Serialize(self.addr())) else {
            return Err(S::Error::custom(format!(
                "object of type '{}' refers back to itself",
                self.ty.name()
            )));
        };

        let mut s = serializer.serialize_struct("Object", 2)?;
        s.serialize_field("type", self.ty.name())?;
        s.serialize_field("slots", &self.snapshot())?;
        s.end()
    }
}
