use crate::{
    accessor::{
        Accessor, AccessorKey, AccessorKind, AccessorRequest, AccessorSynthesizer,
        InvocationShape, check_binding,
    },
    error::{Error, ErrorOrigin},
    ir::{AssignTarget, Expr, Lambda, ParamDecl},
    model::{FieldRef, MemberRef, PropertyRef, TypeHandle},
    value::ValueType,
};
use std::sync::Arc;

impl AccessorSynthesizer {
    /// `instance -> value` for a field.
    pub fn field_getter(
        &self,
        field: &FieldRef,
        request: &AccessorRequest,
    ) -> Result<Arc<Accessor>, Error> {
        self.getter(&MemberRef::Field(field.clone()), request)
    }

    /// `(instance, value) -> ()` for a field. Write-once fields go through
    /// their write primitive.
    pub fn field_setter(
        &self,
        field: &FieldRef,
        request: &AccessorRequest,
    ) -> Result<Arc<Accessor>, Error> {
        self.setter(&MemberRef::Field(field.clone()), request)
    }

    /// `instance -> value` through the property's getter.
    pub fn property_getter(
        &self,
        property: &PropertyRef,
        request: &AccessorRequest,
    ) -> Result<Arc<Accessor>, Error> {
        self.getter(&MemberRef::Property(property.clone()), request)
    }

    /// `(instance, value) -> ()` through the property's setter.
    pub fn property_setter(
        &self,
        property: &PropertyRef,
        request: &AccessorRequest,
    ) -> Result<Arc<Accessor>, Error> {
        self.setter(&MemberRef::Property(property.clone()), request)
    }

    /// Getter for any data member.
    pub fn getter(
        &self,
        member: &MemberRef,
        request: &AccessorRequest,
    ) -> Result<Arc<Accessor>, Error> {
        check_binding(request, member.is_static(), member)?;
        if !member.is_readable() {
            return Err(Error::invalid_operation(
                ErrorOrigin::Accessor,
                format!("{member:?} has no getter"),
            ));
        }

        let key = boundary_key(member, AccessorKind::Get, request);
        self.cache.get_or_build(key, |key| {
            let (params, instance) = instance_param(key, member.owner(), member.is_static())?;
            let read = self.read_member(instance, member)?;

            Lambda::new(params, convert_out(read, key)?)
        })
    }

    /// Setter for any data member.
    pub fn setter(
        &self,
        member: &MemberRef,
        request: &AccessorRequest,
    ) -> Result<Arc<Accessor>, Error> {
        check_binding(request, member.is_static(), member)?;
        // fail before touching the cache
        self.assign_target(member)?;

        let key = boundary_key(member, AccessorKind::Set, request);
        self.cache.get_or_build(key, |key| {
            let (mut params, instance) = instance_param(key, member.owner(), member.is_static())?;
            let index = params.len();
            params.push(ParamDecl::new("value", key.value_ty.clone()));
            let value = Expr::param(index, key.value_ty.clone()).cast(member.ty())?;
            let body = self.assign_member(instance, member, value)?;

            Lambda::new(params, body)
        })
    }

    // ------------------------------------------------------------------
    // IR fragments (uncached)
    // ------------------------------------------------------------------

    /// Read a data member. Properties go through their getter method.
    pub fn read_member(&self, instance: Option<Expr>, member: &MemberRef) -> Result<Expr, Error> {
        match member {
            MemberRef::Field(field) => Expr::field_get(instance, field),
            MemberRef::Property(property) => {
                let getter = property.getter().ok_or_else(|| {
                    Error::invalid_operation(
                        ErrorOrigin::Accessor,
                        format!("{property:?} has no getter"),
                    )
                })?;
                Expr::call(instance, &getter, Vec::new())
            }
        }
    }

    /// How a member is written from generated IR: direct field store,
    /// setter call, or the write primitive for write-once fields.
    pub fn assign_target(&self, member: &MemberRef) -> Result<AssignTarget, Error> {
        match member {
            MemberRef::Field(field) if field.model().init_only => Ok(AssignTarget::Primitive(
                self.cache.write_primitive(field),
            )),
            MemberRef::Field(field) => Ok(AssignTarget::Field(field.clone())),
            MemberRef::Property(property) => property.setter().map(AssignTarget::Setter).ok_or_else(
                || {
                    Error::invalid_operation(
                        ErrorOrigin::Accessor,
                        format!("{property:?} has no settable accessor"),
                    )
                },
            ),
        }
    }

    /// Assign `value` to a member as a standalone expression.
    pub fn assign_member(
        &self,
        instance: Option<Expr>,
        member: &MemberRef,
        value: Expr,
    ) -> Result<Expr, Error> {
        match self.assign_target(member)? {
            AssignTarget::Field(field) => Expr::field_set(instance, &field, value),
            AssignTarget::Primitive(primitive) => Expr::write_primitive(&primitive, instance, value),
            AssignTarget::Setter(setter) => Expr::call(instance, &setter, vec![value]),
        }
    }
}

// Effective boundary types for a data-member accessor.
fn boundary_key(
    member: &MemberRef,
    kind: AccessorKind,
    request: &AccessorRequest,
) -> AccessorKey {
    let (instance_ty, value_ty) = match request.shape {
        InvocationShape::Generic => (Some(ValueType::Any), ValueType::Any),
        InvocationShape::Typed => (
            (!member.is_static())
                .then(|| request.instance_ty.clone().unwrap_or_else(|| member.owner().value_type())),
            request.value_ty.clone().unwrap_or_else(|| member.ty().clone()),
        ),
    };

    AccessorKey {
        member: member.id(),
        kind,
        shape: request.shape,
        instance_ty,
        value_ty,
        param_tys: Vec::new(),
    }
}

/// Declared instance parameter plus the receiver expression cast to the
/// owner. Generic accessors of static members take an instance they ignore.
pub(super) fn instance_param(
    key: &AccessorKey,
    owner: &TypeHandle,
    is_static: bool,
) -> Result<(Vec<ParamDecl>, Option<Expr>), Error> {
    let Some(ty) = &key.instance_ty else {
        return Ok((Vec::new(), None));
    };

    let params = vec![ParamDecl::new("instance", ty.clone())];
    if is_static {
        return Ok((params, None));
    }
    let receiver = Expr::param(0, ty.clone()).cast(&owner.value_type())?;

    Ok((params, Some(receiver)))
}

/// Convert an accessor result to the key's value type.
pub(super) fn convert_out(expr: Expr, key: &AccessorKey) -> Result<Expr, Error> {
    expr.cast(&key.value_ty)
}
