use crate::{
    accessor::{
        Accessor, AccessorKey, AccessorKind, AccessorRequest, AccessorSynthesizer, InvocationShape,
        check_binding,
        member::{convert_out, instance_param},
    },
    error::{Error, ErrorOrigin},
    ir::{Expr, Lambda, ParamDecl},
    model::{CtorRef, MethodRef, ParamModel},
    value::ValueType,
};
use std::sync::Arc;

impl AccessorSynthesizer {
    /// `(instance, args...) -> result` for a method. Void methods return
    /// `Null`.
    pub fn method_invoker(
        &self,
        method: &MethodRef,
        request: &AccessorRequest,
    ) -> Result<Arc<Accessor>, Error> {
        let model = method.model();
        check_binding(request, model.is_static, method)?;

        let (instance_ty, value_ty) = match request.shape {
            InvocationShape::Generic => (Some(ValueType::Any), ValueType::Any),
            InvocationShape::Typed => (
                (!model.is_static).then(|| {
                    request
                        .instance_ty
                        .clone()
                        .unwrap_or_else(|| method.owner().value_type())
                }),
                request
                    .value_ty
                    .clone()
                    .unwrap_or_else(|| model.result_type()),
            ),
        };
        let key = AccessorKey {
            member: method.id(),
            kind: AccessorKind::Invoke,
            shape: request.shape,
            instance_ty,
            value_ty,
            param_tys: boundary_params(&model.params, request, method.name())?,
        };

        self.cache.get_or_build(key, |key| {
            let (mut params, instance) = instance_param(key, method.owner(), model.is_static)?;
            let args = bind_arguments(&mut params, &model.params, key)?;
            let call = Expr::call(instance, method, args)?;

            Lambda::new(params, convert_out(call, key)?)
        })
    }

    /// `(args...) -> instance` for a constructor.
    pub fn constructor_invoker(
        &self,
        ctor: &CtorRef,
        request: &AccessorRequest,
    ) -> Result<Arc<Accessor>, Error> {
        check_binding(request, true, ctor)?;

        let model = ctor.model();
        let value_ty = match request.shape {
            InvocationShape::Generic => ValueType::Any,
            InvocationShape::Typed => request
                .value_ty
                .clone()
                .unwrap_or_else(|| ctor.owner().value_type()),
        };
        let key = AccessorKey {
            member: ctor.id(),
            kind: AccessorKind::Construct,
            shape: request.shape,
            instance_ty: None,
            value_ty,
            param_tys: boundary_params(&model.params, request, ctor.owner().name())?,
        };

        self.cache.get_or_build(key, |key| {
            let mut params = Vec::new();
            let args = bind_arguments(&mut params, &model.params, key)?;
            let new = Expr::new_object(ctor, args)?;

            Lambda::new(params, convert_out(new, key)?)
        })
    }
}

// Boundary parameter types: one `List<any>` for the generic shape,
// otherwise the requested or declared parameter types.
fn boundary_params(
    declared: &[ParamModel],
    request: &AccessorRequest,
    callee: &str,
) -> Result<Vec<ValueType>, Error> {
    match (request.shape, &request.param_tys) {
        (InvocationShape::Generic, _) => Ok(vec![ValueType::list(ValueType::Any)]),
        (InvocationShape::Typed, None) => Ok(declared.iter().map(|p| p.ty.clone()).collect()),
        (InvocationShape::Typed, Some(tys)) if tys.len() == declared.len() => Ok(tys.clone()),
        (InvocationShape::Typed, Some(tys)) => Err(Error::invalid_operation(
            ErrorOrigin::Accessor,
            format!(
                "'{callee}' takes {} parameters, {} parameter types requested",
                declared.len(),
                tys.len()
            ),
        )),
    }
}

// Declare the boundary parameters and build one argument per declared
// parameter, cast to its type.
fn bind_arguments(
    params: &mut Vec<ParamDecl>,
    declared: &[ParamModel],
    key: &AccessorKey,
) -> Result<Vec<Expr>, Error> {
    let first = params.len();
    match key.shape {
        InvocationShape::Generic => {
            let list_ty = ValueType::list(ValueType::Any);
            params.push(ParamDecl::new("args", list_ty.clone()));
            declared
                .iter()
                .enumerate()
                .map(|(i, p)| Expr::index(Expr::param(first, list_ty.clone()), i)?.cast(&p.ty))
                .collect()
        }
        InvocationShape::Typed => declared
            .iter()
            .zip(&key.param_tys)
            .enumerate()
            .map(|(i, (p, ty))| {
                params.push(ParamDecl::new(p.name.clone(), ty.clone()));
                Expr::param(first + i, ty.clone()).cast(&p.ty)
            })
            .collect(),
    }
}
