use crate::projection::{MemberNameMatchStrategy, ProjectionSource, ValueMap};
use recast_core::{
    accessor::AccessorSynthesizer,
    error::{Error, ErrorOrigin},
    ir::{Expr, ExprKind},
    model::{MemberRef, TypeHandle},
    value::ValueType,
};

///
/// Inference
///
/// What an `Inferred` source is matched against.
///

#[derive(Clone, Copy, Debug)]
pub(super) enum Inference<'a> {
    Member(&'a str),
    Param(&'a str),
}

///
/// Binder
///
/// Builds source-side IR over the compiler's single source parameter.
///

pub(super) struct Binder<'a> {
    accessors: &'a AccessorSynthesizer,
    source: &'a TypeHandle,
    strategy: &'a dyn MemberNameMatchStrategy,
    param: Expr,
}

impl<'a> Binder<'a> {
    pub(super) fn new(
        accessors: &'a AccessorSynthesizer,
        source: &'a TypeHandle,
        strategy: &'a dyn MemberNameMatchStrategy,
    ) -> Self {
        Self {
            accessors,
            source,
            strategy,
            param: Expr::param(0, source.value_type()),
        }
    }

    /// Source IR before value mapping and conversion.
    pub(super) fn source_expr(
        &self,
        source: &ProjectionSource,
        inference: Inference<'_>,
    ) -> Result<Expr, Error> {
        match source {
            ProjectionSource::Constant(value) => Ok(Expr::constant(value.clone())),
            ProjectionSource::Expression(expr) => expr.rebind(std::slice::from_ref(&self.param)),
            ProjectionSource::Inferred => self.infer(inference),
            ProjectionSource::Lambda(lambda) => {
                if lambda.params().len() != 1 {
                    return Err(Error::invalid_operation(
                        ErrorOrigin::Projection,
                        format!(
                            "source lambda must take the source object only, it takes {} parameters",
                            lambda.params().len()
                        ),
                    ));
                }
                lambda.apply(vec![self.param.clone()])
            }
            ProjectionSource::Path(path) => self.path(path),
        }
    }

    // First hop reads the source directly; later hops propagate null.
    fn path(&self, path: &str) -> Result<Expr, Error> {
        let mut current: Option<Expr> = None;
        let mut owner = Some(self.source.clone());

        for segment in path.split('.') {
            let Some(ty) = owner.take() else {
                let found = current.as_ref().map_or(ValueType::Any, |e| e.ty().clone());
                return Err(Error::member_resolution(
                    ErrorOrigin::Projection,
                    format!("'{segment}' in path '{path}' is read from {found}, which has no members"),
                ));
            };
            let member = ty.find_member(segment).ok_or_else(|| {
                Error::member_resolution(
                    ErrorOrigin::Projection,
                    format!("'{segment}' in path '{path}' is not a member of {ty}"),
                )
            })?;

            let next = match current {
                None => {
                    let instance = (!member.is_static()).then(|| self.param.clone());
                    self.accessors.read_member(instance, &member)?
                }
                Some(instance) => Expr::navigate(instance, &member)?,
            };

            owner = next.ty().underlying().object_type().cloned();
            current = Some(next);
        }

        current.ok_or_else(|| Error::member_resolution(ErrorOrigin::Projection, "empty member path"))
    }

    fn infer(&self, inference: Inference<'_>) -> Result<Expr, Error> {
        let (name, candidates): (&str, Vec<MemberRef>) = match inference {
            Inference::Member(name) => (
                name,
                self.readable()
                    .filter(|m| self.strategy.member_matches_source_member(name, m.name()))
                    .collect(),
            ),
            Inference::Param(name) => (
                name,
                self.readable()
                    .filter(|m| self.strategy.parameter_matches_source_member(name, m.name()))
                    .collect(),
            ),
        };

        match candidates.as_slice() {
            [member] => self.accessors.read_member(Some(self.param.clone()), member),
            [] => Err(Error::member_resolution(
                ErrorOrigin::Projection,
                format!("no member of {} matches '{name}'", self.source),
            )),
            many => Err(Error::member_resolution(
                ErrorOrigin::Projection,
                format!(
                    "'{name}' matches several members of {}: {}",
                    self.source,
                    many.iter().map(MemberRef::name).collect::<Vec<_>>().join(", ")
                ),
            )),
        }
    }

    fn readable(&self) -> impl Iterator<Item = MemberRef> {
        self.source
            .members()
            .into_iter()
            .filter(|m| !m.is_static() && m.is_readable())
    }
}

/// Apply the value map, then convert to the assigned type. Unmapped
/// literals go through the constant conversion table.
pub(super) fn finish(value: Expr, map: Option<&ValueMap>, ty: &ValueType) -> Result<Expr, Error> {
    if let Some(map) = map {
        return map.lower(value, ty)?.convert(ty);
    }
    if let ExprKind::Constant(literal) = value.kind() {
        return Expr::typed_constant(literal.clone(), ty);
    }

    value.convert(ty)
}
