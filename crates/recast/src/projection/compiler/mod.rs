//! Projection Compiler.
//!
//! Binds a [`ProjectionConfiguration`] against source and target metadata
//! and emits one lambda from the source object to a new target instance.
//! All binding happens here; a compiled projection never fails to resolve
//! a member at invocation time.

mod ctor;
mod resolve;

use crate::{
    config::RecastConfig,
    projection::{
        CamelCaseMatchStrategy, CompiledProjection, MemberNameMatchStrategy, ProjectedMember,
        ProjectionConfiguration, ProjectionTarget, TargetSpec,
        compiled::{ArgOrigin, CtorArg, MemberAssignment},
    },
};
use ctor::Slot;
use recast_core::{
    accessor::AccessorSynthesizer,
    error::{Error, ErrorOrigin},
    ir::Expr,
    model::{MemberRef, TypeHandle},
    value::Value,
};
use recast_schema::{
    build::SynthesisEngine,
    node::{PropertyDescriptor, TypeDescriptor},
};
use resolve::{Binder, Inference, finish};
use std::sync::{Arc, LazyLock};
use tracing::debug;

static GLOBAL: LazyLock<ProjectionCompiler> =
    LazyLock::new(|| ProjectionCompiler::with_config(&RecastConfig::default()));

///
/// ProjectionCompiler
///
/// Holds the accessor cache and synthesis engine it builds with. Cloning
/// shares both.
///

#[derive(Clone, Debug)]
pub struct ProjectionCompiler {
    accessors: AccessorSynthesizer,
    engine: Arc<SynthesisEngine>,
    strategy: Arc<dyn MemberNameMatchStrategy>,
}

impl Default for ProjectionCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectionCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(
            AccessorSynthesizer::new(),
            Arc::new(SynthesisEngine::new()),
            Arc::new(CamelCaseMatchStrategy),
        )
    }

    #[must_use]
    pub fn with_config(config: &RecastConfig) -> Self {
        Self::with_parts(
            AccessorSynthesizer::new(),
            Arc::new(SynthesisEngine::with_options(config.synthesis.clone())),
            config.projection.match_strategy.strategy(),
        )
    }

    #[must_use]
    pub const fn with_parts(
        accessors: AccessorSynthesizer,
        engine: Arc<SynthesisEngine>,
        strategy: Arc<dyn MemberNameMatchStrategy>,
    ) -> Self {
        Self {
            accessors,
            engine,
            strategy,
        }
    }

    /// Process-wide instance built from the default configuration.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    #[must_use]
    pub const fn accessors(&self) -> &AccessorSynthesizer {
        &self.accessors
    }

    #[must_use]
    pub fn engine(&self) -> &SynthesisEngine {
        &self.engine
    }

    #[must_use]
    pub fn strategy(&self) -> &dyn MemberNameMatchStrategy {
        self.strategy.as_ref()
    }

    /// Bind and assemble `config`. Prefer
    /// [`ProjectionConfiguration::compiled`], which memoizes.
    pub fn compile(&self, config: &ProjectionConfiguration) -> Result<Arc<CompiledProjection>, Error> {
        let strategy = config.strategy().unwrap_or(&self.strategy).as_ref();
        let binder = Binder::new(&self.accessors, config.source(), strategy);

        let sources = config
            .members()
            .iter()
            .map(|m| {
                binder
                    .source_expr(&m.source, Inference::Member(m.name()))
                    .map_err(|err| err.context(format!("member '{}'", m.name())))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let target = match config.target() {
            TargetSpec::Declared(handle) => handle.clone(),
            TargetSpec::Synthesized(name) => self.synthesize_target(name, config, &sources)?,
        };

        let (ctor, slots) = ctor::resolve(&target, config, strategy)?;

        // constructor arguments in parameter order
        let mut ctor_args = Vec::with_capacity(slots.len());
        for (param, slot) in ctor.model().params.iter().zip(&slots) {
            let default = param
                .default
                .clone()
                .map(|value| Expr::typed_constant(value, &param.ty))
                .transpose()?;

            let (origin, value) = match *slot {
                Some(Slot::Member(i)) => {
                    let member = &config.members()[i];
                    let value = finish(sources[i].clone(), member.value_map.as_ref(), &param.ty)
                        .map_err(|err| err.context(format!("member '{}'", member.name())))?;

                    (ArgOrigin::Member(member.name().to_string()), value)
                }
                Some(Slot::Param(i)) => {
                    let target = &config.ctor_params()[i];
                    let raw = binder.source_expr(&target.source, Inference::Param(&param.name))?;
                    let value = finish(raw, target.value_map.as_ref(), &param.ty)
                        .map_err(|err| err.context(format!("parameter '{}'", param.name)))?;

                    (ArgOrigin::Param, value)
                }
                None => {
                    let value = match &default {
                        Some(default) => default.clone(),
                        None => Expr::typed_constant(Value::Null, &param.ty)?,
                    };

                    (ArgOrigin::Default, value)
                }
            };

            ctor_args.push(CtorArg {
                param: param.name.clone(),
                origin,
                value,
                default,
            });
        }

        // everything the constructor did not take is initialised afterwards
        let consumed: Vec<usize> = slots
            .iter()
            .filter_map(|slot| match slot {
                Some(Slot::Member(i)) => Some(*i),
                _ => None,
            })
            .collect();

        let mut assignments = Vec::new();
        for (i, spec) in config.members().iter().enumerate() {
            if consumed.contains(&i) {
                continue;
            }
            let member = self.target_member(&target, &spec.member)?;
            let value = finish(sources[i].clone(), spec.value_map.as_ref(), member.ty())
                .map_err(|err| err.context(format!("member '{}'", spec.name())))?;

            assignments.push(MemberAssignment {
                name: spec.name().to_string(),
                target: self.accessors.assign_target(&member)?,
                member,
                value,
            });
        }

        let compiled = CompiledProjection::new(config.source().clone(), ctor, ctor_args, assignments)?;

        debug!(
            source_type = %config.source(),
            target_type = %compiled.target(),
            ctor = %compiled.constructor().model().signature(),
            columns = compiled.columns().len(),
            "projection compiled"
        );

        Ok(Arc::new(compiled))
    }

    fn target_member(&self, target: &TypeHandle, member: &ProjectedMember) -> Result<MemberRef, Error> {
        let resolved = match member {
            ProjectedMember::Member(member) if target.is_subtype_of(member.owner()) => member.clone(),
            ProjectedMember::Member(member) => {
                return Err(Error::member_resolution(
                    ErrorOrigin::Projection,
                    format!("{member:?} is not a member of {target}"),
                ));
            }
            ProjectedMember::Name(name) => target.find_member(name).ok_or_else(|| {
                Error::member_resolution(
                    ErrorOrigin::Projection,
                    format!("{target} has no member '{name}'"),
                )
            })?,
        };

        if resolved.is_static() {
            return Err(Error::invalid_operation(
                ErrorOrigin::Projection,
                format!("static member {resolved:?} cannot be projected"),
            ));
        }

        Ok(resolved)
    }

    // Inferred targets are plain get/set records typed by their sources.
    fn synthesize_target(
        &self,
        name: &str,
        config: &ProjectionConfiguration,
        sources: &[Expr],
    ) -> Result<TypeHandle, Error> {
        let explicit = config.constructor().is_some()
            || !config.ctor_params().is_empty()
            || config
                .members()
                .iter()
                .any(|m| m.ctor_param.is_some() || m.target == ProjectionTarget::CtorParam);
        if explicit {
            return Err(Error::constructor_resolution(
                ErrorOrigin::Projection,
                format!("synthesized target '{name}' cannot honour explicit constructor bindings"),
            ));
        }

        let mut builder = TypeDescriptor::builder(name);
        for (spec, source) in config.members().iter().zip(sources) {
            if let ProjectedMember::Member(member) = &spec.member {
                return Err(Error::member_resolution(
                    ErrorOrigin::Projection,
                    format!("{member:?} cannot be a member of synthesized target '{name}'"),
                ));
            }

            let ty = spec
                .value_map
                .as_ref()
                .and_then(|map| map.mapped_type())
                .unwrap_or_else(|| source.ty().clone());
            let mut property = PropertyDescriptor::new(spec.name(), ty.underlying().clone());
            if ty.is_nullable() {
                property = property.nullable();
            }
            builder = builder.property(property);
        }

        let desc = builder.build_with(self.engine.options())?;

        self.engine.synthesize(&desc)
    }
}
