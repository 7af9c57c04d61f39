use crate::projection::{
    CompiledProjection, MemberNameMatchStrategy, ProjectionCompiler, ValueMap,
};
use recast_core::{
    error::Error,
    ir::{Expr, Lambda},
    model::{CtorRef, MemberRef, TypeHandle},
    value::Value,
};
use derive_more::Display;
use std::sync::{Arc, OnceLock};

///
/// ProjectedMember
///
/// Target member named by declared handle or by name. Names are looked up
/// on the target type when the projection is compiled.
///

#[derive(Clone, Debug)]
#[remain::sorted]
pub enum ProjectedMember {
    Member(MemberRef),
    Name(String),
}

impl ProjectedMember {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Member(member) => member.name(),
            Self::Name(name) => name,
        }
    }
}

///
/// ProjectionSource
///
/// Where an assigned value comes from. `Expression` and `Lambda` sources
/// take the source object as their only parameter.
///

#[derive(Clone, Debug, Default)]
#[remain::sorted]
pub enum ProjectionSource {
    Constant(Value),
    Expression(Expr),
    /// The uniquely matching source member, found by the name strategy.
    #[default]
    Inferred,
    Lambda(Lambda),
    /// Dotted member path; hops after the first propagate null.
    Path(String),
}

impl ProjectionSource {
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }
}

///
/// ProjectionTarget
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[remain::sorted]
pub enum ProjectionTarget {
    /// Constructor parameter when the resolved constructor has a matching
    /// one, member initialisation otherwise.
    #[default]
    Auto,
    CtorParam,
    Member,
}

///
/// MemberTarget
///

#[derive(Clone, Debug)]
pub struct MemberTarget {
    pub member: ProjectedMember,
    pub source: ProjectionSource,
    pub target: ProjectionTarget,
    pub value_map: Option<ValueMap>,

    /// Explicit constructor parameter this member is bound to.
    pub ctor_param: Option<String>,
}

impl MemberTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_member(ProjectedMember::Name(name.into()))
    }

    #[must_use]
    pub fn for_member(member: &MemberRef) -> Self {
        Self::with_member(ProjectedMember::Member(member.clone()))
    }

    const fn with_member(member: ProjectedMember) -> Self {
        Self {
            member,
            source: ProjectionSource::Inferred,
            target: ProjectionTarget::Auto,
            value_map: None,
            ctor_param: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.member.name()
    }

    #[must_use]
    pub fn source(mut self, source: ProjectionSource) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub const fn target(mut self, target: ProjectionTarget) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn value_map(mut self, map: ValueMap) -> Self {
        self.value_map = Some(map);
        self
    }

    /// Bind to the named constructor parameter.
    #[must_use]
    pub fn ctor_param(mut self, param: impl Into<String>) -> Self {
        self.ctor_param = Some(param.into());
        self.target = ProjectionTarget::CtorParam;
        self
    }
}

///
/// CtorParamRef
///

#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[remain::sorted]
pub enum CtorParamRef {
    #[display("'{_0}'")]
    Name(String),
    #[display("#{_0}")]
    Position(usize),
}

///
/// CtorParamTarget
///
/// A constructor argument that does not originate from a target member.
///

#[derive(Clone, Debug)]
pub struct CtorParamTarget {
    pub param: CtorParamRef,
    pub source: ProjectionSource,
    pub value_map: Option<ValueMap>,
}

impl CtorParamTarget {
    pub fn named(name: impl Into<String>, source: ProjectionSource) -> Self {
        Self {
            param: CtorParamRef::Name(name.into()),
            source,
            value_map: None,
        }
    }

    #[must_use]
    pub const fn positional(index: usize, source: ProjectionSource) -> Self {
        Self {
            param: CtorParamRef::Position(index),
            source,
            value_map: None,
        }
    }

    #[must_use]
    pub fn value_map(mut self, map: ValueMap) -> Self {
        self.value_map = Some(map);
        self
    }
}

///
/// TargetSpec
///

#[derive(Clone, Debug)]
#[remain::sorted]
pub enum TargetSpec {
    Declared(TypeHandle),
    /// Synthesize a record type with this name from the member list.
    Synthesized(String),
}

///
/// ProjectionConfiguration
///
/// Mapping rules from one source type to a target type. Compiled at most
/// once; the first compiler to ask fixes the result for every later caller.
///

#[derive(Clone, Debug)]
pub struct ProjectionConfiguration {
    source: TypeHandle,
    target: TargetSpec,
    members: Vec<MemberTarget>,
    ctor_params: Vec<CtorParamTarget>,
    constructor: Option<CtorRef>,
    strategy: Option<Arc<dyn MemberNameMatchStrategy>>,
    compiled: OnceLock<Result<Arc<CompiledProjection>, Error>>,
}

impl ProjectionConfiguration {
    #[must_use]
    pub fn builder(source: &TypeHandle) -> ProjectionConfigurationBuilder {
        ProjectionConfigurationBuilder::new(source)
    }

    #[must_use]
    pub const fn source(&self) -> &TypeHandle {
        &self.source
    }

    #[must_use]
    pub const fn target(&self) -> &TargetSpec {
        &self.target
    }

    #[must_use]
    pub fn members(&self) -> &[MemberTarget] {
        &self.members
    }

    #[must_use]
    pub fn ctor_params(&self) -> &[CtorParamTarget] {
        &self.ctor_params
    }

    #[must_use]
    pub const fn constructor(&self) -> Option<&CtorRef> {
        self.constructor.as_ref()
    }

    #[must_use]
    pub fn strategy(&self) -> Option<&Arc<dyn MemberNameMatchStrategy>> {
        self.strategy.as_ref()
    }

    /// Compile through `compiler` on first use and memoize the outcome,
    /// failures included.
    pub fn compiled(&self, compiler: &ProjectionCompiler) -> Result<Arc<CompiledProjection>, Error> {
        self.compiled
            .get_or_init(|| compiler.compile(self))
            .clone()
    }

    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }
}

///
/// ProjectionConfigurationBuilder
///

#[derive(Clone, Debug)]
pub struct ProjectionConfigurationBuilder {
    inner: ProjectionConfiguration,
}

impl ProjectionConfigurationBuilder {
    /// Without an explicit target the projection synthesizes
    /// `{Source}Projection`.
    #[must_use]
    pub fn new(source: &TypeHandle) -> Self {
        Self {
            inner: ProjectionConfiguration {
                source: source.clone(),
                target: TargetSpec::Synthesized(format!("{}Projection", source.name())),
                members: Vec::new(),
                ctor_params: Vec::new(),
                constructor: None,
                strategy: None,
                compiled: OnceLock::new(),
            },
        }
    }

    #[must_use]
    pub fn target(mut self, target: &TypeHandle) -> Self {
        self.inner.target = TargetSpec::Declared(target.clone());
        self
    }

    #[must_use]
    pub fn synthesize_as(mut self, name: impl Into<String>) -> Self {
        self.inner.target = TargetSpec::Synthesized(name.into());
        self
    }

    /// Map a target member by name. A later entry for the same name
    /// replaces the earlier one.
    #[must_use]
    pub fn member(self, name: impl Into<String>, source: ProjectionSource) -> Self {
        self.member_with(MemberTarget::new(name).source(source))
    }

    #[must_use]
    pub fn member_with(mut self, member: MemberTarget) -> Self {
        self.inner.members.retain(|m| m.name() != member.name());
        self.inner.members.push(member);
        self
    }

    #[must_use]
    pub fn ctor_param(mut self, param: CtorParamTarget) -> Self {
        self.inner.ctor_params.retain(|p| p.param != param.param);
        self.inner.ctor_params.push(param);
        self
    }

    #[must_use]
    pub fn constructor(mut self, ctor: &CtorRef) -> Self {
        self.inner.constructor = Some(ctor.clone());
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: Arc<dyn MemberNameMatchStrategy>) -> Self {
        self.inner.strategy = Some(strategy);
        self
    }

    #[must_use]
    pub fn build(self) -> ProjectionConfiguration {
        self.inner
    }
}
