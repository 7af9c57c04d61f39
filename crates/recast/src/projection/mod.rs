//! Projection configuration, name matching, value maps and the projection
//! compiler.

mod compiled;
mod compiler;
mod config;
mod strategy;
mod value_map;

#[cfg(test)]
mod tests;

pub use compiled::{CompiledProjection, Projection};
pub use compiler::ProjectionCompiler;
pub use config::{
    CtorParamRef, CtorParamTarget, MemberTarget, ProjectedMember, ProjectionConfiguration,
    ProjectionConfigurationBuilder, ProjectionSource, ProjectionTarget, TargetSpec,
};
pub use strategy::{CamelCaseMatchStrategy, ExactMatchStrategy, MemberNameMatchStrategy};
pub use value_map::{UnmappedPolicy, ValueMap};
