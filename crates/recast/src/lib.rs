//! ## Crate layout
//! - `core`: values, runtime type metadata, the typed IR and the cached
//!   accessor/invoker synthesizer.
//! - `schema`: type descriptors and the synthesis engine.
//! - `projection`: projection configuration, name matching, value maps and
//!   the projection compiler.
//! - `query`: applies compiled projections over row iterators.
//! - `config`: TOML-loadable workspace configuration.
//!
//! The `prelude` module carries what a caller needs to declare and run a
//! projection.
#![warn(unreachable_pub)]

pub use recast_core as core;
pub use recast_schema as schema;

pub mod config;
pub mod projection;
pub mod query;

pub use recast_core::error::{Error, ErrorClass, ErrorOrigin};

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        config::RecastConfig,
        projection::{
            CompiledProjection, CtorParamTarget, MemberTarget, Projection, ProjectionCompiler,
            ProjectionConfiguration, ProjectionSource, ProjectionTarget, UnmappedPolicy, ValueMap,
        },
        query::{ProjectExt as _, build_query},
    };
    pub use recast_core::prelude::*;
    pub use recast_schema::prelude::{FieldDescriptor, PropertyDescriptor, TypeDescriptor};
}
