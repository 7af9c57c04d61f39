//! Type descriptors and the synthesis engine that turns them into runtime
//! record types.
#![warn(unreachable_pub)]

pub mod build;
pub mod error;
pub mod node;
pub mod validate;
pub mod visit;

/// Maximum length for type and member identifiers.
pub const MAX_TYPE_NAME_LEN: usize = 128;

/// Maximum number of members one descriptor may declare.
pub const MAX_MEMBERS: usize = 256;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        build::{SynthesisEngine, SynthesisOptions},
        err,
        error::ErrorTree,
        node::*,
    };
}
