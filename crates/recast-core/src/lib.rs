//! Core runtime for Recast: values and their conversion table, runtime type
//! metadata, the typed IR with its closure compiler, and the cached
//! accessor/invoker synthesizer built on top of it.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod accessor;
pub mod error;
pub mod ir;
pub mod model;
pub mod value;

///
/// Prelude
///
/// Domain vocabulary only. Caches, compilers and errors stay in their
/// modules.
///

pub mod prelude {
    pub use crate::{
        model::{ObjectRef, TypeHandle, TypeModel},
        value::{Value, ValueType},
    };
}
