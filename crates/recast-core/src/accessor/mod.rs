//! Accessor/invoker synthesis.
//!
//! Turns a field, property, method or constructor into a typed IR lambda
//! that performs the access, inserting casts where the requested boundary
//! types differ from the member's own. Results are cached per
//! [`AccessorKey`] and compiled lazily on first use.

mod cache;
mod invoke;
mod member;
mod request;


pub use cache::{AccessorCache, CacheStats};
pub use request::{AccessorKey, AccessorKind, AccessorRequest, Binding, InvocationShape};

use crate::{
    error::{Error, ErrorOrigin},
    ir::{CompiledLambda, Lambda},
    value::Value,
};
use std::{
    fmt,
    sync::{Arc, LazyLock, OnceLock},
};

static GLOBAL: LazyLock<AccessorSynthesizer> = LazyLock::new(AccessorSynthesizer::new);

///
/// Accessor
///
/// One synthesized accessor: its IR and, once requested, the compiled
/// closure tree. Compilation happens at most once.
///

pub struct Accessor {
    key: AccessorKey,
    lambda: Lambda,
    compiled: OnceLock<Result<CompiledLambda, Error>>,
}

impl Accessor {
    pub(crate) const fn new(key: AccessorKey, lambda: Lambda) -> Self {
        Self {
            key,
            lambda,
            compiled: OnceLock::new(),
        }
    }

    #[must_use]
    pub const fn key(&self) -> &AccessorKey {
        &self.key
    }

    #[must_use]
    pub const fn lambda(&self) -> &Lambda {
        &self.lambda
    }

    pub fn compiled(&self) -> Result<&CompiledLambda, Error> {
        self.compiled
            .get_or_init(|| self.lambda.compile())
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Value, Error> {
        self.compiled()?.invoke(args)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("key", &self.key)
            .field("lambda", &self.lambda.to_string())
            .field("compiled", &self.compiled.get().is_some())
            .finish()
    }
}

///
/// AccessorSynthesizer
///
/// Entry point for accessor synthesis. Cloning shares the cache.
///

#[derive(Clone, Debug, Default)]
pub struct AccessorSynthesizer {
    cache: Arc<AccessorCache>,
}

impl AccessorSynthesizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_cache(cache: Arc<AccessorCache>) -> Self {
        Self { cache }
    }

    /// Process-wide instance.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    #[must_use]
    pub fn cache(&self) -> &AccessorCache {
        &self.cache
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

// Fail when an explicit binding request disagrees with the member.
fn check_binding(
    request: &AccessorRequest,
    is_static: bool,
    member: &dyn fmt::Debug,
) -> Result<(), Error> {
    match (request.binding, is_static) {
        (Some(Binding::Instance), true) => Err(Error::invalid_operation(
            ErrorOrigin::Accessor,
            format!("{member:?} is static but an instance accessor was requested"),
        )),
        (Some(Binding::Static), false) => Err(Error::invalid_operation(
            ErrorOrigin::Accessor,
            format!("{member:?} is an instance member but a static accessor was requested"),
        )),
        _ => Ok(()),
    }
}
