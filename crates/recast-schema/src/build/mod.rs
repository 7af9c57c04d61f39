//! Type Synthesis Engine.
//!
//! Turns validated descriptors into runtime types. Handles are registered
//! by type name; every emitted definition is also appended to the module,
//! which never shrinks.

mod emit;
mod signature;

#[cfg(test)]
mod tests;

pub use signature::{SignatureMember, TypeSignature};

use crate::{error::ErrorTree, node::TypeDescriptor, validate::validate_descriptor};
use recast_core::{
    error::{Error, ErrorOrigin},
    model::TypeHandle,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{LazyLock, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use thiserror::Error as ThisError;
use tracing::{info, trace, warn};

static GLOBAL: LazyLock<SynthesisEngine> = LazyLock::new(SynthesisEngine::new);

///
/// BuildError
///

#[derive(Debug, ThisError)]
pub enum BuildError {
    #[error("type '{name}' failed validation:\n{tree}")]
    Validation { name: String, tree: ErrorTree },

    #[error(
        "type '{name}' is already synthesized with signature {existing:016x} and re-synthesis is disabled"
    )]
    ResynthesisDisabled { name: String, existing: u64 },
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        let origin = match &err {
            BuildError::Validation { .. } => ErrorOrigin::Schema,
            BuildError::ResynthesisDisabled { .. } => ErrorOrigin::Synthesis,
        };

        Self::descriptor_invalid(origin, err.to_string())
    }
}

///
/// SynthesisOptions
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthesisOptions {
    pub max_type_name_len: usize,
    pub max_members: usize,

    /// When false, a signature change under an existing name is an error
    /// instead of replacing the registration.
    pub allow_resynthesis: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            max_type_name_len: crate::MAX_TYPE_NAME_LEN,
            max_members: crate::MAX_MEMBERS,
            allow_resynthesis: true,
        }
    }
}

///
/// EngineStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EngineStats {
    /// Names currently registered.
    pub registered: usize,
    /// Definitions ever emitted, including replaced ones.
    pub emitted: usize,
}

///
/// Registration
///

#[derive(Clone, Debug)]
struct Registration {
    signature: TypeSignature,
    handle: TypeHandle,
}

///
/// SynthesisEngine
///
/// Registry lookups take a shared read lock only. Emission is serialized
/// behind the module lock and re-checks the registry once it holds it, so
/// racing callers for one name emit a single definition.
///

#[derive(Debug, Default)]
pub struct SynthesisEngine {
    options: SynthesisOptions,
    registry: RwLock<HashMap<String, Registration>>,
    module: Mutex<Vec<TypeHandle>>,
}

impl SynthesisEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: SynthesisOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Process-wide instance with default options.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    #[must_use]
    pub const fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    /// Return the type registered for the descriptor's name when its
    /// signature matches, otherwise emit and register a new definition.
    pub fn synthesize(&self, desc: &TypeDescriptor) -> Result<TypeHandle, Error> {
        validate_descriptor(desc, &self.options).map_err(|tree| BuildError::Validation {
            name: desc.name().to_string(),
            tree,
        })?;

        let signature = TypeSignature::of(desc);
        if let Some(handle) = self.cached(desc.name(), &signature) {
            trace!(type_name = desc.name(), "synthesized type cache hit");
            return Ok(handle);
        }

        let mut module = self
            .module
            .lock()
            .expect("synthesis module Mutex poisoned while acquiring lock");

        // another caller may have emitted it while we waited
        let previous = self.registry_read().get(desc.name()).cloned();
        if let Some(prev) = &previous {
            if prev.signature == signature {
                return Ok(prev.handle.clone());
            }
            if !self.options.allow_resynthesis {
                return Err(BuildError::ResynthesisDisabled {
                    name: desc.name().to_string(),
                    existing: prev.signature.fingerprint(),
                }
                .into());
            }
        }

        let handle = emit::emit(desc)?;
        module.push(handle.clone());

        let fingerprint = format!("{:016x}", signature.fingerprint());
        self.registry_write().insert(
            desc.name().to_string(),
            Registration {
                signature,
                handle: handle.clone(),
            },
        );

        match previous {
            Some(prev) => warn!(
                type_name = desc.name(),
                previous = %format!("{:016x}", prev.signature.fingerprint()),
                signature = %fingerprint,
                module_len = module.len(),
                "type re-synthesized; previous definition stays in the module"
            ),
            None => info!(
                type_name = desc.name(),
                signature = %fingerprint,
                members = desc.member_count(),
                "type synthesized"
            ),
        }

        Ok(handle)
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<TypeHandle> {
        self.registry_read().get(name).map(|r| r.handle.clone())
    }

    #[must_use]
    pub fn signature(&self, name: &str) -> Option<TypeSignature> {
        self.registry_read().get(name).map(|r| r.signature.clone())
    }

    /// Number of definitions ever emitted. Never decreases.
    #[must_use]
    pub fn module_len(&self) -> usize {
        self.module
            .lock()
            .expect("synthesis module Mutex poisoned while acquiring lock")
            .len()
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            registered: self.registry_read().len(),
            emitted: self.module_len(),
        }
    }

    fn cached(&self, name: &str, signature: &TypeSignature) -> Option<TypeHandle> {
        self.registry_read()
            .get(name)
            .filter(|r| r.signature == *signature)
            .map(|r| r.handle.clone())
    }

    fn registry_read(&self) -> RwLockReadGuard<'_, HashMap<String, Registration>> {
        self.registry
            .read()
            .expect("synthesis registry RwLock poisoned while acquiring read lock")
    }

    fn registry_write(&self) -> RwLockWriteGuard<'_, HashMap<String, Registration>> {
        self.registry
            .write()
            .expect("synthesis registry RwLock poisoned while acquiring write lock")
    }
}
