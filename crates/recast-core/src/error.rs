use derive_more::Display;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured compile/runtime error with a stable classification.
/// Every error raised while building descriptors, IR, accessors or projections
/// is one of these; the class is the part callers are expected to match on.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Malformed type descriptor (duplicate or missing names, bad defaults).
    pub fn descriptor_invalid(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::DescriptorInvalid, origin, message)
    }

    /// A projected member or source member cannot be located.
    pub fn member_resolution(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::MemberResolutionFailed, origin, message)
    }

    /// No constructor (or more than one) matches the parameter set.
    pub fn constructor_resolution(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::ConstructorResolutionFailed, origin, message)
    }

    /// A required constructor parameter or member has no source and no default.
    pub fn unbound_required(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::UnboundRequiredParameter, origin, message)
    }

    pub fn invalid_operation(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidOperation, origin, message)
    }

    pub fn incompatible_type(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::IncompatibleType, origin, message)
    }

    /// Runtime cast failure; only reachable through explicit checked
    /// conversions or inputs that are not of the declared parameter type.
    pub fn invalid_cast(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidCast, ErrorOrigin::Ir, message)
    }

    pub fn internal(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, origin, message)
    }

    #[must_use]
    pub fn is(&self, class: ErrorClass) -> bool {
        self.class == class
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }

    /// Prefix the message with extra context, keeping the classification.
    #[must_use]
    pub fn context(mut self, context: impl std::fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum ErrorClass {
    ConstructorResolutionFailed,
    DescriptorInvalid,
    IncompatibleType,
    Internal,
    InvalidCast,
    InvalidOperation,
    MemberResolutionFailed,
    UnboundRequiredParameter,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum ErrorOrigin {
    Accessor,
    Config,
    Ir,
    Model,
    Projection,
    Query,
    Schema,
    Synthesis,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_class_includes_origin_and_class() {
        let err = Error::unbound_required(ErrorOrigin::Projection, "parameter 'age' has no source");

        assert_eq!(
            err.display_with_class(),
            "Projection:UnboundRequiredParameter: parameter 'age' has no source"
        );
        assert!(err.is(ErrorClass::UnboundRequiredParameter));
        assert!(!err.is(ErrorClass::InvalidCast));
    }

    #[test]
    fn context_prefixes_message() {
        let err = Error::member_resolution(ErrorOrigin::Projection, "no member 'Age'")
            .context("member 'IsAdult'");

        assert_eq!(err.message, "member 'IsAdult': no member 'Age'");
        assert_eq!(err.class, ErrorClass::MemberResolutionFailed);
    }
}
