//! Descriptor validation orchestration.

pub mod ctor;
pub mod naming;

use crate::{
    build::SynthesisOptions,
    error::ErrorTree,
    node::{TypeDescriptor, VisitableNode},
    visit::ValidateVisitor,
};

/// Run full descriptor validation in a staged, deterministic order.
pub fn validate_descriptor(
    desc: &TypeDescriptor,
    options: &SynthesisOptions,
) -> Result<(), ErrorTree> {
    // Phase 1: node-local invariants.
    let mut errors = validate_nodes(desc);

    // Phase 2: limits and cross-member rules, filed under the type's route.
    let mut global = ErrorTree::new();
    validate_global(desc, options, &mut global);
    errors.merge_at(desc.name(), global);

    errors.result()
}

// Validate all nodes via a visitor to retain route-aware error aggregation.
fn validate_nodes(desc: &TypeDescriptor) -> ErrorTree {
    let mut visitor = ValidateVisitor::new();
    desc.accept(&mut visitor);

    visitor.errors
}

fn validate_global(desc: &TypeDescriptor, options: &SynthesisOptions, errors: &mut ErrorTree) {
    naming::validate_limits(desc, options, errors);
    naming::validate_shadowing(desc, errors);
    ctor::validate_ctor_params(desc, errors);
}

#[cfg(test)]
mod tests {
    use crate::{
        build::SynthesisOptions,
        node::{FieldDescriptor, PropertyDescriptor, TypeDescriptor, Visibility},
    };
    use recast_core::{
        error::ErrorClass,
        model::{PropertySpec, TypeModel},
        value::{Value, ValueType},
    };

    fn message(result: Result<TypeDescriptor, recast_core::error::Error>) -> String {
        let err = result.unwrap_err();
        assert_eq!(err.class, ErrorClass::DescriptorInvalid);

        err.message
    }

    #[test]
    fn valid_descriptor_builds() {
        let desc = TypeDescriptor::builder("Person")
            .property(PropertyDescriptor::new("Name", ValueType::Text).required())
            .field(FieldDescriptor::new("Age", ValueType::Int32).optional(0))
            .build()
            .unwrap();

        assert_eq!(desc.member_count(), 2);
    }

    #[test]
    fn empty_type_is_rejected() {
        let msg = message(TypeDescriptor::builder("Empty").build());
        assert!(msg.contains("Empty: type declares no members"), "{msg}");
    }

    #[test]
    fn every_problem_is_reported_with_its_route() {
        let msg = message(
            TypeDescriptor::builder("Person")
                .property(PropertyDescriptor::new("Name", ValueType::Text))
                .field(FieldDescriptor::new("Name", ValueType::Text))
                .property(PropertyDescriptor::new("Age", ValueType::Int32).optional("old"))
                .field(FieldDescriptor::new("Hidden", ValueType::Bool).visibility(Visibility::None))
                .build(),
        );

        assert!(msg.contains("Person: duplicate member name 'Name'"), "{msg}");
        assert!(msg.contains("Person.Age: default value is not assignable"), "{msg}");
        assert!(msg.contains("Person.Hidden: field visibility cannot be None"), "{msg}");
    }

    #[test]
    fn null_default_requires_nullable_value_type() {
        let rejected = TypeDescriptor::builder("Reading")
            .property(PropertyDescriptor::new("Value", ValueType::Float64).optional(Value::Null))
            .build();
        assert!(rejected.is_err());

        TypeDescriptor::builder("Reading")
            .property(
                PropertyDescriptor::new("Value", ValueType::Float64)
                    .nullable()
                    .optional(Value::Null),
            )
            .property(
                PropertyDescriptor::new("Label", ValueType::Text)
                    .nullable()
                    .optional(Value::Null),
            )
            .build()
            .unwrap();

        // reference types need the flag too
        let msg = message(
            TypeDescriptor::builder("Reading")
                .property(PropertyDescriptor::new("Label", ValueType::Text).optional(Value::Null))
                .build(),
        );
        assert!(msg.contains("Reading.Label: null default on a member that is not nullable"), "{msg}");
    }

    #[test]
    fn duplicate_ctor_param_names_are_rejected() {
        let msg = message(
            TypeDescriptor::builder("Pair")
                .property(PropertyDescriptor::new("Left", ValueType::Int32).required().ctor_param("value"))
                .property(PropertyDescriptor::new("Right", ValueType::Int32).required().ctor_param("value"))
                .build(),
        );

        assert!(msg.contains("Pair.Right: ctor parameter 'value' is already bound"), "{msg}");
    }

    #[test]
    fn ctor_param_on_unbound_member_is_rejected() {
        let msg = message(
            TypeDescriptor::builder("Pair")
                .property(PropertyDescriptor::new("Left", ValueType::Int32).ctor_param("left"))
                .build(),
        );

        assert!(msg.contains("not constructor-bound"), "{msg}");
    }

    #[test]
    fn limits_come_from_options() {
        let options = SynthesisOptions {
            max_type_name_len: 8,
            max_members: 1,
            ..SynthesisOptions::default()
        };

        let msg = message(
            TypeDescriptor::builder("VeryLongName")
                .property(PropertyDescriptor::new("A", ValueType::Int32))
                .property(PropertyDescriptor::new("B", ValueType::Int32))
                .build_with(&options),
        );

        assert!(msg.contains("type name exceeds max length 8"), "{msg}");
        assert!(msg.contains("more than the limit of 1"), "{msg}");
    }

    #[test]
    fn base_members_cannot_be_shadowed() {
        let base = TypeModel::builder("Entity")
            .property(PropertySpec::new("Id", ValueType::Uint64))
            .build()
            .unwrap();

        let msg = message(
            TypeDescriptor::builder("Customer")
                .base(&base)
                .property(PropertyDescriptor::new("Id", ValueType::Uint64))
                .build(),
        );

        assert!(msg.contains("Customer.Id: shadows member 'Id' of base type 'Entity'"), "{msg}");
    }

    #[test]
    fn malformed_names_are_rejected() {
        let msg = message(
            TypeDescriptor::builder("Bad Name")
                .property(PropertyDescriptor::new("ok", ValueType::Int32))
                .build(),
        );
        assert!(msg.contains("'Bad Name' is not a valid identifier"), "{msg}");
    }
}
