use crate::{build::SynthesisOptions, err, error::ErrorTree, node::TypeDescriptor};

/// Ensure an identifier is non-empty, ASCII, and shaped like an identifier.
pub(crate) fn validate_ident(ident: &str) -> Result<(), String> {
    if ident.is_empty() {
        return Err("identifier is empty".to_string());
    }
    if !ident.is_ascii() {
        return Err(format!("identifier '{ident}' must be ASCII"));
    }

    let mut chars = ident.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("identifier '{ident}' is not a valid identifier"));
    }

    Ok(())
}

/// Identifier lengths and member count against the configured limits.
pub(crate) fn validate_limits(
    desc: &TypeDescriptor,
    options: &SynthesisOptions,
    errs: &mut ErrorTree,
) {
    let max = options.max_type_name_len;

    if desc.name().len() > max {
        err!(errs, "type name exceeds max length {max}");
    }
    for member in desc.members() {
        if member.name().len() > max {
            errs.add_at(member.name(), format!("member name exceeds max length {max}"));
        }
    }

    if desc.member_count() > options.max_members {
        err!(
            errs,
            "type declares {} members, more than the limit of {}",
            desc.member_count(),
            options.max_members
        );
    }
}

/// Members may not hide a field or property of the base type.
pub(crate) fn validate_shadowing(desc: &TypeDescriptor, errs: &mut ErrorTree) {
    let Some(base) = desc.base() else {
        return;
    };

    for member in desc.members() {
        if let Some(hidden) = base.find_member(member.name()) {
            errs.add_at(
                member.name(),
                format!(
                    "shadows member '{}' of base type '{}'",
                    hidden.name(),
                    hidden.owner().name()
                ),
            );
        }
    }
}
