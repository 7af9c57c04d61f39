use crate::{error::ErrorTree, node::TypeDescriptor};
use std::collections::HashMap;

/// Constructor parameter names must be unique across bound members.
pub(crate) fn validate_ctor_params(desc: &TypeDescriptor, errs: &mut ErrorTree) {
    let mut owners: HashMap<String, String> = HashMap::new();

    for param in desc.ctor_params() {
        if let Some(prev) = owners.insert(param.name.clone(), param.member.clone()) {
            errs.add_at(
                &param.member,
                format!(
                    "ctor parameter '{}' is already bound to member '{prev}'",
                    param.name
                ),
            );
        }
    }
}
