use crate::{
    error::ErrorTree,
    node::{ValidateNode, VisitableNode},
    validate::naming::validate_ident,
};
use recast_core::{model::AttributeModel, value::Value};
use serde::Serialize;

///
/// AttributeDescriptor
///
/// A type-level attribute construction: positional constructor arguments
/// plus named property assignments.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttributeDescriptor {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub named: Vec<(String, Value)>,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            named: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }

    pub(crate) fn to_model(&self) -> AttributeModel {
        let with_args = self
            .args
            .iter()
            .cloned()
            .fold(AttributeModel::new(&self.name), |model, value| model.arg(value));

        self.named
            .iter()
            .cloned()
            .fold(with_args, |model, (name, value)| model.named(name, value))
    }
}

impl ValidateNode for AttributeDescriptor {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        errs.add_result(validate_ident(&self.name));
        for (name, _) in &self.named {
            errs.add_result(validate_ident(name));
        }

        errs.result()
    }
}

impl VisitableNode for AttributeDescriptor {
    fn route_key(&self) -> String {
        format!("@{}", self.name)
    }
}
