use crate::value::Value;

///
/// AttributeModel
///
/// One attribute applied to a type: constructor arguments plus named
/// property assignments, in declaration order.
///

#[derive(Clone, Debug, PartialEq)]
pub struct AttributeModel {
    pub name: String,
    pub args: Vec<Value>,
    pub named: Vec<(String, Value)>,
}

impl AttributeModel {
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

    #[must_use]
    pub fn named_value(&self, name: &str) -> Option<&Value> {
        self.named.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}
