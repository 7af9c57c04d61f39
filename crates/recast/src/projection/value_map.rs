use recast_core::{
    error::Error,
    ir::Expr,
    value::{Value, ValueType},
};

///
/// UnmappedPolicy
///
/// What a value map yields when no key matches the source value.
///

#[derive(Clone, Debug, Default, PartialEq)]
#[remain::sorted]
pub enum UnmappedPolicy {
    /// A fixed value, converted to the target type.
    Constant(Value),
    /// The source value itself, implicitly converted to the target type.
    PassThrough,
    /// The target type's zero value.
    #[default]
    TargetDefault,
}

///
/// ValueMap
///
/// Ordered key/value substitutions applied to a source value before it is
/// assigned. The first matching key wins.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
    unmapped: UnmappedPolicy,
}

impl ValueMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entry(mut self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn unmapped(mut self, policy: UnmappedPolicy) -> Self {
        self.unmapped = policy;
        self
    }

    #[must_use]
    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }

    #[must_use]
    pub const fn policy(&self) -> &UnmappedPolicy {
        &self.unmapped
    }

    /// Natural type of the mapped values, used when the target member type
    /// still has to be inferred.
    pub(crate) fn mapped_type(&self) -> Option<ValueType> {
        self.entries.iter().find_map(|(_, v)| v.natural_type())
    }

    /// Lower to an equality chain over `source`:
    /// `s == k0 ? v0 : (s == k1 ? v1 : ... : fallback)`. Keys are converted
    /// to the source type first.
    pub(crate) fn lower(&self, source: Expr, target: &ValueType) -> Result<Expr, Error> {
        Expr::let_in(source, |s| {
            let fallback = match &self.unmapped {
                UnmappedPolicy::Constant(value) => Expr::typed_constant(value.clone(), target)?,
                UnmappedPolicy::PassThrough => s.clone().convert(target)?,
                UnmappedPolicy::TargetDefault => Expr::default_of(target.clone()),
            };

            self.entries
                .iter()
                .rev()
                .try_fold(fallback, |otherwise, (key, value)| {
                    let key = Expr::typed_constant(key.clone(), s.ty())
                        .map_err(|err| err.context(format!("value map key {key:?}")))?;
                    let test = Expr::equals(s.clone(), key)?;
                    let then = Expr::typed_constant(value.clone(), target)?;

                    Expr::conditional(test, then, otherwise)
                })
        })
    }
}
