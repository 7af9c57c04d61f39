use recast_core::{
    error::{Error, ErrorOrigin},
    ir::{AssignTarget, CompiledLambda, Expr, Lambda, ParamDecl},
    model::{CtorRef, MemberRef, TypeHandle},
    value::Value,
};
use std::{fmt, sync::Arc};
use tracing::trace;

///
/// ArgOrigin
///

#[derive(Clone, Debug, Eq, PartialEq)]
#[remain::sorted]
pub(crate) enum ArgOrigin {
    /// Unmatched optional parameter left at its default.
    Default,
    /// Fed by the named target member's mapping.
    Member(String),
    /// Fed by an explicit constructor-parameter target.
    Param,
}

///
/// CtorArg
///

#[derive(Clone, Debug)]
pub(crate) struct CtorArg {
    pub(crate) param: String,
    pub(crate) origin: ArgOrigin,
    pub(crate) value: Expr,
    pub(crate) default: Option<Expr>,
}

///
/// MemberAssignment
///

#[derive(Clone, Debug)]
pub(crate) struct MemberAssignment {
    pub(crate) name: String,
    pub(crate) member: MemberRef,
    pub(crate) target: AssignTarget,
    pub(crate) value: Expr,
}

///
/// CompiledProjection
///
/// A fully bound projection. The default projection is assembled eagerly;
/// reduced projections are re-derived from the same bound assignments.
///

pub struct CompiledProjection {
    source: TypeHandle,
    ctor: CtorRef,
    ctor_args: Vec<CtorArg>,
    assignments: Vec<MemberAssignment>,
    full: Projection,
}

impl CompiledProjection {
    pub(crate) fn new(
        source: TypeHandle,
        ctor: CtorRef,
        ctor_args: Vec<CtorArg>,
        assignments: Vec<MemberAssignment>,
    ) -> Result<Self, Error> {
        let args = ctor_args.iter().map(|a| a.value.clone()).collect();
        let bindings = assignments
            .iter()
            .map(|a| (a.target.clone(), a.value.clone()))
            .collect();
        let full = assemble(&source, &ctor, args, bindings)?;

        Ok(Self {
            source,
            ctor,
            ctor_args,
            assignments,
            full,
        })
    }

    #[must_use]
    pub const fn source(&self) -> &TypeHandle {
        &self.source
    }

    #[must_use]
    pub fn target(&self) -> &TypeHandle {
        self.ctor.owner()
    }

    #[must_use]
    pub const fn constructor(&self) -> &CtorRef {
        &self.ctor
    }

    /// Target member names this projection writes, constructor-bound
    /// members first.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        self.ctor_args
            .iter()
            .filter_map(|a| match &a.origin {
                ArgOrigin::Member(name) => Some(name.as_str()),
                _ => None,
            })
            .chain(self.assignments.iter().map(|a| a.name.as_str()))
            .collect()
    }

    /// Target members assigned after construction, with their handles.
    pub fn initialized_members(&self) -> impl Iterator<Item = &MemberRef> {
        self.assignments.iter().map(|a| &a.member)
    }

    /// Constructor parameter names in call order.
    pub fn ctor_params(&self) -> impl Iterator<Item = &str> {
        self.ctor_args.iter().map(|a| a.param.as_str())
    }

    #[must_use]
    pub const fn full(&self) -> &Projection {
        &self.full
    }

    /// The full projection, or one restricted to `columns`.
    pub fn project(&self, columns: Option<&[&str]>) -> Result<Projection, Error> {
        match columns {
            None => Ok(self.full.clone()),
            Some(columns) => self.reduced(columns),
        }
    }

    /// Apply the full projection.
    pub fn apply(&self, source: &Value) -> Result<Value, Error> {
        self.full.apply(source)
    }

    // Constructor-bound members outside the subset fall back to their
    // parameter default; required ones keep their source.
    fn reduced(&self, columns: &[&str]) -> Result<Projection, Error> {
        let known = self.columns();
        if let Some(unknown) = columns.iter().find(|c| !known.contains(c)) {
            return Err(Error::member_resolution(
                ErrorOrigin::Projection,
                format!(
                    "'{unknown}' is not a projected member of {}; projected: {}",
                    self.target(),
                    known.join(", ")
                ),
            ));
        }

        let args = self
            .ctor_args
            .iter()
            .map(|arg| match (&arg.origin, &arg.default) {
                (ArgOrigin::Member(name), Some(default)) if !columns.contains(&name.as_str()) => {
                    default.clone()
                }
                _ => arg.value.clone(),
            })
            .collect();
        let bindings = self
            .assignments
            .iter()
            .filter(|a| columns.contains(&a.name.as_str()))
            .map(|a| (a.target.clone(), a.value.clone()))
            .collect::<Vec<_>>();

        trace!(
            target_type = %self.target(),
            columns = columns.len(),
            initialized = bindings.len(),
            "reduced projection derived"
        );

        assemble(&self.source, &self.ctor, args, bindings)
    }
}

impl fmt::Debug for CompiledProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledProjection")
            .field("source", &self.source)
            .field("target", self.target())
            .field("ctor", &self.ctor)
            .field("columns", &self.columns())
            .finish_non_exhaustive()
    }
}

///
/// Projection
///
/// One executable projection: a single-parameter lambda from the source
/// object to a new target instance.
///

#[derive(Clone)]
pub struct Projection {
    lambda: Arc<Lambda>,
    compiled: Arc<CompiledLambda>,
    target: TypeHandle,
}

impl Projection {
    #[must_use]
    pub fn lambda(&self) -> &Lambda {
        &self.lambda
    }

    #[must_use]
    pub const fn target(&self) -> &TypeHandle {
        &self.target
    }

    /// Project one source value. A null source projects to null.
    pub fn apply(&self, source: &Value) -> Result<Value, Error> {
        if source.is_null() {
            return Ok(Value::Null);
        }

        self.compiled.invoke(std::slice::from_ref(source))
    }
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Projection({})", self.lambda)
    }
}

fn assemble(
    source: &TypeHandle,
    ctor: &CtorRef,
    args: Vec<Expr>,
    bindings: Vec<(AssignTarget, Expr)>,
) -> Result<Projection, Error> {
    let params = vec![ParamDecl::new("source", source.value_type())];
    let body = Expr::member_init(Expr::new_object(ctor, args)?, bindings)?;
    let lambda = Lambda::new(params, body)?;
    let compiled = lambda.compile()?;

    Ok(Projection {
        lambda: Arc::new(lambda),
        compiled: Arc::new(compiled),
        target: ctor.owner().clone(),
    })
}
