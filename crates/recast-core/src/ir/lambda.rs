use crate::{
    error::{Error, ErrorOrigin},
    ir::{CompiledLambda, Expr, ExprKind, LocalId, compile},
    value::ValueType,
};
use std::{collections::BTreeSet, fmt};

///
/// ParamDecl
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub ty: ValueType,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

///
/// Lambda
///
/// A closed expression over declared parameters. Building one checks that
/// every parameter reference matches its declaration and every local is
/// read inside its binding.
///

#[derive(Clone, Debug)]
pub struct Lambda {
    params: Vec<ParamDecl>,
    body: Expr,
}

impl Lambda {
    pub fn new(params: Vec<ParamDecl>, body: Expr) -> Result<Self, Error> {
        check_params(&params, &body)?;
        check_scopes(&body, &mut BTreeSet::new())?;

        Ok(Self { params, body })
    }

    /// Parameter reference for declaration `index`.
    pub fn param_expr(params: &[ParamDecl], index: usize) -> Result<Expr, Error> {
        let decl = params.get(index).ok_or_else(|| {
            Error::internal(
                ErrorOrigin::Ir,
                format!("parameter #{index} is not declared"),
            )
        })?;

        Ok(Expr::param(index, decl.ty.clone()))
    }

    #[must_use]
    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }

    #[must_use]
    pub const fn body(&self) -> &Expr {
        &self.body
    }

    #[must_use]
    pub const fn return_type(&self) -> &ValueType {
        self.body.ty()
    }

    /// Splice the body into another tree, substituting `args` for the
    /// parameters. Each argument is converted to its parameter type.
    pub fn apply(&self, args: Vec<Expr>) -> Result<Expr, Error> {
        if args.len() != self.params.len() {
            return Err(Error::invalid_operation(
                ErrorOrigin::Ir,
                format!(
                    "lambda takes {} arguments, {} given",
                    self.params.len(),
                    args.len()
                ),
            ));
        }

        let args = self
            .params
            .iter()
            .zip(args)
            .map(|(decl, arg)| arg.convert(&decl.ty))
            .collect::<Result<Vec<_>, _>>()?;

        self.body.rebind(&args)
    }

    /// Lower to an executable closure tree.
    pub fn compile(&self) -> Result<CompiledLambda, Error> {
        compile::compile(self)
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("|")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "p{i}: {}", p.ty)?;
        }
        write!(f, "| {}", self.body)
    }
}

fn check_params(params: &[ParamDecl], body: &Expr) -> Result<(), Error> {
    let mut result = Ok(());

    body.walk(&mut |node| {
        if result.is_err() {
            return;
        }
        if let ExprKind::Param(index) = node.kind() {
            match params.get(*index) {
                Some(decl) if decl.ty == *node.ty() => {}
                Some(decl) => {
                    result = Err(Error::incompatible_type(
                        ErrorOrigin::Ir,
                        format!(
                            "parameter '{}' is declared {} but referenced as {}",
                            decl.name,
                            decl.ty,
                            node.ty()
                        ),
                    ));
                }
                None => {
                    result = Err(Error::internal(
                        ErrorOrigin::Ir,
                        format!("parameter #{index} is not declared"),
                    ));
                }
            }
        }
    });

    result
}

fn check_scopes(expr: &Expr, bound: &mut BTreeSet<LocalId>) -> Result<(), Error> {
    match expr.kind() {
        ExprKind::Let { local, value, body } => {
            check_scopes(value, bound)?;
            let fresh = bound.insert(*local);
            let out = check_scopes(body, bound);
            if fresh {
                bound.remove(local);
            }
            out
        }
        ExprKind::Local(local) if !bound.contains(local) => Err(Error::internal(
            ErrorOrigin::Ir,
            format!("local {local} is read outside its binding"),
        )),
        _ => expr
            .children()
            .into_iter()
            .try_for_each(|child| check_scopes(child, bound)),
    }
}
