use crate::{
    error::{Error, ErrorOrigin},
    ir::{Expr, ExprKind, LocalId, MemberBinding},
};
use std::collections::HashMap;

// Substitution state: parameter replacements plus renamed locals.
struct Rebinder<'a> {
    args: &'a [Expr],
    locals: HashMap<LocalId, LocalId>,
}

impl Expr {
    /// Replace every `Param(i)` with `args[i]`, converting each argument to
    /// the parameter's type. Locals are renamed so the result can be
    /// spliced next to other copies of the same tree.
    pub fn rebind(&self, args: &[Self]) -> Result<Self, Error> {
        let mut rebinder = Rebinder {
            args,
            locals: HashMap::new(),
        };

        rebinder.visit(self)
    }
}

impl Rebinder<'_> {
    fn boxed(&mut self, expr: &Expr) -> Result<Box<Expr>, Error> {
        self.visit(expr).map(Box::new)
    }

    fn opt(&mut self, expr: Option<&Expr>) -> Result<Option<Box<Expr>>, Error> {
        expr.map(|e| self.boxed(e)).transpose()
    }

    fn all(&mut self, exprs: &[Expr]) -> Result<Vec<Expr>, Error> {
        exprs.iter().map(|e| self.visit(e)).collect()
    }

    fn visit(&mut self, expr: &Expr) -> Result<Expr, Error> {
        let ty = expr.ty().clone();

        let kind = match expr.kind() {
            ExprKind::Param(index) => {
                let arg = self.args.get(*index).ok_or_else(|| {
                    Error::internal(
                        ErrorOrigin::Ir,
                        format!("no argument supplied for parameter #{index}"),
                    )
                })?;
                return arg.clone().convert(&ty);
            }
            ExprKind::Binary { op, lhs, rhs } => ExprKind::Binary {
                op: *op,
                lhs: self.boxed(lhs)?,
                rhs: self.boxed(rhs)?,
            },
            ExprKind::Call {
                method,
                instance,
                args,
            } => ExprKind::Call {
                method: method.clone(),
                instance: self.opt(instance.as_deref())?,
                args: self.all(args)?,
            },
            ExprKind::Conditional {
                test,
                then,
                otherwise,
            } => ExprKind::Conditional {
                test: self.boxed(test)?,
                then: self.boxed(then)?,
                otherwise: self.boxed(otherwise)?,
            },
            ExprKind::Constant(value) => ExprKind::Constant(value.clone()),
            ExprKind::Convert { operand, rule } => ExprKind::Convert {
                operand: self.boxed(operand)?,
                rule: *rule,
            },
            ExprKind::Default => ExprKind::Default,
            ExprKind::FieldGet { field, instance } => ExprKind::FieldGet {
                field: field.clone(),
                instance: self.opt(instance.as_deref())?,
            },
            ExprKind::FieldSet {
                field,
                instance,
                value,
            } => ExprKind::FieldSet {
                field: field.clone(),
                instance: self.opt(instance.as_deref())?,
                value: self.boxed(value)?,
            },
            ExprKind::Index { list, index } => ExprKind::Index {
                list: self.boxed(list)?,
                index: *index,
            },
            ExprKind::Let { local, value, body } => {
                let value = self.boxed(value)?;
                let renamed = LocalId::fresh();
                let shadowed = self.locals.insert(*local, renamed);
                let body = self.boxed(body);
                match shadowed {
                    Some(previous) => self.locals.insert(*local, previous),
                    None => self.locals.remove(local),
                };

                ExprKind::Let {
                    local: renamed,
                    value,
                    body: body?,
                }
            }
            ExprKind::Local(local) => {
                ExprKind::Local(self.locals.get(local).copied().unwrap_or(*local))
            }
            ExprKind::MemberInit { new, bindings } => {
                let new = self.boxed(new)?;
                let bindings = bindings
                    .iter()
                    .map(|b| {
                        Ok(MemberBinding::from_parts(
                            b.target().clone(),
                            self.visit(b.value())?,
                        ))
                    })
                    .collect::<Result<Vec<_>, Error>>()?;

                ExprKind::MemberInit { new, bindings }
            }
            ExprKind::Navigate { instance, member } => ExprKind::Navigate {
                instance: self.boxed(instance)?,
                member: member.clone(),
            },
            ExprKind::New { ctor, args } => ExprKind::New {
                ctor: ctor.clone(),
                args: self.all(args)?,
            },
            ExprKind::Not(operand) => ExprKind::Not(self.boxed(operand)?),
            ExprKind::Sequence(exprs) => ExprKind::Sequence(self.all(exprs)?),
            ExprKind::WritePrimitive {
                primitive,
                instance,
                value,
            } => ExprKind::WritePrimitive {
                primitive: primitive.clone(),
                instance: self.opt(instance.as_deref())?,
                value: self.boxed(value)?,
            },
        };

        Ok(Expr::from_parts(kind, ty))
    }
}
