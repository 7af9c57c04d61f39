//! Lowering of typed IR into a tree of boxed closures.
//!
//! Locals are resolved to frame slots once, here; evaluation never looks
//! anything up by name or id.

use crate::{
    error::{Error, ErrorOrigin},
    ir::{AssignTarget, BinaryOp, Expr, ExprKind, Lambda, LocalId, ops},
    model::ObjectRef,
    value::{Value, ValueType, cast_value},
};
use std::{collections::HashMap, fmt, sync::Arc};

type Eval = Box<dyn Fn(&mut Frame) -> Result<Value, Error> + Send + Sync>;

///
/// Frame
///
/// Evaluation state of one invocation.
///

struct Frame {
    params: Vec<Value>,
    locals: Vec<Value>,
}

///
/// CompiledLambda
///
/// Executable form of a [`Lambda`]. Cheap to clone and safe to share
/// across threads.
///

#[derive(Clone)]
pub struct CompiledLambda {
    params: Arc<[ValueType]>,
    ret: ValueType,
    locals: usize,
    root: Arc<Eval>,
}

impl CompiledLambda {
    #[must_use]
    pub fn param_types(&self) -> &[ValueType] {
        &self.params
    }

    #[must_use]
    pub const fn return_type(&self) -> &ValueType {
        &self.ret
    }

    /// Run the lambda. Arguments that do not conform to their declared
    /// parameter types fail with `InvalidCast` before evaluation starts.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, Error> {
        if args.len() != self.params.len() {
            return Err(Error::invalid_operation(
                ErrorOrigin::Ir,
                format!(
                    "compiled lambda takes {} arguments, {} given",
                    self.params.len(),
                    args.len()
                ),
            ));
        }
        for (i, (ty, arg)) in self.params.iter().zip(args).enumerate() {
            if !ty.conforms(arg) {
                return Err(Error::invalid_cast(format!(
                    "argument #{i} ({}) is not a {ty}",
                    arg.label()
                )));
            }
        }

        let mut frame = Frame {
            params: args.to_vec(),
            locals: vec![Value::Null; self.locals],
        };

        (self.root)(&mut frame)
    }
}

impl fmt::Debug for CompiledLambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledLambda")
            .field("params", &self.params)
            .field("ret", &self.ret)
            .field("locals", &self.locals)
            .finish_non_exhaustive()
    }
}

pub(crate) fn compile(lambda: &Lambda) -> Result<CompiledLambda, Error> {
    let mut compiler = Compiler::default();
    let root = compiler.lower(lambda.body())?;

    Ok(CompiledLambda {
        params: lambda.params().iter().map(|p| p.ty.clone()).collect(),
        ret: lambda.return_type().clone(),
        locals: compiler.slots.len(),
        root: Arc::new(root),
    })
}

///
/// Compiler
///

#[derive(Default)]
struct Compiler {
    slots: HashMap<LocalId, usize>,
}

impl Compiler {
    fn slot(&mut self, local: LocalId) -> usize {
        let next = self.slots.len();
        *self.slots.entry(local).or_insert(next)
    }

    fn lower_all(&mut self, exprs: &[Expr]) -> Result<Vec<Eval>, Error> {
        exprs.iter().map(|e| self.lower(e)).collect()
    }

    fn lower_opt(&mut self, expr: Option<&Expr>) -> Result<Option<Eval>, Error> {
        expr.map(|e| self.lower(e)).transpose()
    }

    #[expect(clippy::too_many_lines)]
    fn lower(&mut self, expr: &Expr) -> Result<Eval, Error> {
        let ty = expr.ty().clone();

        let eval: Eval = match expr.kind() {
            ExprKind::Binary { op, lhs, rhs } => {
                let op = *op;
                let lhs = self.lower(lhs)?;
                let rhs = self.lower(rhs)?;
                match op {
                    BinaryOp::And => Box::new(move |frame: &mut Frame| {
                        if truthy(lhs(frame)?)? {
                            rhs(frame)
                        } else {
                            Ok(Value::Bool(false))
                        }
                    }),
                    BinaryOp::Or => Box::new(move |frame: &mut Frame| {
                        if truthy(lhs(frame)?)? {
                            Ok(Value::Bool(true))
                        } else {
                            rhs(frame)
                        }
                    }),
                    _ => Box::new(move |frame: &mut Frame| {
                        let l = lhs(frame)?;
                        let r = rhs(frame)?;
                        ops::apply(op, l, r)
                    }),
                }
            }
            ExprKind::Call {
                method,
                instance,
                args,
            } => {
                let method = method.clone();
                let instance = self.lower_opt(instance.as_deref())?;
                let args = self.lower_all(args)?;
                Box::new(move |frame: &mut Frame| {
                    let this = eval_instance(instance.as_ref(), frame, method.name())?;
                    let values = args
                        .iter()
                        .map(|arg| arg(frame))
                        .collect::<Result<Vec<_>, _>>()?;
                    let out = method.invoke(this.as_ref(), &values)?;
                    cast_value(out, &ty)
                })
            }
            ExprKind::Conditional {
                test,
                then,
                otherwise,
            } => {
                let test = self.lower(test)?;
                let then = self.lower(then)?;
                let otherwise = self.lower(otherwise)?;
                Box::new(move |frame: &mut Frame| {
                    if truthy(test(frame)?)? {
                        then(frame)
                    } else {
                        otherwise(frame)
                    }
                })
            }
            ExprKind::Constant(value) => {
                let value = value.clone();
                Box::new(move |_: &mut Frame| Ok(value.clone()))
            }
            ExprKind::Convert { operand, .. } => {
                let operand = self.lower(operand)?;
                Box::new(move |frame: &mut Frame| cast_value(operand(frame)?, &ty))
            }
            ExprKind::Default => {
                let value = ty.default_value();
                Box::new(move |_: &mut Frame| Ok(value.clone()))
            }
            ExprKind::FieldGet { field, instance } => {
                let field = field.clone();
                let instance = self.lower_opt(instance.as_deref())?;
                Box::new(move |frame: &mut Frame| {
                    let this = eval_instance(instance.as_ref(), frame, field.name())?;
                    field.load(this.as_ref())
                })
            }
            ExprKind::FieldSet {
                field,
                instance,
                value,
            } => {
                let field = field.clone();
                let instance = self.lower_opt(instance.as_deref())?;
                let value = self.lower(value)?;
                Box::new(move |frame: &mut Frame| {
                    let this = eval_instance(instance.as_ref(), frame, field.name())?;
                    field.store(this.as_ref(), value(frame)?)?;
                    Ok(Value::Null)
                })
            }
            ExprKind::Index { list, index } => {
                let index = *index;
                let list = self.lower(list)?;
                Box::new(move |frame: &mut Frame| match list(frame)? {
                    Value::List(mut items) if index < items.len() => Ok(items.swap_remove(index)),
                    other => Err(Error::invalid_cast(format!(
                        "argument list {} has no element #{index}",
                        other.label()
                    ))),
                })
            }
            ExprKind::Let { local, value, body } => {
                let value = self.lower(value)?;
                let slot = self.slot(*local);
                let body = self.lower(body)?;
                Box::new(move |frame: &mut Frame| {
                    let bound = value(frame)?;
                    frame.locals[slot] = bound;
                    body(frame)
                })
            }
            ExprKind::Local(local) => {
                let slot = self.slot(*local);
                Box::new(move |frame: &mut Frame| Ok(frame.locals[slot].clone()))
            }
            ExprKind::MemberInit { new, bindings } => {
                let new = self.lower(new)?;
                let mut steps = Vec::with_capacity(bindings.len());
                for binding in bindings {
                    steps.push((binding.target().clone(), self.lower(binding.value())?));
                }
                Box::new(move |frame: &mut Frame| {
                    let object = new(frame)?;
                    let Value::Object(target) = &object else {
                        return Err(Error::internal(
                            ErrorOrigin::Ir,
                            "member initialisation produced no object",
                        ));
                    };
                    for (assign, value) in &steps {
                        let value = value(frame)?;
                        match assign {
                            AssignTarget::Field(field) => field.store(Some(target), value)?,
                            AssignTarget::Primitive(primitive) => {
                                primitive.write(Some(target), value)?;
                            }
                            AssignTarget::Setter(setter) => {
                                setter.invoke(Some(target), &[value])?;
                            }
                        }
                    }
                    Ok(object)
                })
            }
            ExprKind::Navigate { instance, member } => {
                let member = member.clone();
                let instance = self.lower(instance)?;
                Box::new(move |frame: &mut Frame| match instance(frame)? {
                    Value::Null => Ok(Value::Null),
                    Value::Object(object) => member.load(Some(&object)),
                    other => Err(Error::invalid_cast(format!(
                        "cannot read '{}' from {}",
                        member.name(),
                        other.label()
                    ))),
                })
            }
            ExprKind::New { ctor, args } => {
                let ctor = ctor.clone();
                let args = self.lower_all(args)?;
                Box::new(move |frame: &mut Frame| {
                    let values = args
                        .iter()
                        .map(|arg| arg(frame))
                        .collect::<Result<Vec<_>, _>>()?;
                    ctor.construct(&values).map(Value::Object)
                })
            }
            ExprKind::Not(operand) => {
                let operand = self.lower(operand)?;
                Box::new(move |frame: &mut Frame| Ok(Value::Bool(!truthy(operand(frame)?)?)))
            }
            ExprKind::Param(index) => {
                let index = *index;
                Box::new(move |frame: &mut Frame| {
                    frame.params.get(index).cloned().ok_or_else(|| {
                        Error::internal(ErrorOrigin::Ir, format!("parameter #{index} missing"))
                    })
                })
            }
            ExprKind::Sequence(exprs) => {
                let steps = self.lower_all(exprs)?;
                Box::new(move |frame: &mut Frame| {
                    let mut last = Value::Null;
                    for step in &steps {
                        last = step(frame)?;
                    }
                    Ok(last)
                })
            }
            ExprKind::WritePrimitive {
                primitive,
                instance,
                value,
            } => {
                let primitive = Arc::clone(primitive);
                let instance = self.lower_opt(instance.as_deref())?;
                let value = self.lower(value)?;
                Box::new(move |frame: &mut Frame| {
                    let this = eval_instance(instance.as_ref(), frame, primitive.field().name())?;
                    primitive.write(this.as_ref(), value(frame)?)?;
                    Ok(Value::Null)
                })
            }
        };

        Ok(eval)
    }
}

fn truthy(value: Value) -> Result<bool, Error> {
    value.as_bool().ok_or_else(|| {
        Error::internal(
            ErrorOrigin::Ir,
            format!("expected bool, found {}", value.label()),
        )
    })
}

// Evaluate the receiver of an instance member; `None` for static members.
fn eval_instance(
    instance: Option<&Eval>,
    frame: &mut Frame,
    member: &str,
) -> Result<Option<ObjectRef>, Error> {
    let Some(instance) = instance else {
        return Ok(None);
    };

    match instance(frame)? {
        Value::Object(object) => Ok(Some(object)),
        Value::Null => Err(Error::invalid_cast(format!(
            "null reference while accessing '{member}'"
        ))),
        other => Err(Error::invalid_cast(format!(
            "cannot access '{member}' on {}",
            other.label()
        ))),
    }
}
