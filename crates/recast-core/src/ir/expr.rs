use crate::{
    error::{Error, ErrorOrigin},
    ir::{
        LocalId, WritePrimitive,
        ops::{self, BinaryOp},
    },
    model::{CtorRef, FieldRef, MemberRef, MethodRef, TypeHandle},
    value::{ConversionKind, ConversionRule, Value, ValueType, classify, convert_constant},
};
use std::{fmt, sync::Arc};

///
/// Expr
///
/// A typed expression node. Only the checked constructors below create
/// one, so `ty()` is always the type the node evaluates to.
///

#[derive(Clone, Debug)]
pub struct Expr {
    kind: ExprKind,
    ty: ValueType,
}

///
/// ExprKind
///

#[derive(Clone, Debug)]
#[remain::sorted]
pub enum ExprKind {
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        method: MethodRef,
        instance: Option<Box<Expr>>,
        args: Vec<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Constant(Value),
    Convert {
        operand: Box<Expr>,
        rule: ConversionRule,
    },
    Default,
    FieldGet {
        field: FieldRef,
        instance: Option<Box<Expr>>,
    },
    FieldSet {
        field: FieldRef,
        instance: Option<Box<Expr>>,
        value: Box<Expr>,
    },
    Index {
        list: Box<Expr>,
        index: usize,
    },
    Let {
        local: LocalId,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    Local(LocalId),
    MemberInit {
        new: Box<Expr>,
        bindings: Vec<MemberBinding>,
    },
    Navigate {
        instance: Box<Expr>,
        member: MemberRef,
    },
    New {
        ctor: CtorRef,
        args: Vec<Expr>,
    },
    Not(Box<Expr>),
    Param(usize),
    Sequence(Vec<Expr>),
    WritePrimitive {
        primitive: Arc<WritePrimitive>,
        instance: Option<Box<Expr>>,
        value: Box<Expr>,
    },
}

///
/// AssignTarget
///
/// How a member initialiser stores its value.
///

#[derive(Clone, Debug)]
pub enum AssignTarget {
    Field(FieldRef),
    Primitive(Arc<WritePrimitive>),
    Setter(MethodRef),
}

///
/// MemberBinding
///

#[derive(Clone, Debug)]
pub struct MemberBinding {
    target: AssignTarget,
    value: Expr,
}

impl MemberBinding {
    #[must_use]
    pub const fn target(&self) -> &AssignTarget {
        &self.target
    }

    #[must_use]
    pub const fn value(&self) -> &Expr {
        &self.value
    }

    pub(crate) const fn from_parts(target: AssignTarget, value: Expr) -> Self {
        Self { target, value }
    }
}

impl Expr {
    pub(crate) const fn from_parts(kind: ExprKind, ty: ValueType) -> Self {
        Self { kind, ty }
    }

    #[must_use]
    pub const fn kind(&self) -> &ExprKind {
        &self.kind
    }

    #[must_use]
    pub const fn ty(&self) -> &ValueType {
        &self.ty
    }

    // ------------------------------------------------------------------
    // leaves
    // ------------------------------------------------------------------

    /// Literal typed by its natural type; `Null` is typed `any`.
    #[must_use]
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = value.natural_type().unwrap_or(ValueType::Any);

        Self::from_parts(ExprKind::Constant(value), ty)
    }

    /// Literal converted to `ty` at build time.
    pub fn typed_constant(value: impl Into<Value>, ty: &ValueType) -> Result<Self, Error> {
        let value = convert_constant(&value.into(), ty)?;

        Ok(Self::from_parts(ExprKind::Constant(value), ty.clone()))
    }

    #[must_use]
    pub const fn default_of(ty: ValueType) -> Self {
        Self::from_parts(ExprKind::Default, ty)
    }

    /// Reference to lambda parameter `index`. The enclosing [`Lambda`]
    /// checks the index and type when it is built.
    ///
    /// [`Lambda`]: crate::ir::Lambda
    #[must_use]
    pub const fn param(index: usize, ty: ValueType) -> Self {
        Self::from_parts(ExprKind::Param(index), ty)
    }

    // ------------------------------------------------------------------
    // conversions
    // ------------------------------------------------------------------

    /// Implicit conversion; identity returns `self` unchanged.
    pub fn convert(self, to: &ValueType) -> Result<Self, Error> {
        self.convert_with(to, ConversionKind::Implicit)
    }

    /// Explicit (checked) conversion.
    pub fn cast(self, to: &ValueType) -> Result<Self, Error> {
        self.convert_with(to, ConversionKind::Explicit)
    }

    fn convert_with(self, to: &ValueType, kind: ConversionKind) -> Result<Self, Error> {
        let rule = classify(&self.ty, to, kind).ok_or_else(|| {
            let how = match kind {
                ConversionKind::Implicit => "implicitly",
                ConversionKind::Explicit => "explicitly",
            };
            Error::incompatible_type(
                ErrorOrigin::Ir,
                format!("{} cannot be converted {how} to {to}", self.ty),
            )
        })?;

        if rule == ConversionRule::Identity {
            return Ok(self);
        }

        // literals fold at build time when they fit
        if let ExprKind::Constant(value) = &self.kind
            && let Ok(folded) = convert_constant(value, to)
        {
            return Ok(Self::from_parts(ExprKind::Constant(folded), to.clone()));
        }

        Ok(Self::from_parts(
            ExprKind::Convert {
                operand: Box::new(self),
                rule,
            },
            to.clone(),
        ))
    }

    // ------------------------------------------------------------------
    // operators
    // ------------------------------------------------------------------

    pub fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Result<Self, Error> {
        let sig = ops::resolve(op, &lhs.ty, &rhs.ty)?;
        let lhs = lhs.convert(&sig.operand)?;
        let rhs = rhs.convert(&sig.operand)?;

        Ok(Self::from_parts(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            sig.result,
        ))
    }

    pub fn equals(lhs: Self, rhs: Self) -> Result<Self, Error> {
        Self::binary(BinaryOp::Eq, lhs, rhs)
    }

    pub fn negate(operand: Self) -> Result<Self, Error> {
        expect_bool(&operand, "operand of '!'")?;

        Ok(Self::from_parts(
            ExprKind::Not(Box::new(operand)),
            ValueType::Bool,
        ))
    }

    /// `test ? then : otherwise`; the branches are unified to a common type.
    pub fn conditional(test: Self, then: Self, otherwise: Self) -> Result<Self, Error> {
        expect_bool(&test, "condition")?;

        let ty = ops::unify(&then.ty, &otherwise.ty).ok_or_else(|| {
            Error::incompatible_type(
                ErrorOrigin::Ir,
                format!(
                    "conditional branches {} and {} have no common type",
                    then.ty, otherwise.ty
                ),
            )
        })?;
        let then = then.convert(&ty)?;
        let otherwise = otherwise.convert(&ty)?;

        Ok(Self::from_parts(
            ExprKind::Conditional {
                test: Box::new(test),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            ty,
        ))
    }

    // ------------------------------------------------------------------
    // scoping
    // ------------------------------------------------------------------

    /// Bind `value` to a fresh local visible only inside `body`.
    pub fn let_in<F>(value: Self, body: F) -> Result<Self, Error>
    where
        F: FnOnce(Self) -> Result<Self, Error>,
    {
        let local = LocalId::fresh();
        let reference = Self::from_parts(ExprKind::Local(local), value.ty.clone());
        let body = body(reference)?;
        let ty = body.ty.clone();

        Ok(Self::from_parts(
            ExprKind::Let {
                local,
                value: Box::new(value),
                body: Box::new(body),
            },
            ty,
        ))
    }

    /// Evaluate each expression in order; the last one is the result.
    pub fn sequence(exprs: Vec<Self>) -> Result<Self, Error> {
        let ty = exprs
            .last()
            .map(|e| e.ty.clone())
            .ok_or_else(|| Error::internal(ErrorOrigin::Ir, "empty sequence"))?;

        Ok(Self::from_parts(ExprKind::Sequence(exprs), ty))
    }

    /// Element `index` of a list expression.
    pub fn index(list: Self, index: usize) -> Result<Self, Error> {
        let ValueType::List(elem) = &list.ty else {
            return Err(Error::incompatible_type(
                ErrorOrigin::Ir,
                format!("cannot index into {}", list.ty),
            ));
        };
        let ty = (**elem).clone();

        Ok(Self::from_parts(
            ExprKind::Index {
                list: Box::new(list),
                index,
            },
            ty,
        ))
    }

    // ------------------------------------------------------------------
    // members
    // ------------------------------------------------------------------

    /// Read a field. `instance` must be absent for static fields.
    pub fn field_get(instance: Option<Self>, field: &FieldRef) -> Result<Self, Error> {
        let instance = bind_instance(instance, field.owner(), field.model().is_static, field.name())?;

        Ok(Self::from_parts(
            ExprKind::FieldGet {
                field: field.clone(),
                instance,
            },
            field.ty().clone(),
        ))
    }

    /// Assign a field directly. Write-once fields are rejected; use
    /// [`Expr::write_primitive`].
    pub fn field_set(instance: Option<Self>, field: &FieldRef, value: Self) -> Result<Self, Error> {
        if field.model().init_only {
            return Err(Error::invalid_operation(
                ErrorOrigin::Ir,
                format!("field {field:?} is write-once and cannot be assigned directly"),
            ));
        }
        let instance = bind_instance(instance, field.owner(), field.model().is_static, field.name())?;
        let value = value.convert(field.ty())?;

        Ok(Self::from_parts(
            ExprKind::FieldSet {
                field: field.clone(),
                instance,
                value: Box::new(value),
            },
            ValueType::Any,
        ))
    }

    /// Store through a write primitive.
    pub fn write_primitive(
        primitive: &Arc<WritePrimitive>,
        instance: Option<Self>,
        value: Self,
    ) -> Result<Self, Error> {
        let field = primitive.field();
        let instance = bind_instance(instance, field.owner(), field.model().is_static, field.name())?;
        let value = value.convert(field.ty())?;

        Ok(Self::from_parts(
            ExprKind::WritePrimitive {
                primitive: Arc::clone(primitive),
                instance,
                value: Box::new(value),
            },
            ValueType::Any,
        ))
    }

    /// Call a method. Missing trailing optional arguments are filled with
    /// their defaults; every argument is converted to its parameter type.
    pub fn call(instance: Option<Self>, method: &MethodRef, args: Vec<Self>) -> Result<Self, Error> {
        let model = method.model();
        let instance = bind_instance(instance, method.owner(), model.is_static, method.name())?;
        let args = bind_args(&model.params, args, method.name())?;

        Ok(Self::from_parts(
            ExprKind::Call {
                method: method.clone(),
                instance,
                args,
            },
            model.result_type(),
        ))
    }

    /// Construct a new instance of the constructor's owner.
    pub fn new_object(ctor: &CtorRef, args: Vec<Self>) -> Result<Self, Error> {
        let args = bind_args(&ctor.model().params, args, ctor.owner().name())?;

        Ok(Self::from_parts(
            ExprKind::New {
                ctor: ctor.clone(),
                args,
            },
            ctor.owner().value_type(),
        ))
    }

    /// Null-propagating member read: `instance?.member`.
    pub fn navigate(instance: Self, member: &MemberRef) -> Result<Self, Error> {
        if member.is_static() {
            return Err(Error::invalid_operation(
                ErrorOrigin::Ir,
                format!("cannot navigate to static member {member:?}"),
            ));
        }
        if !member.is_readable() {
            return Err(Error::invalid_operation(
                ErrorOrigin::Ir,
                format!("member {member:?} has no getter"),
            ));
        }
        let instance = upcast_instance(instance, member.owner(), member.name())?;
        let ty = member.ty().clone().nullable();

        Ok(Self::from_parts(
            ExprKind::Navigate {
                instance: Box::new(instance),
                member: member.clone(),
            },
            ty,
        ))
    }

    /// Initialise members on a freshly constructed object; evaluates to the
    /// object.
    pub fn member_init(new: Self, bindings: Vec<(AssignTarget, Self)>) -> Result<Self, Error> {
        let Some(owner) = new.ty.object_type().cloned() else {
            return Err(Error::incompatible_type(
                ErrorOrigin::Ir,
                format!("member initialisation needs an object, found {}", new.ty),
            ));
        };

        let mut out = Vec::with_capacity(bindings.len());
        for (target, value) in bindings {
            let (declaring, ty, name) = match &target {
                AssignTarget::Field(field) => {
                    if field.model().init_only {
                        return Err(Error::invalid_operation(
                            ErrorOrigin::Ir,
                            format!("field {field:?} is write-once and cannot be assigned directly"),
                        ));
                    }
                    (field.owner().clone(), field.ty().clone(), field.name().to_string())
                }
                AssignTarget::Primitive(primitive) => {
                    let field = primitive.field();
                    (field.owner().clone(), field.ty().clone(), field.name().to_string())
                }
                AssignTarget::Setter(setter) => {
                    let model = setter.model();
                    let [param] = model.params.as_slice() else {
                        return Err(Error::invalid_operation(
                            ErrorOrigin::Ir,
                            format!("{setter:?} is not a setter"),
                        ));
                    };
                    (setter.owner().clone(), param.ty.clone(), setter.name().to_string())
                }
            };
            if !owner.is_subtype_of(&declaring) {
                return Err(Error::member_resolution(
                    ErrorOrigin::Ir,
                    format!("'{name}' is not a member of '{}'", owner.name()),
                ));
            }
            out.push(MemberBinding::from_parts(target, value.convert(&ty)?));
        }

        let ty = new.ty.clone();
        Ok(Self::from_parts(
            ExprKind::MemberInit {
                new: Box::new(new),
                bindings: out,
            },
            ty,
        ))
    }

    // ------------------------------------------------------------------
    // traversal
    // ------------------------------------------------------------------

    /// Direct children in evaluation order.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        match &self.kind {
            ExprKind::Binary { lhs, rhs, .. } => {
                out.push(&**lhs);
                out.push(&**rhs);
            }
            ExprKind::Call { instance, args, .. } => {
                out.extend(instance.as_deref());
                out.extend(args);
            }
            ExprKind::Conditional {
                test,
                then,
                otherwise,
            } => {
                out.extend([&**test, &**then, &**otherwise]);
            }
            ExprKind::Constant(_) | ExprKind::Default | ExprKind::Local(_) | ExprKind::Param(_) => {}
            ExprKind::Convert { operand, .. } | ExprKind::Not(operand) => out.push(&**operand),
            ExprKind::FieldGet { instance, .. } => out.extend(instance.as_deref()),
            ExprKind::FieldSet {
                instance, value, ..
            }
            | ExprKind::WritePrimitive {
                instance, value, ..
            } => {
                out.extend(instance.as_deref());
                out.push(&**value);
            }
            ExprKind::Index { list, .. } => out.push(&**list),
            ExprKind::Let { value, body, .. } => {
                out.push(&**value);
                out.push(&**body);
            }
            ExprKind::MemberInit { new, bindings } => {
                out.push(&**new);
                out.extend(bindings.iter().map(MemberBinding::value));
            }
            ExprKind::Navigate { instance, .. } => out.push(&**instance),
            ExprKind::New { args, .. } => out.extend(args),
            ExprKind::Sequence(exprs) => out.extend(exprs),
        }

        out
    }

    /// Visit every node, parents before children.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Self)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }
}

fn expect_bool(expr: &Expr, what: &str) -> Result<(), Error> {
    if *expr.ty() == ValueType::Bool {
        Ok(())
    } else {
        Err(Error::incompatible_type(
            ErrorOrigin::Ir,
            format!("{what} must be bool, found {}", expr.ty()),
        ))
    }
}

// Check static/instance agreement and upcast the instance to the owner.
fn bind_instance(
    instance: Option<Expr>,
    owner: &TypeHandle,
    is_static: bool,
    member: &str,
) -> Result<Option<Box<Expr>>, Error> {
    match (instance, is_static) {
        (None, true) => Ok(None),
        (Some(_), true) => Err(Error::invalid_operation(
            ErrorOrigin::Ir,
            format!("static member '{member}' cannot be accessed through an instance"),
        )),
        (None, false) => Err(Error::invalid_operation(
            ErrorOrigin::Ir,
            format!("instance member '{member}' requires an instance"),
        )),
        (Some(instance), false) => Ok(Some(Box::new(upcast_instance(instance, owner, member)?))),
    }
}

fn upcast_instance(instance: Expr, owner: &TypeHandle, member: &str) -> Result<Expr, Error> {
    instance.convert(&owner.value_type()).map_err(|err| {
        Error::member_resolution(
            ErrorOrigin::Ir,
            format!("'{member}' is declared on '{}': {}", owner.name(), err.message),
        )
    })
}

fn bind_args(
    params: &[crate::model::ParamModel],
    args: Vec<Expr>,
    callee: &str,
) -> Result<Vec<Expr>, Error> {
    let required = params.iter().filter(|p| !p.is_optional()).count();
    if args.len() < required || args.len() > params.len() {
        return Err(Error::invalid_operation(
            ErrorOrigin::Ir,
            format!(
                "'{callee}' takes {required}..={} arguments, {} given",
                params.len(),
                args.len()
            ),
        ));
    }

    let given = args.len();
    let mut out = Vec::with_capacity(params.len());
    for (param, arg) in params.iter().zip(args) {
        out.push(
            arg.convert(&param.ty)
                .map_err(|err| err.context(format!("argument '{}' of '{callee}'", param.name)))?,
        );
    }
    for param in &params[given..] {
        let default = param.default.clone().unwrap_or(Value::Null);
        out.push(Expr::typed_constant(default, &param.ty)?);
    }

    Ok(out)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match &self.kind {
            ExprKind::Binary { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            ExprKind::Call {
                method,
                instance,
                args,
            } => {
                match instance {
                    Some(i) => write!(f, "{i}.{}(", method.name())?,
                    None => write!(f, "{}::{}(", method.owner(), method.name())?,
                }
                list(f, args)?;
                f.write_str(")")
            }
            ExprKind::Conditional {
                test,
                then,
                otherwise,
            } => write!(f, "({test} ? {then} : {otherwise})"),
            ExprKind::Constant(value) => write!(f, "{value:?}"),
            ExprKind::Convert { operand, .. } => write!(f, "({}){operand}", self.ty),
            ExprKind::Default => write!(f, "default({})", self.ty),
            ExprKind::FieldGet { field, instance } => match instance {
                Some(i) => write!(f, "{i}.{}", field.name()),
                None => write!(f, "{}::{}", field.owner(), field.name()),
            },
            ExprKind::FieldSet {
                field,
                instance,
                value,
            } => match instance {
                Some(i) => write!(f, "{i}.{} = {value}", field.name()),
                None => write!(f, "{}::{} = {value}", field.owner(), field.name()),
            },
            ExprKind::Index { list, index } => write!(f, "{list}[{index}]"),
            ExprKind::Let { local, value, body } => write!(f, "let {local} = {value} in {body}"),
            ExprKind::Local(local) => write!(f, "{local}"),
            ExprKind::MemberInit { new, bindings } => {
                write!(f, "{new} {{ ")?;
                for (i, b) in bindings.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    let name = match &b.target {
                        AssignTarget::Field(field) => field.name(),
                        AssignTarget::Primitive(p) => p.field().name(),
                        AssignTarget::Setter(s) => s.name(),
                    };
                    write!(f, "{name} = {}", b.value)?;
                }
                f.write_str(" }")
            }
            ExprKind::Navigate { instance, member } => write!(f, "{instance}?.{}", member.name()),
            ExprKind::New { ctor, args } => {
                write!(f, "new {}(", ctor.owner())?;
                list(f, args)?;
                f.write_str(")")
            }
            ExprKind::Not(operand) => write!(f, "!{operand}"),
            ExprKind::Param(index) => write!(f, "p{index}"),
            ExprKind::Sequence(exprs) => {
                f.write_str("{ ")?;
                list(f, exprs)?;
                f.write_str(" }")
            }
            ExprKind::WritePrimitive {
                primitive,
                instance,
                value,
            } => match instance {
                Some(i) => write!(f, "{primitive:?}({i}, {value})"),
                None => write!(f, "{primitive:?}({value})"),
            },
        }
    }
}
