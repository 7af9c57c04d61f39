use crate::projection::{
    CtorParamRef, MemberNameMatchStrategy, ProjectedMember, ProjectionConfiguration,
    ProjectionTarget,
};
use recast_core::{
    error::{Error, ErrorOrigin},
    model::{CtorRef, TypeHandle},
};
use std::{cmp::Reverse, fmt};

///
/// Slot
///
/// Configuration entry feeding one constructor parameter.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum Slot {
    Member(usize),
    Param(usize),
}

///
/// Fit
///

#[derive(Debug)]
enum Fit {
    Bound(Vec<Option<Slot>>),
    /// Required parameters nothing feeds, and how many bindings the
    /// constructor did take.
    Missing { params: Vec<String>, consumed: usize },
    /// A configured binding the constructor cannot take.
    Rejected(String),
    /// A member left for initialisation that the target cannot write.
    Unassignable(String),
}

/// Pick the constructor for `target` and bind its parameters.
pub(super) fn resolve(
    target: &TypeHandle,
    config: &ProjectionConfiguration,
    strategy: &dyn MemberNameMatchStrategy,
) -> Result<(CtorRef, Vec<Option<Slot>>), Error> {
    if let Some(ctor) = config.constructor() {
        if ctor.owner() != target {
            return Err(Error::constructor_resolution(
                ErrorOrigin::Projection,
                format!(
                    "constructor {} belongs to {}, not {target}",
                    ctor.model().signature(),
                    ctor.owner()
                ),
            ));
        }
        let slots = accept(ctor, fit(ctor, config, strategy))?;

        return Ok((ctor.clone(), slots));
    }

    let ctors = target.constructor_refs();
    let mut fits: Vec<_> = ctors
        .iter()
        .map(|ctor| (ctor, fit(ctor, config, strategy)))
        .collect();

    if fits.len() == 1 {
        let (ctor, only) = fits.remove(0);
        let slots = accept(ctor, only)?;

        return Ok((ctor.clone(), slots));
    }

    if !fits.iter().any(|(_, fit)| matches!(fit, Fit::Bound(_))) {
        return Err(unresolved(target, config, &ctors, fits));
    }

    let mut bound: Vec<_> = fits
        .into_iter()
        .filter_map(|(ctor, fit)| match fit {
            Fit::Bound(slots) => Some((ctor, slots)),
            _ => None,
        })
        .collect();

    // most bindings consumed, then fewest parameters
    let rank = |(ctor, slots): &(&CtorRef, Vec<Option<Slot>>)| {
        (slots.iter().flatten().count(), Reverse(ctor.model().params.len()))
    };
    bound.sort_by_key(|entry| Reverse(rank(entry)));

    if let [first, second, ..] = bound.as_slice()
        && rank(first) == rank(second)
    {
        return Err(Error::constructor_resolution(
            ErrorOrigin::Projection,
            format!(
                "constructors {} and {} of {target} are equally good for [{}]",
                first.0.model().signature(),
                second.0.model().signature(),
                AttemptedSet(config),
            ),
        ));
    }

    let (ctor, slots) = bound.swap_remove(0);

    Ok((ctor.clone(), slots))
}

// No constructor binds. A single best constructor that only lacks sources
// for required parameters is reported as unbound; anything else is a
// resolution failure.
fn unresolved(
    target: &TypeHandle,
    config: &ProjectionConfiguration,
    ctors: &[CtorRef],
    fits: Vec<(&CtorRef, Fit)>,
) -> Error {
    let mut missing: Vec<_> = fits
        .into_iter()
        .filter_map(|(ctor, fit)| match fit {
            Fit::Missing { params, consumed } => Some((ctor, params, consumed)),
            _ => None,
        })
        .collect();
    missing.sort_by_key(|(_, params, consumed)| (Reverse(*consumed), params.len()));

    match missing.as_slice() {
        [(ctor, params, consumed), rest @ ..]
            if rest
                .first()
                .is_none_or(|(_, p, c)| (c, p.len()) != (consumed, params.len())) =>
        {
            unbound(ctor, params)
        }
        _ => Error::constructor_resolution(
            ErrorOrigin::Projection,
            format!(
                "no constructor of {target} accepts [{}]; tried {}",
                AttemptedSet(config),
                ctors
                    .iter()
                    .map(|c| c.model().signature())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ),
    }
}

fn unbound(ctor: &CtorRef, params: &[String]) -> Error {
    let names = params
        .iter()
        .map(|p| format!("'{p}'"))
        .collect::<Vec<_>>()
        .join(", ");

    Error::unbound_required(
        ErrorOrigin::Projection,
        format!(
            "required parameter {names} of {}{} has no source and no default",
            ctor.owner(),
            ctor.model().signature()
        ),
    )
}

fn accept(ctor: &CtorRef, fit: Fit) -> Result<Vec<Option<Slot>>, Error> {
    match fit {
        Fit::Bound(slots) => Ok(slots),
        Fit::Missing { params, .. } => Err(unbound(ctor, &params)),
        Fit::Rejected(reason) => Err(Error::constructor_resolution(
            ErrorOrigin::Projection,
            format!("{}{}: {reason}", ctor.owner(), ctor.model().signature()),
        )),
        Fit::Unassignable(member) => Err(Error::unbound_required(
            ErrorOrigin::Projection,
            format!(
                "member '{member}' of {} has no setter and {} takes no parameter for it",
                ctor.owner(),
                ctor.model().signature()
            ),
        )),
    }
}

// Explicit parameter targets first, then members naming a parameter, then
// members matched by the strategy.
fn fit(ctor: &CtorRef, config: &ProjectionConfiguration, strategy: &dyn MemberNameMatchStrategy) -> Fit {
    let params = &ctor.model().params;
    let members = config.members();
    let mut slots: Vec<Option<Slot>> = vec![None; params.len()];
    let mut used = vec![false; members.len()];

    for (i, target) in config.ctor_params().iter().enumerate() {
        let index = match &target.param {
            CtorParamRef::Name(name) => params.iter().position(|p| p.name == *name),
            CtorParamRef::Position(index) => (*index < params.len()).then_some(*index),
        };
        match index {
            Some(index) if slots[index].is_none() => slots[index] = Some(Slot::Param(i)),
            _ => {
                return Fit::Rejected(format!(
                    "no free parameter for parameter {}",
                    target.param
                ));
            }
        }
    }

    for (i, member) in members.iter().enumerate() {
        let Some(name) = &member.ctor_param else {
            continue;
        };
        match params.iter().position(|p| p.name == *name) {
            Some(index) if slots[index].is_none() => {
                slots[index] = Some(Slot::Member(i));
                used[i] = true;
            }
            _ => {
                return Fit::Rejected(format!(
                    "member '{}' is bound to missing parameter '{name}'",
                    member.name()
                ));
            }
        }
    }

    for (index, param) in params.iter().enumerate() {
        if slots[index].is_some() {
            continue;
        }
        let found = (0..members.len()).find(|&i| {
            let m = &members[i];
            !used[i]
                && m.target != ProjectionTarget::Member
                && m.ctor_param.is_none()
                && strategy.parameter_matches_member(&param.name, m.name())
        });
        if let Some(i) = found {
            slots[index] = Some(Slot::Member(i));
            used[i] = true;
        }
    }

    if let Some((_, member)) = members
        .iter()
        .enumerate()
        .find(|(i, m)| !used[*i] && m.target == ProjectionTarget::CtorParam)
    {
        return Fit::Rejected(format!(
            "no parameter matches constructor-bound member '{}'",
            member.name()
        ));
    }

    let missing: Vec<String> = params
        .iter()
        .zip(&slots)
        .filter(|(p, slot)| slot.is_none() && !p.is_optional())
        .map(|(p, _)| p.name.clone())
        .collect();
    if !missing.is_empty() {
        return Fit::Missing {
            params: missing,
            consumed: slots.iter().flatten().count(),
        };
    }

    // read-only members can only be set through a constructor
    let owner = ctor.owner();
    for (i, member) in members.iter().enumerate() {
        if used[i] {
            continue;
        }
        let resolved = match &member.member {
            ProjectedMember::Member(m) => Some(m.clone()),
            ProjectedMember::Name(name) => owner.find_member(name),
        };
        if resolved.is_some_and(|m| !m.is_static() && !m.is_assignable()) {
            return Fit::Unassignable(member.name().to_string());
        }
    }

    Fit::Bound(slots)
}

///
/// AttemptedSet
///
/// Names the configuration offers to constructors, for diagnostics.
///

struct AttemptedSet<'a>(&'a ProjectionConfiguration);

impl fmt::Display for AttemptedSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.0.ctor_params().iter().map(|p| p.param.to_string());
        let members = self
            .0
            .members()
            .iter()
            .filter(|m| m.target != ProjectionTarget::Member)
            .map(|m| m.ctor_param.clone().unwrap_or_else(|| m.name().to_string()));

        f.write_str(&params.chain(members).collect::<Vec<_>>().join(", "))
    }
}
