//! The "assignable" capability: any entity that can be the target of a rule
//! or an initial assignment.

use serde::{Deserialize, Serialize};

use crate::expr::Expr;

/// The assignment record shared by every assignable entity.
///
/// `value` is the expression defining the entity's ongoing behaviour (a
/// derivative when `is_rate` is set, an algebraic definition otherwise).
/// `initial_value` is valid only at t = 0. The record tracks where the
/// initial value came from so that an explicit initial assignment always
/// takes precedence over an entity-intrinsic attribute, regardless of the
/// order in which the two are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assign {
    value: Option<Expr>,
    initial_value: Option<Expr>,
    is_rate: bool,
    initial_from_assignment: bool,
}

impl Assign {
    pub fn value(&self) -> Option<&Expr> {
        self.value.as_ref()
    }

    pub fn initial_value(&self) -> Option<&Expr> {
        self.initial_value.as_ref()
    }

    /// Whether `value` denotes a derivative rather than an algebraic
    /// definition.
    pub fn is_rate(&self) -> bool {
        self.is_rate
    }

    pub fn set_value(&mut self, value: Expr, is_rate: bool) {
        self.value = Some(value);
        self.is_rate = is_rate;
    }

    /// Seeds the initial value from an entity-intrinsic attribute. A no-op
    /// once an initial assignment has claimed the slot.
    pub fn set_initial_value(&mut self, value: Expr) {
        if !self.initial_from_assignment {
            self.initial_value = Some(value);
        }
    }

    /// Overrides the initial value from an explicit initial assignment.
    pub(crate) fn override_initial(&mut self, value: Expr) {
        self.initial_value = Some(value);
        self.initial_from_assignment = true;
    }

    pub(crate) fn has_initial_assignment(&self) -> bool {
        self.initial_from_assignment
    }
}

/// Capability implemented by every entity that can be targeted by a rule or
/// an initial assignment: compartments, species, parameters, and species
/// references (stoichiometries).
pub trait Assignable {
    fn sid(&self) -> &str;

    fn assign(&self) -> &Assign;

    fn assign_mut(&mut self) -> &mut Assign;

    /// The expression defining this entity's instantaneous worth, if any.
    fn value(&self) -> Option<&Expr> {
        self.assign().value()
    }

    /// The expression defining this entity's value at t = 0, if any.
    fn initial_value(&self) -> Option<&Expr> {
        self.assign().initial_value()
    }

    /// Whether [`Assignable::value`] denotes a derivative.
    fn is_rate(&self) -> bool {
        self.assign().is_rate()
    }

    fn set_value(&mut self, value: Expr, is_rate: bool) {
        self.assign_mut().set_value(value, is_rate);
    }

    fn set_initial_value(&mut self, value: Expr) {
        self.assign_mut().set_initial_value(value);
    }

    /// Applies an explicit initial assignment, overriding any
    /// attribute-seeded initial value.
    fn apply_initial_assignment(&mut self, value: Expr) {
        self.assign_mut().override_initial(value);
    }
}
