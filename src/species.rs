//! Species definitions.

use serde::{Deserialize, Serialize};

use crate::assignable::{Assign, Assignable};
use crate::expr::Expr;
use crate::model::Model;
use crate::units::Unit;

/// A chemical species living inside a compartment.
///
/// A species' amount and concentration are two views of one physical
/// quantity, related through the compartment size. The species therefore
/// stores a single initial value plus a record of which view it was given
/// in; the translation derives the other view, never letting the two be set
/// independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    sid: String,
    compartment: String,
    is_amount: bool,
    is_boundary: bool,
    is_constant: bool,
    substance_units: Option<Unit>,
    conversion_factor: Option<String>,
    initial_in_amount: Option<bool>,
    assign: Assign,
}

impl Species {
    pub(crate) fn new(
        compartment: impl Into<String>,
        sid: impl Into<String>,
        is_amount: bool,
        is_boundary: bool,
        is_constant: bool,
    ) -> Self {
        Species {
            sid: sid.into(),
            compartment: compartment.into(),
            is_amount,
            is_boundary,
            is_constant,
            substance_units: None,
            conversion_factor: None,
            initial_in_amount: None,
            assign: Assign::default(),
        }
    }

    /// The SId of the compartment this species lives in.
    pub fn compartment(&self) -> &str {
        &self.compartment
    }

    /// Whether the species is tracked in absolute amount rather than
    /// concentration.
    pub fn is_amount(&self) -> bool {
        self.is_amount
    }

    /// Whether the species is excluded from reaction-driven rate
    /// aggregation.
    pub fn is_boundary(&self) -> bool {
        self.is_boundary
    }

    pub fn is_constant(&self) -> bool {
        self.is_constant
    }

    pub fn substance_units(&self) -> Option<Unit> {
        self.substance_units
    }

    pub fn set_substance_units(&mut self, units: Unit) {
        self.substance_units = Some(units);
    }

    /// The units an amount of this species is measured in: its own
    /// substance units if declared, else the model default.
    pub fn amount_units(&self, model: &Model) -> Unit {
        self.substance_units
            .unwrap_or_else(|| model.substance_units())
    }

    /// The SId of the parameter scaling this species' reaction-driven rate,
    /// if one was declared on the species itself.
    pub fn conversion_factor(&self) -> Option<&str> {
        self.conversion_factor.as_deref()
    }

    pub(crate) fn set_conversion_factor(&mut self, parameter_sid: impl Into<String>) {
        self.conversion_factor = Some(parameter_sid.into());
    }

    /// Seeds the initial value in an explicit view: `in_amount` marks the
    /// expression as an amount rather than a concentration.
    pub fn set_initial_value_as(&mut self, value: Expr, in_amount: bool) {
        if !self.assign.has_initial_assignment() {
            self.initial_in_amount = Some(in_amount);
        }
        self.assign.set_initial_value(value);
    }

    /// Whether the resolved initial value denotes an amount. Defaults to the
    /// species' own tracking mode when no initial value was given.
    pub fn initial_in_amount(&self) -> bool {
        self.initial_in_amount.unwrap_or(self.is_amount)
    }
}

impl Assignable for Species {
    fn sid(&self) -> &str {
        &self.sid
    }

    fn assign(&self) -> &Assign {
        &self.assign
    }

    fn assign_mut(&mut self) -> &mut Assign {
        &mut self.assign
    }

    fn set_initial_value(&mut self, value: Expr) {
        // Without an explicit view, an initial value is read in the species'
        // own tracking mode.
        self.set_initial_value_as(value, self.is_amount);
    }

    fn apply_initial_assignment(&mut self, value: Expr) {
        self.initial_in_amount = Some(self.is_amount);
        self.assign.override_initial(value);
    }
}
