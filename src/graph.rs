//! The emitted computational model: a namespace of components, each holding
//! named variables with units, defining expressions, and a rate-or-algebraic
//! classification.
//!
//! This is the structure handed to the numerical engine. The engine
//! enumerates components and variables, queries units and state
//! classification, and evaluates defining expressions; the resolver-driven
//! evaluation here is also what the integration tests use to pin down the
//! translation semantics.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::SBMLError;
use crate::expr::Expr;
use crate::units::Unit;

/// A single named quantity in the emitted model.
#[derive(Debug, Clone, Serialize)]
pub struct Variable {
    name: String,
    unit: Option<Unit>,
    rhs: Expr,
    initial: Option<Expr>,
    state: bool,
    binding: Option<String>,
}

impl Variable {
    /// A variable defined algebraically (or held constant) by `rhs`.
    pub fn algebraic(name: impl Into<String>, unit: Option<Unit>, rhs: Expr) -> Self {
        Variable {
            name: name.into(),
            unit,
            rhs,
            initial: None,
            state: false,
            binding: None,
        }
    }

    /// A state variable: `rhs` is its derivative, `initial` seeds the
    /// integrator.
    pub fn state(name: impl Into<String>, unit: Option<Unit>, rhs: Expr, initial: Expr) -> Self {
        Variable {
            name: name.into(),
            unit,
            rhs,
            initial: Some(initial),
            state: true,
            binding: None,
        }
    }

    /// A variable bound to an external source (the simulation clock), seeded
    /// by `seed` until the engine overrides it.
    pub fn bound(
        name: impl Into<String>,
        unit: Option<Unit>,
        seed: Expr,
        binding: impl Into<String>,
    ) -> Self {
        Variable {
            name: name.into(),
            unit,
            rhs: seed,
            initial: None,
            state: false,
            binding: Some(binding.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> Option<Unit> {
        self.unit
    }

    /// The defining expression: the derivative for states, the definition
    /// or constant seed otherwise.
    pub fn rhs(&self) -> &Expr {
        &self.rhs
    }

    /// The initial value of a state variable.
    pub fn initial_value(&self) -> Option<&Expr> {
        self.initial.as_ref()
    }

    /// Whether this variable is a member of the integration state vector.
    pub fn is_state(&self) -> bool {
        self.state
    }

    /// The external source this variable is bound to, if any.
    pub fn binding(&self) -> Option<&str> {
        self.binding.as_deref()
    }
}

/// A named group of variables.
#[derive(Debug, Clone, Serialize)]
pub struct Component {
    name: String,
    variables: IndexMap<String, Variable>,
}

impl Component {
    fn new(name: impl Into<String>) -> Self {
        Component {
            name: name.into(),
            variables: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a variable, rejecting duplicate names.
    pub fn add_variable(&mut self, variable: Variable) -> Result<(), SBMLError> {
        if self.variables.contains_key(variable.name()) {
            return Err(SBMLError::DuplicateName(format!(
                "{}.{}",
                self.name,
                variable.name()
            )));
        }
        self.variables.insert(variable.name().to_string(), variable);
        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn count_variables(&self) -> usize {
        self.variables.len()
    }
}

/// The finished model graph: insertion-ordered components holding
/// insertion-ordered variables.
#[derive(Debug, Clone, Serialize)]
pub struct ModelGraph {
    name: String,
    components: IndexMap<String, Component>,
    time: Option<String>,
}

impl ModelGraph {
    pub fn new(name: impl Into<String>) -> Self {
        ModelGraph {
            name: name.into(),
            components: IndexMap::new(),
            time: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a component, rejecting duplicate names.
    pub fn add_component(&mut self, name: &str) -> Result<&mut Component, SBMLError> {
        if self.components.contains_key(name) {
            return Err(SBMLError::DuplicateName(name.to_string()));
        }
        Ok(self
            .components
            .entry(name.to_string())
            .or_insert_with(|| Component::new(name)))
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    pub(crate) fn component_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.components.get_mut(name)
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn count_components(&self) -> usize {
        self.components.len()
    }

    /// Looks up a variable by its qualified `component.variable` name.
    pub fn get(&self, qname: &str) -> Option<&Variable> {
        let (component, variable) = qname.split_once('.')?;
        self.components.get(component)?.variable(variable)
    }

    pub fn has_variable(&self, qname: &str) -> bool {
        self.get(qname).is_some()
    }

    /// Total number of variables across all components.
    pub fn count_variables(&self) -> usize {
        self.components.values().map(Component::count_variables).sum()
    }

    /// Qualified names of all state variables, in emission order.
    pub fn states(&self) -> Vec<String> {
        self.components
            .values()
            .flat_map(|c| {
                c.variables()
                    .filter(|v| v.is_state())
                    .map(move |v| format!("{}.{}", c.name(), v.name()))
            })
            .collect()
    }

    /// The qualified name of the variable bound to the simulation clock.
    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    pub(crate) fn set_time(&mut self, qname: impl Into<String>) {
        self.time = Some(qname.into());
    }

    /// Evaluates the defining expression of the variable named `qname`.
    ///
    /// References to state variables resolve to the state's initial value;
    /// bound variables resolve to their seed; everything else is evaluated
    /// recursively. Cyclic definitions are reported as errors.
    pub fn eval(&self, qname: &str) -> Result<f64, SBMLError> {
        let variable = self
            .get(qname)
            .ok_or_else(|| SBMLError::UnresolvedReference(qname.to_string()))?;
        let mut active = HashSet::new();
        self.eval_expr(variable.rhs(), &mut active)
    }

    fn eval_expr(&self, expr: &Expr, active: &mut HashSet<String>) -> Result<f64, SBMLError> {
        match expr {
            Expr::Number(value) => Ok(*value),
            Expr::Name(name) => self.value_of(name, active),
            Expr::PrefixMinus(operand) => Ok(-self.eval_expr(operand, active)?),
            Expr::Plus(a, b) => Ok(self.eval_expr(a, active)? + self.eval_expr(b, active)?),
            Expr::Minus(a, b) => Ok(self.eval_expr(a, active)? - self.eval_expr(b, active)?),
            Expr::Times(a, b) => Ok(self.eval_expr(a, active)? * self.eval_expr(b, active)?),
            Expr::Divide(a, b) => Ok(self.eval_expr(a, active)? / self.eval_expr(b, active)?),
            Expr::Power(a, b) => {
                Ok(self.eval_expr(a, active)?.powf(self.eval_expr(b, active)?))
            }
        }
    }

    /// The value a *reference* to `qname` takes during evaluation.
    fn value_of(&self, qname: &str, active: &mut HashSet<String>) -> Result<f64, SBMLError> {
        let variable = self
            .get(qname)
            .ok_or_else(|| SBMLError::UnresolvedReference(qname.to_string()))?;
        if !active.insert(qname.to_string()) {
            return Err(SBMLError::CircularReference(qname.to_string()));
        }
        let value = if variable.is_state() {
            match variable.initial_value() {
                Some(initial) => self.eval_expr(initial, active),
                None => Ok(0.0),
            }
        } else {
            self.eval_expr(variable.rhs(), active)
        };
        active.remove(qname);
        value
    }

    /// Serialises the graph to JSON for downstream consumers.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ModelGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "model {}", self.name)?;
        for component in self.components.values() {
            writeln!(f, "  component {}", component.name())?;
            for variable in component.variables() {
                let marker = if variable.is_state() {
                    "state "
                } else if variable.binding().is_some() {
                    "bound "
                } else {
                    ""
                };
                writeln!(f, "    {}{} = {}", marker, variable.name(), variable.rhs())?;
            }
        }
        Ok(())
    }
}
