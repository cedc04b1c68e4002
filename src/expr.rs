//! Expression sub-language shared by rules, initial assignments, and kinetic
//! laws.
//!
//! Expressions are immutable trees over numbers and named references. The
//! translation pipeline never evaluates them eagerly: it rewrites references
//! from SId space into the emitted variable namespace and leaves evaluation
//! to the consumer of the finished model (the graph's resolver-driven
//! evaluation is also what the test suites use).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SBMLError;

/// An expression over numbers and named references.
///
/// Setters across the crate accept this type and nothing else, so "a value
/// that is not an expression" cannot be constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A numeric literal.
    Number(f64),
    /// A reference to another quantity by name.
    Name(String),
    /// Unary negation.
    PrefixMinus(Box<Expr>),
    Plus(Box<Expr>, Box<Expr>),
    Minus(Box<Expr>, Box<Expr>),
    Times(Box<Expr>, Box<Expr>),
    Divide(Box<Expr>, Box<Expr>),
    Power(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Creates a reference to `name`.
    pub fn name(name: impl Into<String>) -> Self {
        Expr::Name(name.into())
    }

    pub fn plus(left: Expr, right: Expr) -> Self {
        Expr::Plus(Box::new(left), Box::new(right))
    }

    pub fn minus(left: Expr, right: Expr) -> Self {
        Expr::Minus(Box::new(left), Box::new(right))
    }

    pub fn times(left: Expr, right: Expr) -> Self {
        Expr::Times(Box::new(left), Box::new(right))
    }

    pub fn divide(left: Expr, right: Expr) -> Self {
        Expr::Divide(Box::new(left), Box::new(right))
    }

    pub fn power(left: Expr, right: Expr) -> Self {
        Expr::Power(Box::new(left), Box::new(right))
    }

    pub fn prefix_minus(operand: Expr) -> Self {
        Expr::PrefixMinus(Box::new(operand))
    }

    /// Returns every name referenced by this expression, in order of first
    /// appearance and without duplicates.
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Name(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expr::PrefixMinus(operand) => operand.collect_references(names),
            Expr::Plus(a, b)
            | Expr::Minus(a, b)
            | Expr::Times(a, b)
            | Expr::Divide(a, b)
            | Expr::Power(a, b) => {
                a.collect_references(names);
                b.collect_references(names);
            }
        }
    }

    /// Rewrites every referenced name through `map`, returning a new
    /// expression in the target namespace.
    ///
    /// Fails with [`SBMLError::UnresolvedReference`] for any name the map
    /// does not cover; this is where rules and kinetic laws naming unknown
    /// SIds are caught.
    pub fn rename(&self, map: &HashMap<String, String>) -> Result<Expr, SBMLError> {
        match self {
            Expr::Number(value) => Ok(Expr::Number(*value)),
            Expr::Name(name) => map
                .get(name)
                .map(|target| Expr::Name(target.clone()))
                .ok_or_else(|| SBMLError::UnresolvedReference(name.clone())),
            Expr::PrefixMinus(operand) => Ok(Expr::prefix_minus(operand.rename(map)?)),
            Expr::Plus(a, b) => Ok(Expr::plus(a.rename(map)?, b.rename(map)?)),
            Expr::Minus(a, b) => Ok(Expr::minus(a.rename(map)?, b.rename(map)?)),
            Expr::Times(a, b) => Ok(Expr::times(a.rename(map)?, b.rename(map)?)),
            Expr::Divide(a, b) => Ok(Expr::divide(a.rename(map)?, b.rename(map)?)),
            Expr::Power(a, b) => Ok(Expr::power(a.rename(map)?, b.rename(map)?)),
        }
    }

    /// Evaluates the expression against a fixed set of bindings.
    ///
    /// Fails with [`SBMLError::UnresolvedReference`] for unbound names. The
    /// emitted model graph carries its own recursive resolver; this form is
    /// for callers that already hold a flat valuation.
    pub fn eval(&self, bindings: &HashMap<String, f64>) -> Result<f64, SBMLError> {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Name(name) => bindings
                .get(name)
                .copied()
                .ok_or_else(|| SBMLError::UnresolvedReference(name.clone())),
            Expr::PrefixMinus(operand) => Ok(-operand.eval(bindings)?),
            Expr::Plus(a, b) => Ok(a.eval(bindings)? + b.eval(bindings)?),
            Expr::Minus(a, b) => Ok(a.eval(bindings)? - b.eval(bindings)?),
            Expr::Times(a, b) => Ok(a.eval(bindings)? * b.eval(bindings)?),
            Expr::Divide(a, b) => Ok(a.eval(bindings)? / b.eval(bindings)?),
            Expr::Power(a, b) => Ok(a.eval(bindings)?.powf(b.eval(bindings)?)),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{value}"),
            Expr::Name(name) => write!(f, "{name}"),
            Expr::PrefixMinus(operand) => write!(f, "-{operand}"),
            Expr::Plus(a, b) => write!(f, "({a} + {b})"),
            Expr::Minus(a, b) => write!(f, "({a} - {b})"),
            Expr::Times(a, b) => write!(f, "({a} * {b})"),
            Expr::Divide(a, b) => write!(f, "({a} / {b})"),
            Expr::Power(a, b) => write!(f, "({a} ^ {b})"),
        }
    }
}
