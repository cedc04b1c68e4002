//! SBML import for unit-annotated computational models
//!
//! This library reads declarative SBML level 3 reaction networks and turns
//! them into component/variable model graphs, including:
//! - Parsing SBML documents and a MathML expression subset
//! - A single-namespace registry of compartments, species, parameters,
//!   reactions, and stoichiometry references
//! - Rule and initial-assignment resolution with defined precedence
//! - Aggregation of reaction kinetics into per-species rate expressions
//! - Unit resolution against the SI-based SBML base unit table

#![warn(unused_imports)]

/// Commonly used types and functionality re-exported for convenience
pub mod prelude {
    pub use crate::assignable::Assignable;
    pub use crate::compartment::Compartment;
    pub use crate::error::SBMLError;
    pub use crate::expr::Expr;
    pub use crate::graph::{Component, ModelGraph, Variable};
    pub use crate::model::{is_valid_sid, Model};
    pub use crate::parameter::Parameter;
    pub use crate::parser::parse_string;
    pub use crate::reaction::{ModifierSpeciesReference, Reaction, SpeciesReference};
    pub use crate::species::Species;
    pub use crate::units::Unit;
}

/// Error types for document and model failures
pub mod error;

/// The expression sub-language used by rules and kinetic laws
pub mod expr;

/// SBML base units and user-defined unit composition
pub mod units;

/// The rule and initial-assignment target capability
pub mod assignable;

/// Compartment definitions
pub mod compartment;

/// Species definitions
pub mod species;

/// Parameter definitions
pub mod parameter;

/// Reactions and species references
pub mod reaction;

/// The model registry and rule resolution
pub mod model;

/// The emitted component/variable model graph
pub mod graph;

/// Translation of a model into its model graph
pub mod convert;

/// The SBML document reader
pub mod parser;
