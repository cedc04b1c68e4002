//! Reaction definitions: reactants, products, modifiers, and the kinetic
//! law they share.

use serde::{Deserialize, Serialize};

use crate::assignable::{Assign, Assignable};
use crate::expr::Expr;

/// A reaction: ordered reactant and product references, a set of read-only
/// modifiers, and an optional kinetic law.
///
/// A reaction without a kinetic law contributes nothing to any species rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    sid: String,
    reactants: Vec<SpeciesReference>,
    products: Vec<SpeciesReference>,
    modifiers: Vec<ModifierSpeciesReference>,
    kinetic_law: Option<Expr>,
}

impl Reaction {
    pub(crate) fn new(sid: impl Into<String>) -> Self {
        Reaction {
            sid: sid.into(),
            reactants: Vec::new(),
            products: Vec::new(),
            modifiers: Vec::new(),
            kinetic_law: None,
        }
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn reactants(&self) -> &[SpeciesReference] {
        &self.reactants
    }

    pub fn products(&self) -> &[SpeciesReference] {
        &self.products
    }

    pub fn modifiers(&self) -> &[ModifierSpeciesReference] {
        &self.modifiers
    }

    pub fn kinetic_law(&self) -> Option<&Expr> {
        self.kinetic_law.as_ref()
    }

    /// Sets the rate expression shared, with stoichiometric scaling, by all
    /// of this reaction's reactants and products.
    pub fn set_kinetic_law(&mut self, law: Expr) {
        self.kinetic_law = Some(law);
    }

    pub(crate) fn push_reactant(&mut self, reference: SpeciesReference) -> &mut SpeciesReference {
        self.reactants.push(reference);
        self.reactants.last_mut().expect("pushed above")
    }

    pub(crate) fn push_product(&mut self, reference: SpeciesReference) -> &mut SpeciesReference {
        self.products.push(reference);
        self.products.last_mut().expect("pushed above")
    }

    pub(crate) fn push_modifier(&mut self, reference: ModifierSpeciesReference) {
        self.modifiers.push(reference);
    }

    /// Looks up a reactant or product reference by its own SId.
    pub fn species_reference(&self, sid: &str) -> Option<&SpeciesReference> {
        self.reactants
            .iter()
            .chain(self.products.iter())
            .find(|r| r.reference_sid() == Some(sid))
    }

    pub(crate) fn species_reference_mut(&mut self, sid: &str) -> Option<&mut SpeciesReference> {
        self.reactants
            .iter_mut()
            .chain(self.products.iter_mut())
            .find(|r| r.reference_sid() == Some(sid))
    }
}

/// A stoichiometric link between a reaction and one of its reactant or
/// product species.
///
/// The stoichiometry coefficient is itself assignable: it can be seeded by
/// an attribute, overridden by an initial assignment, or governed by a rule,
/// and defaults to exactly 1 when none of those apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesReference {
    sid: Option<String>,
    species: String,
    assign: Assign,
}

impl SpeciesReference {
    pub(crate) fn new(species: impl Into<String>, sid: Option<String>) -> Self {
        SpeciesReference {
            sid,
            species: species.into(),
            assign: Assign::default(),
        }
    }

    /// The SId of the referenced species.
    pub fn species(&self) -> &str {
        &self.species
    }

    /// This reference's own SId, present only when the reference was
    /// registered as an assignable.
    pub fn reference_sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }
}

impl Assignable for SpeciesReference {
    fn sid(&self) -> &str {
        self.sid.as_deref().unwrap_or_default()
    }

    fn assign(&self) -> &Assign {
        &self.assign
    }

    fn assign_mut(&mut self) -> &mut Assign {
        &mut self.assign
    }
}

/// A read-only reaction participant with no stoichiometric effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifierSpeciesReference {
    sid: Option<String>,
    species: String,
}

impl ModifierSpeciesReference {
    pub(crate) fn new(species: impl Into<String>, sid: Option<String>) -> Self {
        ModifierSpeciesReference {
            sid,
            species: species.into(),
        }
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn reference_sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }
}
