//! The SBML model: one registry owning every entity, keyed by SId.
//!
//! Compartments, species, parameters, reactions, and reaction-owned species
//! references share a single identifier namespace. All entities are created
//! through the `add_*` factories here, which validate the SId grammar and
//! reject duplicates eagerly; rule resolution and initial assignments only
//! ever mutate the assignment records of existing entities.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::debug;
use regex::Regex;

use crate::assignable::Assignable;
use crate::compartment::Compartment;
use crate::error::SBMLError;
use crate::expr::Expr;
use crate::parameter::Parameter;
use crate::reaction::{ModifierSpeciesReference, Reaction, SpeciesReference};
use crate::species::Species;
use crate::units::{self, Unit};

lazy_static::lazy_static! {
    /// The SId grammar: a letter or underscore followed by letters, digits,
    /// and underscores.
    static ref SID_PATTERN: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
        .expect("the SId pattern is a valid regex");
}

/// Checks `sid` against the identifier grammar.
pub fn is_valid_sid(sid: &str) -> bool {
    SID_PATTERN.is_match(sid)
}

/// A declarative biochemical-network model under construction.
///
/// Entity insertion order is preserved for deterministic emission; lookup is
/// by SId.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    notes: Option<String>,
    compartments: IndexMap<String, Compartment>,
    species: IndexMap<String, Species>,
    parameters: IndexMap<String, Parameter>,
    reactions: IndexMap<String, Reaction>,
    units: HashMap<String, Unit>,
    conversion_factor: Option<String>,
    time_units: Unit,
    substance_units: Unit,
    extent_units: Unit,
    length_units: Unit,
    area_units: Unit,
    volume_units: Unit,
    sids: HashSet<String>,
}

impl Model {
    /// Creates an empty model. All model-level unit defaults start out
    /// dimensionless.
    pub fn new(name: impl Into<String>) -> Self {
        Model {
            name: name.into(),
            notes: None,
            compartments: IndexMap::new(),
            species: IndexMap::new(),
            parameters: IndexMap::new(),
            reactions: IndexMap::new(),
            units: HashMap::new(),
            conversion_factor: None,
            time_units: Unit::DIMENSIONLESS,
            substance_units: Unit::DIMENSIONLESS,
            extent_units: Unit::DIMENSIONLESS,
            length_units: Unit::DIMENSIONLESS,
            area_units: Unit::DIMENSIONLESS,
            volume_units: Unit::DIMENSIONLESS,
            sids: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = Some(notes.into());
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Validates `sid` and claims it in the shared namespace.
    fn register_sid(&mut self, sid: &str) -> Result<(), SBMLError> {
        if !is_valid_sid(sid) {
            return Err(SBMLError::InvalidSId(sid.to_string()));
        }
        if !self.sids.insert(sid.to_string()) {
            return Err(SBMLError::DuplicateSId(sid.to_string()));
        }
        Ok(())
    }

    /// Adds a compartment to the model.
    pub fn add_compartment(&mut self, sid: &str) -> Result<&mut Compartment, SBMLError> {
        self.register_sid(sid)?;
        Ok(self
            .compartments
            .entry(sid.to_string())
            .or_insert_with(|| Compartment::new(sid)))
    }

    pub fn compartment(&self, sid: &str) -> Option<&Compartment> {
        self.compartments.get(sid)
    }

    pub fn compartment_mut(&mut self, sid: &str) -> Option<&mut Compartment> {
        self.compartments.get_mut(sid)
    }

    pub fn compartments(&self) -> impl Iterator<Item = &Compartment> {
        self.compartments.values()
    }

    /// Adds a species to the model. The compartment must already be
    /// registered.
    pub fn add_species(
        &mut self,
        compartment: &str,
        sid: &str,
        is_amount: bool,
        is_boundary: bool,
        is_constant: bool,
    ) -> Result<&mut Species, SBMLError> {
        if !self.compartments.contains_key(compartment) {
            return Err(SBMLError::UnresolvedReference(compartment.to_string()));
        }
        self.register_sid(sid)?;
        Ok(self
            .species
            .entry(sid.to_string())
            .or_insert_with(|| Species::new(compartment, sid, is_amount, is_boundary, is_constant)))
    }

    pub fn species(&self, sid: &str) -> Option<&Species> {
        self.species.get(sid)
    }

    pub fn species_mut(&mut self, sid: &str) -> Option<&mut Species> {
        self.species.get_mut(sid)
    }

    pub fn all_species(&self) -> impl Iterator<Item = &Species> {
        self.species.values()
    }

    /// Adds a parameter to the model.
    pub fn add_parameter(&mut self, sid: &str) -> Result<&mut Parameter, SBMLError> {
        self.register_sid(sid)?;
        Ok(self
            .parameters
            .entry(sid.to_string())
            .or_insert_with(|| Parameter::new(sid)))
    }

    pub fn parameter(&self, sid: &str) -> Option<&Parameter> {
        self.parameters.get(sid)
    }

    pub fn parameter_mut(&mut self, sid: &str) -> Option<&mut Parameter> {
        self.parameters.get_mut(sid)
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }

    /// Adds a reaction to the model.
    pub fn add_reaction(&mut self, sid: &str) -> Result<&mut Reaction, SBMLError> {
        self.register_sid(sid)?;
        Ok(self
            .reactions
            .entry(sid.to_string())
            .or_insert_with(|| Reaction::new(sid)))
    }

    pub fn reaction(&self, sid: &str) -> Option<&Reaction> {
        self.reactions.get(sid)
    }

    pub fn reaction_mut(&mut self, sid: &str) -> Option<&mut Reaction> {
        self.reactions.get_mut(sid)
    }

    pub fn reactions(&self) -> impl Iterator<Item = &Reaction> {
        self.reactions.values()
    }

    /// Adds a reactant reference to a reaction. When `reference_sid` is
    /// given the reference's stoichiometry becomes an assignable registered
    /// in the shared namespace.
    pub fn add_reactant(
        &mut self,
        reaction: &str,
        species: &str,
        reference_sid: Option<&str>,
    ) -> Result<&mut SpeciesReference, SBMLError> {
        let reference = self.new_species_reference(reaction, species, reference_sid)?;
        let entry = self
            .reactions
            .get_mut(reaction)
            .ok_or_else(|| SBMLError::UnresolvedReference(reaction.to_string()))?;
        Ok(entry.push_reactant(reference))
    }

    /// Adds a product reference to a reaction.
    pub fn add_product(
        &mut self,
        reaction: &str,
        species: &str,
        reference_sid: Option<&str>,
    ) -> Result<&mut SpeciesReference, SBMLError> {
        let reference = self.new_species_reference(reaction, species, reference_sid)?;
        let entry = self
            .reactions
            .get_mut(reaction)
            .ok_or_else(|| SBMLError::UnresolvedReference(reaction.to_string()))?;
        Ok(entry.push_product(reference))
    }

    /// Adds a read-only modifier reference to a reaction.
    pub fn add_modifier(
        &mut self,
        reaction: &str,
        species: &str,
        reference_sid: Option<&str>,
    ) -> Result<(), SBMLError> {
        if !self.reactions.contains_key(reaction) {
            return Err(SBMLError::UnresolvedReference(reaction.to_string()));
        }
        if !self.species.contains_key(species) {
            return Err(SBMLError::UnresolvedReference(species.to_string()));
        }
        if let Some(sid) = reference_sid {
            self.register_sid(sid)?;
        }
        let reference = ModifierSpeciesReference::new(species, reference_sid.map(String::from));
        if let Some(entry) = self.reactions.get_mut(reaction) {
            entry.push_modifier(reference);
        }
        Ok(())
    }

    fn new_species_reference(
        &mut self,
        reaction: &str,
        species: &str,
        reference_sid: Option<&str>,
    ) -> Result<SpeciesReference, SBMLError> {
        if !self.reactions.contains_key(reaction) {
            return Err(SBMLError::UnresolvedReference(reaction.to_string()));
        }
        if !self.species.contains_key(species) {
            return Err(SBMLError::UnresolvedReference(species.to_string()));
        }
        if let Some(sid) = reference_sid {
            self.register_sid(sid)?;
        }
        Ok(SpeciesReference::new(
            species,
            reference_sid.map(String::from),
        ))
    }

    /// Looks up an assignable of any entity kind by SId.
    pub fn assignable(&self, sid: &str) -> Result<&dyn Assignable, SBMLError> {
        if let Some(c) = self.compartments.get(sid) {
            return Ok(c);
        }
        if let Some(s) = self.species.get(sid) {
            return Ok(s);
        }
        if let Some(p) = self.parameters.get(sid) {
            return Ok(p);
        }
        for reaction in self.reactions.values() {
            if let Some(reference) = reaction.species_reference(sid) {
                return Ok(reference);
            }
        }
        Err(SBMLError::UnresolvedReference(sid.to_string()))
    }

    /// Mutable form of [`Model::assignable`].
    pub fn assignable_mut(&mut self, sid: &str) -> Result<&mut dyn Assignable, SBMLError> {
        if let Some(c) = self.compartments.get_mut(sid) {
            return Ok(c);
        }
        if let Some(s) = self.species.get_mut(sid) {
            return Ok(s);
        }
        if let Some(p) = self.parameters.get_mut(sid) {
            return Ok(p);
        }
        for reaction in self.reactions.values_mut() {
            if let Some(reference) = reaction.species_reference_mut(sid) {
                return Ok(reference);
            }
        }
        Err(SBMLError::UnresolvedReference(sid.to_string()))
    }

    // ------------------------------------------------------------------
    // Rules and initial assignments
    // ------------------------------------------------------------------

    /// Applies an explicit initial assignment to the entity named by `sid`,
    /// overriding any attribute-seeded initial value.
    ///
    /// A second initial assignment against the same entity is rejected
    /// rather than silently overwritten.
    pub fn set_initial_assignment(&mut self, sid: &str, value: Expr) -> Result<(), SBMLError> {
        let target = self.assignable_mut(sid)?;
        if target.assign().has_initial_assignment() {
            return Err(SBMLError::DuplicateInitialAssignment(sid.to_string()));
        }
        target.apply_initial_assignment(value);
        Ok(())
    }

    /// Pins the entity named by `sid` to `value` at all times.
    pub fn set_assignment_rule(&mut self, sid: &str, value: Expr) -> Result<(), SBMLError> {
        self.set_rule(sid, value, false)
    }

    /// Promotes the entity named by `sid` to a state variable with
    /// derivative `value`.
    pub fn set_rate_rule(&mut self, sid: &str, value: Expr) -> Result<(), SBMLError> {
        self.set_rule(sid, value, true)
    }

    fn set_rule(&mut self, sid: &str, value: Expr, is_rate: bool) -> Result<(), SBMLError> {
        let target = self.assignable_mut(sid)?;
        if target.value().is_some() {
            return Err(SBMLError::DuplicateRule(sid.to_string()));
        }
        target.set_value(value, is_rate);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------

    /// Resolves an SBML base unit name.
    pub fn base_unit(&self, name: &str) -> Result<Unit, SBMLError> {
        units::base_unit(name)
    }

    /// Resolves a unit SId: user-registered units first, then base units.
    pub fn unit(&self, unit_sid: &str) -> Result<Unit, SBMLError> {
        if let Some(unit) = self.units.get(unit_sid) {
            return Ok(*unit);
        }
        match units::base_unit(unit_sid) {
            Ok(unit) => Ok(unit),
            Err(err @ SBMLError::UnsupportedBaseUnit(_)) => Err(err),
            Err(_) => Err(SBMLError::UnknownUnit(unit_sid.to_string())),
        }
    }

    /// Registers a user-defined unit under `unit_sid`.
    pub fn add_unit(&mut self, unit_sid: &str, unit: Unit) -> Result<(), SBMLError> {
        if !is_valid_sid(unit_sid) {
            return Err(SBMLError::InvalidUnitSId(unit_sid.to_string()));
        }
        if units::is_base_unit_name(unit_sid) {
            return Err(SBMLError::UnitOverride(unit_sid.to_string()));
        }
        if self.units.contains_key(unit_sid) {
            return Err(SBMLError::DuplicateUnitSId(unit_sid.to_string()));
        }
        debug!("registered unit {unit_sid} = {unit}");
        self.units.insert(unit_sid.to_string(), unit);
        Ok(())
    }

    pub fn time_units(&self) -> Unit {
        self.time_units
    }

    pub fn set_time_units(&mut self, units: Unit) {
        self.time_units = units;
    }

    pub fn substance_units(&self) -> Unit {
        self.substance_units
    }

    pub fn set_substance_units(&mut self, units: Unit) {
        self.substance_units = units;
    }

    pub fn extent_units(&self) -> Unit {
        self.extent_units
    }

    pub fn set_extent_units(&mut self, units: Unit) {
        self.extent_units = units;
    }

    pub fn length_units(&self) -> Unit {
        self.length_units
    }

    pub fn set_length_units(&mut self, units: Unit) {
        self.length_units = units;
    }

    pub fn area_units(&self) -> Unit {
        self.area_units
    }

    pub fn set_area_units(&mut self, units: Unit) {
        self.area_units = units;
    }

    pub fn volume_units(&self) -> Unit {
        self.volume_units
    }

    pub fn set_volume_units(&mut self, units: Unit) {
        self.volume_units = units;
    }

    // ------------------------------------------------------------------
    // Conversion factors
    // ------------------------------------------------------------------

    /// The model-wide conversion factor parameter, applied to species that
    /// declare none of their own.
    pub fn conversion_factor(&self) -> Option<&Parameter> {
        self.conversion_factor
            .as_ref()
            .and_then(|sid| self.parameters.get(sid))
    }

    pub(crate) fn conversion_factor_sid(&self) -> Option<&str> {
        self.conversion_factor.as_deref()
    }

    /// Sets the model-wide conversion factor. The parameter must already be
    /// registered.
    pub fn set_conversion_factor(&mut self, parameter_sid: &str) -> Result<(), SBMLError> {
        if !self.parameters.contains_key(parameter_sid) {
            return Err(SBMLError::UnresolvedReference(parameter_sid.to_string()));
        }
        self.conversion_factor = Some(parameter_sid.to_string());
        Ok(())
    }

    /// Declares a conversion factor for one species. Both the species and
    /// the parameter must already be registered.
    pub fn set_species_conversion_factor(
        &mut self,
        species_sid: &str,
        parameter_sid: &str,
    ) -> Result<(), SBMLError> {
        if !self.parameters.contains_key(parameter_sid) {
            return Err(SBMLError::UnresolvedReference(parameter_sid.to_string()));
        }
        let species = self
            .species
            .get_mut(species_sid)
            .ok_or_else(|| SBMLError::UnresolvedReference(species_sid.to_string()))?;
        species.set_conversion_factor(parameter_sid);
        Ok(())
    }
}
