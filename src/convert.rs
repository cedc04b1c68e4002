//! Translation of a resolved SBML model into the computational model graph.
//!
//! One component is emitted per compartment, plus a reserved synthetic
//! component holding model-level parameters and the time variable. Species
//! rates are assembled by summing stoichiometry-weighted kinetic-law
//! contributions over all reactions a species participates in; boundary and
//! constant species are excluded from that aggregation.

use std::collections::HashMap;

use log::{debug, warn};

use crate::assignable::{Assign, Assignable};
use crate::error::SBMLError;
use crate::expr::Expr;
use crate::graph::{ModelGraph, Variable};
use crate::model::Model;
use crate::units::Unit;

/// Canonical name of the reserved synthetic component. Kept as `myokit` for
/// compatibility with the Myokit simulation environment this crate's output
/// targets; a user compartment with the same name wins the name and the
/// synthetic component takes a numeric suffix.
pub const SYNTHETIC_COMPONENT: &str = "myokit";

/// Name and binding label of the simulation-clock variable.
pub const TIME_VARIABLE: &str = "time";

impl Model {
    /// Translates this model into a component/variable graph ready for
    /// numerical integration.
    ///
    /// The translation is single-pass and synchronous; any failure leaves no
    /// usable graph behind.
    pub fn myokit_model(&self) -> Result<ModelGraph, SBMLError> {
        let mut graph = ModelGraph::new(self.name());
        let synthetic = self.synthetic_component_name();

        for compartment in self.compartments() {
            graph.add_component(compartment.sid())?;
        }
        graph.add_component(&synthetic)?;

        let map = self.qualified_name_map(&synthetic)?;
        let mut rates = self.reaction_rates(&map)?;

        // Compartment sizes.
        for compartment in self.compartments() {
            let unit = compartment.size_units(self);
            let variable =
                define_variable("size", Some(unit), compartment.assign(), None, &map)?;
            insert_variable(&mut graph, compartment.sid(), variable)?;
        }

        // Species, in amount and (unless amount-only) concentration view.
        for species in self.all_species() {
            let sid = species.sid();
            let compartment = self
                .compartment(species.compartment())
                .ok_or_else(|| SBMLError::UnresolvedReference(species.compartment().to_string()))?;
            let size_qname = format!("{}.size", species.compartment());
            let amount_name = format!("{sid}_amount");
            let amount_unit = species.amount_units(self);
            let assign = species.assign();

            // The resolved initial value, converted into the amount view.
            let initial_amount = match assign.initial_value() {
                Some(expr) => {
                    let expr = expr.rename(&map)?;
                    Some(if species.initial_in_amount() {
                        expr
                    } else {
                        Expr::times(expr, Expr::name(&size_qname))
                    })
                }
                None => None,
            };

            let amount_var = match assign.value() {
                Some(expr) => {
                    if rates.remove(sid).is_some() {
                        debug!("rule on species <{sid}> overrides its reaction contributions");
                    }
                    // Rule expressions are stated in the species' preferred
                    // view; scale to amounts for concentration species.
                    let mut rhs = expr.rename(&map)?;
                    if !species.is_amount() {
                        rhs = Expr::times(rhs, Expr::name(&size_qname));
                    }
                    if assign.is_rate() {
                        Variable::state(
                            &amount_name,
                            Some(amount_unit),
                            rhs,
                            initial_amount.unwrap_or(Expr::Number(0.0)),
                        )
                    } else {
                        Variable::algebraic(&amount_name, Some(amount_unit), rhs)
                    }
                }
                None => match rates.remove(sid) {
                    Some(rate) => Variable::state(
                        &amount_name,
                        Some(amount_unit),
                        rate,
                        initial_amount.unwrap_or_else(|| {
                            warn!("species <{sid}> has no initial value, defaulting to 0");
                            Expr::Number(0.0)
                        }),
                    ),
                    None => Variable::algebraic(
                        &amount_name,
                        Some(amount_unit),
                        initial_amount.unwrap_or_else(|| {
                            warn!("species <{sid}> has no initial value, defaulting to 0");
                            Expr::Number(0.0)
                        }),
                    ),
                },
            };
            insert_variable(&mut graph, species.compartment(), amount_var)?;

            if !species.is_amount() {
                let conc_unit = amount_unit / compartment.size_units(self);
                let amount_qname = format!("{}.{amount_name}", species.compartment());
                let concentration = Variable::algebraic(
                    format!("{sid}_concentration"),
                    Some(conc_unit),
                    Expr::divide(Expr::name(amount_qname), Expr::name(&size_qname)),
                );
                insert_variable(&mut graph, species.compartment(), concentration)?;
            }
        }

        // Stoichiometry variables, one per species reference with an SId,
        // placed in the compartment of the referenced species.
        for reaction in self.reactions() {
            for reference in reaction.reactants().iter().chain(reaction.products()) {
                let Some(rsid) = reference.reference_sid() else {
                    continue;
                };
                let owner = self
                    .species(reference.species())
                    .ok_or_else(|| SBMLError::UnresolvedReference(reference.species().to_string()))?
                    .compartment()
                    .to_string();
                let variable = define_variable(
                    rsid,
                    None,
                    reference.assign(),
                    Some(Expr::Number(1.0)),
                    &map,
                )?;
                insert_variable(&mut graph, &owner, variable)?;
            }
        }

        // Model-level parameters live in the synthetic component.
        for parameter in self.parameters() {
            let variable = define_variable(
                parameter.sid(),
                parameter.units(),
                parameter.assign(),
                None,
                &map,
            )?;
            insert_variable(&mut graph, &synthetic, variable)?;
        }

        // The independent time variable, bound to the simulation clock.
        let mut time_name = TIME_VARIABLE.to_string();
        let mut suffix = 0;
        while graph
            .component(&synthetic)
            .is_some_and(|c| c.has_variable(&time_name))
        {
            suffix += 1;
            time_name = format!("{TIME_VARIABLE}_{suffix}");
        }
        if suffix > 0 {
            warn!("a parameter took the name <{TIME_VARIABLE}>, clock bound as <{time_name}>");
        }
        let time = Variable::bound(
            &time_name,
            Some(self.time_units()),
            Expr::Number(0.0),
            TIME_VARIABLE,
        );
        insert_variable(&mut graph, &synthetic, time)?;
        graph.set_time(format!("{synthetic}.{time_name}"));

        Ok(graph)
    }

    /// Name of the synthetic component, suffixed until it collides with no
    /// user-declared compartment.
    fn synthetic_component_name(&self) -> String {
        let mut name = SYNTHETIC_COMPONENT.to_string();
        let mut suffix = 0;
        while self.compartment(&name).is_some() {
            suffix += 1;
            name = format!("{SYNTHETIC_COMPONENT}_{suffix}");
        }
        if suffix > 0 {
            debug!(
                "compartment <{SYNTHETIC_COMPONENT}> declared by the model, \
                 synthetic component renamed to <{name}>"
            );
        }
        name
    }

    /// Maps every SId to the qualified name of the variable that represents
    /// it in the emitted graph. Species map to their preferred view.
    fn qualified_name_map(&self, synthetic: &str) -> Result<HashMap<String, String>, SBMLError> {
        let mut map = HashMap::new();
        for compartment in self.compartments() {
            map.insert(
                compartment.sid().to_string(),
                format!("{}.size", compartment.sid()),
            );
        }
        for species in self.all_species() {
            let view = if species.is_amount() {
                "amount"
            } else {
                "concentration"
            };
            map.insert(
                species.sid().to_string(),
                format!("{}.{}_{view}", species.compartment(), species.sid()),
            );
        }
        for parameter in self.parameters() {
            map.insert(
                parameter.sid().to_string(),
                format!("{synthetic}.{}", parameter.sid()),
            );
        }
        for reaction in self.reactions() {
            for reference in reaction.reactants().iter().chain(reaction.products()) {
                let Some(rsid) = reference.reference_sid() else {
                    continue;
                };
                let owner = self
                    .species(reference.species())
                    .ok_or_else(|| SBMLError::UnresolvedReference(reference.species().to_string()))?
                    .compartment();
                map.insert(rsid.to_string(), format!("{owner}.{rsid}"));
            }
        }
        Ok(map)
    }

    /// Assembles the net amount-rate contributed by reactions, per species.
    ///
    /// Each reaction with a kinetic law contributes
    /// `± conversion_factor × stoichiometry × kinetic_law` to every
    /// non-boundary, non-constant reactant (negative) and product
    /// (positive). The conversion factor is the species' own, else the
    /// model-wide one, and is applied exactly once per reaction.
    fn reaction_rates(
        &self,
        map: &HashMap<String, String>,
    ) -> Result<HashMap<String, Expr>, SBMLError> {
        let mut rates: HashMap<String, Expr> = HashMap::new();

        for reaction in self.reactions() {
            let Some(law) = reaction.kinetic_law() else {
                debug!(
                    "reaction <{}> has no kinetic law and contributes no rates",
                    reaction.sid()
                );
                continue;
            };
            let law = law.rename(map)?;

            let references = reaction
                .reactants()
                .iter()
                .map(|r| (r, true))
                .chain(reaction.products().iter().map(|r| (r, false)));

            for (reference, is_reactant) in references {
                let species = self.species(reference.species()).ok_or_else(|| {
                    SBMLError::UnresolvedReference(reference.species().to_string())
                })?;
                if species.is_boundary() || species.is_constant() {
                    continue;
                }

                let stoichiometry = match reference.reference_sid() {
                    // A registered reference is represented by a variable,
                    // so rules targeting it take effect.
                    Some(rsid) => Expr::Name(
                        map.get(rsid)
                            .cloned()
                            .ok_or_else(|| SBMLError::UnresolvedReference(rsid.to_string()))?,
                    ),
                    None => match reference.initial_value() {
                        Some(expr) => expr.rename(map)?,
                        None => Expr::Number(1.0),
                    },
                };

                let mut term = Expr::times(stoichiometry, law.clone());
                if let Some(factor) = species
                    .conversion_factor()
                    .or_else(|| self.conversion_factor_sid())
                {
                    let qname = map
                        .get(factor)
                        .cloned()
                        .ok_or_else(|| SBMLError::UnresolvedReference(factor.to_string()))?;
                    term = Expr::times(Expr::Name(qname), term);
                }
                if is_reactant {
                    term = Expr::prefix_minus(term);
                }

                let sid = species.sid().to_string();
                let combined = match rates.remove(&sid) {
                    Some(existing) => Expr::plus(existing, term),
                    None => term,
                };
                rates.insert(sid, combined);
            }
        }

        Ok(rates)
    }
}

/// Builds the variable for a plain (non-species) assignable: a rate rule
/// makes it a state, an assignment rule pins it, otherwise it holds its
/// resolved initial value (or `default_initial`, or zero).
fn define_variable(
    name: &str,
    unit: Option<Unit>,
    assign: &Assign,
    default_initial: Option<Expr>,
    map: &HashMap<String, String>,
) -> Result<Variable, SBMLError> {
    let initial = match assign.initial_value() {
        Some(expr) => Some(expr.rename(map)?),
        None => default_initial,
    };

    match assign.value() {
        Some(expr) if assign.is_rate() => Ok(Variable::state(
            name,
            unit,
            expr.rename(map)?,
            initial.unwrap_or(Expr::Number(0.0)),
        )),
        Some(expr) => Ok(Variable::algebraic(name, unit, expr.rename(map)?)),
        None => Ok(Variable::algebraic(
            name,
            unit,
            initial.unwrap_or_else(|| {
                debug!("no value resolved for <{name}>, holding 0");
                Expr::Number(0.0)
            }),
        )),
    }
}

/// Adds `variable` to the named component of `graph`.
fn insert_variable(
    graph: &mut ModelGraph,
    component: &str,
    variable: Variable,
) -> Result<(), SBMLError> {
    match graph.component_mut(component) {
        Some(entry) => entry.add_variable(variable),
        None => Err(SBMLError::UnresolvedReference(component.to_string())),
    }
}
