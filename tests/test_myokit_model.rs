//! Tests for the translation of a model into its component/variable graph.

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use sbmlkit::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A model with one compartment of size 10 in litres.
fn model_with_compartment() -> Model {
    let mut model = Model::new("m");
    let litre = model.unit("litre").unwrap();
    let compartment = model.add_compartment("c").unwrap();
    compartment.set_size_units(litre);
    compartment.set_initial_value(Expr::Number(10.0));
    model
}

#[test]
fn test_components() {
    init_logging();
    let mut model = Model::new("m");
    model.add_compartment("a").unwrap();
    model.add_compartment("b").unwrap();

    let graph = model.myokit_model().unwrap();
    assert!(graph.has_component("a"));
    assert!(graph.has_component("b"));
    assert!(graph.has_component("myokit"));
    assert_eq!(graph.count_components(), 3);
    assert_eq!(graph.time(), Some("myokit.time"));
}

#[test]
fn test_reserved_component_name_collision() {
    init_logging();
    let mut model = Model::new("m");
    model.add_compartment("myokit").unwrap();

    let graph = model.myokit_model().unwrap();
    // The user compartment keeps its name, the synthetic component moves.
    assert!(graph.has_variable("myokit.size"));
    assert!(graph.has_component("myokit_1"));
    assert_eq!(graph.time(), Some("myokit_1.time"));

    model.add_compartment("myokit_1").unwrap();
    let graph = model.myokit_model().unwrap();
    assert_eq!(graph.time(), Some("myokit_2.time"));
}

#[test]
fn test_compartment_size_variable() {
    init_logging();
    let model = model_with_compartment();
    let litre = model.unit("litre").unwrap();

    let graph = model.myokit_model().unwrap();
    let size = graph.get("c.size").unwrap();
    assert_eq!(size.unit(), Some(litre));
    assert!(!size.is_state());
    assert_relative_eq!(graph.eval("c.size").unwrap(), 10.0);
}

#[test]
fn test_size_units_follow_spatial_dimensions() {
    init_logging();
    let mut model = Model::new("m");
    model.set_area_units(Unit::METER.powi(2));
    let compartment = model.add_compartment("c").unwrap();
    compartment.set_spatial_dimensions(2.0);

    let graph = model.myokit_model().unwrap();
    assert_eq!(graph.get("c.size").unwrap().unit(), Some(Unit::METER.powi(2)));
}

#[test]
fn test_size_initial_assignment_wins() {
    init_logging();
    let mut model = model_with_compartment();
    model.set_initial_assignment("c", Expr::Number(5.0)).unwrap();

    let graph = model.myokit_model().unwrap();
    assert_relative_eq!(graph.eval("c.size").unwrap(), 5.0);
}

#[test]
fn test_size_assignment_rule() {
    init_logging();
    let mut model = model_with_compartment();
    model
        .set_assignment_rule("c", Expr::plus(Expr::Number(2.0), Expr::Number(5.0)))
        .unwrap();

    let graph = model.myokit_model().unwrap();
    assert!(!graph.get("c.size").unwrap().is_state());
    assert_relative_eq!(graph.eval("c.size").unwrap(), 7.0);
}

#[test]
fn test_size_rate_rule_promotes_to_state() {
    init_logging();
    let mut model = model_with_compartment();
    model.set_rate_rule("c", Expr::Number(2.0)).unwrap();
    model.add_parameter("q").unwrap();
    model.set_assignment_rule("q", Expr::name("c")).unwrap();

    let graph = model.myokit_model().unwrap();
    let size = graph.get("c.size").unwrap();
    assert!(size.is_state());
    assert_eq!(graph.states(), vec!["c.size".to_string()]);

    // Evaluating the state yields its derivative; a reference to the state
    // resolves to its initial value.
    assert_relative_eq!(graph.eval("c.size").unwrap(), 2.0);
    assert_relative_eq!(graph.eval("myokit.q").unwrap(), 10.0);
}

#[test]
fn test_species_amount_and_concentration_views() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "plain", false, false, false).unwrap();
    model.add_species("c", "amt", true, false, false).unwrap();

    let graph = model.myokit_model().unwrap();
    assert!(graph.has_variable("c.plain_amount"));
    assert!(graph.has_variable("c.plain_concentration"));
    assert!(graph.has_variable("c.amt_amount"));
    assert!(!graph.has_variable("c.amt_concentration"));
    // size + 2 views + 1 view.
    assert_eq!(graph.component("c").unwrap().count_variables(), 4);
}

#[test]
fn test_species_units() {
    init_logging();
    let mut model = Model::new("m");
    let compartment = model.add_compartment("c").unwrap();
    compartment.set_size_units(Unit::METER);
    model.add_species("c", "s", false, false, false).unwrap();
    model
        .species_mut("s")
        .unwrap()
        .set_substance_units(Unit::KILOGRAM);

    let graph = model.myokit_model().unwrap();
    assert_eq!(
        graph.get("c.s_amount").unwrap().unit(),
        Some(Unit::KILOGRAM)
    );
    assert_eq!(
        graph.get("c.s_concentration").unwrap().unit(),
        Some(Unit::KILOGRAM / Unit::METER)
    );
}

#[test]
fn test_species_default_substance_units() {
    init_logging();
    let mut model = model_with_compartment();
    model.set_substance_units(Unit::MOLE);
    model.add_species("c", "s", true, false, false).unwrap();

    let graph = model.myokit_model().unwrap();
    assert_eq!(graph.get("c.s_amount").unwrap().unit(), Some(Unit::MOLE));
}

#[test]
fn test_species_initial_in_concentration() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "s", false, false, false).unwrap();
    model
        .species_mut("s")
        .unwrap()
        .set_initial_value_as(Expr::Number(2.1), false);

    let graph = model.myokit_model().unwrap();
    assert_relative_eq!(graph.eval("c.s_amount").unwrap(), 21.0);
    assert_relative_eq!(graph.eval("c.s_concentration").unwrap(), 2.1);
}

#[test]
fn test_species_initial_in_amount() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "s", false, false, false).unwrap();
    model
        .species_mut("s")
        .unwrap()
        .set_initial_value_as(Expr::Number(21.0), true);

    let graph = model.myokit_model().unwrap();
    assert_relative_eq!(graph.eval("c.s_amount").unwrap(), 21.0);
    assert_relative_eq!(graph.eval("c.s_concentration").unwrap(), 2.1);
}

#[test]
fn test_species_initial_assignment_read_in_preferred_view() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "s", false, false, false).unwrap();
    model
        .species_mut("s")
        .unwrap()
        .set_initial_value_as(Expr::Number(21.0), true);
    // The assignment replaces the attribute and is read as a concentration.
    model.set_initial_assignment("s", Expr::Number(5.0)).unwrap();

    let graph = model.myokit_model().unwrap();
    assert_relative_eq!(graph.eval("c.s_amount").unwrap(), 50.0);
    assert_relative_eq!(graph.eval("c.s_concentration").unwrap(), 5.0);
}

#[test]
fn test_species_assignment_rule_scaled_to_amount() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "s", false, true, false).unwrap();
    model.add_parameter("p").unwrap();
    model
        .parameter_mut("p")
        .unwrap()
        .set_initial_value(Expr::Number(10.0));
    model
        .set_assignment_rule("s", Expr::plus(Expr::name("p"), Expr::Number(5.0)))
        .unwrap();

    let graph = model.myokit_model().unwrap();
    assert!(!graph.get("c.s_amount").unwrap().is_state());
    assert_relative_eq!(graph.eval("c.s_amount").unwrap(), 150.0);
    assert_relative_eq!(graph.eval("c.s_concentration").unwrap(), 15.0);
}

#[test]
fn test_species_rate_rule_scaled_to_amount() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "s", false, true, false).unwrap();
    model
        .species_mut("s")
        .unwrap()
        .set_initial_value_as(Expr::Number(2.1), false);
    model.set_rate_rule("s", Expr::Number(15.0)).unwrap();

    let graph = model.myokit_model().unwrap();
    assert!(graph.get("c.s_amount").unwrap().is_state());
    // Derivative of the amount, then the concentration at t = 0.
    assert_relative_eq!(graph.eval("c.s_amount").unwrap(), 150.0);
    assert_relative_eq!(graph.eval("c.s_concentration").unwrap(), 2.1);
}

#[test]
fn test_parameters_live_in_synthetic_component() {
    init_logging();
    let mut model = Model::new("m");
    model.add_parameter("k").unwrap();
    model
        .parameter_mut("k")
        .unwrap()
        .set_initial_value(Expr::Number(3.5));
    model.parameter_mut("k").unwrap().set_units(Unit::SECOND);
    model.add_parameter("unset").unwrap();

    let graph = model.myokit_model().unwrap();
    let k = graph.get("myokit.k").unwrap();
    assert_eq!(k.unit(), Some(Unit::SECOND));
    assert_relative_eq!(graph.eval("myokit.k").unwrap(), 3.5);

    // No units and no value: unitless, holding zero.
    let unset = graph.get("myokit.unset").unwrap();
    assert_eq!(unset.unit(), None);
    assert_relative_eq!(graph.eval("myokit.unset").unwrap(), 0.0);
}

#[test]
fn test_reaction_rates_in_amount_view() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "s1", true, false, false).unwrap();
    model.add_species("c", "s2", true, false, false).unwrap();
    model
        .species_mut("s1")
        .unwrap()
        .set_initial_value_as(Expr::Number(10.0), true);
    model
        .species_mut("s2")
        .unwrap()
        .set_initial_value_as(Expr::Number(4.0), true);

    model.add_reaction("r").unwrap();
    let reactant = model.add_reactant("r", "s1", None).unwrap();
    reactant.set_initial_value(Expr::Number(2.0));
    model.add_product("r", "s2", None).unwrap();
    model
        .reaction_mut("r")
        .unwrap()
        .set_kinetic_law(Expr::times(Expr::name("s1"), Expr::Number(3.0)));

    let graph = model.myokit_model().unwrap();
    assert!(graph.get("c.s1_amount").unwrap().is_state());
    assert!(graph.get("c.s2_amount").unwrap().is_state());
    // The law reads the state's initial value 10: rate 30, stoichiometry 2.
    assert_relative_eq!(graph.eval("c.s1_amount").unwrap(), -60.0);
    assert_relative_eq!(graph.eval("c.s2_amount").unwrap(), 30.0);
}

#[test]
fn test_kinetic_law_reads_concentration_view() {
    init_logging();
    let mut model = Model::new("m");
    let compartment = model.add_compartment("c").unwrap();
    compartment.set_initial_value(Expr::Number(2.0));
    model.add_species("c", "s", false, false, false).unwrap();
    model
        .species_mut("s")
        .unwrap()
        .set_initial_value_as(Expr::Number(3.0), false);

    model.add_reaction("r").unwrap();
    model.add_reactant("r", "s", None).unwrap();
    model
        .reaction_mut("r")
        .unwrap()
        .set_kinetic_law(Expr::name("s"));

    let graph = model.myokit_model().unwrap();
    // Amount 6 at t = 0, concentration 3, rate -(1 * 3).
    assert_relative_eq!(graph.eval("c.s_amount").unwrap(), -3.0);
    assert_relative_eq!(graph.eval("c.s_concentration").unwrap(), 3.0);
}

#[test]
fn test_stoichiometry_reference_becomes_variable() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "s1", true, false, false).unwrap();
    model.add_species("c", "s2", true, false, false).unwrap();
    model.add_reaction("r").unwrap();
    let reactant = model.add_reactant("r", "s1", Some("sr")).unwrap();
    reactant.set_initial_value(Expr::Number(2.0));
    model.add_product("r", "s2", Some("sp")).unwrap();
    model
        .reaction_mut("r")
        .unwrap()
        .set_kinetic_law(Expr::Number(5.0));

    let graph = model.myokit_model().unwrap();
    assert_relative_eq!(graph.eval("c.sr").unwrap(), 2.0);
    // A reference without a declared stoichiometry defaults to one.
    assert_relative_eq!(graph.eval("c.sp").unwrap(), 1.0);
    assert_relative_eq!(graph.eval("c.s1_amount").unwrap(), -10.0);
    assert_relative_eq!(graph.eval("c.s2_amount").unwrap(), 5.0);
}

#[test]
fn test_stoichiometry_reference_accepts_rules() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "s", true, false, false).unwrap();
    model.add_reaction("r").unwrap();
    let reactant = model.add_reactant("r", "s", Some("sr")).unwrap();
    reactant.set_initial_value(Expr::Number(2.0));
    model
        .reaction_mut("r")
        .unwrap()
        .set_kinetic_law(Expr::Number(5.0));
    model.set_rate_rule("sr", Expr::Number(0.5)).unwrap();

    let graph = model.myokit_model().unwrap();
    let sr = graph.get("c.sr").unwrap();
    assert!(sr.is_state());
    assert_relative_eq!(graph.eval("c.sr").unwrap(), 0.5);
    // The rate term reads the stoichiometry state's initial value.
    assert_relative_eq!(graph.eval("c.s_amount").unwrap(), -10.0);
}

#[test]
fn test_conversion_factors() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "s1", true, false, false).unwrap();
    model.add_species("c", "s2", true, false, false).unwrap();
    model.add_parameter("f").unwrap();
    model
        .parameter_mut("f")
        .unwrap()
        .set_initial_value(Expr::Number(1.2));
    model.add_parameter("g").unwrap();
    model
        .parameter_mut("g")
        .unwrap()
        .set_initial_value(Expr::Number(3.0));
    model.set_conversion_factor("f").unwrap();
    model.set_species_conversion_factor("s2", "g").unwrap();

    model.add_reaction("r").unwrap();
    let reactant = model.add_reactant("r", "s1", None).unwrap();
    reactant.set_initial_value(Expr::Number(2.0));
    model.add_product("r", "s2", None).unwrap();
    model
        .reaction_mut("r")
        .unwrap()
        .set_kinetic_law(Expr::Number(5.0));

    let graph = model.myokit_model().unwrap();
    // Model factor 1.2 on s1, the species' own factor 3 on s2.
    assert_relative_eq!(graph.eval("c.s1_amount").unwrap(), -12.0);
    assert_relative_eq!(graph.eval("c.s2_amount").unwrap(), 15.0);
}

#[test]
fn test_boundary_and_constant_species_excluded() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "edge", true, true, false).unwrap();
    model.add_species("c", "fixed", true, false, true).unwrap();
    model
        .species_mut("edge")
        .unwrap()
        .set_initial_value_as(Expr::Number(4.0), true);
    model
        .species_mut("fixed")
        .unwrap()
        .set_initial_value_as(Expr::Number(7.0), true);

    model.add_reaction("r").unwrap();
    model.add_reactant("r", "edge", None).unwrap();
    model.add_product("r", "fixed", None).unwrap();
    model
        .reaction_mut("r")
        .unwrap()
        .set_kinetic_law(Expr::Number(5.0));

    let graph = model.myokit_model().unwrap();
    assert!(!graph.get("c.edge_amount").unwrap().is_state());
    assert!(!graph.get("c.fixed_amount").unwrap().is_state());
    assert_relative_eq!(graph.eval("c.edge_amount").unwrap(), 4.0);
    assert_relative_eq!(graph.eval("c.fixed_amount").unwrap(), 7.0);
}

#[test]
fn test_modifiers_do_not_contribute_to_rates() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "s", true, false, false).unwrap();
    model.add_species("c", "enzyme", true, false, false).unwrap();
    model
        .species_mut("enzyme")
        .unwrap()
        .set_initial_value_as(Expr::Number(4.0), true);

    model.add_reaction("r").unwrap();
    model.add_product("r", "s", None).unwrap();
    model.add_modifier("r", "enzyme", Some("me")).unwrap();
    // The law reads the modifier; the modifier's own rate is untouched.
    model
        .reaction_mut("r")
        .unwrap()
        .set_kinetic_law(Expr::times(Expr::name("enzyme"), Expr::Number(5.0)));

    let graph = model.myokit_model().unwrap();
    assert_relative_eq!(graph.eval("c.s_amount").unwrap(), 20.0);
    assert!(!graph.get("c.enzyme_amount").unwrap().is_state());
    assert_relative_eq!(graph.eval("c.enzyme_amount").unwrap(), 4.0);
}

#[test]
fn test_reaction_without_kinetic_law_contributes_nothing() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "s", true, false, false).unwrap();
    model
        .species_mut("s")
        .unwrap()
        .set_initial_value_as(Expr::Number(4.0), true);
    model.add_reaction("r").unwrap();
    model.add_reactant("r", "s", None).unwrap();

    let graph = model.myokit_model().unwrap();
    assert!(!graph.get("c.s_amount").unwrap().is_state());
    assert_relative_eq!(graph.eval("c.s_amount").unwrap(), 4.0);
}

#[test]
fn test_rates_sum_across_reactions() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "s", true, false, false).unwrap();
    model.add_reaction("r1").unwrap();
    model.add_product("r1", "s", None).unwrap();
    model
        .reaction_mut("r1")
        .unwrap()
        .set_kinetic_law(Expr::Number(5.0));
    model.add_reaction("r2").unwrap();
    model.add_product("r2", "s", None).unwrap();
    model
        .reaction_mut("r2")
        .unwrap()
        .set_kinetic_law(Expr::Number(7.0));

    let graph = model.myokit_model().unwrap();
    assert_relative_eq!(graph.eval("c.s_amount").unwrap(), 12.0);
}

#[test]
fn test_rate_rule_overrides_reactions() {
    init_logging();
    let mut model = model_with_compartment();
    model.add_species("c", "s", true, false, false).unwrap();
    model.add_reaction("r").unwrap();
    model.add_product("r", "s", None).unwrap();
    model
        .reaction_mut("r")
        .unwrap()
        .set_kinetic_law(Expr::Number(5.0));
    model.set_rate_rule("s", Expr::Number(99.0)).unwrap();

    let graph = model.myokit_model().unwrap();
    assert_relative_eq!(graph.eval("c.s_amount").unwrap(), 99.0);
}

#[test]
fn test_time_variable() {
    init_logging();
    let mut model = Model::new("m");
    model.set_time_units(Unit::SECOND);

    let graph = model.myokit_model().unwrap();
    let time = graph.get("myokit.time").unwrap();
    assert_eq!(time.binding(), Some("time"));
    assert_eq!(time.unit(), Some(Unit::SECOND));
    assert_relative_eq!(graph.eval("myokit.time").unwrap(), 0.0);
}

#[test]
fn test_time_variable_name_collision() {
    init_logging();
    let mut model = Model::new("m");
    model.add_parameter("time").unwrap();

    let graph = model.myokit_model().unwrap();
    assert_eq!(graph.get("myokit.time").unwrap().binding(), None);
    assert_eq!(graph.time(), Some("myokit.time_1"));
    assert_eq!(graph.get("myokit.time_1").unwrap().binding(), Some("time"));
}

#[test]
fn test_parse_document_to_graph() {
    init_logging();
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sbml xmlns="http://www.sbml.org/sbml/level3/version2/core" level="3" version="2">
  <model id="cycle" timeUnits="second">
    <listOfCompartments>
      <compartment id="c" size="10" spatialDimensions="3" units="litre"/>
    </listOfCompartments>
    <listOfSpecies>
      <species id="s1" compartment="c" initialConcentration="2.1"
               hasOnlySubstanceUnits="false" boundaryCondition="false"
               constant="false"/>
      <species id="s2" compartment="c" initialAmount="4"
               hasOnlySubstanceUnits="true" boundaryCondition="false"
               constant="false"/>
    </listOfSpecies>
    <listOfParameters>
      <parameter id="k" value="3"/>
    </listOfParameters>
    <listOfReactions>
      <reaction id="r">
        <listOfReactants>
          <speciesReference species="s1" stoichiometry="2"/>
        </listOfReactants>
        <listOfProducts>
          <speciesReference species="s2"/>
        </listOfProducts>
        <kineticLaw>
          <math xmlns="http://www.w3.org/1998/Math/MathML">
            <apply><times/><ci>k</ci><ci>s1</ci></apply>
          </math>
        </kineticLaw>
      </reaction>
    </listOfReactions>
  </model>
</sbml>"#;

    let model = parse_string(xml).unwrap();
    let graph = model.myokit_model().unwrap();

    assert_eq!(graph.name(), "cycle");
    assert_eq!(graph.time(), Some("myokit.time"));
    assert_eq!(
        graph.get("myokit.time").unwrap().unit(),
        Some(Unit::SECOND)
    );
    assert_relative_eq!(graph.eval("c.size").unwrap(), 10.0);
    assert_relative_eq!(graph.eval("c.s1_concentration").unwrap(), 2.1);
    assert_relative_eq!(graph.eval("myokit.k").unwrap(), 3.0);
    // Law k * s1 reads the concentration 2.1: rate -(2 * 6.3) and +6.3.
    assert_relative_eq!(graph.eval("c.s1_amount").unwrap(), -12.6);
    assert_relative_eq!(graph.eval("c.s2_amount").unwrap(), 6.3);
}
