//! The document front end: reads an SBML level 3 document into a [`Model`].
//!
//! The reader is namespace-agnostic and tolerant of unknown elements, which
//! are skipped with a debug log. Semantic processing runs in dependency
//! order regardless of document order within each list: units first, then
//! compartments, parameters and species, then reactions, then initial
//! assignments and rules.

use std::collections::HashMap;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::assignable::Assignable;
use crate::error::SBMLError;
use crate::expr::Expr;
use crate::model::Model;

/// Name given to models that declare neither a `name` nor an `id`.
const UNNAMED: &str = "Imported SBML model";

/// Parses an SBML document held in a string.
pub fn parse_string(xml: &str) -> Result<Model, SBMLError> {
    let root = read_document(xml)?;
    if root.name != "sbml" {
        return Err(SBMLError::MalformedDocument(format!(
            "expected an <sbml> root element, found <{}>",
            root.name
        )));
    }
    let model = root
        .child("model")
        .ok_or_else(|| SBMLError::MalformedDocument("no <model> element found".to_string()))?;
    parse_model(model)
}

// ----------------------------------------------------------------------
// Document tree
// ----------------------------------------------------------------------

/// One element of the raw document tree, with namespace prefixes stripped.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: HashMap<String, String>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// The text of this element and all its descendants, in document order.
    fn deep_text(&self) -> String {
        let mut text = self.text.clone();
        for child in &self.children {
            let inner = child.deep_text();
            if !inner.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&inner);
            }
        }
        text.trim().to_string()
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, SBMLError> {
    let mut element = Element {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        ..Element::default()
    };
    for attribute in start.attributes() {
        let attribute =
            attribute.map_err(|err| SBMLError::MalformedDocument(err.to_string()))?;
        element.attributes.insert(
            String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned(),
            String::from_utf8_lossy(&attribute.value).into_owned(),
        );
    }
    Ok(element)
}

/// Reads the whole document into an element tree.
fn read_document(xml: &str) -> Result<Element, SBMLError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // A synthetic root keeps the stack non-empty; the document root ends up
    // as its only child.
    let mut stack = vec![Element::default()];
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(element_from(&start)?),
            Event::Empty(start) => {
                let element = element_from(&start)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(SBMLError::MalformedDocument(
                        "unbalanced closing tag".to_string(),
                    ));
                }
                let element = stack.pop().unwrap_or_default();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text
                        .push_str(String::from_utf8_lossy(&text).trim());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if stack.len() != 1 {
        return Err(SBMLError::MalformedDocument(
            "unexpected end of document".to_string(),
        ));
    }
    let mut root = stack.pop().unwrap_or_default();
    match root.children.len() {
        1 => Ok(root.children.remove(0)),
        0 => Err(SBMLError::MalformedDocument("empty document".to_string())),
        _ => Err(SBMLError::MalformedDocument(
            "multiple root elements".to_string(),
        )),
    }
}

// ----------------------------------------------------------------------
// Semantic processing
// ----------------------------------------------------------------------

fn parse_model(element: &Element) -> Result<Model, SBMLError> {
    let name = element
        .attr("name")
        .or_else(|| element.attr("id"))
        .unwrap_or(UNNAMED);
    let mut model = Model::new(name);

    if let Some(notes) = element.child("notes") {
        model.set_notes(notes.deep_text());
    }

    parse_unit_definitions(&mut model, element)?;
    parse_model_units(&mut model, element)?;
    parse_compartments(&mut model, element)?;
    parse_parameters(&mut model, element)?;
    if let Some(factor) = element.attr("conversionFactor") {
        model.set_conversion_factor(factor)?;
    }
    parse_species(&mut model, element)?;
    parse_reactions(&mut model, element)?;
    parse_initial_assignments(&mut model, element)?;
    parse_rules(&mut model, element)?;

    Ok(model)
}

fn parse_unit_definitions(model: &mut Model, element: &Element) -> Result<(), SBMLError> {
    let Some(list) = element.child("listOfUnitDefinitions") else {
        return Ok(());
    };
    for definition in list.children_named("unitDefinition") {
        let sid = required_attr(definition, "id")?;
        let mut unit = crate::units::Unit::DIMENSIONLESS;
        if let Some(parts) = definition.child("listOfUnits") {
            for part in parts.children_named("unit") {
                let kind = required_attr(part, "kind")?;
                let base = crate::units::base_unit(kind)?;
                let multiplier = optional_number(part, "multiplier")?.unwrap_or(1.0);
                let scale = optional_number(part, "scale")?.unwrap_or(0.0);
                let exponent = optional_number(part, "exponent")?.unwrap_or(1.0);
                // The attribute is a double, but fractional powers of a base
                // unit have no representation here.
                if exponent.fract() != 0.0 {
                    return Err(SBMLError::MalformedDocument(format!(
                        "unit \"{sid}\" has a non-integer exponent {exponent} on \"{kind}\""
                    )));
                }
                unit = unit
                    * base
                        .scaled(multiplier * 10f64.powf(scale))
                        .powi(exponent as i32);
            }
        }
        model.add_unit(sid, unit)?;
    }
    Ok(())
}

fn parse_model_units(model: &mut Model, element: &Element) -> Result<(), SBMLError> {
    if let Some(sid) = element.attr("timeUnits") {
        let unit = model.unit(sid)?;
        model.set_time_units(unit);
    }
    if let Some(sid) = element.attr("substanceUnits") {
        let unit = model.unit(sid)?;
        model.set_substance_units(unit);
    }
    if let Some(sid) = element.attr("extentUnits") {
        let unit = model.unit(sid)?;
        model.set_extent_units(unit);
    }
    if let Some(sid) = element.attr("lengthUnits") {
        let unit = model.unit(sid)?;
        model.set_length_units(unit);
    }
    if let Some(sid) = element.attr("areaUnits") {
        let unit = model.unit(sid)?;
        model.set_area_units(unit);
    }
    if let Some(sid) = element.attr("volumeUnits") {
        let unit = model.unit(sid)?;
        model.set_volume_units(unit);
    }
    Ok(())
}

fn parse_compartments(model: &mut Model, element: &Element) -> Result<(), SBMLError> {
    let Some(list) = element.child("listOfCompartments") else {
        return Ok(());
    };
    for definition in list.children_named("compartment") {
        let sid = required_attr(definition, "id")?;
        let units = match definition.attr("units") {
            Some(unit_sid) => Some(model.unit(unit_sid)?),
            None => None,
        };
        let size = optional_number(definition, "size")?;
        let dimensions = optional_number(definition, "spatialDimensions")?;

        let compartment = model.add_compartment(sid)?;
        if let Some(units) = units {
            compartment.set_size_units(units);
        }
        if let Some(dimensions) = dimensions {
            compartment.set_spatial_dimensions(dimensions);
        }
        if let Some(size) = size {
            compartment.set_initial_value(Expr::Number(size));
        }
    }
    Ok(())
}

fn parse_parameters(model: &mut Model, element: &Element) -> Result<(), SBMLError> {
    let Some(list) = element.child("listOfParameters") else {
        return Ok(());
    };
    for definition in list.children_named("parameter") {
        let sid = required_attr(definition, "id")?;
        let units = match definition.attr("units") {
            Some(unit_sid) => Some(model.unit(unit_sid)?),
            None => None,
        };
        let value = optional_number(definition, "value")?;

        let parameter = model.add_parameter(sid)?;
        if let Some(units) = units {
            parameter.set_units(units);
        }
        if let Some(value) = value {
            parameter.set_initial_value(Expr::Number(value));
        }
    }
    Ok(())
}

fn parse_species(model: &mut Model, element: &Element) -> Result<(), SBMLError> {
    let Some(list) = element.child("listOfSpecies") else {
        return Ok(());
    };
    for definition in list.children_named("species") {
        let sid = required_attr(definition, "id")?;
        let compartment = required_attr(definition, "compartment")?;
        let is_amount = optional_bool(definition, "hasOnlySubstanceUnits")?.unwrap_or(false);
        let is_boundary = optional_bool(definition, "boundaryCondition")?.unwrap_or(false);
        let is_constant = optional_bool(definition, "constant")?.unwrap_or(false);
        let units = match definition.attr("substanceUnits") {
            Some(unit_sid) => Some(model.unit(unit_sid)?),
            None => None,
        };
        let amount = optional_number(definition, "initialAmount")?;
        let concentration = optional_number(definition, "initialConcentration")?;
        let factor = definition.attr("conversionFactor").map(String::from);

        let species = model.add_species(compartment, sid, is_amount, is_boundary, is_constant)?;
        if let Some(units) = units {
            species.set_substance_units(units);
        }
        if let Some(amount) = amount {
            species.set_initial_value_as(Expr::Number(amount), true);
        } else if let Some(concentration) = concentration {
            species.set_initial_value_as(Expr::Number(concentration), false);
        }
        if let Some(factor) = factor {
            model.set_species_conversion_factor(sid, &factor)?;
        }
    }
    Ok(())
}

fn parse_reactions(model: &mut Model, element: &Element) -> Result<(), SBMLError> {
    let Some(list) = element.child("listOfReactions") else {
        return Ok(());
    };
    for definition in list.children_named("reaction") {
        let reaction_sid = required_attr(definition, "id")?;
        model.add_reaction(reaction_sid)?;

        if let Some(reactants) = definition.child("listOfReactants") {
            for reference in reactants.children_named("speciesReference") {
                let species = required_attr(reference, "species")?;
                let stoichiometry = optional_number(reference, "stoichiometry")?;
                let entry = model.add_reactant(reaction_sid, species, reference.attr("id"))?;
                if let Some(stoichiometry) = stoichiometry {
                    entry.set_initial_value(Expr::Number(stoichiometry));
                }
            }
        }
        if let Some(products) = definition.child("listOfProducts") {
            for reference in products.children_named("speciesReference") {
                let species = required_attr(reference, "species")?;
                let stoichiometry = optional_number(reference, "stoichiometry")?;
                let entry = model.add_product(reaction_sid, species, reference.attr("id"))?;
                if let Some(stoichiometry) = stoichiometry {
                    entry.set_initial_value(Expr::Number(stoichiometry));
                }
            }
        }
        if let Some(modifiers) = definition.child("listOfModifiers") {
            for reference in modifiers.children_named("modifierSpeciesReference") {
                let species = required_attr(reference, "species")?;
                model.add_modifier(reaction_sid, species, reference.attr("id"))?;
            }
        }

        if let Some(law) = definition.child("kineticLaw") {
            let math = law.child("math").ok_or_else(|| {
                SBMLError::MalformedDocument(format!(
                    "kinetic law of reaction <{reaction_sid}> has no <math> element"
                ))
            })?;
            let expression = parse_math(math)?;
            if let Some(entry) = model.reaction_mut(reaction_sid) {
                entry.set_kinetic_law(expression);
            }
        }
    }
    Ok(())
}

fn parse_initial_assignments(model: &mut Model, element: &Element) -> Result<(), SBMLError> {
    let Some(list) = element.child("listOfInitialAssignments") else {
        return Ok(());
    };
    for definition in list.children_named("initialAssignment") {
        let symbol = required_attr(definition, "symbol")?;
        let math = definition.child("math").ok_or_else(|| {
            SBMLError::MalformedDocument(format!(
                "initial assignment of <{symbol}> has no <math> element"
            ))
        })?;
        let expression = parse_math(math)?;
        model.set_initial_assignment(symbol, expression)?;
    }
    Ok(())
}

fn parse_rules(model: &mut Model, element: &Element) -> Result<(), SBMLError> {
    let Some(list) = element.child("listOfRules") else {
        return Ok(());
    };
    for definition in &list.children {
        match definition.name.as_str() {
            "assignmentRule" | "rateRule" => {
                let variable = required_attr(definition, "variable")?;
                let math = definition.child("math").ok_or_else(|| {
                    SBMLError::MalformedDocument(format!(
                        "rule for <{variable}> has no <math> element"
                    ))
                })?;
                let expression = parse_math(math)?;
                if definition.name == "rateRule" {
                    model.set_rate_rule(variable, expression)?;
                } else {
                    model.set_assignment_rule(variable, expression)?;
                }
            }
            "algebraicRule" => {
                warn!("algebraic rules are not supported, rule skipped");
            }
            other => {
                debug!("skipping unknown rule element <{other}>");
            }
        }
    }
    Ok(())
}

// ----------------------------------------------------------------------
// MathML
// ----------------------------------------------------------------------

/// Parses a `<math>` element holding a single expression.
fn parse_math(element: &Element) -> Result<Expr, SBMLError> {
    match element.children.len() {
        1 => parse_math_element(&element.children[0]),
        0 => Err(SBMLError::InvalidMath("empty <math> element".to_string())),
        _ => Err(SBMLError::InvalidMath(
            "a <math> element must hold a single expression".to_string(),
        )),
    }
}

fn parse_math_element(element: &Element) -> Result<Expr, SBMLError> {
    match element.name.as_str() {
        "cn" => {
            let text = element.text.trim();
            text.parse()
                .map(Expr::Number)
                .map_err(|_| SBMLError::InvalidMath(format!("invalid number \"{text}\"")))
        }
        "ci" => Ok(Expr::name(element.text.trim())),
        "apply" => {
            let mut parts = element.children.iter();
            let operator = parts
                .next()
                .ok_or_else(|| SBMLError::InvalidMath("empty <apply> element".to_string()))?;
            let operands: Vec<Expr> = parts.map(parse_math_element).collect::<Result<_, _>>()?;
            apply_operator(&operator.name, operands)
        }
        other => Err(SBMLError::InvalidMath(format!(
            "unsupported MathML element <{other}>"
        ))),
    }
}

fn apply_operator(operator: &str, operands: Vec<Expr>) -> Result<Expr, SBMLError> {
    let arity = operands.len();
    let mut operands = operands.into_iter();
    match operator {
        // n-ary operators fold left; an empty sum or product collapses to
        // its identity element.
        "plus" => Ok(operands.reduce(Expr::plus).unwrap_or(Expr::Number(0.0))),
        "times" => Ok(operands.reduce(Expr::times).unwrap_or(Expr::Number(1.0))),
        "minus" => match (operands.next(), operands.next()) {
            (Some(operand), None) => Ok(Expr::prefix_minus(operand)),
            (Some(left), Some(right)) if arity == 2 => Ok(Expr::minus(left, right)),
            _ => Err(SBMLError::InvalidMath(format!(
                "<minus> takes one or two operands, got {arity}"
            ))),
        },
        "divide" => match (operands.next(), operands.next()) {
            (Some(left), Some(right)) if arity == 2 => Ok(Expr::divide(left, right)),
            _ => Err(SBMLError::InvalidMath(format!(
                "<divide> takes two operands, got {arity}"
            ))),
        },
        "power" => match (operands.next(), operands.next()) {
            (Some(left), Some(right)) if arity == 2 => Ok(Expr::power(left, right)),
            _ => Err(SBMLError::InvalidMath(format!(
                "<power> takes two operands, got {arity}"
            ))),
        },
        other => Err(SBMLError::InvalidMath(format!(
            "unsupported MathML operator <{other}>"
        ))),
    }
}

// ----------------------------------------------------------------------
// Attribute helpers
// ----------------------------------------------------------------------

fn required_attr<'a>(element: &'a Element, name: &str) -> Result<&'a str, SBMLError> {
    element.attr(name).ok_or_else(|| {
        SBMLError::MalformedDocument(format!(
            "element <{}> is missing the required attribute \"{name}\"",
            element.name
        ))
    })
}

fn optional_number(element: &Element, name: &str) -> Result<Option<f64>, SBMLError> {
    match element.attr(name) {
        None => Ok(None),
        Some(text) => text.parse().map(Some).map_err(|_| {
            SBMLError::MalformedDocument(format!(
                "attribute \"{name}\" of <{}> is not a number: \"{text}\"",
                element.name
            ))
        }),
    }
}

fn optional_bool(element: &Element, name: &str) -> Result<Option<bool>, SBMLError> {
    match element.attr(name) {
        None => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(text) => Err(SBMLError::MalformedDocument(format!(
            "attribute \"{name}\" of <{}> is not a boolean: \"{text}\"",
            element.name
        ))),
    }
}
