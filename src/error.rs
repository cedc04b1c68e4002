use thiserror::Error;

/// Errors that can occur while building, resolving, or translating an SBML
/// model.
///
/// All failures are reported synchronously and nothing is retried: a failed
/// translation yields no usable model.
#[derive(Debug, Error)]
pub enum SBMLError {
    /// Error when an SId does not match the identifier grammar
    #[error("Invalid SId \"{0}\".")]
    InvalidSId(String),

    /// Error when an SId is already registered by any entity kind
    #[error("Duplicate SId \"{0}\".")]
    DuplicateSId(String),

    /// Error when a UnitSId does not match the identifier grammar
    #[error("Invalid UnitSId \"{0}\".")]
    InvalidUnitSId(String),

    /// Error when a user unit is registered under a reserved base unit name
    #[error("User unit overrides built-in unit: \"{0}\".")]
    UnitOverride(String),

    /// Error when a UnitSId is already registered
    #[error("Duplicate UnitSId \"{0}\".")]
    DuplicateUnitSId(String),

    /// Error when a unit SId references neither a user unit nor a base unit
    #[error("The unit SId <{0}> does not reference a known unit.")]
    UnknownUnit(String),

    /// Error when a base unit is physically real but not modelled
    #[error("The units \"{0}\" are not supported.")]
    UnsupportedBaseUnit(String),

    /// Error when a name is not an SBML base unit at all
    #[error("The name <{0}> is not an SBML base unit.")]
    UnknownBaseUnit(String),

    /// Error when a rule, initial assignment, or reference names an SId that
    /// is not present in the registry
    #[error("The SId <{0}> does not reference a registered entity.")]
    UnresolvedReference(String),

    /// Error when a second rule targets an already rule-governed entity
    #[error("The SId <{0}> is already targeted by a rule.")]
    DuplicateRule(String),

    /// Error when a second initial assignment targets the same entity
    #[error("The SId <{0}> is already targeted by an initial assignment.")]
    DuplicateInitialAssignment(String),

    /// Error when variable definitions reference each other cyclically
    #[error("Circular dependency on <{0}>.")]
    CircularReference(String),

    /// Error when a component or variable name is emitted twice
    #[error("Duplicate name in model graph: \"{0}\".")]
    DuplicateName(String),

    /// Error when the markup cannot be read as XML
    #[error("Failed to read SBML markup: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Error when the document structure violates the SBML subset
    #[error("Malformed SBML document: {0}")]
    MalformedDocument(String),

    /// Error when a math element uses unsupported or malformed MathML
    #[error("Unsupported or malformed MathML: {0}")]
    InvalidMath(String),
}
