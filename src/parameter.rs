//! Parameter definitions.

use serde::{Deserialize, Serialize};

use crate::assignable::{Assign, Assignable};
use crate::units::Unit;

/// A named scalar quantity.
///
/// A parameter without declared units stays unit-less; it is not defaulted
/// to dimensionless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    sid: String,
    units: Option<Unit>,
    assign: Assign,
}

impl Parameter {
    pub(crate) fn new(sid: impl Into<String>) -> Self {
        Parameter {
            sid: sid.into(),
            units: None,
            assign: Assign::default(),
        }
    }

    pub fn units(&self) -> Option<Unit> {
        self.units
    }

    pub fn set_units(&mut self, units: Unit) {
        self.units = Some(units);
    }
}

impl Assignable for Parameter {
    fn sid(&self) -> &str {
        &self.sid
    }

    fn assign(&self) -> &Assign {
        &self.assign
    }

    fn assign_mut(&mut self) -> &mut Assign {
        &mut self.assign
    }
}
