//! Compartment definitions.

use serde::{Deserialize, Serialize};

use crate::assignable::{Assign, Assignable};
use crate::model::Model;
use crate::units::Unit;

/// A compartment: a bounded region with a size whose units follow from its
/// spatial dimensionality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compartment {
    sid: String,
    spatial_dimensions: Option<f64>,
    size_units: Option<Unit>,
    assign: Assign,
}

impl Compartment {
    pub(crate) fn new(sid: impl Into<String>) -> Self {
        Compartment {
            sid: sid.into(),
            spatial_dimensions: None,
            size_units: None,
            assign: Assign::default(),
        }
    }

    pub fn spatial_dimensions(&self) -> Option<f64> {
        self.spatial_dimensions
    }

    /// Sets the number of spatial dimensions. SBML Level 3 allows
    /// non-integer values, so this is not restricted to 0-3.
    pub fn set_spatial_dimensions(&mut self, dimensions: f64) {
        self.spatial_dimensions = Some(dimensions);
    }

    pub fn set_size_units(&mut self, units: Unit) {
        self.size_units = Some(units);
    }

    /// The units of this compartment's size: the explicit override if one
    /// was set, else the model's length/area/volume units for 1/2/3 spatial
    /// dimensions, else dimensionless.
    pub fn size_units(&self, model: &Model) -> Unit {
        if let Some(units) = self.size_units {
            return units;
        }
        match self.spatial_dimensions {
            Some(d) if d == 1.0 => model.length_units(),
            Some(d) if d == 2.0 => model.area_units(),
            Some(d) if d == 3.0 => model.volume_units(),
            _ => Unit::DIMENSIONLESS,
        }
    }
}

impl Assignable for Compartment {
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
