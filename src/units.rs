//! Unit bookkeeping for the translated model.
//!
//! A [`Unit`] is a multiplicative composition of the seven SI base
//! dimensions plus a scalar multiplier. The crate records and composes unit
//! values (products, quotients, integer powers) but performs no dimensional
//! validation beyond that; checking that an expression is dimensionally
//! sound is the consumer's business.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Div, Mul};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::SBMLError;

/// Index order of the base dimension exponents.
const DIMENSION_NAMES: [&str; 7] = ["kg", "m", "s", "A", "K", "cd", "mol"];

/// A dimensionless, multiplicative and exponentiated composition of SI base
/// units. Immutable; equality is structural.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Exponents on (kg, m, s, A, K, cd, mol).
    exponents: [i8; 7],
    /// Scalar multiplier, e.g. 1e-3 for gram relative to kilogram.
    multiplier: f64,
}

impl Unit {
    pub const DIMENSIONLESS: Unit = Unit::base([0, 0, 0, 0, 0, 0, 0]);
    pub const KILOGRAM: Unit = Unit::base([1, 0, 0, 0, 0, 0, 0]);
    pub const METER: Unit = Unit::base([0, 1, 0, 0, 0, 0, 0]);
    pub const SECOND: Unit = Unit::base([0, 0, 1, 0, 0, 0, 0]);
    pub const AMPERE: Unit = Unit::base([0, 0, 0, 1, 0, 0, 0]);
    pub const KELVIN: Unit = Unit::base([0, 0, 0, 0, 1, 0, 0]);
    pub const CANDELA: Unit = Unit::base([0, 0, 0, 0, 0, 1, 0]);
    pub const MOLE: Unit = Unit::base([0, 0, 0, 0, 0, 0, 1]);

    const fn base(exponents: [i8; 7]) -> Unit {
        Unit {
            exponents,
            multiplier: 1.0,
        }
    }

    /// Raises the unit to an integer power. Dimension exponents beyond the
    /// i8 range saturate rather than wrap.
    pub fn powi(self, exponent: i32) -> Unit {
        let mut exponents = self.exponents;
        for e in exponents.iter_mut() {
            let widened = i32::from(*e).saturating_mul(exponent);
            *e = widened.clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8;
        }
        Unit {
            exponents,
            multiplier: self.multiplier.powi(exponent),
        }
    }

    /// Returns the same dimensions with the multiplier scaled by `factor`.
    pub fn scaled(self, factor: f64) -> Unit {
        Unit {
            multiplier: self.multiplier * factor,
            ..self
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Whether this is plain dimensionless with multiplier 1.
    pub fn is_dimensionless(&self) -> bool {
        *self == Unit::DIMENSIONLESS
    }
}

impl Mul for Unit {
    type Output = Unit;

    fn mul(self, rhs: Unit) -> Unit {
        let mut exponents = self.exponents;
        for (e, r) in exponents.iter_mut().zip(rhs.exponents) {
            *e += r;
        }
        Unit {
            exponents,
            multiplier: self.multiplier * rhs.multiplier,
        }
    }
}

impl Div for Unit {
    type Output = Unit;

    fn div(self, rhs: Unit) -> Unit {
        let mut exponents = self.exponents;
        for (e, r) in exponents.iter_mut().zip(rhs.exponents) {
            *e -= r;
        }
        Unit {
            exponents,
            multiplier: self.multiplier / rhs.multiplier,
        }
    }
}

impl Mul<f64> for Unit {
    type Output = Unit;

    fn mul(self, factor: f64) -> Unit {
        self.scaled(factor)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .exponents
            .iter()
            .zip(DIMENSION_NAMES)
            .filter(|(e, _)| **e != 0)
            .map(|(e, name)| {
                if *e == 1 {
                    name.to_string()
                } else {
                    format!("{name}^{e}")
                }
            })
            .join("*");

        let body = if parts.is_empty() {
            "1".to_string()
        } else {
            parts
        };

        if self.multiplier == 1.0 {
            write!(f, "[{body}]")
        } else {
            write!(f, "[{body} ({:e})]", self.multiplier)
        }
    }
}

lazy_static::lazy_static! {
    /// Fixed mapping from SBML base unit names to unit values. Both the
    /// `liter`/`litre` and `meter`/`metre` spellings are present; `item`,
    /// `radian` and `steradian` collapse to dimensionless; `avogadro` is a
    /// scaled dimensionless unit.
    static ref BASE_UNITS: HashMap<&'static str, Unit> = {
        let kg = Unit::KILOGRAM;
        let m = Unit::METER;
        let s = Unit::SECOND;
        let a = Unit::AMPERE;
        let cd = Unit::CANDELA;

        let joule = kg * m.powi(2) / s.powi(2);
        let volt = kg * m.powi(2) / (s.powi(3) * a);
        let liter = m.powi(3).scaled(1e-3);

        let mut table = HashMap::new();
        table.insert("ampere", a);
        table.insert("avogadro", Unit::DIMENSIONLESS.scaled(6.02214179e23));
        table.insert("becquerel", Unit::DIMENSIONLESS / s);
        table.insert("candela", cd);
        table.insert("coulomb", a * s);
        table.insert("dimensionless", Unit::DIMENSIONLESS);
        table.insert("farad", a * s / volt);
        table.insert("gram", kg.scaled(1e-3));
        table.insert("gray", joule / kg);
        table.insert("henry", volt * s / a);
        table.insert("hertz", Unit::DIMENSIONLESS / s);
        table.insert("item", Unit::DIMENSIONLESS);
        table.insert("joule", joule);
        table.insert("katal", Unit::MOLE / s);
        table.insert("kelvin", Unit::KELVIN);
        table.insert("kilogram", kg);
        table.insert("liter", liter);
        table.insert("litre", liter);
        table.insert("lumen", cd);
        table.insert("lux", cd / m.powi(2));
        table.insert("meter", m);
        table.insert("metre", m);
        table.insert("mole", Unit::MOLE);
        table.insert("newton", kg * m / s.powi(2));
        table.insert("ohm", volt / a);
        table.insert("pascal", kg / (m * s.powi(2)));
        table.insert("radian", Unit::DIMENSIONLESS);
        table.insert("second", s);
        table.insert("siemens", a / volt);
        table.insert("sievert", joule / kg);
        table.insert("steradian", Unit::DIMENSIONLESS);
        table.insert("tesla", volt * s / m.powi(2));
        table.insert("volt", volt);
        table.insert("watt", joule / s);
        table.insert("weber", volt * s);
        table
    };
}

/// Whether `name` is a reserved SBML base unit name (including the names of
/// recognised but unsupported units).
pub fn is_base_unit_name(name: &str) -> bool {
    name == "celsius" || BASE_UNITS.contains_key(name)
}

/// Resolves an SBML base unit name to its unit value.
///
/// `celsius` is recognised but rejected as unsupported: a non-absolute
/// temperature scale has no multiplicative representation. Any other unknown
/// name fails as [`SBMLError::UnknownBaseUnit`].
pub fn base_unit(name: &str) -> Result<Unit, SBMLError> {
    if name == "celsius" {
        return Err(SBMLError::UnsupportedBaseUnit(name.to_string()));
    }
    BASE_UNITS
        .get(name)
        .copied()
        .ok_or_else(|| SBMLError::UnknownBaseUnit(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_units_resolve() {
        assert_eq!(base_unit("ampere").unwrap(), Unit::AMPERE);
        assert_eq!(base_unit("metre").unwrap(), base_unit("meter").unwrap());
        assert_eq!(
            base_unit("litre").unwrap(),
            Unit::METER.powi(3).scaled(1e-3)
        );
        assert_eq!(
            base_unit("avogadro").unwrap(),
            Unit::DIMENSIONLESS.scaled(6.02214179e23)
        );
        assert_eq!(base_unit("item").unwrap(), Unit::DIMENSIONLESS);
    }

    #[test]
    fn test_celsius_is_unsupported() {
        let result = base_unit("celsius");
        assert!(matches!(result, Err(SBMLError::UnsupportedBaseUnit(_))));
    }

    #[test]
    fn test_unknown_base_unit() {
        let result = base_unit("some unit");
        assert!(matches!(result, Err(SBMLError::UnknownBaseUnit(_))));
    }

    #[test]
    fn test_composition() {
        let molar = Unit::MOLE / base_unit("litre").unwrap();
        assert_eq!(molar, Unit::MOLE / Unit::METER.powi(3) * 1e3);

        let area = Unit::METER.powi(2);
        assert_eq!(area / Unit::METER, Unit::METER);
    }

    #[test]
    fn test_powi_saturates() {
        let huge = Unit::METER.powi(2).powi(100);
        assert_eq!(huge.to_string(), "[m^127]");
        assert_eq!(Unit::METER.powi(-3).powi(100).to_string(), "[m^-128]");
    }

    #[test]
    fn test_structural_equality() {
        // mL and L differ in multiplier only, and are not equal.
        let liter = base_unit("liter").unwrap();
        assert_ne!(liter, liter * 1e-3);
        assert_eq!(liter * 1e-3, base_unit("litre").unwrap().scaled(1e-3));
    }

    #[test]
    fn test_display() {
        assert_eq!(Unit::DIMENSIONLESS.to_string(), "[1]");
        assert_eq!((Unit::KILOGRAM / Unit::METER).to_string(), "[kg*m^-1]");
        assert_eq!(base_unit("gram").unwrap().to_string(), "[kg (1e-3)]");
    }
}
