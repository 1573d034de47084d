use derive_more::Display;
use strum::EnumIter;

/// Units the matcher understands. Inventory and requirement rows store
/// free-text units; anything that parses into one of these takes part in
/// conversion, anything else only matches itself verbatim.
#[derive(Debug, Display, EnumIter, Hash, Copy, Clone, PartialEq, Eq)]
pub enum Unit {
    #[display("pcs")]
    Pieces,
    #[display("cups")]
    Cups,
    #[display("fl. oz.")]
    FluidOunces,
    #[display("tbsp.")]
    Tablespoons,
    #[display("tsp.")]
    Teaspoons,
    #[display("quarts")]
    Quarts,
    #[display("ml")]
    Milliliters,
    #[display("l")]
    Liters,
    #[display("g")]
    Grams,
    #[display("kg")]
    Kilograms,
    #[display("mg")]
    Milligrams,
    #[display("oz.")]
    Ounces,
    #[display("lbs.")]
    Pounds,
}

impl Unit {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_lowercase().as_str() {
            "" | "pc" | "pcs" | "piece" | "pieces" => Self::Pieces,
            "c" | "c." | "cup" | "cups" => Self::Cups,
            "fl oz" | "fl. oz." | "fl.oz." | "floz" | "fluid ounce" | "fluid ounces" => {
                Self::FluidOunces
            }
            "tbsp" | "tbsp." | "tablespoon" | "tablespoons" => Self::Tablespoons,
            "tsp" | "tsp." | "teaspoon" | "teaspoons" => Self::Teaspoons,
            "qt" | "qt." | "quart" | "quarts" => Self::Quarts,
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
                Self::Milliliters
            }
            "l" | "liter" | "liters" | "litre" | "litres" => Self::Liters,
            "g" | "gram" | "grams" => Self::Grams,
            "kg" | "kilogram" | "kilograms" => Self::Kilograms,
            "mg" | "milligram" | "milligrams" => Self::Milligrams,
            "oz" | "oz." | "ounce" | "ounces" => Self::Ounces,
            "lb" | "lb." | "lbs" | "lbs." | "pound" | "pounds" => Self::Pounds,
            _ => return None,
        })
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }
}

#[derive(PartialEq, Eq, Debug)]
pub enum MeasurementKind {
    Count,
    Volume,
    Weight,
}

impl From<Unit> for MeasurementKind {
    fn from(u: Unit) -> Self {
        match u {
            Unit::Pieces => Self::Count,
            Unit::Cups => Self::Volume,
            Unit::FluidOunces => Self::Volume,
            Unit::Tablespoons => Self::Volume,
            Unit::Teaspoons => Self::Volume,
            Unit::Quarts => Self::Volume,
            Unit::Milliliters => Self::Volume,
            Unit::Liters => Self::Volume,
            Unit::Grams => Self::Weight,
            Unit::Kilograms => Self::Weight,
            Unit::Milligrams => Self::Weight,
            Unit::Ounces => Self::Weight,
            Unit::Pounds => Self::Weight,
        }
    }
}

#[derive(PartialEq, Eq, Debug)]
pub enum MeasurementClass {
    Us,
    Metric,
}

impl From<Unit> for MeasurementClass {
    fn from(u: Unit) -> Self {
        match u {
            Unit::Cups => Self::Us,
            Unit::FluidOunces => Self::Us,
            Unit::Tablespoons => Self::Us,
            Unit::Teaspoons => Self::Us,
            Unit::Quarts => Self::Us,
            Unit::Ounces => Self::Us,
            Unit::Pounds => Self::Us,
            Unit::Milliliters => Self::Metric,
            Unit::Liters => Self::Metric,
            Unit::Grams => Self::Metric,
            Unit::Kilograms => Self::Metric,
            Unit::Milligrams => Self::Metric,
            // counts have no measurement system
            Unit::Pieces => unreachable!(),
        }
    }
}

fn as_teaspoons(a: Unit) -> f64 {
    match a {
        Unit::Cups => 48.0,
        Unit::FluidOunces => 6.0,
        Unit::Tablespoons => 3.0,
        Unit::Teaspoons => 1.0,
        Unit::Quarts => 192.0,
        _ => unreachable!(),
    }
}

fn as_milliliters(a: Unit) -> f64 {
    match a {
        Unit::Cups => 236.588236,
        Unit::FluidOunces => 29.573535296,
        Unit::Tablespoons => 14.7867648,
        Unit::Teaspoons => 4.92892159,
        Unit::Quarts => 946.353,
        Unit::Liters => 1_000.0,
        Unit::Milliliters => 1.0,
        _ => unreachable!(),
    }
}

fn as_ounces(a: Unit) -> f64 {
    match a {
        Unit::Ounces => 1.0,
        Unit::Pounds => 16.0,
        _ => unreachable!(),
    }
}

fn as_milligrams(a: Unit) -> f64 {
    match a {
        Unit::Grams => 1_000.0,
        Unit::Kilograms => 1_000_000.0,
        Unit::Milligrams => 1.0,
        Unit::Ounces => 28349.52,
        Unit::Pounds => 453592.4,
        _ => unreachable!(),
    }
}

/// Factor that converts a quantity in `a` into `b`, or `None` when the two
/// measure different kinds of things. US-to-US conversions go through
/// teaspoons/ounces so the usual kitchen ratios stay exact.
pub fn conversion_factor(a: Unit, b: Unit) -> Option<f64> {
    let a_kind = MeasurementKind::from(a);
    let b_kind = MeasurementKind::from(b);
    if a_kind != b_kind {
        return None;
    }

    Some(match a_kind {
        MeasurementKind::Count => 1.0,
        MeasurementKind::Volume => {
            match (MeasurementClass::from(a), MeasurementClass::from(b)) {
                (MeasurementClass::Us, MeasurementClass::Us) => {
                    as_teaspoons(a) / as_teaspoons(b)
                }
                _ => as_milliliters(a) / as_milliliters(b),
            }
        }
        MeasurementKind::Weight => {
            match (MeasurementClass::from(a), MeasurementClass::from(b)) {
                (MeasurementClass::Us, MeasurementClass::Us) => as_ounces(a) / as_ounces(b),
                _ => as_milligrams(a) / as_milligrams(b),
            }
        }
    })
}

#[test]
fn unit_conversion_us() {
    use Unit::*;
    assert_eq!(conversion_factor(Cups, FluidOunces), Some(8.0));
    assert_eq!(conversion_factor(Cups, Tablespoons), Some(16.0));
    assert_eq!(conversion_factor(Cups, Teaspoons), Some(48.0));

    assert_eq!(conversion_factor(FluidOunces, Cups), Some(1.0 / 8.0));
    assert_eq!(conversion_factor(Tablespoons, Cups), Some(1.0 / 16.0));
    assert_eq!(conversion_factor(Teaspoons, Cups), Some(1.0 / 48.0));

    assert_eq!(conversion_factor(Tablespoons, FluidOunces), Some(1.0 / 2.0));
    assert_eq!(conversion_factor(Tablespoons, Teaspoons), Some(3.0));

    assert_eq!(conversion_factor(Quarts, Cups), Some(4.0));

    assert_eq!(conversion_factor(Pounds, Ounces), Some(16.0));
    assert_eq!(conversion_factor(Ounces, Pounds), Some(1.0 / 16.0));
}

#[test]
fn unit_conversion_metric() {
    use Unit::*;

    assert_eq!(conversion_factor(Liters, Milliliters), Some(1_000.0));
    assert_eq!(conversion_factor(Milliliters, Liters), Some(1.0 / 1_000.0));

    assert_eq!(conversion_factor(Grams, Milligrams), Some(1_000.0));
    assert_eq!(conversion_factor(Kilograms, Milligrams), Some(1_000_000.0));
    assert_eq!(conversion_factor(Milligrams, Grams), Some(1.0 / 1_000.0));
    assert_eq!(conversion_factor(Kilograms, Grams), Some(1_000.0));
    assert_eq!(conversion_factor(Grams, Kilograms), Some(1.0 / 1_000.0));
}

#[test]
fn unit_conversion_us_metric() {
    use Unit::*;

    let factor = conversion_factor(Cups, Milliliters).unwrap();
    assert!((factor - 236.588236).abs() < 1e-6);

    let factor = conversion_factor(Liters, Cups).unwrap();
    assert!((factor - 4.2267528).abs() < 1e-6);

    let factor = conversion_factor(Ounces, Grams).unwrap();
    assert!((factor - 28.34952).abs() < 1e-5);

    let factor = conversion_factor(Pounds, Grams).unwrap();
    assert!((factor - 453.5924).abs() < 1e-4);
}

#[test]
fn unit_conversion_counts() {
    use Unit::*;

    assert_eq!(conversion_factor(Pieces, Pieces), Some(1.0));
    assert_eq!(conversion_factor(Pieces, Cups), None);
    assert_eq!(conversion_factor(Grams, Pieces), None);
}

#[test]
fn unit_conversion_cross_kind_is_none() {
    use Unit::*;

    assert_eq!(conversion_factor(Cups, Grams), None);
    assert_eq!(conversion_factor(Pounds, Liters), None);
}

#[test]
fn unit_parsing() {
    assert_eq!(Unit::parse("cups"), Some(Unit::Cups));
    assert_eq!(Unit::parse(" Cup "), Some(Unit::Cups));
    assert_eq!(Unit::parse("ML"), Some(Unit::Milliliters));
    assert_eq!(Unit::parse("tbsp"), Some(Unit::Tablespoons));
    assert_eq!(Unit::parse(""), Some(Unit::Pieces));
    assert_eq!(Unit::parse("pcs"), Some(Unit::Pieces));
    assert_eq!(Unit::parse("bunch"), None);
}

#[test]
fn unit_display_round_trips() {
    for unit in Unit::iter() {
        assert_eq!(Unit::parse(&unit.to_string()), Some(unit));
    }
}
