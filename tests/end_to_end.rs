//! End-to-end scenarios through the public `parse_universe`/`parse_query`
//! API, against a single definition source modeled on the worked example
//! universe (length/time/mass/area/speed/momentum/temperature).
//!
//! One deliberate deviation from that worked example: its literal text
//! reuses `"m"` as the short name for both `meter` and `minute`, which
//! collides under this engine's universe-wide (not per-property) unit-name
//! uniqueness rule. `minute` is given the short name `"min"` here instead;
//! see DESIGN.md.

use std::cmp::Ordering;
use std::sync::Arc;

use unital::external::DefaultNumberFormatter;
use unital::rational::Rational;
use unital::{ConvertError, Universe};

const DEFINITION_SOURCE: &str = r#"
length, distance {
    { nano, micro, milli, centi, deci, deca, hecto, kilo } meter, metre (m);
    inch (in) = 25.4 mm;
    foot (ft) = 12 inches;
    yard (yd) = 3 feet;
    mile (mi) = 5280 feet;
    light year (ly) = 9_460_730_472_580_800 m;
}
time {
    { micro, milli } second (s);
    minute (min) = 60 seconds;
    hour (h) = 60 minutes;
}
mass {
    { milli, kilo } gram (g);
    pound (lb) = 0.45359237 kg;
    ounce (oz) = 1/16 pounds;
}
area = square distance {
    acre (ac) = 43_560 feet^2;
}
speed = distance/time {
    (mps) = meters per second;
    (mph) = miles per hour;
}
momentum = mass*speed {}
temperature {
    celsius (c);
    fahrenheit (f) = 5/9 celsius - 160/9;
}
"#;

fn universe() -> Universe {
    unital::parse_universe(DEFINITION_SOURCE, Some("test-universe".to_string()), Arc::new(DefaultNumberFormatter), None).expect("definition source parses and freezes")
}

fn assert_rational_eq(actual: &Rational, expected: &Rational) {
    assert_eq!(actual.compare(expected), Ordering::Equal, "expected {expected}, got {actual}");
}

#[test]
fn converts_highway_speed_to_si() {
    let u = universe();
    let query = unital::parse_query("100 miles per hour in meters per second", &u).unwrap();

    let foot = Rational::new(3048, 10000).unwrap();
    let mile = foot.mul(&Rational::from_integer(5280));
    let hour = Rational::from_integer(3600);
    let mph = mile.div(&hour).unwrap();
    let expected = mph.mul(&Rational::from_integer(100));

    assert_rational_eq(query.result().value(), &expected);
}

#[test]
fn converts_meters_to_inches_exactly() {
    let u = universe();
    let query = unital::parse_query("2 meters in inches", &u).unwrap();
    // 2 / 0.0254 = 10000/127, not a terminating decimal.
    let expected = Rational::new(10000, 127).unwrap();
    assert_rational_eq(query.result().value(), &expected);
}

#[test]
fn converts_fractional_speed_between_compound_units() {
    let u = universe();
    let query = unital::parse_query("1/3 kilometers/hour in feet/min", &u).unwrap();

    let km_per_hour = Rational::new(1, 3).unwrap().mul(&Rational::from_integer(1000)).div(&Rational::from_integer(3600)).unwrap();
    let foot = Rational::new(3048, 10000).unwrap();
    let expected = km_per_hour.div(&foot).unwrap().mul(&Rational::from_integer(60));

    assert_rational_eq(query.result().value(), &expected);
}

#[test]
fn converts_momentum_between_unit_systems() {
    let u = universe();
    let query = unital::parse_query(".45 kg m / square second in pound foot per s^2", &u).unwrap();

    let kg_m_per_s2 = Rational::from_decimal_str("0.45").unwrap();
    let pound = Rational::new(45359237, 100_000_000).unwrap();
    let foot = Rational::new(3048, 10000).unwrap();
    let expected = kg_m_per_s2.div(&pound.mul(&foot)).unwrap();

    assert_rational_eq(query.result().value(), &expected);
}

#[test]
fn converts_an_offsetted_temperature_unit() {
    let u = universe();
    let query = unital::parse_query("0 celsius in fahrenheit", &u).unwrap();
    assert_rational_eq(query.result().value(), &Rational::from_integer(32));
}

#[test]
fn sums_a_mixed_unit_list_before_converting() {
    let u = universe();
    let query = unital::parse_query("10 meters + 3 yards in feet", &u).unwrap();

    let foot = Rational::new(3048, 10000).unwrap();
    let yard = Rational::new(9144, 10000).unwrap();
    let expected = Rational::from_integer(10).div(&foot).unwrap().add(&Rational::from_integer(3).mul(&yard).div(&foot).unwrap());

    assert_rational_eq(query.result().value(), &expected);
}

#[test]
fn incompatible_dimensions_are_rejected() {
    let u = universe();
    let err = unital::parse_query("2 meters in seconds", &u).unwrap_err();
    assert!(matches!(err, ConvertError::IncompatibleUnits { .. }));
}

#[test]
fn repeated_derived_unit_expressions_resolve_to_the_same_unit() {
    let u = universe();
    let first = unital::parse_query("5 kilograms meter per second in kilogram meter per second", &u).unwrap();
    let second = unital::parse_query("9 kilogram meter per second in kilograms meter per second", &u).unwrap();
    assert_eq!(first.result().unit(), second.result().unit());
}

#[test]
fn area_derived_from_an_exponentiated_atomic_unit() {
    let u = universe();
    let query = unital::parse_query("1 acre in square feet", &u).unwrap();
    assert_rational_eq(query.result().value(), &Rational::from_integer(43_560));
}

#[test]
fn momentum_property_reduces_to_fundamental_dimensions() {
    let u = universe();
    // momentum = mass*speed, and speed = distance/time; mass*speed should
    // therefore be compatible with mass*distance/time even though neither
    // definition mentions "speed" by name.
    let query = unital::parse_query("1 kilogram meter per second in kilogram meter per second", &u).unwrap();
    assert_rational_eq(query.result().value(), &Rational::one());
}

#[test]
fn unknown_unit_name_reports_suggestions() {
    let u = universe();
    let err = unital::parse_query("2 meetr in inches", &u).unwrap_err();
    match err {
        ConvertError::UnknownUnitName { name, suggestions } => {
            assert_eq!(name, "meetr");
            assert!(!suggestions.is_empty());
        }
        other => panic!("expected UnknownUnitName, got {other:?}"),
    }
}
