//! `Quantity` and `ConversionQuery`: the value side of the engine.
//! Everything here is a plain data pair plus free functions that take
//! a [`Universe`] explicitly — a `Quantity` does not borrow or own one, so
//! the same value can be evaluated against any registry that knows its unit.
//!
//! A value and a unit id travel together, and every arithmetic operation on
//! the pair is a free function or method that takes the registry as an
//! explicit argument rather than a method on a type that owns the registry.

use std::cmp::Ordering;

use crate::error::{ConvertError, Result};
use crate::rational::Rational;
use crate::universe::Universe;
use crate::unit::UnitId;

/// An immutable `(value, unit)` pair. Two quantities are only
/// ever compared after converting one into the other's unit — there is no
/// blanket `PartialEq`, since "equal" is ambiguous without a registry to
/// resolve units against and a sum of offsetted units is ill-defined in
/// general. [`Quantity::equals`] and [`Quantity::approximately_equals`]
/// below are the two relations a caller can actually ask for.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quantity {
    value: Rational,
    unit: UnitId,
}

impl Quantity {
    pub fn new(value: Rational, unit: UnitId) -> Self {
        Self { value, unit }
    }

    pub fn value(&self) -> &Rational {
        &self.value
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// Converts this quantity into `destination`, failing if the two units
    /// do not share a dimension.
    pub fn convert_to(&self, universe: &Universe, destination: UnitId) -> Result<Quantity> {
        let converted = universe.convert(self.unit, destination, &self.value)?;
        Ok(Quantity::new(converted, destination))
    }

    /// Strict equality: same dimension, and equal once both are expressed
    /// in the same unit. Fails (rather than silently returning `false`) when
    /// the two quantities measure different properties, since "5 meters"
    /// and "5 seconds" being merely *unequal* would misleadingly suggest
    /// they were comparable at all.
    pub fn equals(&self, universe: &Universe, other: &Quantity) -> Result<bool> {
        Ok(self.compare(universe, other)? == Ordering::Equal)
    }

    /// The lax counterpart to [`Quantity::equals`]: `false` for incompatible
    /// dimensions instead of an error, for callers that just want a yes/no
    /// without handling the incompatible case.
    pub fn approximately_equals(&self, universe: &Universe, other: &Quantity) -> bool {
        self.equals(universe, other).unwrap_or(false)
    }

    /// Orders this quantity against `other` by converting `other` into this
    /// quantity's unit and delegating to `Rational`'s ordering.
    pub fn compare(&self, universe: &Universe, other: &Quantity) -> Result<Ordering> {
        let other_value = universe.convert(other.unit, self.unit, &other.value)?;
        Ok(self.value.compare(&other_value))
    }

    /// Sums `quantities` and expresses the total in `destination`:
    /// - empty input sums to zero at `destination`;
    /// - a single quantity is just converted, even if its own unit carries
    ///   an offset (`5 celsius` alone is `41 fahrenheit`, no addition
    ///   happens);
    /// - two or more quantities fail if *any* of their units has a nonzero
    ///   offset — summing two offsetted quantities has no single sensible
    ///   zero point — otherwise each is converted to `destination` and
    ///   accumulated.
    pub fn sum(universe: &Universe, destination: UnitId, quantities: &[Quantity]) -> Result<Quantity> {
        match quantities {
            [] => Ok(Quantity::new(Rational::zero(), destination)),
            [only] => only.convert_to(universe, destination),
            many => {
                for q in many {
                    if universe.unit(q.unit).has_offset() {
                        return Err(ConvertError::NonAdditiveQuantities {
                            unit: universe.unit_display_name(q.unit),
                        });
                    }
                }
                let mut total = Rational::zero();
                for q in many {
                    let converted = universe.convert(q.unit, destination, &q.value)?;
                    total = total.add(&converted);
                }
                Ok(Quantity::new(total, destination))
            }
        }
    }
}

/// The result of evaluating a query string: the quantities as parsed, their
/// sum, and the sum expressed in the destination unit. Keeps the three
/// pieces separate rather than discarding the inputs once summed,
/// since the query's *expression* string form renders the original
/// quantities, not just the final value.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConversionQuery {
    quantities: Vec<Quantity>,
    sum: Quantity,
    result: Quantity,
}

impl ConversionQuery {
    /// Evaluates `quantities` against `destination`: sums them and converts
    /// the sum into `destination`.
    pub fn evaluate(universe: &Universe, quantities: Vec<Quantity>, destination: UnitId) -> Result<Self> {
        let source_unit = quantities.first().map(|q| q.unit).unwrap_or(destination);
        let sum = Quantity::sum(universe, source_unit, &quantities)?;
        let result = sum.convert_to(universe, destination)?;
        Ok(Self { quantities, sum, result })
    }

    pub fn quantities(&self) -> &[Quantity] {
        &self.quantities
    }

    pub fn sum(&self) -> &Quantity {
        &self.sum
    }

    pub fn result(&self) -> &Quantity {
        &self.result
    }

    /// `"q1"` for a single quantity, `"(q1) + (q2) + ..."` for a sum, each
    /// `qN` rendered as `"value unit"` with the unit named in whichever
    /// plurality matches its value.
    pub fn expression(&self, universe: &Universe) -> String {
        match self.quantities.as_slice() {
            [only] => render_quantity(universe, only),
            many => many
                .iter()
                .map(|q| format!("({})", render_quantity(universe, q)))
                .collect::<Vec<_>>()
                .join(" + "),
        }
    }

    /// `"expression = value unit"`.
    pub fn result_string(&self, universe: &Universe) -> String {
        format!("{} = {}", self.expression(universe), render_quantity(universe, &self.result))
    }

    /// `"expression in plural_unit_name"`.
    pub fn query_string(&self, universe: &Universe) -> String {
        format!("{} in {}", self.expression(universe), universe.unit_plural_display_name(self.result.unit))
    }
}

fn render_quantity(universe: &Universe, q: &Quantity) -> String {
    let formatted = universe.number_formatter().format(&q.value);
    let name = if q.value.abs() == Rational::one() {
        universe.unit_display_name(q.unit)
    } else {
        universe.unit_plural_display_name(q.unit)
    };
    format!("{formatted} {name}")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::external::DefaultNumberFormatter;

    use super::*;

    fn r(n: i64, d: i64) -> Rational {
        Rational::new(n, d).unwrap()
    }

    fn meter_second_universe() -> (Universe, UnitId, UnitId, UnitId, UnitId) {
        let mut u = Universe::new(Arc::new(DefaultNumberFormatter));
        let length = u.register_fundamental_property(vec!["length".to_string()]).unwrap();
        let meter = u
            .register_atomic_unit(length, vec!["meter".to_string()], vec!["m".to_string()], Rational::one(), Rational::zero())
            .unwrap();
        let inch = u
            .register_atomic_unit(length, vec!["inch".to_string()], vec!["in".to_string()], Rational::new(254, 10000).unwrap(), Rational::zero())
            .unwrap();
        let temperature = u.register_fundamental_property(vec!["temperature".to_string()]).unwrap();
        let celsius = u
            .register_atomic_unit(temperature, vec!["celsius".to_string()], vec!["c".to_string()], Rational::one(), Rational::zero())
            .unwrap();
        let fahrenheit = u
            .register_atomic_unit(
                temperature,
                vec!["fahrenheit".to_string()],
                vec!["f".to_string()],
                Rational::new(5, 9).unwrap(),
                Rational::new(-160, 9).unwrap(),
            )
            .unwrap();
        u.freeze().unwrap();
        (u, meter, inch, celsius, fahrenheit)
    }

    #[test]
    fn converting_a_single_quantity_just_converts() {
        let (u, meter, inch, ..) = meter_second_universe();
        let q = Quantity::new(r(2, 1), meter);
        let converted = q.convert_to(&u, inch).unwrap();
        assert!(converted.value().compare(&r(10000, 127)) == Ordering::Equal);
    }

    #[test]
    fn sum_of_empty_list_is_zero_at_destination() {
        let (u, meter, ..) = meter_second_universe();
        let sum = Quantity::sum(&u, meter, &[]).unwrap();
        assert!(sum.value().is_zero());
        assert_eq!(sum.unit(), meter);
    }

    #[test]
    fn sum_of_two_plain_quantities_accumulates() {
        let (u, meter, inch, ..) = meter_second_universe();
        let a = Quantity::new(r(1, 1), meter);
        let b = Quantity::new(r(1, 1), meter);
        let total = Quantity::sum(&u, meter, &[a, b]).unwrap();
        assert_eq!(total.value().compare(&r(2, 1)), Ordering::Equal);
        let _ = inch;
    }

    #[test]
    fn summing_two_offsetted_quantities_fails() {
        let (u, _, _, celsius, fahrenheit) = meter_second_universe();
        let a = Quantity::new(r(0, 1), celsius);
        let b = Quantity::new(r(32, 1), fahrenheit);
        let err = Quantity::sum(&u, celsius, &[a, b]);
        assert!(matches!(err, Err(ConvertError::NonAdditiveQuantities { .. })));
    }

    #[test]
    fn single_offsetted_quantity_converts_without_failing() {
        let (u, _, _, celsius, fahrenheit) = meter_second_universe();
        let a = Quantity::new(r(0, 1), celsius);
        let converted = Quantity::sum(&u, fahrenheit, &[a]).unwrap();
        assert_eq!(converted.value().compare(&r(32, 1)), Ordering::Equal);
    }

    #[test]
    fn equals_requires_compatible_dimensions() {
        let (u, meter, _, celsius, _) = meter_second_universe();
        let a = Quantity::new(r(1, 1), meter);
        let b = Quantity::new(r(1, 1), celsius);
        assert!(a.equals(&u, &b).is_err());
        assert!(!a.approximately_equals(&u, &b));
    }

    #[test]
    fn equals_converts_before_comparing() {
        let (u, meter, inch, ..) = meter_second_universe();
        let a = Quantity::new(r(1, 1), meter);
        let b = Quantity::new(r(10000, 254), inch);
        assert!(a.equals(&u, &b).unwrap());
    }

    #[test]
    fn expression_pluralizes_by_value() {
        let (u, meter, ..) = meter_second_universe();
        let query = ConversionQuery::evaluate(&u, vec![Quantity::new(r(2, 1), meter)], meter).unwrap();
        assert_eq!(query.expression(&u), "2 meters");
    }

    #[test]
    fn expression_keeps_singular_for_one() {
        let (u, meter, ..) = meter_second_universe();
        let query = ConversionQuery::evaluate(&u, vec![Quantity::new(r(1, 1), meter)], meter).unwrap();
        assert_eq!(query.expression(&u), "1 meter");
    }

    #[test]
    fn query_string_uses_plural_destination_name() {
        let (u, meter, inch, ..) = meter_second_universe();
        let query = ConversionQuery::evaluate(&u, vec![Quantity::new(r(1, 1), meter)], inch).unwrap();
        assert!(query.query_string(&u).ends_with("in inches"));
    }

    #[test]
    fn multi_term_expression_is_parenthesized_and_joined() {
        let (u, meter, ..) = meter_second_universe();
        let query = ConversionQuery::evaluate(
            &u,
            vec![Quantity::new(r(1, 1), meter), Quantity::new(r(2, 1), meter)],
            meter,
        )
        .unwrap();
        assert_eq!(query.expression(&u), "(1 meter) + (2 meters)");
    }
}
