//! Interfaces for the three external collaborators the core never implements
//! more than a reasonable default for: the currency loader, the pluralizer,
//! and the number formatter. The core never performs I/O and never decides
//! how a rational prints — it only calls through these traits, so a caller
//! can swap in richer behavior (locale-aware formatting, a live exchange-
//! rate feed) without touching the engine.

use crate::rational::Rational;

/// `Rational → String`, injected into a [`crate::universe::Universe`]. The
/// default implementation below is exact-decimal-or-bounded-precision.
pub trait NumberFormatter: Send + Sync {
    fn format(&self, value: &Rational) -> String;
}

/// The formatter a [`crate::universe::Universe`] uses when the caller
/// doesn't supply one: `Rational::to_decimal_string`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNumberFormatter;

impl NumberFormatter for DefaultNumberFormatter {
    fn format(&self, value: &Rational) -> String {
        value.to_decimal_string()
    }
}

/// One currency unit as the currency collaborator hands it to the core:
/// a code, a display name, the code of the shared base currency, and the
/// multiplier to convert to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyUnitDef {
    pub code: String,
    pub long_name: String,
    pub base_code: String,
    pub multiplier: Rational,
}

/// Given a set of currency codes, returns a sequence of unit definitions
/// with a shared base currency and per-unit multipliers. Implemented
/// outside the core against whatever JSON feed or cache file backs it; the
/// core only ever sees the values this returns.
pub trait CurrencySource {
    fn load(&self, codes: &[String]) -> Result<Vec<CurrencyUnitDef>, crate::error::ConvertError>;
}

/// `plural_of: String → String`. The core's own unit-name registration
/// ([`crate::inflector::plural_of`]) is not this trait — that pluralization
/// is an implementation detail of name indexing, always present. This
/// trait is the external hook for a caller that wants a richer inflection
/// engine for its own output; a thin adapter over
/// [`crate::inflector::plural_of`] is provided as the default.
pub trait Pluralizer {
    fn plural_of(&self, word: &str) -> String;
}

/// Adapts the core's own inflector to the external [`Pluralizer`] seam, so
/// a caller that doesn't need anything richer doesn't have to implement
/// one from scratch.
#[derive(Debug, Clone, Copy, Default)]
pub struct InflectorPluralizer;

impl Pluralizer for InflectorPluralizer {
    fn plural_of(&self, word: &str) -> String {
        crate::inflector::plural_of(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_formatter_renders_exact_decimals() {
        let formatter = DefaultNumberFormatter;
        assert_eq!(formatter.format(&Rational::new(1, 4).unwrap()), "0.25");
    }

    #[test]
    fn inflector_pluralizer_matches_the_core_inflector() {
        let pluralizer = InflectorPluralizer;
        assert_eq!(pluralizer.plural_of("meter"), "meters");
    }
}
