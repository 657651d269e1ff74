//! A unit-algebra engine and natural-language conversion parser/evaluator
//! over a user-supplied universe of properties and units.
//!
//! A caller builds a [`Universe`] by parsing a definition source with
//! [`parse_universe`], then evaluates conversion queries against it with
//! [`parse_query`]. Every quantity in between is an exact [`Rational`] — the
//! engine never rounds until a [`NumberFormatter`] is asked to render one.
//!
//! ```ignore
//! let universe = unital::parse_universe(DEFINITION_SOURCE, None, Arc::new(DefaultNumberFormatter), None)?;
//! let query = unital::parse_query("2 meters in inches", &universe)?;
//! println!("{}", query.result_string(&universe));
//! ```

pub mod error;
pub mod external;
pub mod factorization;
pub mod inflector;
pub mod prefix;
pub mod quantity;
pub mod rational;
pub mod suggestions;
pub mod tokenizer;
pub mod unit;
pub mod universe;

pub(crate) mod parser;

use std::sync::Arc;

pub use error::{ArithmeticError, ConvertError, Result, Span};
pub use external::{CurrencySource, CurrencyUnitDef, DefaultNumberFormatter, InflectorPluralizer, NumberFormatter, Pluralizer};
pub use factorization::Factorization;
pub use prefix::UnitPrefix;
pub use quantity::{ConversionQuery, Quantity};
pub use rational::Rational;
pub use unit::{Property, PropertyId, Unit, UnitId};
pub use universe::Universe;

/// Parses a complete universe-definition source into a frozen
/// [`Universe`]. `filename` is only used to annotate error spans.
/// `currency_source` is consulted for any property block that delegates to
/// `$`; pass `None` when the definition declares no currency property.
pub fn parse_universe(
    source: &str,
    filename: Option<String>,
    number_formatter: Arc<dyn NumberFormatter>,
    currency_source: Option<&dyn CurrencySource>,
) -> Result<Universe> {
    parser::definition::parse_universe(source, filename, number_formatter, currency_source)
}

/// Parses and evaluates a query string against `universe`.
pub fn parse_query(source: &str, universe: &Universe) -> Result<ConversionQuery> {
    parser::query::parse_query(source, universe)
}
