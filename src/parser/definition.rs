//! The universe-definition grammar: `file := property_def+`. Drives a
//! whole-input grammar to completion — a sequence of property blocks —
//! parsing until EOF and failing on the first bad token.

use std::sync::Arc;

use crate::error::{ConvertError, Result};
use crate::external::{CurrencySource, NumberFormatter};
use crate::parser::Parser;
use crate::prefix::UnitPrefix;
use crate::rational::Rational;
use crate::tokenizer::TokenKind;
use crate::unit::PropertyId;
use crate::universe::Universe;

/// Parses a complete universe-definition source into a frozen [`Universe`].
/// `currency_source` is consulted only for property blocks that delegate to
/// `$`; omit it when the definition has no such block.
pub fn parse_universe(
    source: &str,
    filename: Option<String>,
    number_formatter: Arc<dyn NumberFormatter>,
    currency_source: Option<&dyn CurrencySource>,
) -> Result<Universe> {
    let mut universe = Universe::new(number_formatter);
    let mut parser = Parser::new(source, filename)?;
    parser.register_keyword("per");

    while parser.current_kind() != TokenKind::Eof {
        parse_property_def(&mut parser, &mut universe, currency_source)?;
    }

    universe.freeze()?;
    Ok(universe)
}

fn parse_property_def(parser: &mut Parser, universe: &mut Universe, currency_source: Option<&dyn CurrencySource>) -> Result<()> {
    let names = parser.parse_name_list()?;

    if parser.current_kind() == TokenKind::Dollar {
        parser.bump()?;
        let codes = parse_currency_block(parser)?;
        register_currency_property(universe, names, codes, currency_source)?;
        return Ok(());
    }

    let property_id = if parser.current_kind() == TokenKind::Equals {
        parser.bump()?;
        let resolver = |name: &str| universe.get_property(name).map(|p| p.id());
        let dimensions = parser.parse_factor_expr(&resolver)?;
        universe.register_derived_property(names, dimensions)?
    } else {
        universe.register_fundamental_property(names)?
    };

    parser.expect(TokenKind::LBrace)?;
    while parser.current_kind() != TokenKind::RBrace {
        parse_unit_def(parser, universe, property_id)?;
    }
    parser.expect(TokenKind::RBrace)?;
    Ok(())
}

fn parse_unit_def(parser: &mut Parser, universe: &mut Universe, property_id: PropertyId) -> Result<()> {
    let prefixes = if parser.current_kind() == TokenKind::LBrace {
        parser.bump()?;
        let names = parser.parse_prefix_list()?;
        parser.expect(TokenKind::RBrace)?;
        names
    } else {
        Vec::new()
    };

    // An "unnamed" nickname unit (`(mps) = meters per second;`) has no long
    // name at all, only the short-name group; a unit_def starting directly
    // at `(` skips straight to the short-name group instead.
    let long_names = if parser.current_kind() == TokenKind::LParen {
        Vec::new()
    } else {
        parser.parse_name_list()?
    };

    let short_names = if parser.current_kind() == TokenKind::LParen {
        parser.bump()?;
        let names = parser.parse_name_list()?;
        parser.expect(TokenKind::RParen)?;
        names
    } else {
        Vec::new()
    };

    let is_first_unit = universe.get_property_by_id(property_id).units().is_empty();
    let (multiplier, offset) = if parser.current_kind() == TokenKind::Equals {
        if is_first_unit {
            return Err(ConvertError::syntax(
                "the first unit of a fundamental property must be declared without an expression",
                parser.current_span(),
                "=",
            ));
        }
        parser.bump()?;
        parse_unit_rhs(parser, universe, property_id)?
    } else {
        (Rational::one(), Rational::zero())
    };

    let unit_id = universe.register_atomic_unit(property_id, long_names, short_names, multiplier, offset)?;

    for prefix_name in &prefixes {
        let prefix = UnitPrefix::by_long_name(prefix_name)
            .ok_or_else(|| ConvertError::syntax(format!("unknown prefix {prefix_name:?}"), parser.current_span(), prefix_name.clone()))?;
        universe.register_prefixed_unit(property_id, prefix, unit_id)?;
    }

    parser.expect(TokenKind::Semicolon)?;
    Ok(())
}

/// `'=' number factor_expr (('+'|'-') number)?` when the right-hand side
/// opens with a numeric literal — the ordinary "n base_units" unit
/// definition — or a bare `factor_expr` otherwise, for unnamed combination
/// units (`(mps) = meters per second;`, with no leading multiplier). In the
/// bare form the new unit's multiplier is the referenced expression's own
/// multiplier and no offset is permitted.
fn parse_unit_rhs(parser: &mut Parser, universe: &Universe, property_id: PropertyId) -> Result<(Rational, Rational)> {
    let resolver = |name: &str| universe.get_unit_id(name);

    if parser.starts_number() {
        let factor = parser.parse_number()?;
        let base_factors = parser.parse_factor_expr(&resolver)?;
        let base_unit_id = universe.unit_for_factors(base_factors)?;
        let base_unit = universe.unit(base_unit_id);
        if base_unit.property() != Some(property_id) {
            return Err(ConvertError::IncompatibleBaseUnit {
                unit: universe.unit_display_name(base_unit_id),
                base: base_unit.property().map(|p| universe.get_property_by_id(p).primary_name().to_string()).unwrap_or_default(),
            });
        }

        let multiplier = factor.mul(base_unit.multiplier());
        let mut c = Rational::zero();

        if matches!(parser.current_kind(), TokenKind::Plus | TokenKind::Minus) {
            let negative = parser.current_kind() == TokenKind::Minus;
            parser.bump()?;
            let extra = parser.parse_number()?;
            c = if negative { c.sub(&extra) } else { c.add(&extra) };
        }

        // `x` new-units is `factor*x + c` expressed in the referenced unit;
        // converting that to the base unit through the referenced unit's
        // own `to_base` (u*base_unit.multiplier() + base_unit.offset())
        // gives base = x*(factor*base_unit.multiplier()) + (c*base_unit.multiplier() + base_unit.offset()).
        // The multiplier above is exactly the first term; this is the second.
        let offset = c.mul(base_unit.multiplier()).add(base_unit.offset());

        Ok((multiplier, offset))
    } else {
        let factors = parser.parse_factor_expr(&resolver)?;
        let unit_id = universe.unit_for_factors(factors)?;
        let unit = universe.unit(unit_id);
        if unit.has_offset() {
            return Err(ConvertError::incompatible_units(universe.unit_display_name(unit_id), "a unit nickname (offsetted units cannot be aliased)"));
        }
        Ok((unit.multiplier().clone(), Rational::zero()))
    }
}

/// `currency_block := '{' (WORD ':' name_list ';')* '}'`, returning the
/// currency code paired with the names it should be registered under.
fn parse_currency_block(parser: &mut Parser) -> Result<Vec<(String, Vec<String>)>> {
    parser.expect(TokenKind::LBrace)?;
    let mut entries = Vec::new();
    while parser.current_kind() != TokenKind::RBrace {
        let code = expect_word_text(parser)?;
        parser.expect(TokenKind::Colon)?;
        let names = parser.parse_name_list()?;
        parser.expect(TokenKind::Semicolon)?;
        entries.push((code, names));
    }
    parser.expect(TokenKind::RBrace)?;
    Ok(entries)
}

fn expect_word_text(parser: &mut Parser) -> Result<String> {
    if parser.current_kind() != TokenKind::Word {
        return Err(ConvertError::syntax("expected a currency code", parser.current_span(), parser.current_text().to_string()));
    }
    Ok(parser.bump()?.text)
}

fn register_currency_property(
    universe: &mut Universe,
    names: Vec<String>,
    codes: Vec<(String, Vec<String>)>,
    currency_source: Option<&dyn CurrencySource>,
) -> Result<()> {
    let source = currency_source.ok_or_else(|| ConvertError::illegal_state("this universe declares a currency property but no currency source was configured"))?;

    let property_id = universe.register_fundamental_property(names)?;
    let codes_only: Vec<String> = codes.iter().map(|(code, _)| code.clone()).collect();
    let defs = source.load(&codes_only)?;

    for def in defs {
        let aliases = codes.iter().find(|(code, _)| *code == def.code).map(|(_, names)| names.clone()).unwrap_or_default();
        let mut long_names = vec![def.long_name];
        long_names.extend(aliases);
        universe.register_atomic_unit(property_id, long_names, vec![def.code], def.multiplier, Rational::zero())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use crate::external::DefaultNumberFormatter;
    use crate::parser::query::parse_query;

    use super::*;

    fn universe(source: &str) -> Result<Universe> {
        parse_universe(source, Some("test".to_string()), Arc::new(DefaultNumberFormatter), None)
    }

    #[test]
    fn unit_chained_through_a_non_base_offsetted_unit_composes_correctly() {
        // `fahrenheit` is itself offset from `celsius` (its property's base
        // unit); `shifted_fahrenheit` is then defined atop `fahrenheit`, not
        // atop the base unit, so this exercises composing the two offsets
        // rather than just inheriting `fahrenheit`'s directly.
        let u = universe(
            r#"
            temperature {
                celsius (c);
                fahrenheit (f) = 5/9 celsius - 160/9;
                shifted_fahrenheit (sf) = 1 fahrenheit + 10;
            }
            "#,
        )
        .unwrap();

        let query = parse_query("0 shifted_fahrenheit in celsius", &u).unwrap();
        let expected = Rational::new(-110, 9).unwrap();
        assert_eq!(query.result().value().compare(&expected), Ordering::Equal);
    }

    #[test]
    fn unit_referencing_a_base_unit_from_another_property_is_rejected() {
        let u = universe(
            r#"
            length {
                meter (m);
            }
            time {
                second (s);
                bogus_minute (bm) = 60 meters;
            }
            "#,
        )
        .unwrap_err();

        assert!(matches!(u, ConvertError::IncompatibleBaseUnit { .. }));
    }

    #[test]
    fn first_unit_of_a_fundamental_property_cannot_carry_an_expression() {
        let err = universe(
            r#"
            length {
                meter (m) = 100 centimeters;
            }
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConvertError::Syntax { .. }));
    }

    #[test]
    fn unnamed_nickname_unit_combines_other_units_without_a_leading_multiplier() {
        let u = universe(
            r#"
            length {
                meter (m);
            }
            time {
                second (s);
            }
            speed = length/time {
                (mps) = meters per second;
            }
            "#,
        )
        .unwrap();

        let query = parse_query("3 meters per second in mps", &u).unwrap();
        assert_eq!(query.result().value().compare(&Rational::from_integer(3)), Ordering::Equal);
    }
}
