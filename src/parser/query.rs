//! The query grammar: `query := quantity (('and'|'plus'|',') quantity)*
//! (separator factor_expr)?`.
//!
//! Parses, then immediately evaluates against the loaded registry in the
//! same pass — there is no separate "query AST" type, since `quantity` and
//! `factor_expr` already resolve straight to `Quantity`/`Factorization<UnitId>`
//! during parsing.

use crate::error::{ConvertError, Result};
use crate::parser::Parser;
use crate::quantity::{ConversionQuery, Quantity};
use crate::tokenizer::TokenKind;
use crate::universe::Universe;

/// Parses and immediately evaluates a query string against `universe`.
pub fn parse_query(source: &str, universe: &Universe) -> Result<ConversionQuery> {
    let mut parser = Parser::new(source, None)?;
    parser.register_keyword("per");
    parser.register_keyword("in");
    parser.register_keyword("to");
    parser.register_keyword("as");
    parser.register_keyword("and");
    parser.register_keyword("plus");

    let mut quantities = vec![parse_quantity(&mut parser, universe)?];
    while is_list_separator(&parser) {
        parser.bump()?;
        quantities.push(parse_quantity(&mut parser, universe)?);
    }

    for q in &quantities[1..] {
        if !universe.are_compatible(quantities[0].unit(), q.unit()) {
            return Err(ConvertError::incompatible_units(
                universe.unit_display_name(quantities[0].unit()),
                universe.unit_display_name(q.unit()),
            ));
        }
    }

    let destination = if is_separator_keyword(&parser) {
        parser.bump()?;
        let resolver = |name: &str| universe.get_unit_id(name);
        let factors = parser.parse_factor_expr(&resolver)?;
        universe.unit_for_factors(factors)?
    } else {
        let source_unit = quantities[0].unit();
        let property_id = universe
            .unit(source_unit)
            .property()
            .ok_or_else(|| ConvertError::incompatible_units(universe.unit_display_name(source_unit), "no property (invalid derived unit)"))?;
        universe
            .get_property_by_id(property_id)
            .base_unit()
            .expect("every frozen property has a base unit, checked at freeze time")
    };

    parser.expect(TokenKind::Eof)?;
    ConversionQuery::evaluate(universe, quantities, destination)
}

/// `quantity := number factor_expr`.
fn parse_quantity(parser: &mut Parser, universe: &Universe) -> Result<Quantity> {
    let value = parser.parse_number()?;
    let resolver = |name: &str| universe.get_unit_id(name);
    let factors = parser.parse_factor_expr(&resolver)?;
    let unit_id = universe.unit_for_factors(factors)?;
    Ok(Quantity::new(value, unit_id))
}

fn is_list_separator(parser: &Parser) -> bool {
    parser.current_kind() == TokenKind::Comma || parser.is_keyword("and") || parser.is_keyword("plus")
}

/// `separator := 'in' | 'to' | 'as'`.
fn is_separator_keyword(parser: &Parser) -> bool {
    parser.is_keyword("in") || parser.is_keyword("to") || parser.is_keyword("as")
}
