//! Error taxonomy for the unit-algebra engine.
//!
//! One `thiserror`-derived enum covers every failure mode the core can
//! produce. The core never recovers from an error: every
//! operation aborts and surfaces the error to the caller.

use std::fmt;

use crate::factorization::Factorization;

/// A location within a parsed source (definition file or query string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub filename: Option<String>,
}

impl Span {
    pub fn new(line: usize, column: usize, filename: Option<String>) -> Self {
        Self {
            line,
            column,
            filename,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filename {
            Some(name) => write!(f, "{name}:{}:{}", self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

/// Rounding-related and constructor failures from [`crate::rational::Rational`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivideByZero,
    #[error("value is not finite")]
    NotFinite,
    #[error("rounding is necessary but forbidden by RoundingMode::Unnecessary")]
    RoundingNecessary,
    #[error("cannot raise zero to a negative power")]
    ZeroToNegativePower,
    #[error("malformed decimal literal: {0}")]
    MalformedDecimal(String),
}

/// The complete error taxonomy of the unit-algebra engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConvertError {
    #[error("{0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("syntax error at {span}: {message}")]
    Syntax {
        message: String,
        span: Span,
        found: String,
    },

    #[error("unknown unit {name:?}{}", suggestion_suffix(.suggestions))]
    UnknownUnitName {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("unknown property {name:?}{}", suggestion_suffix(.suggestions))]
    UnknownPropertyName {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("duplicate unit name {name:?}")]
    DuplicateUnitName { name: String },

    #[error("duplicate property name {name:?}")]
    DuplicatePropertyName { name: String },

    #[error("two derived properties collapse to the same dimensions: {a:?} and {b:?}")]
    DuplicateDerivedProperty { a: String, b: String },

    #[error("incompatible units: {from} and {to} do not share a dimension{}", detail.as_ref().map(|d| format!(" ({d})")).unwrap_or_default())]
    IncompatibleUnits {
        from: String,
        to: String,
        detail: Option<String>,
    },

    #[error("unit {unit:?} references base unit {base:?} from a different property")]
    IncompatibleBaseUnit { unit: String, base: String },

    #[error("property {name:?} is fundamental but declares no atomic units")]
    InvalidEmptyProperty { name: String },

    #[error("cannot apply a prefix to {unit:?}: it is already a prefixed unit")]
    DoublePrefixedUnit { unit: String },

    #[error("cannot sum quantities: {unit:?} has a nonzero offset")]
    NonAdditiveQuantities { unit: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("illegal tokenizer state: {0}")]
    IllegalState(String),
}

fn suggestion_suffix(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean {}?)", suggestions.join(", "))
    }
}

impl ConvertError {
    pub fn unknown_unit(name: impl Into<String>) -> Self {
        ConvertError::UnknownUnitName {
            name: name.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn unknown_property(name: impl Into<String>) -> Self {
        ConvertError::UnknownPropertyName {
            name: name.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(mut self, found: Vec<String>) -> Self {
        match &mut self {
            ConvertError::UnknownUnitName { suggestions, .. }
            | ConvertError::UnknownPropertyName { suggestions, .. } => *suggestions = found,
            _ => {}
        }
        self
    }

    pub fn incompatible_units(from: impl Into<String>, to: impl Into<String>) -> Self {
        ConvertError::IncompatibleUnits {
            from: from.into(),
            to: to.into(),
            detail: None,
        }
    }

    /// Like [`ConvertError::incompatible_units`], but with the two sides'
    /// dimensional factorizations spelled out (built from
    /// [`dimension_mismatch_message`]) for a caller that has them on hand —
    /// the universe registry's `convert`, which knows both properties'
    /// dimensions, uses this one.
    pub fn incompatible_units_with_dims(from: impl Into<String>, to: impl Into<String>, detail: impl Into<String>) -> Self {
        ConvertError::IncompatibleUnits {
            from: from.into(),
            to: to.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        ConvertError::IllegalState(message.into())
    }

    pub fn syntax(message: impl Into<String>, span: Span, found: impl Into<String>) -> Self {
        ConvertError::Syntax {
            message: message.into(),
            span,
            found: found.into(),
        }
    }
}

/// Dimension-mismatch context used by the evaluator when reporting
/// `IncompatibleUnits`; kept distinct from the error enum so call sites can
/// render the factorizations before converting to a string.
pub fn dimension_mismatch_message<T: fmt::Display>(
    expected: &Factorization<T>,
    found: &Factorization<T>,
) -> String
where
    T: Clone + Eq + std::hash::Hash,
{
    format!(
        "expected dimension {}, found {}",
        expected.to_canonical_string(|item| item.to_string()),
        found.to_canonical_string(|item| item.to_string())
    )
}

pub type Result<T> = std::result::Result<T, ConvertError>;
