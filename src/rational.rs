//! Arbitrary-precision reduced fractions.
//!
//! Built on `num_rational::BigRational` (already reduced, denominator always
//! positive) rather than a hand-rolled numerator/denominator pair, with
//! rounding-mode and decimal-string rendering layered on top since the
//! numeric crate itself doesn't provide either.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ArithmeticError;

/// An exact, always-reduced rational number with an arbitrary-precision
/// numerator and a strictly positive arbitrary-precision denominator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rational(BigRational);

/// Strategies for `Rational::round`, mirroring `java.math.RoundingMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    HalfUp,
    HalfDown,
    HalfEven,
    Ceiling,
    Floor,
    Up,
    Down,
    Unnecessary,
}

impl Rational {
    /// Builds `numerator / denominator`, normalizing sign and reducing by
    /// the gcd. Fails if `denominator` is zero.
    pub fn new(numerator: impl Into<BigInt>, denominator: impl Into<BigInt>) -> Result<Self, ArithmeticError> {
        let den = denominator.into();
        if den.is_zero() {
            return Err(ArithmeticError::DivideByZero);
        }
        Ok(Self(BigRational::new(numerator.into(), den)))
    }

    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    pub fn one() -> Self {
        Self(BigRational::one())
    }

    pub fn from_integer(n: impl Into<BigInt>) -> Self {
        Self(BigRational::from_integer(n.into()))
    }

    /// Parses `"[+-]?digits(.digits)?([eE][+-]?digits)?"`.
    pub fn from_decimal_str(s: &str) -> Result<Self, ArithmeticError> {
        parse_decimal(s)
    }

    /// Decomposes the IEEE-754 bit pattern of `value` into an exact dyadic
    /// rational. Rejects NaN and infinities.
    pub fn from_f64(value: f64) -> Result<Self, ArithmeticError> {
        if !value.is_finite() {
            return Err(ArithmeticError::NotFinite);
        }
        if value == 0.0 {
            return Ok(Self::zero());
        }
        let bits = value.to_bits();
        let negative = bits >> 63 == 1;
        let raw_exponent = ((bits >> 52) & 0x7ff) as i64;
        let raw_mantissa = bits & 0xf_ffff_ffff_ffff;

        let (mantissa, exponent) = if raw_exponent == 0 {
            (raw_mantissa, -1074i64)
        } else {
            (raw_mantissa | (1u64 << 52), raw_exponent - 1075)
        };

        let mut numerator = BigInt::from(mantissa);
        let mut denominator = BigInt::from(1);
        if exponent >= 0 {
            numerator *= bigint_pow(&BigInt::from(2), exponent as u32);
        } else {
            denominator = bigint_pow(&BigInt::from(2), (-exponent) as u32);
        }
        if negative {
            numerator = -numerator;
        }
        Ok(Self(BigRational::new(numerator, denominator)))
    }

    pub fn numerator(&self) -> &BigInt {
        self.0.numer()
    }

    pub fn denominator(&self) -> &BigInt {
        self.0.denom()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.numer().is_negative()
    }

    pub fn signum(&self) -> i32 {
        if self.0.numer().is_zero() {
            0
        } else if self.0.numer().is_negative() {
            -1
        } else {
            1
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        Self(&self.0 + &other.0)
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self(&self.0 - &other.0)
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self(&self.0 * &other.0)
    }

    pub fn div(&self, other: &Self) -> Result<Self, ArithmeticError> {
        if other.is_zero() {
            return Err(ArithmeticError::DivideByZero);
        }
        Ok(Self(&self.0 / &other.0))
    }

    pub fn neg(&self) -> Self {
        Self(-self.0.clone())
    }

    pub fn abs(&self) -> Self {
        Self(Signed::abs(&self.0))
    }

    pub fn reciprocal(&self) -> Result<Self, ArithmeticError> {
        if self.is_zero() {
            return Err(ArithmeticError::DivideByZero);
        }
        Ok(Self(self.0.recip()))
    }

    /// `0^0 = 1`; a negative exponent of zero fails.
    pub fn pow(&self, exp: i32) -> Result<Self, ArithmeticError> {
        if exp == 0 {
            return Ok(Self::one());
        }
        if self.is_zero() && exp < 0 {
            return Err(ArithmeticError::ZeroToNegativePower);
        }
        let n = exp.unsigned_abs();
        let num = bigint_pow(self.0.numer(), n);
        let den = bigint_pow(self.0.denom(), n);
        if exp > 0 {
            Ok(Self(BigRational::new(num, den)))
        } else {
            Ok(Self(BigRational::new(den, num)))
        }
    }

    /// Signum-first, equal-denominator-next, cross-multiplication otherwise
    /// — `BigRational`'s own `Ord` already implements exactly this.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }

    /// Rounds to the nearest integer under `mode`. `Unnecessary` fails
    /// unless `self` is already an integer.
    pub fn round(&self, mode: RoundingMode) -> Result<BigInt, ArithmeticError> {
        let numer = self.0.numer();
        let denom = self.0.denom();
        if denom.is_one() {
            return Ok(numer.clone());
        }

        let toward_zero = numer / denom;
        let remainder = numer - &toward_zero * denom;
        let negative = numer.is_negative();
        let away_from_zero = if negative { &toward_zero - 1 } else { &toward_zero + 1 };

        match mode {
            RoundingMode::Unnecessary => Err(ArithmeticError::RoundingNecessary),
            RoundingMode::Down => Ok(toward_zero),
            RoundingMode::Up => Ok(away_from_zero),
            RoundingMode::Floor => Ok(if negative { away_from_zero } else { toward_zero }),
            RoundingMode::Ceiling => Ok(if negative { toward_zero } else { away_from_zero }),
            RoundingMode::HalfUp | RoundingMode::HalfDown | RoundingMode::HalfEven => {
                let twice_remainder = remainder.abs() * BigInt::from(2);
                let go_away = match twice_remainder.cmp(denom) {
                    Ordering::Less => false,
                    Ordering::Greater => true,
                    Ordering::Equal => match mode {
                        RoundingMode::HalfUp => true,
                        RoundingMode::HalfDown => false,
                        RoundingMode::HalfEven => (&away_from_zero % BigInt::from(2)).is_zero(),
                        _ => unreachable!(),
                    },
                };
                Ok(if go_away { away_from_zero } else { toward_zero })
            }
        }
    }

    /// `Some(decimal)` when the denominator's only prime factors are 2 and
    /// 5 (the fraction terminates in base 10); `None` otherwise.
    pub fn to_exact_decimal(&self) -> Option<String> {
        if self.is_zero() {
            return Some("0".to_string());
        }
        let (rest, twos) = factor_out(self.0.denom().clone(), &BigInt::from(2));
        let (rest, fives) = factor_out(rest, &BigInt::from(5));
        if rest != BigInt::from(1) {
            return None;
        }
        let scale = twos.max(fives);
        let scaled_numerator = self.0.numer() * bigint_pow(&BigInt::from(10), scale);
        let value = scaled_numerator.div_floor(self.0.denom());
        Some(format_scaled(value, scale))
    }

    /// The exact decimal when the fraction terminates in base 10, else a
    /// decimal approximation at a precision of
    /// `max(numerator_bits, denominator_bits) / log2(10)`, floored, at
    /// least 17 significant digits.
    pub fn to_decimal_string(&self) -> String {
        if let Some(exact) = self.to_exact_decimal() {
            return exact;
        }
        let num_bits = self.0.numer().bits() as f64;
        let den_bits = self.0.denom().bits() as f64;
        let precision = ((num_bits.max(den_bits) / std::f64::consts::LOG2_10).floor() as u32).max(17);
        let scale = bigint_pow(&BigInt::from(10), precision);
        let scaled = Self(BigRational::new(self.0.numer() * &scale, self.0.denom().clone()));
        let rounded = scaled
            .round(RoundingMode::HalfUp)
            .expect("half-up rounding never requires RoundingMode::Unnecessary");
        format_scaled(rounded, precision)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

fn bigint_pow(base: &BigInt, mut exp: u32) -> BigInt {
    let mut result = BigInt::from(1);
    let mut squaring = base.clone();
    while exp > 0 {
        if exp & 1 == 1 {
            result *= &squaring;
        }
        squaring = &squaring * &squaring;
        exp >>= 1;
    }
    result
}

fn factor_out(mut n: BigInt, base: &BigInt) -> (BigInt, u32) {
    let mut count = 0u32;
    if n.is_zero() {
        return (n, 0);
    }
    loop {
        let (quotient, remainder) = n.div_mod_floor(base);
        if remainder.is_zero() {
            n = quotient;
            count += 1;
        } else {
            break;
        }
    }
    (n, count)
}

fn format_scaled(value: BigInt, scale: u32) -> String {
    let negative = value.is_negative();
    let digits = value.abs().to_str_radix(10);
    if scale == 0 {
        return if negative { format!("-{digits}") } else { digits };
    }
    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{digits}", "0".repeat(scale - digits.len() + 1))
    } else {
        digits
    };
    let split_at = padded.len() - scale;
    let (int_part, frac_part) = padded.split_at(split_at);
    let sign = if negative { "-" } else { "" };
    format!("{sign}{int_part}.{frac_part}")
}

static DECIMAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<sign>[+-])?(?P<int>\d+)?(\.(?P<frac>\d+))?([eE](?P<exp>[+-]?\d+))?$").unwrap()
});

fn parse_decimal(s: &str) -> Result<Rational, ArithmeticError> {
    let caps = DECIMAL_PATTERN
        .captures(s)
        .ok_or_else(|| ArithmeticError::MalformedDecimal(s.to_string()))?;
    let int_part = caps.name("int").map(|m| m.as_str()).unwrap_or("");
    let frac_part = caps.name("frac").map(|m| m.as_str()).unwrap_or("");
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(ArithmeticError::MalformedDecimal(s.to_string()));
    }
    let negative = caps.name("sign").map(|m| m.as_str() == "-").unwrap_or(false);

    let digits = format!("{int_part}{frac_part}");
    let mut numerator: BigInt = digits
        .parse()
        .map_err(|_| ArithmeticError::MalformedDecimal(s.to_string()))?;
    if negative {
        numerator = -numerator;
    }
    let mut denominator = bigint_pow(&BigInt::from(10), frac_part.len() as u32);

    if let Some(exp_match) = caps.name("exp") {
        let exp: i64 = exp_match
            .as_str()
            .parse()
            .map_err(|_| ArithmeticError::MalformedDecimal(s.to_string()))?;
        if exp >= 0 {
            numerator *= bigint_pow(&BigInt::from(10), exp as u32);
        } else {
            denominator *= bigint_pow(&BigInt::from(10), (-exp) as u32);
        }
    }

    Rational::new(numerator, denominator)
}
