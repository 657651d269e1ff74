//! SI decimal and binary unit prefixes.
//!
//! A small fixed name→index lookup built at compile time via
//! `phf::phf_map!`, with the (more expensive) `Rational` multiplier
//! computed once and memoized behind a `once_cell::sync::Lazy`, deferring
//! construction to first use.

use once_cell::sync::Lazy;
use phf::phf_map;

use crate::rational::Rational;

/// One entry of the closed prefix table: `multiplier = base^scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitPrefixDef {
    pub long_name: &'static str,
    pub short_name: &'static str,
    pub base: i64,
    pub scale: i32,
}

pub static PREFIX_TABLE: &[UnitPrefixDef] = &[
    UnitPrefixDef { long_name: "yotta", short_name: "Y", base: 10, scale: 24 },
    UnitPrefixDef { long_name: "zetta", short_name: "Z", base: 10, scale: 21 },
    UnitPrefixDef { long_name: "exa", short_name: "E", base: 10, scale: 18 },
    UnitPrefixDef { long_name: "peta", short_name: "P", base: 10, scale: 15 },
    UnitPrefixDef { long_name: "tera", short_name: "T", base: 10, scale: 12 },
    UnitPrefixDef { long_name: "giga", short_name: "G", base: 10, scale: 9 },
    UnitPrefixDef { long_name: "mega", short_name: "M", base: 10, scale: 6 },
    UnitPrefixDef { long_name: "kilo", short_name: "k", base: 10, scale: 3 },
    UnitPrefixDef { long_name: "hecto", short_name: "h", base: 10, scale: 2 },
    UnitPrefixDef { long_name: "deca", short_name: "da", base: 10, scale: 1 },
    UnitPrefixDef { long_name: "deci", short_name: "d", base: 10, scale: -1 },
    UnitPrefixDef { long_name: "centi", short_name: "c", base: 10, scale: -2 },
    UnitPrefixDef { long_name: "milli", short_name: "m", base: 10, scale: -3 },
    UnitPrefixDef { long_name: "micro", short_name: "u", base: 10, scale: -6 },
    UnitPrefixDef { long_name: "nano", short_name: "n", base: 10, scale: -9 },
    UnitPrefixDef { long_name: "pico", short_name: "p", base: 10, scale: -12 },
    UnitPrefixDef { long_name: "femto", short_name: "f", base: 10, scale: -15 },
    UnitPrefixDef { long_name: "atto", short_name: "a", base: 10, scale: -18 },
    UnitPrefixDef { long_name: "zepto", short_name: "z", base: 10, scale: -21 },
    UnitPrefixDef { long_name: "yocto", short_name: "y", base: 10, scale: -24 },
    UnitPrefixDef { long_name: "kibi", short_name: "Ki", base: 2, scale: 10 },
    UnitPrefixDef { long_name: "mebi", short_name: "Mi", base: 2, scale: 20 },
    UnitPrefixDef { long_name: "gibi", short_name: "Gi", base: 2, scale: 30 },
    UnitPrefixDef { long_name: "tebi", short_name: "Ti", base: 2, scale: 40 },
    UnitPrefixDef { long_name: "pebi", short_name: "Pi", base: 2, scale: 50 },
    UnitPrefixDef { long_name: "exbi", short_name: "Ei", base: 2, scale: 60 },
    UnitPrefixDef { long_name: "zebi", short_name: "Zi", base: 2, scale: 70 },
    UnitPrefixDef { long_name: "yobi", short_name: "Yi", base: 2, scale: 80 },
];

static LONG_NAME_INDEX: phf::Map<&'static str, usize> = phf_map! {
    "yotta" => 0, "zetta" => 1, "exa" => 2, "peta" => 3, "tera" => 4,
    "giga" => 5, "mega" => 6, "kilo" => 7, "hecto" => 8, "deca" => 9,
    "deci" => 10, "centi" => 11, "milli" => 12, "micro" => 13, "nano" => 14,
    "pico" => 15, "femto" => 16, "atto" => 17, "zepto" => 18, "yocto" => 19,
    "kibi" => 20, "mebi" => 21, "gibi" => 22, "tebi" => 23, "pebi" => 24,
    "exbi" => 25, "zebi" => 26, "yobi" => 27,
};

static SHORT_NAME_INDEX: phf::Map<&'static str, usize> = phf_map! {
    "Y" => 0, "Z" => 1, "E" => 2, "P" => 3, "T" => 4,
    "G" => 5, "M" => 6, "k" => 7, "h" => 8, "da" => 9,
    "d" => 10, "c" => 11, "m" => 12, "u" => 13, "n" => 14,
    "p" => 15, "f" => 16, "a" => 17, "z" => 18, "y" => 19,
    "Ki" => 20, "Mi" => 21, "Gi" => 22, "Ti" => 23, "Pi" => 24,
    "Ei" => 25, "Zi" => 26, "Yi" => 27,
};

static MULTIPLIERS: Lazy<Vec<Rational>> = Lazy::new(|| {
    PREFIX_TABLE
        .iter()
        .map(|def| {
            Rational::from_integer(def.base)
                .pow(def.scale)
                .expect("a prefix base is never zero, so its scale never raises zero to a negative power")
        })
        .collect()
});

/// A named prefix from the closed SI/binary table, with its cached
/// `Rational` multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitPrefix {
    index: usize,
}

impl UnitPrefix {
    pub fn by_long_name(name: &str) -> Option<Self> {
        LONG_NAME_INDEX.get(name).map(|&index| Self { index })
    }

    pub fn by_short_name(name: &str) -> Option<Self> {
        SHORT_NAME_INDEX.get(name).map(|&index| Self { index })
    }

    pub fn long_name(&self) -> &'static str {
        PREFIX_TABLE[self.index].long_name
    }

    pub fn short_name(&self) -> &'static str {
        PREFIX_TABLE[self.index].short_name
    }

    pub fn base(&self) -> i64 {
        PREFIX_TABLE[self.index].base
    }

    pub fn scale(&self) -> i32 {
        PREFIX_TABLE[self.index].scale
    }

    pub fn multiplier(&self) -> &'static Rational {
        &MULTIPLIERS[self.index]
    }

    pub fn all() -> impl Iterator<Item = UnitPrefix> {
        (0..PREFIX_TABLE.len()).map(|index| UnitPrefix { index })
    }
}
