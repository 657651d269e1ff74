//! `Property` and `Unit`: the dimensional algebra.
//!
//! A unit never owns another unit; it refers to one by a small `Copy` id
//! (`PropertyId`/`UnitId`) into the owning `Universe`'s arenas, which
//! resolves the reference. Properties and units are open-ended — loaded
//! from a definition source, not a compiled-in table.

use std::hash::Hash;

use indexmap::IndexMap;

use crate::factorization::Factorization;
use crate::prefix::UnitPrefix;
use crate::rational::Rational;

/// Index of a [`Property`] within its owning [`crate::universe::Universe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyId(pub(crate) usize);

/// Index of a [`Unit`] within its owning [`crate::universe::Universe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitId(pub(crate) usize);

/// A physical dimension: length, time, mass, or a derived combination of
/// fundamental properties.
#[derive(Debug, Clone)]
pub struct Property {
    id: PropertyId,
    names: Vec<String>,
    dimensions: Factorization<PropertyId>,
    base_unit: Option<UnitId>,
    units: Vec<UnitId>,
    name_index: IndexMap<String, UnitId>,
    frozen: bool,
}

impl Property {
    /// A fundamental property: its own dimension, no unit registered yet.
    /// The caller assigns `dimensions = Factorization::single(id, 1)`.
    pub(crate) fn new(id: PropertyId, names: Vec<String>, dimensions: Factorization<PropertyId>) -> Self {
        debug_assert!(!names.is_empty(), "a property must have at least one name");
        Self {
            id,
            names,
            dimensions,
            base_unit: None,
            units: Vec::new(),
            name_index: IndexMap::new(),
            frozen: false,
        }
    }

    pub fn id(&self) -> PropertyId {
        self.id
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn primary_name(&self) -> &str {
        &self.names[0]
    }

    pub fn dimensions(&self) -> &Factorization<PropertyId> {
        &self.dimensions
    }

    /// A property is fundamental when its dimension is the single-item
    /// factorization `self^1`.
    pub fn is_fundamental(&self) -> bool {
        self.dimensions.as_single_unit_power() == Some(&self.id) && self.dimensions.get(&self.id) == 1
    }

    pub fn base_unit(&self) -> Option<UnitId> {
        self.base_unit
    }

    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    pub fn unit_named(&self, name: &str) -> Option<UnitId> {
        self.name_index.get(name).copied()
    }

    pub fn has_unit_named(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether `name` is already taken by a unit registered under this
    /// property.
    pub(crate) fn owns_name(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    /// Records `unit_id` under each of `names`, making it the base unit if
    /// this is the property's first unit. Caller (the universe registry)
    /// has already checked global name uniqueness.
    pub(crate) fn adopt_unit(&mut self, unit_id: UnitId, names: &[String]) {
        if self.units.is_empty() {
            self.base_unit = Some(unit_id);
        }
        self.units.push(unit_id);
        for name in names {
            self.name_index.insert(name.clone(), unit_id);
        }
    }

    /// Rejects a fundamental property frozen with zero atomic units.
    pub(crate) fn freeze(&mut self) -> Result<(), crate::error::ConvertError> {
        if self.is_fundamental() && self.units.is_empty() {
            return Err(crate::error::ConvertError::InvalidEmptyProperty {
                name: self.primary_name().to_string(),
            });
        }
        self.frozen = true;
        Ok(())
    }
}

/// How a unit was synthesized, if at all; `None` means the unit is atomic
/// (declared directly in the definition file with its own multiplier).
#[derive(Debug, Clone)]
pub enum UnitOrigin {
    /// Declared directly in a definition source with its own multiplier.
    Atomic,
    /// A prefixed variant of `base`, e.g. `kilo` applied to `meter`.
    Prefixed { prefix: UnitPrefix, base: UnitId },
    /// Synthesized from a product/quotient of other units, e.g. `m/s`.
    Derived { factors: Factorization<UnitId> },
}

/// A unit of measure. `property` is `None` for an *invalid* derived unit
/// whose reduced dimension matches no registered property — such a unit
/// carries a multiplier but can never participate in a conversion.
#[derive(Debug, Clone)]
pub struct Unit {
    id: UnitId,
    property: Option<PropertyId>,
    long_names: Vec<String>,
    short_names: Vec<String>,
    multiplier: Rational,
    offset: Rational,
    origin: UnitOrigin,
}

impl Unit {
    pub(crate) fn new(
        id: UnitId,
        property: Option<PropertyId>,
        long_names: Vec<String>,
        short_names: Vec<String>,
        multiplier: Rational,
        offset: Rational,
        origin: UnitOrigin,
    ) -> Self {
        Self {
            id,
            property,
            long_names,
            short_names,
            multiplier,
            offset,
            origin,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Relocates this unit to a freshly allocated id. Used only by the
    /// registry when a unit is built before its final slot in the unit
    /// table is known — a single-item factor list can resolve directly to
    /// an existing unit, so the id can't be assigned until after the
    /// unroll/lookup has run.
    pub(crate) fn with_id(mut self, id: UnitId) -> Self {
        self.id = id;
        self
    }

    pub fn property(&self) -> Option<PropertyId> {
        self.property
    }

    /// A unit is *valid* when it has a property attached.
    pub fn is_valid(&self) -> bool {
        self.property.is_some()
    }

    pub fn long_names(&self) -> &[String] {
        &self.long_names
    }

    pub fn short_names(&self) -> &[String] {
        &self.short_names
    }

    pub fn primary_long_name(&self) -> Option<&str> {
        self.long_names.first().map(String::as_str)
    }

    /// All registered names (long, then short) for iteration (registration
    /// duplicate checks, suggestion search).
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        self.long_names.iter().chain(self.short_names.iter()).map(String::as_str)
    }

    pub fn multiplier(&self) -> &Rational {
        &self.multiplier
    }

    pub fn offset(&self) -> &Rational {
        &self.offset
    }

    pub fn has_offset(&self) -> bool {
        !self.offset.is_zero()
    }

    pub fn origin(&self) -> &UnitOrigin {
        &self.origin
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.origin, UnitOrigin::Derived { .. })
    }

    pub fn prefix(&self) -> Option<UnitPrefix> {
        match &self.origin {
            UnitOrigin::Prefixed { prefix, .. } => Some(*prefix),
            _ => None,
        }
    }

    pub fn factors(&self) -> Option<&Factorization<UnitId>> {
        match &self.origin {
            UnitOrigin::Derived { factors } => Some(factors),
            _ => None,
        }
    }

    /// `base_value = value * multiplier + offset`.
    pub fn to_base(&self, value: &Rational) -> Rational {
        value.mul(&self.multiplier).add(&self.offset)
    }

    /// The inverse of [`Unit::to_base`]: `value = (base_value - offset) / multiplier`.
    pub fn from_base(&self, base_value: &Rational) -> Result<Rational, crate::error::ArithmeticError> {
        base_value.sub(&self.offset).div(&self.multiplier)
    }

    /// Converts `x` (expressed in `self`) into `other`, routing through the
    /// shared base value. Valid whenever `self` and `other`
    /// measure the same property — callers are expected to have already
    /// checked [`crate::universe::Universe::are_compatible`].
    pub fn convert_to(&self, other: &Unit, x: &Rational) -> Result<Rational, crate::error::ArithmeticError> {
        if self.id == other.id {
            return Ok(x.clone());
        }
        let base_value = self.to_base(x);
        other.from_base(&base_value)
    }
}
