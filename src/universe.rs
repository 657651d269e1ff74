//! The frozen registry that owns every property and unit.
//!
//! A single owning table with name→index maps built once and consulted by
//! everything downstream. Built at runtime by the parser from a definition
//! source, so it needs `&mut self` during load and a lock-guarded cache
//! afterward, rather than a `'static` compiled-in table.

use std::sync::{Arc, Mutex, RwLock};

use indexmap::IndexMap;

use crate::error::{ConvertError, Result};
use crate::external::NumberFormatter;
use crate::factorization::Factorization;
use crate::inflector;
use crate::prefix::UnitPrefix;
use crate::rational::Rational;
use crate::suggestions;
use crate::unit::{Property, PropertyId, Unit, UnitId, UnitOrigin};

/// The owning registry of properties and units. Built by the definition
/// parser, then [`Universe::freeze`]s; after that every conversion query
/// against it may run concurrently — the only guarded mutable state is
/// `derived_units_by_factors`.
pub struct Universe {
    properties: Vec<Property>,
    property_name_index: IndexMap<String, PropertyId>,
    property_dimension_index: IndexMap<Factorization<PropertyId>, PropertyId>,
    units: RwLock<Vec<Arc<Unit>>>,
    unit_name_index: IndexMap<String, UnitId>,
    derived_units_by_factors: Mutex<IndexMap<Factorization<UnitId>, UnitId>>,
    number_formatter: Arc<dyn NumberFormatter>,
    frozen: bool,
}

impl Universe {
    pub fn new(number_formatter: Arc<dyn NumberFormatter>) -> Self {
        Self {
            properties: Vec::new(),
            property_name_index: IndexMap::new(),
            property_dimension_index: IndexMap::new(),
            units: RwLock::new(Vec::new()),
            unit_name_index: IndexMap::new(),
            derived_units_by_factors: Mutex::new(IndexMap::new()),
            number_formatter,
            frozen: false,
        }
    }

    fn ensure_not_frozen(&self) -> Result<()> {
        if self.frozen {
            return Err(ConvertError::illegal_state("cannot mutate a frozen universe"));
        }
        Ok(())
    }

    pub fn number_formatter(&self) -> &Arc<dyn NumberFormatter> {
        &self.number_formatter
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    // -- property lookups --------------------------------------------------

    pub fn has_property(&self, name: &str) -> bool {
        self.property_name_index.contains_key(name)
    }

    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.property_name_index.get(name).map(|id| &self.properties[id.0])
    }

    pub fn get_property_by_id(&self, id: PropertyId) -> &Property {
        &self.properties[id.0]
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.property_name_index.keys().map(String::as_str)
    }

    // -- unit lookups --------------------------------------------------

    pub fn has_unit(&self, name: &str) -> bool {
        self.unit_name_index.contains_key(name)
    }

    pub fn get_unit_id(&self, name: &str) -> Option<UnitId> {
        self.unit_name_index.get(name).copied()
    }

    pub fn get_unit(&self, name: &str) -> Option<Arc<Unit>> {
        let id = self.get_unit_id(name)?;
        Some(self.unit(id))
    }

    pub fn unit(&self, id: UnitId) -> Arc<Unit> {
        self.units.read().expect("unit table lock is never poisoned").get(id.0).expect("UnitId is always in range").clone()
    }

    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.unit_name_index.keys().map(String::as_str)
    }

    fn unknown_unit(&self, name: &str) -> ConvertError {
        ConvertError::unknown_unit(name).with_suggestions(suggestions::suggest(name, self.unit_names()))
    }

    fn unknown_property(&self, name: &str) -> ConvertError {
        ConvertError::unknown_property(name).with_suggestions(suggestions::suggest(name, self.property_names()))
    }

    // -- property registration --------------------------------------------------

    /// Registers a fundamental property: its dimension is itself.
    pub fn register_fundamental_property(&mut self, names: Vec<String>) -> Result<PropertyId> {
        self.ensure_not_frozen()?;
        self.check_property_names_available(&names)?;
        let id = PropertyId(self.properties.len());
        let dims = Factorization::single(id, 1);
        self.properties.push(Property::new(id, names.clone(), dims));
        self.index_property_names(id, &names);
        Ok(id)
    }

    /// Registers a derived property from a dimensional factorization over
    /// already-registered properties, synthesizing its base unit from the
    /// base units of its dimensional factors.
    pub fn register_derived_property(
        &mut self,
        names: Vec<String>,
        dimensions: Factorization<PropertyId>,
    ) -> Result<PropertyId> {
        self.ensure_not_frozen()?;
        self.check_property_names_available(&names)?;

        // The written factor expression may itself name a derived property
        // (`momentum = mass*speed`); substitute each referenced property's
        // own (already-reduced, by induction over file order) dimensions so
        // what gets stored is always in terms of fundamental properties only.
        let reduced = self.reduce_property_dimensions(&dimensions);

        if let Some(existing) = self.property_dimension_index.get(&reduced) {
            return Err(ConvertError::DuplicateDerivedProperty {
                a: self.properties[existing.0].primary_name().to_string(),
                b: names[0].clone(),
            });
        }

        let id = PropertyId(self.properties.len());
        self.properties.push(Property::new(id, names.clone(), reduced.clone()));
        self.index_property_names(id, &names);
        self.property_dimension_index.insert(reduced, id);

        let base_factors = dimensions.transform(|pid| {
            self.properties[pid.0]
                .base_unit()
                .expect("a derived property only references properties declared earlier in the file, which already have a base unit")
        });
        let base_unit = self.unit_for_factors(base_factors)?;
        self.properties[id.0].adopt_unit(base_unit, &[]);
        Ok(id)
    }

    /// Substitutes every derived property in `raw` with its own dimensions
    /// (already reduced to fundamentals, by induction over file order),
    /// collapsing exponents so the result mentions only fundamental
    /// properties.
    fn reduce_property_dimensions(&self, raw: &Factorization<PropertyId>) -> Factorization<PropertyId> {
        let mut result = Factorization::empty();
        for (pid, exp) in raw.iter() {
            result = result.mul(&self.properties[pid.0].dimensions().pow(exp));
        }
        result
    }

    fn check_property_names_available(&self, names: &[String]) -> Result<()> {
        for name in names {
            if self.property_name_index.contains_key(name) {
                return Err(ConvertError::DuplicatePropertyName { name: name.clone() });
            }
        }
        Ok(())
    }

    fn index_property_names(&mut self, id: PropertyId, names: &[String]) {
        for name in names {
            self.property_name_index.insert(name.clone(), id);
        }
    }

    pub fn freeze(&mut self) -> Result<()> {
        for property in &mut self.properties {
            property.freeze()?;
        }
        self.frozen = true;
        Ok(())
    }

    // -- unit registration --------------------------------------------------

    /// Registers an atomic unit directly declared in the definition file.
    /// `long_names` are the singular forms as written; plural variants are
    /// derived and registered alongside them.
    pub fn register_atomic_unit(
        &mut self,
        property_id: PropertyId,
        long_names: Vec<String>,
        short_names: Vec<String>,
        multiplier: Rational,
        offset: Rational,
    ) -> Result<UnitId> {
        self.ensure_not_frozen()?;
        let all_long_names = expand_with_plurals(&long_names);
        self.check_unit_names_available(property_id, &all_long_names, &short_names)?;

        let id = self.push_unit(Unit::new(
            UnitId(0),
            Some(property_id),
            long_names.clone(),
            short_names.clone(),
            multiplier,
            offset,
            UnitOrigin::Atomic,
        ));
        self.finish_unit_registration(id, property_id, &all_long_names, &short_names);
        Ok(id)
    }

    /// Registers a prefixed variant of `base` (e.g. `kilo` + `meter`).
    /// Rejects prefixing an already-prefixed unit.
    pub fn register_prefixed_unit(&mut self, property_id: PropertyId, prefix: UnitPrefix, base: UnitId) -> Result<UnitId> {
        self.ensure_not_frozen()?;
        let base_unit = self.unit(base);
        if base_unit.prefix().is_some() {
            return Err(ConvertError::DoublePrefixedUnit {
                unit: base_unit.primary_long_name().unwrap_or_default().to_string(),
            });
        }

        let long_names: Vec<String> = base_unit.long_names().iter().map(|name| format!("{}{name}", prefix.long_name())).collect();
        let short_names: Vec<String> = base_unit.short_names().iter().map(|name| format!("{}{name}", prefix.short_name())).collect();
        let all_long_names = expand_with_plurals(&long_names);
        self.check_unit_names_available(property_id, &all_long_names, &short_names)?;

        let multiplier = prefix.multiplier().mul(base_unit.multiplier());
        let id = self.push_unit(Unit::new(
            UnitId(0),
            Some(property_id),
            long_names,
            short_names.clone(),
            multiplier,
            Rational::zero(),
            UnitOrigin::Prefixed { prefix, base },
        ));
        self.finish_unit_registration(id, property_id, &all_long_names, &short_names);
        Ok(id)
    }

    fn check_unit_names_available(&self, property_id: PropertyId, long_names: &[String], short_names: &[String]) -> Result<()> {
        let property = &self.properties[property_id.0];
        for name in long_names.iter().chain(short_names.iter()) {
            if property.owns_name(name) || self.unit_name_index.contains_key(name) {
                return Err(ConvertError::DuplicateUnitName { name: name.clone() });
            }
        }
        Ok(())
    }

    fn push_unit(&mut self, unit: Unit) -> UnitId {
        let mut guard = self.units.write().expect("unit table lock is never poisoned");
        let id = UnitId(guard.len());
        guard.push(Arc::new(unit.with_id(id)));
        id
    }

    fn finish_unit_registration(&mut self, id: UnitId, property_id: PropertyId, long_names: &[String], short_names: &[String]) {
        let all_names: Vec<String> = long_names.iter().chain(short_names.iter()).cloned().collect();
        self.properties[property_id.0].adopt_unit(id, &all_names);
        for name in &all_names {
            self.unit_name_index.insert(name.clone(), id);
        }
    }

    // -- derived units --------------------------------------------------

    /// Resolves a `Factorization<String>` (unit names as the query/definition
    /// parser sees them) to a `Factorization<UnitId>`, failing on the first
    /// unknown name.
    pub fn unit_factors_for(&self, names: &Factorization<String>) -> Result<Factorization<UnitId>> {
        let mut result = Factorization::empty();
        for (name, exp) in names.iter() {
            let id = self.get_unit_id(name).ok_or_else(|| self.unknown_unit(name))?;
            result = result.mul_item(id, exp);
        }
        Ok(result)
    }

    /// Resolves a `Factorization<Unit>` to the single `Unit` it denotes: the
    /// item itself if it is a single unit to the first power, otherwise a
    /// synthesized (and memoized) derived unit. Nested derived factors are
    /// unrolled into their own components first, so the same dimension
    /// always reduces to the same factorization regardless of how it was
    /// spelled.
    pub fn unit_for_factors(&self, factors: Factorization<UnitId>) -> Result<UnitId> {
        let unrolled = self.unroll(&factors);
        if let Some(single) = unrolled.as_single_unit_power() {
            return Ok(*single);
        }

        if let Some(id) = self.derived_units_by_factors.lock().expect("cache lock is never poisoned").get(&unrolled) {
            return Ok(*id);
        }

        let unit = self.build_derived_unit(&unrolled)?;
        let id = {
            let mut guard = self.units.write().expect("unit table lock is never poisoned");
            let id = UnitId(guard.len());
            guard.push(Arc::new(unit.with_id(id)));
            id
        };

        self.derived_units_by_factors.lock().expect("cache lock is never poisoned").insert(unrolled, id);
        Ok(id)
    }

    /// Replaces every derived factor in `factors` with its own
    /// sub-factorization, so a derived unit's factors never themselves
    /// contain a derived unit.
    fn unroll(&self, factors: &Factorization<UnitId>) -> Factorization<UnitId> {
        let mut result = Factorization::empty();
        for (id, exp) in factors.iter() {
            let unit = self.unit(*id);
            match unit.factors() {
                Some(inner) => {
                    let scaled = inner.pow(exp);
                    result = result.mul(&self.unroll(&scaled));
                }
                None => result = result.mul_item(*id, exp),
            }
        }
        result
    }

    fn build_derived_unit(&self, factors: &Factorization<UnitId>) -> Result<Unit> {
        let mut multiplier = Rational::one();
        for (id, exp) in factors.iter() {
            let unit = self.unit(*id);
            if unit.has_offset() {
                return Err(ConvertError::incompatible_units(
                    unit.primary_long_name().unwrap_or_default(),
                    "a derived unit (offsetted units cannot be composed)",
                ));
            }
            multiplier = multiplier.mul(&unit.multiplier().pow(exp as i32)?);
        }

        // `transform` already collapses colliding items and drops zero
        // exponents, so no separate reduction pass is needed.
        let reduced: Factorization<PropertyId> = factors.transform(|id| {
            self.unit(*id)
                .property()
                .expect("only valid units may participate in a derived-unit factorization")
        });

        let property = if let Some(existing) = self.property_dimension_index.get(&reduced) {
            Some(*existing)
        } else if let Some(single) = reduced.as_single_unit_power() {
            Some(*single)
        } else {
            None
        };

        Ok(Unit::new(
            UnitId(0),
            property,
            Vec::new(),
            Vec::new(),
            multiplier,
            Rational::zero(),
            UnitOrigin::Derived { factors: factors.clone() },
        ))
    }

    // -- compatibility & conversion --------------------------------------------------

    pub fn are_compatible(&self, a: UnitId, b: UnitId) -> bool {
        let a = self.unit(a);
        let b = self.unit(b);
        match (a.property(), b.property()) {
            (Some(pa), Some(pb)) => self.properties[pa.0].dimensions() == self.properties[pb.0].dimensions(),
            _ => false,
        }
    }

    pub fn convert(&self, from: UnitId, to: UnitId, value: &Rational) -> Result<Rational> {
        if !self.are_compatible(from, to) {
            let from_unit = self.unit(from);
            let to_unit = self.unit(to);
            let detail = match (from_unit.property(), to_unit.property()) {
                (Some(pa), Some(pb)) => crate::error::dimension_mismatch_message(
                    &self.properties[pa.0].dimensions().transform(|pid| self.properties[pid.0].primary_name().to_string()),
                    &self.properties[pb.0].dimensions().transform(|pid| self.properties[pid.0].primary_name().to_string()),
                ),
                _ => "one side is an invalid derived unit with no property".to_string(),
            };
            return Err(ConvertError::incompatible_units_with_dims(
                from_unit.primary_long_name().unwrap_or_default(),
                to_unit.primary_long_name().unwrap_or_default(),
                detail,
            ));
        }
        Ok(self.unit(from).convert_to(&self.unit(to), value)?)
    }

    // -- display --------------------------------------------------

    /// A human-readable name for `id`: its registered long name if it has
    /// one, otherwise the rendered factorization of its components,
    /// recursively.
    pub fn unit_display_name(&self, id: UnitId) -> String {
        let unit = self.unit(id);
        if let Some(name) = unit.primary_long_name() {
            return name.to_string();
        }
        match unit.factors() {
            Some(factors) => factors.to_fraction_string(|component| self.unit_display_name(*component)),
            None => "1".to_string(),
        }
    }

    /// [`Universe::unit_display_name`] pluralized, when the unit has a
    /// simple registered name; a compound (unnamed, derived) display name
    /// is returned unpluralized since there is no single word to inflect.
    pub fn unit_plural_display_name(&self, id: UnitId) -> String {
        let unit = self.unit(id);
        match unit.primary_long_name() {
            Some(name) => inflector::plural_of(name),
            None => self.unit_display_name(id),
        }
    }
}

/// `long_names` plus, for each, its plural and (for `"degree X"`-shaped
/// names) the plural applied to `degree` alone instead of the whole name
/// (e.g. `"degree Celsius"` also registers `"degrees Celsius"`).
fn expand_with_plurals(long_names: &[String]) -> Vec<String> {
    let mut all = long_names.to_vec();
    for name in long_names {
        all.push(inflector::plural_of(name));
        if let Some(rest) = name.strip_prefix("degree ") {
            all.push(format!("{} {rest}", inflector::plural_of("degree")));
        }
    }
    all.sort();
    all.dedup();
    all
}
