//! A formal product of items raised to nonzero integer exponents.
//!
//! `Factorization<T>` has no knowledge of units, properties, or tokens — it
//! is the single generic multiset type that `Dimension`, `Unit::factors`,
//! and the parser's factor-expression grammar are all built from.

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

/// A multiset of items, each raised to a nonzero integer exponent.
///
/// The empty factorization is the multiplicative identity. Insertion order
/// is preserved (via `IndexMap`) so string rendering is deterministic, but
/// order carries no semantic weight — equality compares the map contents
/// only, regardless of order.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Factorization<T: Eq + Hash + Clone> {
    terms: IndexMap<T, i64>,
}

impl<T: Eq + Hash + Clone> Default for Factorization<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Eq + Hash + Clone> PartialEq for Factorization<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.terms.len() != other.terms.len() {
            return false;
        }
        self.terms
            .iter()
            .all(|(item, exp)| other.terms.get(item) == Some(exp))
    }
}
impl<T: Eq + Hash + Clone> Eq for Factorization<T> {}

/// Order-independent hash consistent with the order-independent `PartialEq`
/// above: each entry is hashed on its own and combined with XOR, so two
/// factorizations with the same entries in different insertion order hash
/// identically (required for use as a `HashMap`/`IndexMap` key, e.g. the
/// derived-unit memoization cache).
impl<T: Eq + Hash + Clone> Hash for Factorization<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut combined: u64 = 0;
        for (item, exp) in self.terms.iter() {
            let mut entry_hasher = std::collections::hash_map::DefaultHasher::new();
            item.hash(&mut entry_hasher);
            exp.hash(&mut entry_hasher);
            combined ^= entry_hasher.finish();
        }
        combined.hash(state);
    }
}

impl<T: Eq + Hash + Clone> Factorization<T> {
    /// The multiplicative identity: no factors.
    pub fn empty() -> Self {
        Self {
            terms: IndexMap::new(),
        }
    }

    /// A single item raised to `exp`. Returns the identity if `exp == 0`.
    pub fn single(item: T, exp: i64) -> Self {
        let mut terms = IndexMap::new();
        if exp != 0 {
            terms.insert(item, exp);
        }
        Self { terms }
    }

    /// Multiply together a sequence of `(item, exponent)` pairs, collapsing
    /// duplicate items by summing their exponents.
    pub fn product(items: impl IntoIterator<Item = (T, i64)>) -> Self {
        let mut result = Self::empty();
        for (item, exp) in items {
            result = result.mul_item(item, exp);
        }
        result
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, i64)> {
        self.terms.iter().map(|(item, exp)| (item, *exp))
    }

    pub fn get(&self, item: &T) -> i64 {
        self.terms.get(item).copied().unwrap_or(0)
    }

    /// If this factorization is a single item raised to the power 1.
    pub fn as_single_unit_power(&self) -> Option<&T> {
        if self.terms.len() == 1 {
            let (item, exp) = self.terms.iter().next().unwrap();
            if *exp == 1 {
                return Some(item);
            }
        }
        None
    }

    /// Insert `item` raised to `exp`, merging with any existing entry and
    /// dropping the entry entirely if the accumulated exponent reaches 0.
    pub fn mul_item(&self, item: T, exp: i64) -> Self {
        if exp == 0 {
            return self.clone();
        }
        let mut terms = self.terms.clone();
        match terms.get_mut(&item) {
            Some(existing) => {
                *existing += exp;
                if *existing == 0 {
                    terms.shift_remove(&item);
                }
            }
            None => {
                terms.insert(item, exp);
            }
        }
        Self { terms }
    }

    pub fn mul(&self, other: &Self) -> Self {
        let mut result = self.clone();
        for (item, exp) in other.terms.iter() {
            result = result.mul_item(item.clone(), *exp);
        }
        result
    }

    pub fn div(&self, other: &Self) -> Self {
        self.mul(&other.inverse())
    }

    pub fn pow(&self, n: i64) -> Self {
        if n == 0 {
            return Self::empty();
        }
        let mut terms = IndexMap::new();
        for (item, exp) in self.terms.iter() {
            terms.insert(item.clone(), exp * n);
        }
        Self { terms }
    }

    pub fn inverse(&self) -> Self {
        self.pow(-1)
    }

    /// The sub-factorization of entries with positive exponent.
    pub fn numerator(&self) -> Self {
        let terms = self
            .terms
            .iter()
            .filter(|(_, exp)| **exp > 0)
            .map(|(item, exp)| (item.clone(), *exp))
            .collect();
        Self { terms }
    }

    /// The sub-factorization of entries with negative exponent, inverted to
    /// positive (so `numerator().div(&denominator()) == self` up to the
    /// sign convention documented on `div`).
    pub fn denominator(&self) -> Self {
        let terms = self
            .terms
            .iter()
            .filter(|(_, exp)| **exp < 0)
            .map(|(item, exp)| (item.clone(), -*exp))
            .collect();
        Self { terms }
    }

    /// Map every item through `f`, collapsing items that collide after the
    /// transform and dropping any that sum back to a zero exponent.
    pub fn transform<U, F>(&self, mut f: F) -> Factorization<U>
    where
        U: Eq + Hash + Clone,
        F: FnMut(&T) -> U,
    {
        let mut result = Factorization::empty();
        for (item, exp) in self.terms.iter() {
            result = result.mul_item(f(item), *exp);
        }
        result
    }

    /// `"num_terms / den_terms"`, omitting `"/ 1"` when there is no
    /// denominator.
    pub fn to_fraction_string<F: Fn(&T) -> String>(&self, item_fmt: F) -> String {
        let num = self.numerator();
        let den = self.denominator();
        let num_str = factors_to_string(&num, &item_fmt, false);
        if den.is_empty() {
            num_str
        } else {
            let den_str = factors_to_string(&den, &item_fmt, false);
            format!("{num_str} / {den_str}")
        }
    }

    /// `"num_terms den_terms"` using all-positive exponents (denominator
    /// entries rendered with their original, negative, exponent).
    pub fn to_canonical_string<F: Fn(&T) -> String>(&self, item_fmt: F) -> String {
        factors_to_string(self, &item_fmt, true)
    }
}

fn factors_to_string<T: Eq + Hash + Clone, F: Fn(&T) -> String>(
    fz: &Factorization<T>,
    item_fmt: &F,
    show_sign: bool,
) -> String {
    if fz.is_empty() {
        return "1".to_string();
    }
    fz.terms
        .iter()
        .map(|(item, exp)| {
            let name = item_fmt(item);
            match exp {
                1 => name,
                _ if show_sign => format!("{name}^{exp}"),
                _ => format!("{name}^{}", exp.abs()),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(items: &[(&str, i64)]) -> Factorization<String> {
        Factorization::product(items.iter().map(|(s, e)| (s.to_string(), *e)))
    }

    #[test]
    fn empty_is_identity() {
        let e: Factorization<String> = Factorization::empty();
        assert!(e.is_empty());
        assert_eq!(e.to_canonical_string(|s: &String| s.clone()), "1");
    }

    #[test]
    fn mul_collapses_duplicates() {
        let a = f(&[("m", 1), ("s", -1)]);
        let b = f(&[("m", 1)]);
        let prod = a.mul(&b);
        assert_eq!(prod.get(&"m".to_string()), 2);
        assert_eq!(prod.get(&"s".to_string()), -1);
    }

    #[test]
    fn zero_exponent_entries_are_removed() {
        let a = f(&[("m", 2)]);
        let b = f(&[("m", -2)]);
        let prod = a.mul(&b);
        assert!(prod.is_empty());
    }

    #[test]
    fn mul_div_round_trip() {
        let a = f(&[("m", 1), ("s", -2)]);
        let b = f(&[("kg", 1)]);
        assert_eq!(a.mul(&b).div(&b), a);
    }

    #[test]
    fn pow_zero_is_empty() {
        let a = f(&[("m", 3)]);
        assert!(a.pow(0).is_empty());
    }

    #[test]
    fn pow_composes() {
        let a = f(&[("m", 2)]);
        assert_eq!(a.pow(3).pow(2), a.pow(6));
    }

    #[test]
    fn inverse_is_involutive() {
        let a = f(&[("m", 1), ("s", -2)]);
        assert_eq!(a.inverse().inverse(), a);
    }

    #[test]
    fn numerator_denominator_round_trip() {
        let a = f(&[("m", 1), ("s", -2), ("kg", 3)]);
        assert_eq!(a.numerator().div(&a.denominator()), a);
    }

    #[test]
    fn transform_identity() {
        let a = f(&[("m", 1), ("s", -2)]);
        let b = a.transform(|s: &String| s.clone());
        assert_eq!(a, b);
    }

    #[test]
    fn transform_collapses_collisions() {
        let a = f(&[("meter", 1), ("metre", 2)]);
        let b: Factorization<String> = a.transform(|_| "length".to_string());
        assert_eq!(b.get(&"length".to_string()), 3);
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a = f(&[("m", 1), ("s", -1)]);
        let b = f(&[("s", -1), ("m", 1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn fraction_string_omits_trivial_denominator() {
        let a = f(&[("m", 1)]);
        assert_eq!(a.to_fraction_string(|s: &String| s.clone()), "m");
    }

    #[test]
    fn fraction_string_renders_denominator() {
        let a = f(&[("m", 1), ("s", -1)]);
        assert_eq!(a.to_fraction_string(|s: &String| s.clone()), "m / s");
    }
}
