//! Rule-based English pluralization/singularization.
//!
//! A `Vec<Box<dyn Rule>>` searched top-down, first match wins: each rule
//! claims a (inner, whitespace-stripped) word or declines it, and the first
//! rule to claim the input produces the inflected form.

use once_cell::sync::Lazy;
use regex::Regex;

/// One inflection rule: does it apply to this (inner, whitespace-stripped)
/// word, and if so what does it produce.
pub trait Rule: Send + Sync {
    fn applies_to(&self, word: &str) -> bool;
    fn apply_to(&self, word: &str) -> String;
}

/// Always applies, returns the word unchanged.
struct Identity;
impl Rule for Identity {
    fn applies_to(&self, _word: &str) -> bool {
        true
    }
    fn apply_to(&self, word: &str) -> String {
        word.to_string()
    }
}

/// Applies a regex substitution; claims a word only when the pattern
/// matches somewhere in it.
struct PatternReplace {
    pattern: Regex,
    replacement: &'static str,
}
impl Rule for PatternReplace {
    fn applies_to(&self, word: &str) -> bool {
        self.pattern.is_match(word)
    }
    fn apply_to(&self, word: &str) -> String {
        self.pattern.replace(word, self.replacement).into_owned()
    }
}

fn pattern_replace(pattern: &str, replacement: &'static str) -> Box<dyn Rule> {
    Box::new(PatternReplace {
        pattern: Regex::new(pattern).expect("static inflection pattern is valid regex"),
        replacement,
    })
}

/// Applies a regex match through an arbitrary function rather than a fixed
/// replacement string (e.g. doubling a captured consonant).
struct PatternToFunction<F: Fn(&regex::Captures) -> String + Send + Sync> {
    pattern: Regex,
    f: F,
}
impl<F: Fn(&regex::Captures) -> String + Send + Sync> Rule for PatternToFunction<F> {
    fn applies_to(&self, word: &str) -> bool {
        self.pattern.is_match(word)
    }
    fn apply_to(&self, word: &str) -> String {
        let caps = self.pattern.captures(word).expect("applies_to already matched");
        self.pattern.replace(word, &(self.f)(&caps) as &str).into_owned()
    }
}

fn pattern_to_function<F: Fn(&regex::Captures) -> String + Send + Sync + 'static>(
    pattern: &str,
    f: F,
) -> Box<dyn Rule> {
    Box::new(PatternToFunction {
        pattern: Regex::new(pattern).expect("static inflection pattern is valid regex"),
        f,
    })
}

/// Claims any word ending in `suffix`, replacing just that suffix.
struct SuffixReplace {
    suffix: &'static str,
    replacement: &'static str,
}
impl Rule for SuffixReplace {
    fn applies_to(&self, word: &str) -> bool {
        word.to_lowercase().ends_with(self.suffix)
    }
    fn apply_to(&self, word: &str) -> String {
        let cut = word.len() - self.suffix.len();
        format!("{}{}", &word[..cut], self.replacement)
    }
}

fn suffix_replace(suffix: &'static str, replacement: &'static str) -> Box<dyn Rule> {
    Box::new(SuffixReplace { suffix, replacement })
}

/// Claims a word ending in any of several suffixes, each with its own
/// replacement; the first matching suffix in the list wins.
struct SuffixDisjunction {
    pairs: &'static [(&'static str, &'static str)],
}
impl Rule for SuffixDisjunction {
    fn applies_to(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.pairs.iter().any(|(suffix, _)| lower.ends_with(suffix))
    }
    fn apply_to(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        let (suffix, replacement) = self
            .pairs
            .iter()
            .find(|(suffix, _)| lower.ends_with(suffix))
            .expect("applies_to already confirmed a suffix matches");
        let cut = word.len() - suffix.len();
        format!("{}{}", &word[..cut], replacement)
    }
}

fn suffix_disjunction(pairs: &'static [(&'static str, &'static str)]) -> Box<dyn Rule> {
    Box::new(SuffixDisjunction { pairs })
}

/// Wraps another rule so it applies only to words in a fixed set
/// (case-insensitive).
struct OnlyForWords {
    words: &'static [&'static str],
    inner: Box<dyn Rule>,
}
impl Rule for OnlyForWords {
    fn applies_to(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.words.iter().any(|w| *w == lower) && self.inner.applies_to(word)
    }
    fn apply_to(&self, word: &str) -> String {
        self.inner.apply_to(word)
    }
}

fn only_for_words(words: &'static [&'static str], inner: Box<dyn Rule>) -> Box<dyn Rule> {
    Box::new(OnlyForWords { words, inner })
}

/// Wraps another rule so it never applies to words in a fixed set
/// (case-insensitive).
struct ExceptForWords {
    words: &'static [&'static str],
    inner: Box<dyn Rule>,
}
impl Rule for ExceptForWords {
    fn applies_to(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        !self.words.iter().any(|w| *w == lower) && self.inner.applies_to(word)
    }
    fn apply_to(&self, word: &str) -> String {
        self.inner.apply_to(word)
    }
}

fn except_for_words(words: &'static [&'static str], inner: Box<dyn Rule>) -> Box<dyn Rule> {
    Box::new(ExceptForWords { words, inner })
}

/// Wraps another rule so it applies only when `pattern` matches the word.
struct ForWordsMatching {
    pattern: Regex,
    inner: Box<dyn Rule>,
}
impl Rule for ForWordsMatching {
    fn applies_to(&self, word: &str) -> bool {
        self.pattern.is_match(word) && self.inner.applies_to(word)
    }
    fn apply_to(&self, word: &str) -> String {
        self.inner.apply_to(word)
    }
}

fn for_words_matching(pattern: &str, inner: Box<dyn Rule>) -> Box<dyn Rule> {
    Box::new(ForWordsMatching {
        pattern: Regex::new(pattern).expect("static inflection pattern is valid regex"),
        inner,
    })
}

/// Wraps another rule so it applies only when `pattern` does *not* match.
struct ForWordsNotMatching {
    pattern: Regex,
    inner: Box<dyn Rule>,
}
impl Rule for ForWordsNotMatching {
    fn applies_to(&self, word: &str) -> bool {
        !self.pattern.is_match(word) && self.inner.applies_to(word)
    }
    fn apply_to(&self, word: &str) -> String {
        self.inner.apply_to(word)
    }
}

fn for_words_not_matching(pattern: &str, inner: Box<dyn Rule>) -> Box<dyn Rule> {
    Box::new(ForWordsNotMatching {
        pattern: Regex::new(pattern).expect("static inflection pattern is valid regex"),
        inner,
    })
}

/// The fully generic escape hatch: wraps another rule with an arbitrary
/// predicate over the word.
struct ConstrainedBy<P: Fn(&str) -> bool + Send + Sync> {
    predicate: P,
    inner: Box<dyn Rule>,
}
impl<P: Fn(&str) -> bool + Send + Sync> Rule for ConstrainedBy<P> {
    fn applies_to(&self, word: &str) -> bool {
        (self.predicate)(word) && self.inner.applies_to(word)
    }
    fn apply_to(&self, word: &str) -> String {
        self.inner.apply_to(word)
    }
}

pub(crate) fn constrained_by<P: Fn(&str) -> bool + Send + Sync + 'static>(
    predicate: P,
    inner: Box<dyn Rule>,
) -> Box<dyn Rule> {
    Box::new(ConstrainedBy { predicate, inner })
}

/// Case registers observed on an input word, used to reapply the same
/// register to a rule's (lowercase-oriented) output.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Case {
    Upper,
    Capitalized,
    AsIs,
}

fn detect_case(word: &str) -> Case {
    if word.is_empty() {
        return Case::AsIs;
    }
    if word.chars().any(|c| c.is_alphabetic()) && word.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_uppercase()) {
        Case::Upper
    } else if word.chars().next().is_some_and(|c| c.is_uppercase()) {
        Case::Capitalized
    } else {
        Case::AsIs
    }
}

fn apply_case(word: &str, case: Case) -> String {
    match case {
        Case::Upper => word.to_uppercase(),
        Case::Capitalized => {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
        Case::AsIs => word.to_string(),
    }
}

/// An ordered list of rules, applied top-down (first match wins), with
/// leading/trailing whitespace split off before matching and restored
/// after, and the result re-cased to match the input's register.
pub struct RuleBasedInflector {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleBasedInflector {
    pub fn apply(&self, word: &str) -> String {
        let leading_len = word.len() - word.trim_start().len();
        let trailing_len = word.len() - word.trim_end().len();
        let leading = &word[..leading_len];
        let trailing = &word[word.len() - trailing_len..];
        let inner = &word[leading_len..word.len() - trailing_len];

        if inner.is_empty() {
            return word.to_string();
        }

        let case = detect_case(inner);
        let lower = inner.to_lowercase();
        let rule = self
            .rules
            .iter()
            .find(|rule| rule.applies_to(&lower))
            .expect("the identity rule at the end of every table always applies");
        let transformed = rule.apply_to(&lower);
        format!("{leading}{}{trailing}", apply_case(&transformed, case))
    }
}

const UNINFLECTED: &[&str] = &[
    "sheep", "series", "species", "deer", "fish", "aircraft", "moose", "offspring", "salmon",
    "trout", "swine", "bison", "cod",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("ox", "oxen"),
    ("die", "dice"),
    ("datum", "data"),
    ("quantum", "quanta"),
    ("axis", "axes"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
];

static PLURAL_RULES: Lazy<RuleBasedInflector> = Lazy::new(|| {
    let irregular_plurals: &'static [(&'static str, &'static str)] = IRREGULAR;
    let mut rules: Vec<Box<dyn Rule>> = Vec::new();

    rules.push(only_for_words(UNINFLECTED, Box::new(Identity)));

    for (singular, plural) in irregular_plurals {
        rules.push(only_for_words(std::slice::from_ref(singular), pattern_replace(&format!("^{singular}$"), plural)));
    }

    rules.push(for_words_matching(
        r"(?i)[^aeiou]o$",
        except_for_words(&["photo", "piano", "halo", "solo", "zero"], suffix_replace("o", "oes")),
    ));
    rules.push(suffix_disjunction(&[("fe", "ves"), ("f", "ves")]));
    rules.push(for_words_not_matching(r"(?i)[aeiou]y$", suffix_replace("y", "ies")));
    rules.push(suffix_disjunction(&[
        ("sh", "shes"),
        ("ch", "ches"),
        ("x", "xes"),
        ("z", "zes"),
        ("s", "ses"),
    ]));
    rules.push(pattern_to_function(r"$", |_| "s".to_string()));

    RuleBasedInflector { rules }
});

static SINGULAR_RULES: Lazy<RuleBasedInflector> = Lazy::new(|| {
    let irregular_plurals: &'static [(&'static str, &'static str)] = IRREGULAR;
    let mut rules: Vec<Box<dyn Rule>> = Vec::new();

    rules.push(only_for_words(UNINFLECTED, Box::new(Identity)));

    for (singular, plural) in irregular_plurals {
        rules.push(only_for_words(std::slice::from_ref(plural), pattern_replace(&format!("^{plural}$"), singular)));
    }

    rules.push(for_words_matching(r"(?i)[^aeiou]oes$", suffix_replace("oes", "o")));
    rules.push(suffix_replace("ves", "f"));
    rules.push(suffix_replace("ies", "y"));
    rules.push(suffix_disjunction(&[
        ("shes", "sh"),
        ("ches", "ch"),
        ("xes", "x"),
        ("zes", "z"),
        ("ses", "s"),
    ]));
    rules.push(suffix_replace("s", ""));
    rules.push(Box::new(Identity));

    RuleBasedInflector { rules }
});

/// The plural of `word`, per the shared irregular/uninflected table and the
/// ordered suffix-rule table.
pub fn plural_of(word: &str) -> String {
    PLURAL_RULES.apply(word)
}

/// The singular of `word`, via the mirror rule order with swapped
/// substitutions.
pub fn singular_of(word: &str) -> String {
    SINGULAR_RULES.apply(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUND_TRIP_TABLE: &[&str] = &[
        "meter", "inch", "foot", "mile", "ounce", "box", "church", "bus", "buzz", "city", "day",
        "knife", "leaf", "photo", "piano", "person", "child", "axis", "index", "degree", "sheep",
        "series",
    ];

    #[test]
    fn plural_then_singular_round_trips() {
        for word in ROUND_TRIP_TABLE {
            let plural = plural_of(word);
            assert_eq!(singular_of(&plural), *word, "word {word} plural {plural}");
        }
    }

    #[test]
    fn singular_then_plural_round_trips() {
        for word in ROUND_TRIP_TABLE {
            let plural = plural_of(word);
            let back_to_singular = singular_of(&plural);
            assert_eq!(plural_of(&back_to_singular), plural);
        }
    }

    #[test]
    fn uninflected_words_are_unchanged() {
        assert_eq!(plural_of("sheep"), "sheep");
        assert_eq!(singular_of("sheep"), "sheep");
    }

    #[test]
    fn irregular_plurals() {
        assert_eq!(plural_of("foot"), "feet");
        assert_eq!(singular_of("feet"), "foot");
        assert_eq!(plural_of("person"), "people");
    }

    #[test]
    fn y_preceded_by_consonant_becomes_ies() {
        assert_eq!(plural_of("city"), "cities");
        assert_eq!(plural_of("day"), "days");
    }

    #[test]
    fn sibilant_endings_take_es() {
        assert_eq!(plural_of("box"), "boxes");
        assert_eq!(plural_of("church"), "churches");
        assert_eq!(plural_of("bus"), "buses");
    }

    #[test]
    fn f_fe_endings_become_ves() {
        assert_eq!(plural_of("knife"), "knives");
        assert_eq!(plural_of("leaf"), "leaves");
    }

    #[test]
    fn default_rule_appends_s() {
        assert_eq!(plural_of("meter"), "meters");
        assert_eq!(plural_of("inch"), "inches");
    }

    #[test]
    fn case_register_is_preserved() {
        assert_eq!(plural_of("METER"), "METERS");
        assert_eq!(plural_of("Meter"), "Meters");
    }

    #[test]
    fn whitespace_is_preserved_around_the_inner_word() {
        assert_eq!(plural_of(" meter "), " meters ");
    }

    #[test]
    fn degree_pluralizes_regularly_despite_irregular_table_entry() {
        assert_eq!(plural_of("degree"), "degrees");
        assert_eq!(singular_of("degrees"), "degree");
    }

    #[test]
    fn constrained_by_gates_the_wrapped_rule_on_an_arbitrary_predicate() {
        let rule = constrained_by(|w| w.len() > 3, Box::new(Identity));
        assert!(rule.applies_to("meter"));
        assert!(!rule.applies_to("ox"));
    }
}
