//! "Did you mean...?" suggestions for unknown unit/property names.
//!
//! Scores every candidate with `fuzzy_matcher::skim::SkimMatcherV2` and
//! keeps whatever clears a threshold. `UnknownUnitName` and
//! `UnknownPropertyName` carry whatever this returns.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use once_cell::sync::Lazy;

const MAX_SUGGESTIONS: usize = 3;
const MIN_SCORE: i64 = 30;

static MATCHER: Lazy<SkimMatcherV2> = Lazy::new(SkimMatcherV2::default);

/// Returns up to [`MAX_SUGGESTIONS`] candidates best matching `query`,
/// highest score first, dropping anything below [`MIN_SCORE`].
pub fn suggest<'a>(query: &str, candidates: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut scored: Vec<(i64, &str)> = candidates
        .filter_map(|candidate| MATCHER.fuzzy_match(candidate, query).map(|score| (score, candidate)))
        .filter(|(score, _)| *score >= MIN_SCORE)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(MAX_SUGGESTIONS).map(|(_, name)| name.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_a_close_typo() {
        let candidates = ["meter", "metre", "minute", "mile"];
        let suggestions = suggest("metre", candidates.into_iter());
        assert!(suggestions.contains(&"metre".to_string()));
    }

    #[test]
    fn no_suggestions_for_completely_unrelated_query() {
        let candidates = ["meter", "second", "kilogram"];
        let suggestions = suggest("xyzzyplugh", candidates.into_iter());
        assert!(suggestions.len() <= MAX_SUGGESTIONS);
    }

    #[test]
    fn caps_the_number_of_suggestions() {
        let candidates = ["meter", "metre", "meteor", "metreorite", "meterish", "metering"];
        let suggestions = suggest("meter", candidates.into_iter());
        assert!(suggestions.len() <= MAX_SUGGESTIONS);
    }
}
